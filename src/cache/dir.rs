//! Directory-backed cache: one file per key

use crate::cache::{validate_key, CacheBackend};
use crate::error::{TodoError, TodoResult};
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use tokio::fs;
use tracing::debug;

const ENTRY_EXT: &str = "cache";

/// Per-process sequence so concurrent writers never share a temp file
static TEMP_SEQ: AtomicU64 = AtomicU64::new(0);

/// File cache rooted at a directory
#[derive(Debug)]
pub struct DirCache {
    cache_dir: PathBuf,
    closed: AtomicBool,
}

impl DirCache {
    /// Open (creating if needed) a cache directory
    pub async fn open(cache_dir: PathBuf) -> TodoResult<Self> {
        fs::create_dir_all(&cache_dir).await.map_err(|e| {
            TodoError::cache(format!(
                "creating cache dir {}: {}",
                cache_dir.display(),
                e
            ))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o700);
            std::fs::set_permissions(&cache_dir, perms)
                .map_err(|e| TodoError::cache(format!("setting cache dir permissions: {}", e)))?;
        }

        debug!(dir = %cache_dir.display(), "Opened dir cache");
        Ok(Self {
            cache_dir,
            closed: AtomicBool::new(false),
        })
    }

    fn ensure_open(&self) -> TodoResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TodoError::cache(format!(
                "dir cache {} is closed",
                self.cache_dir.display()
            )));
        }
        Ok(())
    }

    fn cache_path(&self, key: &str) -> TodoResult<PathBuf> {
        validate_key(key)?;
        Ok(self.cache_dir.join(format!("{}.{}", key, ENTRY_EXT)))
    }

    async fn write_then_rename(&self, tmp: &Path, path: &Path, payload: &str) -> TodoResult<()> {
        fs::write(tmp, payload).await.map_err(|e| {
            TodoError::cache(format!("writing cache file {}: {}", tmp.display(), e))
        })?;

        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            let perms = std::fs::Permissions::from_mode(0o600);
            fs::set_permissions(tmp, perms)
                .await
                .map_err(|e| TodoError::cache(format!("setting cache file permissions: {}", e)))?;
        }

        // Rename is atomic within a directory, so readers see old or new, never half
        fs::rename(tmp, path).await.map_err(|e| {
            TodoError::cache(format!("replacing cache file {}: {}", path.display(), e))
        })
    }

    /// Unique sibling of `path` for one in-progress write
    fn temp_path(&self, path: &Path) -> PathBuf {
        let seq = TEMP_SEQ.fetch_add(1, Ordering::Relaxed);
        let mut name = path.as_os_str().to_owned();
        name.push(format!(".{}.{}.tmp", std::process::id(), seq));
        PathBuf::from(name)
    }
}

#[async_trait]
impl CacheBackend for DirCache {
    async fn get(&self, key: &str) -> TodoResult<Option<String>> {
        self.ensure_open()?;
        let path = self.cache_path(key)?;

        match fs::read_to_string(&path).await {
            Ok(content) => {
                debug!(key = key, "Cache HIT (dir)");
                Ok(Some(content))
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                debug!(key = key, "Cache MISS (dir)");
                Ok(None)
            }
            Err(e) => Err(TodoError::cache(format!(
                "reading cache file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn set(&self, key: &str, payload: &str) -> TodoResult<()> {
        self.ensure_open()?;
        let path = self.cache_path(key)?;
        let tmp = self.temp_path(&path);

        if let Err(e) = self.write_then_rename(&tmp, &path, payload).await {
            fs::remove_file(&tmp).await.ok();
            return Err(e);
        }

        debug!(key = key, bytes = payload.len(), "Cache SET (dir)");
        Ok(())
    }

    async fn remove(&self, key: &str) -> TodoResult<()> {
        self.ensure_open()?;
        let path = self.cache_path(key)?;
        match fs::remove_file(&path).await {
            Ok(()) => {
                debug!(key = key, "Cache DEL (dir)");
                Ok(())
            }
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Ok(()),
            Err(e) => Err(TodoError::cache(format!(
                "removing cache file {}: {}",
                path.display(),
                e
            ))),
        }
    }

    async fn clear(&self) -> TodoResult<u64> {
        self.ensure_open()?;
        let mut entries = fs::read_dir(&self.cache_dir)
            .await
            .map_err(|e| TodoError::cache(format!("reading cache directory: {}", e)))?;

        let mut removed = 0;
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| TodoError::cache(format!("reading cache entry: {}", e)))?
        {
            if entry.path().extension().is_some_and(|ext| ext == ENTRY_EXT) {
                fs::remove_file(entry.path())
                    .await
                    .map_err(|e| TodoError::cache(format!("removing cache file: {}", e)))?;
                removed += 1;
            }
        }

        Ok(removed)
    }

    async fn close(&self) -> TodoResult<()> {
        self.closed.store(true, Ordering::Release);
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "dir"
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    async fn test_cache() -> (DirCache, TempDir) {
        let temp = TempDir::new().unwrap();
        let cache = DirCache::open(temp.path().join("cache")).await.unwrap();
        (cache, temp)
    }

    #[tokio::test]
    async fn cache_set_and_get() {
        let (cache, _temp) = test_cache().await;
        cache.set("entries", "{\"count\":2}").await.unwrap();

        let payload = cache.get("entries").await.unwrap().unwrap();
        assert_eq!(payload, "{\"count\":2}");
    }

    #[tokio::test]
    async fn cache_missing_returns_none() {
        let (cache, _temp) = test_cache().await;
        assert!(cache.get("nonexistent").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn set_leaves_no_temp_file() {
        let (cache, _temp) = test_cache().await;
        cache.set("entries", "payload").await.unwrap();

        let names: Vec<String> = std::fs::read_dir(&cache.cache_dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["entries.cache".to_string()]);
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 4)]
    async fn concurrent_sets_never_tear() {
        let (cache, _temp) = test_cache().await;
        let cache = std::sync::Arc::new(cache);
        let a = "A".repeat(512 * 1024);
        let b = "B".repeat(512 * 1024);

        let reader = {
            let cache = cache.clone();
            let (a, b) = (a.clone(), b.clone());
            tokio::spawn(async move {
                for _ in 0..200 {
                    if let Some(payload) = cache.get("entries").await.unwrap() {
                        assert!(payload == a || payload == b, "read a partial entry");
                    }
                    tokio::task::yield_now().await;
                }
            })
        };

        for _ in 0..10 {
            let writers: Vec<_> = (0..8)
                .map(|i| {
                    let cache = cache.clone();
                    let payload = if i % 2 == 0 { a.clone() } else { b.clone() };
                    tokio::spawn(async move { cache.set("entries", &payload).await })
                })
                .collect();
            for writer in writers {
                writer.await.unwrap().unwrap();
            }
        }
        reader.await.unwrap();

        let last = cache.get("entries").await.unwrap().unwrap();
        assert!(last == a || last == b);

        let leftovers = std::fs::read_dir(&cache.cache_dir)
            .unwrap()
            .filter(|e| e.as_ref().unwrap().file_name().to_string_lossy().ends_with(".tmp"))
            .count();
        assert_eq!(leftovers, 0);
    }

    #[tokio::test]
    async fn entries_survive_reopen() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path().join("cache");

        let cache = DirCache::open(dir.clone()).await.unwrap();
        cache.set("entries", "kept").await.unwrap();
        cache.close().await.unwrap();

        let reopened = DirCache::open(dir).await.unwrap();
        assert_eq!(reopened.get("entries").await.unwrap().as_deref(), Some("kept"));
    }

    #[tokio::test]
    async fn clear_removes_entries() {
        let (cache, _temp) = test_cache().await;
        cache.set("a", "1").await.unwrap();
        cache.set("b", "2").await.unwrap();
        assert_eq!(cache.clear().await.unwrap(), 2);
        assert!(cache.get("a").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn rejects_path_like_keys() {
        let (cache, _temp) = test_cache().await;
        assert!(cache.get("../etc/passwd").await.is_err());
        assert!(cache.set("", "x").await.is_err());
    }

    #[tokio::test]
    async fn closed_cache_is_unavailable() {
        let (cache, _temp) = test_cache().await;
        cache.close().await.unwrap();
        assert!(matches!(
            cache.get("entries").await,
            Err(TodoError::CacheUnavailable(_))
        ));
    }
}
