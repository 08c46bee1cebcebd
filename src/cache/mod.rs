//! Key-value cache backends for the dataset read path
//!
//! A backend is a handle to a cache the crate does not own. Entries never
//! expire; they stay until removed or until the backing store goes away.
//!
//! | Backend | Storage | Survives restart |
//! |---------|---------|------------------|
//! | memory  | in-process map | no |
//! | dir     | one file per key | yes, until `clear` |
//!
//! Every backend failure surfaces as `TodoError::CacheUnavailable`.

pub mod dir;
pub mod memory;

pub use dir::DirCache;
pub use memory::MemoryCache;

use crate::config::schema::{CacheBackendKind, CacheConfig};
use crate::error::{TodoError, TodoResult};
use async_trait::async_trait;
use std::sync::Arc;

/// Handle to an external key-value cache
#[async_trait]
pub trait CacheBackend: Send + Sync {
    /// Get the payload stored under `key`, `None` on a miss
    async fn get(&self, key: &str) -> TodoResult<Option<String>>;

    /// Store `payload` under `key`, overwriting any previous entry.
    ///
    /// A set either lands completely or not at all.
    async fn set(&self, key: &str, payload: &str) -> TodoResult<()>;

    /// Remove the entry under `key` if present
    async fn remove(&self, key: &str) -> TodoResult<()>;

    /// Remove every entry, returning how many were removed
    async fn clear(&self) -> TodoResult<u64>;

    /// Release the handle. Later calls fail with `CacheUnavailable`.
    async fn close(&self) -> TodoResult<()>;

    /// Backend name for display
    fn backend_name(&self) -> &'static str;
}

/// Check that `key` is usable by every backend: letters, digits, '-', '_'
/// and '.', not empty and not starting with '.'
pub fn validate_key(key: &str) -> TodoResult<()> {
    let valid = !key.is_empty()
        && !key.starts_with('.')
        && key
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || matches!(c, '-' | '_' | '.'));
    if !valid {
        return Err(TodoError::invalid(
            "cache key",
            format!("'{}' may only contain letters, digits, '-', '_' and '.'", key),
        ));
    }
    Ok(())
}

/// Open the cache backend selected by configuration
pub async fn open_backend(config: &CacheConfig) -> TodoResult<Arc<dyn CacheBackend>> {
    match config.backend {
        CacheBackendKind::Memory => Ok(Arc::new(MemoryCache::new())),
        CacheBackendKind::Dir => Ok(Arc::new(DirCache::open(config.dir.clone()).await?)),
    }
}
