//! In-process cache backend

use crate::cache::CacheBackend;
use crate::error::{TodoError, TodoResult};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use tokio::sync::RwLock;
use tracing::debug;

/// Map-backed cache living as long as the process
#[derive(Debug, Default)]
pub struct MemoryCache {
    entries: RwLock<HashMap<String, String>>,
    closed: AtomicBool,
}

impl MemoryCache {
    /// Create an empty cache
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of entries held
    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Whether the cache holds no entries
    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    fn ensure_open(&self) -> TodoResult<()> {
        if self.closed.load(Ordering::Acquire) {
            return Err(TodoError::cache("memory cache is closed"));
        }
        Ok(())
    }
}

#[async_trait]
impl CacheBackend for MemoryCache {
    async fn get(&self, key: &str) -> TodoResult<Option<String>> {
        self.ensure_open()?;
        let result = self.entries.read().await.get(key).cloned();

        if result.is_some() {
            debug!(key = key, "Cache HIT (memory)");
        } else {
            debug!(key = key, "Cache MISS (memory)");
        }

        Ok(result)
    }

    async fn set(&self, key: &str, payload: &str) -> TodoResult<()> {
        self.ensure_open()?;
        self.entries
            .write()
            .await
            .insert(key.to_string(), payload.to_string());

        debug!(key = key, bytes = payload.len(), "Cache SET (memory)");
        Ok(())
    }

    async fn remove(&self, key: &str) -> TodoResult<()> {
        self.ensure_open()?;
        self.entries.write().await.remove(key);
        debug!(key = key, "Cache DEL (memory)");
        Ok(())
    }

    async fn clear(&self) -> TodoResult<u64> {
        self.ensure_open()?;
        let mut entries = self.entries.write().await;
        let removed = entries.len() as u64;
        entries.clear();
        Ok(removed)
    }

    async fn close(&self) -> TodoResult<()> {
        self.closed.store(true, Ordering::Release);
        self.entries.write().await.clear();
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
