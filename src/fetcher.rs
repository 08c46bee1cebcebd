//! Cache-aside (lazy loading) fetcher for the external dataset
//!
//! On a hit the cached payload is returned with no origin call and no
//! freshness check. On a miss the origin is called, the response is written to
//! the cache with a single unconditional `set`, and returned.
//!
//! Failure rules:
//! - origin failure or timeout: `OriginUnavailable`, nothing is written
//! - cache unreachable on read: serve from the origin uncached; if the origin
//!   fails too, the whole fetch is `CacheUnavailable`
//! - cache unreachable on write: the origin response is still returned
//!
//! Without single-flight, two callers that miss at the same time both call
//! the origin and both write the cache. The writes are idempotent overwrites,
//! so this only costs an extra origin call.

use crate::cache::CacheBackend;
use crate::error::{TodoError, TodoResult};
use crate::origin::{Dataset, Origin};
use serde::Serialize;
use std::collections::HashMap;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, info, warn};

/// Default bound on a single origin fetch
pub const DEFAULT_ORIGIN_TIMEOUT: Duration = Duration::from_secs(10);

/// Where a fetched dataset came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchSource {
    /// Served from the cache
    Cache,
    /// Fetched from the origin and written to the cache
    Origin,
    /// Fetched from the origin, but the cache could not be read or written
    Degraded,
}

impl FetchSource {
    pub fn name(&self) -> &'static str {
        match self {
            FetchSource::Cache => "cache",
            FetchSource::Origin => "origin",
            FetchSource::Degraded => "origin (cache unavailable)",
        }
    }
}

/// A dataset plus where it came from
#[derive(Debug, Clone)]
pub struct Fetched {
    pub dataset: Dataset,
    pub source: FetchSource,
}

/// Counters since the fetcher was created
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct FetchStats {
    pub hits: u64,
    pub misses: u64,
    pub origin_calls: u64,
    pub degraded: u64,
}

#[derive(Debug, Default)]
struct Counters {
    hits: AtomicU64,
    misses: AtomicU64,
    origin_calls: AtomicU64,
    degraded: AtomicU64,
}

enum CacheRead {
    Hit(Dataset),
    Miss,
    Unavailable(TodoError),
}

/// Per-key locks collapsing concurrent misses onto one origin call
#[derive(Debug, Default)]
struct InFlight {
    locks: Mutex<HashMap<String, Arc<Mutex<()>>>>,
}

impl InFlight {
    async fn lock_for(&self, key: &str) -> Arc<Mutex<()>> {
        let mut map = self.locks.lock().await;
        Arc::clone(
            map.entry(key.to_string())
                .or_insert_with(|| Arc::new(Mutex::new(()))),
        )
    }

    /// Drop the map entry for `key` once no other caller holds its lock
    async fn release(&self, key: &str, lock: Arc<Mutex<()>>) {
        let mut map = self.locks.lock().await;
        // One reference in the map, one here
        if Arc::strong_count(&lock) == 2 {
            map.remove(key);
        }
    }

    #[cfg(test)]
    async fn len(&self) -> usize {
        self.locks.lock().await.len()
    }
}

/// Get-or-populate over a cache handle and an origin handle
pub struct CacheAsideFetcher {
    cache: Arc<dyn CacheBackend>,
    origin: Arc<dyn Origin>,
    timeout: Duration,
    in_flight: Option<InFlight>,
    counters: Counters,
}

impl CacheAsideFetcher {
    /// Create a fetcher with the default origin timeout and no single-flight
    pub fn new(cache: Arc<dyn CacheBackend>, origin: Arc<dyn Origin>) -> Self {
        Self {
            cache,
            origin,
            timeout: DEFAULT_ORIGIN_TIMEOUT,
            in_flight: None,
            counters: Counters::default(),
        }
    }

    /// Bound each origin fetch by `timeout`
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Enable or disable single-flight population
    pub fn with_single_flight(mut self, enabled: bool) -> Self {
        self.in_flight = enabled.then(InFlight::default);
        self
    }

    /// The cache handle
    pub fn cache(&self) -> &Arc<dyn CacheBackend> {
        &self.cache
    }

    /// The origin handle
    pub fn origin(&self) -> &Arc<dyn Origin> {
        &self.origin
    }

    /// Fetch the dataset stored under `key`
    pub async fn fetch_dataset(&self, key: &str) -> TodoResult<Dataset> {
        self.fetch(key).await.map(|f| f.dataset)
    }

    /// Fetch the dataset stored under `key`, reporting where it came from
    pub async fn fetch(&self, key: &str) -> TodoResult<Fetched> {
        match self.read_cache(key).await {
            CacheRead::Hit(dataset) => return Ok(self.hit(dataset)),
            CacheRead::Miss => {}
            CacheRead::Unavailable(err) => return self.fetch_degraded(key, err).await,
        }

        let Some(in_flight) = &self.in_flight else {
            return self.populate(key).await;
        };

        let lock = in_flight.lock_for(key).await;
        let guard = lock.lock().await;

        // Another caller may have populated the key while we waited
        let result = match self.read_cache(key).await {
            CacheRead::Hit(dataset) => Ok(self.hit(dataset)),
            CacheRead::Miss => self.populate(key).await,
            CacheRead::Unavailable(err) => self.fetch_degraded(key, err).await,
        };

        drop(guard);
        in_flight.release(key, lock).await;
        result
    }

    /// Drop the cached entry so the next fetch goes to the origin
    pub async fn invalidate(&self, key: &str) -> TodoResult<()> {
        self.cache.remove(key).await?;
        info!(key = key, "Invalidated cached dataset");
        Ok(())
    }

    /// Snapshot of the hit/miss counters
    pub fn stats(&self) -> FetchStats {
        FetchStats {
            hits: self.counters.hits.load(Ordering::Relaxed),
            misses: self.counters.misses.load(Ordering::Relaxed),
            origin_calls: self.counters.origin_calls.load(Ordering::Relaxed),
            degraded: self.counters.degraded.load(Ordering::Relaxed),
        }
    }

    fn hit(&self, dataset: Dataset) -> Fetched {
        self.counters.hits.fetch_add(1, Ordering::Relaxed);
        Fetched {
            dataset,
            source: FetchSource::Cache,
        }
    }

    async fn read_cache(&self, key: &str) -> CacheRead {
        match self.cache.get(key).await {
            Ok(Some(payload)) => match Dataset::from_payload(&payload) {
                Ok(dataset) => {
                    debug!(key = key, "Serving dataset from cache");
                    CacheRead::Hit(dataset)
                }
                Err(e) => {
                    // Treated as a miss; the next populate overwrites it
                    warn!(key = key, error = %e, "Discarding unreadable cache entry");
                    CacheRead::Miss
                }
            },
            Ok(None) => CacheRead::Miss,
            Err(e) => CacheRead::Unavailable(e),
        }
    }

    async fn call_origin(&self) -> TodoResult<Dataset> {
        self.counters.origin_calls.fetch_add(1, Ordering::Relaxed);
        match tokio::time::timeout(self.timeout, self.origin.fetch_remote()).await {
            Ok(Ok(dataset)) => Ok(dataset),
            Ok(Err(TodoError::OriginUnavailable(reason))) => Err(TodoError::origin(reason)),
            Ok(Err(e)) => Err(TodoError::origin(e.to_string())),
            Err(_) => Err(TodoError::origin(format!(
                "{} did not respond within {}s",
                self.origin.origin_name(),
                self.timeout.as_secs_f64()
            ))),
        }
    }

    async fn populate(&self, key: &str) -> TodoResult<Fetched> {
        self.counters.misses.fetch_add(1, Ordering::Relaxed);
        let dataset = self.call_origin().await?;

        let payload = dataset.to_payload()?;
        if let Err(e) = self.cache.set(key, &payload).await {
            warn!(key = key, error = %e, "Could not populate cache, serving uncached");
            self.counters.degraded.fetch_add(1, Ordering::Relaxed);
            return Ok(Fetched {
                dataset,
                source: FetchSource::Degraded,
            });
        }

        info!(key = key, bytes = payload.len(), "Populated dataset cache");
        Ok(Fetched {
            dataset,
            source: FetchSource::Origin,
        })
    }

    async fn fetch_degraded(&self, key: &str, cache_err: TodoError) -> TodoResult<Fetched> {
        warn!(key = key, error = %cache_err, "Cache unreachable, falling back to origin");
        self.counters.degraded.fetch_add(1, Ordering::Relaxed);

        match self.call_origin().await {
            Ok(dataset) => Ok(Fetched {
                dataset,
                source: FetchSource::Degraded,
            }),
            Err(origin_err) => Err(TodoError::cache(format!(
                "{}; origin fallback also failed: {}",
                cache_err, origin_err
            ))),
        }
    }
}

impl std::fmt::Debug for CacheAsideFetcher {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CacheAsideFetcher")
            .field("cache", &self.cache.backend_name())
            .field("origin", &self.origin.origin_name())
            .field("timeout", &self.timeout)
            .field("single_flight", &self.in_flight.is_some())
            .finish()
    }
}
