//! Scoped acquisition and release of external handles
//!
//! The cache handle and the origin client are opened once at startup and
//! closed on every exit path: normal return, error, or a panicking body.

use crate::cache::{self, CacheBackend};
use crate::config::schema::OriginConfig;
use crate::config::Config;
use crate::error::{TodoError, TodoResult};
use crate::origin::{HttpOrigin, Origin};
use crate::service::ResourceService;
use std::future::Future;
use std::sync::Arc;
use tracing::{debug, warn};

/// External handles shared by the service
pub struct Resources {
    cache: Arc<dyn CacheBackend>,
    origin: Arc<dyn Origin>,
}

impl Resources {
    /// Wrap handles that were opened elsewhere
    pub fn new(cache: Arc<dyn CacheBackend>, origin: Arc<dyn Origin>) -> Self {
        Self { cache, origin }
    }

    /// Open the configured cache backend and origin client.
    ///
    /// If the origin cannot be set up, the already opened cache is closed
    /// before the error is returned.
    pub async fn acquire(config: &Config) -> TodoResult<Self> {
        let cache = cache::open_backend(&config.cache).await?;
        debug!(backend = cache.backend_name(), "Cache handle acquired");
        Self::acquire_with(cache, &config.origin).await
    }

    /// Set up the origin client around an already opened cache handle,
    /// closing that handle if the origin cannot be built
    pub async fn acquire_with(
        cache: Arc<dyn CacheBackend>,
        origin_config: &OriginConfig,
    ) -> TodoResult<Self> {
        let origin = match HttpOrigin::from_config(origin_config) {
            Ok(origin) => origin,
            Err(e) => {
                if let Err(close_err) = cache.close().await {
                    warn!(error = %close_err, "Failed to close cache after startup error");
                }
                return Err(e);
            }
        };
        debug!(origin = %origin.origin_name(), "Origin client ready");

        Ok(Self::new(cache, Arc::new(origin)))
    }

    /// Cache handle
    pub fn cache(&self) -> Arc<dyn CacheBackend> {
        Arc::clone(&self.cache)
    }

    /// Origin handle
    pub fn origin(&self) -> Arc<dyn Origin> {
        Arc::clone(&self.origin)
    }

    /// Close the handles
    pub async fn release(self) -> TodoResult<()> {
        self.cache.close().await?;
        debug!("Resources released");
        Ok(())
    }
}

impl ResourceService {
    /// Acquire resources, run `body` against a service built on them, and
    /// release the resources whether `body` succeeds, fails or panics.
    ///
    /// An error from `body` takes precedence over an error from release.
    pub async fn run_scoped<F, Fut, T>(config: &Config, body: F) -> TodoResult<T>
    where
        F: FnOnce(Arc<ResourceService>) -> Fut,
        Fut: Future<Output = TodoResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let resources = Resources::acquire(config).await?;
        Self::run_with(config, resources, body).await
    }

    /// Like [`ResourceService::run_scoped`], over resources acquired by the caller
    pub async fn run_with<F, Fut, T>(config: &Config, resources: Resources, body: F) -> TodoResult<T>
    where
        F: FnOnce(Arc<ResourceService>) -> Fut,
        Fut: Future<Output = TodoResult<T>> + Send + 'static,
        T: Send + 'static,
    {
        let service = Arc::new(ResourceService::from_resources(config, &resources));

        // Spawned so a panic in the body still reaches the release below
        let outcome = tokio::spawn(body(service)).await;
        let released = resources.release().await;

        let result = match outcome {
            Ok(result) => result,
            Err(join_err) => Err(TodoError::Internal(format!(
                "service task failed: {}",
                join_err
            ))),
        };

        match (result, released) {
            (Ok(value), Ok(())) => Ok(value),
            (Ok(_), Err(release_err)) => Err(release_err),
            (Err(e), Ok(())) => Err(e),
            (Err(e), Err(release_err)) => {
                warn!(error = %release_err, "Failed to release resources");
                Err(e)
            }
        }
    }
}
