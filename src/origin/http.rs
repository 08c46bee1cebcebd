//! HTTP origin using a blocking `ureq` agent on the blocking pool

use crate::config::schema::OriginConfig;
use crate::error::{TodoError, TodoResult};
use crate::origin::{parse_body, Dataset, Origin};
use async_trait::async_trait;
use std::time::Duration;
use tracing::{debug, info};

/// Largest response body accepted from the origin
const MAX_BODY_BYTES: u64 = 64 * 1024 * 1024;

/// Origin reached over HTTP(S) GET
#[derive(Clone)]
pub struct HttpOrigin {
    agent: ureq::Agent,
    url: String,
    timeout: Duration,
}

impl std::fmt::Debug for HttpOrigin {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpOrigin")
            .field("url", &self.url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl HttpOrigin {
    /// Create an origin client for `url` with a whole-request timeout
    pub fn new(url: impl Into<String>, timeout: Duration) -> TodoResult<Self> {
        let url = url.into();
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return Err(TodoError::invalid(
                "origin url",
                format!("'{}' must start with http:// or https://", url),
            ));
        }

        let agent: ureq::Agent = ureq::Agent::config_builder()
            .timeout_global(Some(timeout))
            .build()
            .into();

        Ok(Self {
            agent,
            url,
            timeout,
        })
    }

    /// Create an origin client from configuration
    pub fn from_config(config: &OriginConfig) -> TodoResult<Self> {
        Self::new(config.url.clone(), config.timeout())
    }

    fn fetch_blocking(agent: &ureq::Agent, url: &str) -> TodoResult<String> {
        let mut response = agent
            .get(url)
            .header("Accept", "application/json")
            .call()
            .map_err(|e| TodoError::origin(format!("GET {} failed: {}", url, e)))?;

        response
            .body_mut()
            .with_config()
            .limit(MAX_BODY_BYTES)
            .read_to_string()
            .map_err(|e| TodoError::origin(format!("reading body from {}: {}", url, e)))
    }
}

#[async_trait]
impl Origin for HttpOrigin {
    async fn fetch_remote(&self) -> TodoResult<Dataset> {
        debug!(url = %self.url, "Fetching dataset from origin");

        let agent = self.agent.clone();
        let url = self.url.clone();
        let body = tokio::task::spawn_blocking(move || Self::fetch_blocking(&agent, &url))
            .await
            .map_err(|e| TodoError::origin(format!("origin task failed: {}", e)))??;

        info!(url = %self.url, bytes = body.len(), "Fetched dataset from origin");
        parse_body(&self.url, &body)
    }

    fn origin_name(&self) -> String {
        self.url.clone()
    }
}
