//! Resource service: the operation surface handed to the request layer
//!
//! Owns no state of its own beyond handles to the record store and the
//! dataset fetcher. Errors pass through unchanged; [`Failure`] is the
//! transport-facing shape of one.

pub mod lifecycle;

pub use lifecycle::Resources;

use crate::audit::AuditLog;
use crate::config::Config;
use crate::error::{TodoError, TodoResult};
use crate::fetcher::{CacheAsideFetcher, FetchSource, FetchStats, Fetched};
use crate::origin::Dataset;
use crate::store::{NewRecord, Record, RecordPatch, RecordStore};
use serde::Serialize;
use serde_json::json;
use std::sync::Arc;
use tracing::{debug, warn};

/// Caller-visible failure: transport status, kind name and message
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    pub status: u16,
    pub kind: &'static str,
    pub message: String,
}

impl From<&TodoError> for Failure {
    fn from(err: &TodoError) -> Self {
        let kind = err.kind();
        Self {
            status: kind.status(),
            kind: kind.name(),
            message: err.to_string(),
        }
    }
}

impl From<TodoError> for Failure {
    fn from(err: TodoError) -> Self {
        Self::from(&err)
    }
}

impl std::fmt::Display for Failure {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} {}", self.status, self.message)
    }
}

/// Map an operation result into the shape the request layer returns
pub fn respond<T>(result: TodoResult<T>) -> Result<T, Failure> {
    result.map_err(Failure::from)
}

/// CRUD over task records plus the cached dataset read path
#[derive(Debug)]
pub struct ResourceService {
    store: Arc<RecordStore>,
    fetcher: CacheAsideFetcher,
    dataset_key: String,
    audit: AuditLog,
}

impl ResourceService {
    /// Create a service over a store and a fetcher, with auditing off
    pub fn new(store: Arc<RecordStore>, fetcher: CacheAsideFetcher) -> Self {
        Self {
            store,
            fetcher,
            dataset_key: "entries".to_string(),
            audit: AuditLog::disabled(),
        }
    }

    /// Build a service from configuration and acquired resources
    pub fn from_resources(config: &Config, resources: &Resources) -> Self {
        let store = if config.store.seed {
            RecordStore::seeded()
        } else {
            RecordStore::new()
        };

        let fetcher = CacheAsideFetcher::new(resources.cache(), resources.origin())
            .with_timeout(config.origin.timeout())
            .with_single_flight(config.cache.single_flight);

        Self::new(Arc::new(store), fetcher)
            .with_dataset_key(config.cache.key.clone())
            .with_audit(AuditLog::new(config))
    }

    /// Set the cache key the dataset lives under
    pub fn with_dataset_key(mut self, key: impl Into<String>) -> Self {
        self.dataset_key = key.into();
        self
    }

    /// Set the audit logger
    pub fn with_audit(mut self, audit: AuditLog) -> Self {
        self.audit = audit;
        self
    }

    /// The underlying store
    pub fn store(&self) -> &Arc<RecordStore> {
        &self.store
    }

    /// The dataset cache key
    pub fn dataset_key(&self) -> &str {
        &self.dataset_key
    }

    /// List records in insertion order, optionally only the first `limit`
    pub fn list_todos(&self, limit: Option<i64>) -> Vec<Record> {
        self.store.list(limit)
    }

    /// Get one record
    pub fn get_todo(&self, id: u64) -> TodoResult<Record> {
        self.store.get(id)
    }

    /// Create a record, returning the new id
    pub async fn create_todo(&self, new: NewRecord) -> TodoResult<u64> {
        let id = self.store.create(new)?;
        self.audit.log("record.created", &json!({ "id": id })).await;
        Ok(id)
    }

    /// Apply a partial update, returning the updated record
    pub async fn update_todo(&self, id: u64, patch: RecordPatch) -> TodoResult<Record> {
        let fields: Vec<&str> = [
            patch.name.as_ref().map(|_| "name"),
            patch.description.as_ref().map(|_| "description"),
            patch.priority.map(|_| "priority"),
        ]
        .into_iter()
        .flatten()
        .collect();

        let record = self.store.update(id, patch)?;
        self.audit
            .log("record.updated", &json!({ "id": id, "fields": fields }))
            .await;
        Ok(record)
    }

    /// Delete a record, returning it
    pub async fn delete_todo(&self, id: u64) -> TodoResult<Record> {
        let record = self.store.delete(id)?;
        self.audit.log("record.deleted", &json!({ "id": id })).await;
        Ok(record)
    }

    /// Fetch the dataset through the cache
    pub async fn fetch_dataset(&self) -> TodoResult<Dataset> {
        self.fetch_dataset_detailed().await.map(|f| f.dataset)
    }

    /// Fetch the dataset through the cache, reporting where it came from
    pub async fn fetch_dataset_detailed(&self) -> TodoResult<Fetched> {
        let fetched = self.fetcher.fetch(&self.dataset_key).await?;
        debug!(key = %self.dataset_key, source = fetched.source.name(), "Dataset served");

        if fetched.source == FetchSource::Origin {
            self.audit
                .log(
                    "dataset.populated",
                    &json!({
                        "key": self.dataset_key,
                        "origin": self.fetcher.origin().origin_name(),
                    }),
                )
                .await;
        }
        Ok(fetched)
    }

    /// Drop the cached dataset, then fetch it again from the origin.
    ///
    /// An unreachable cache does not stop the refresh; the fetch falls back
    /// to the origin the same way a plain fetch does.
    pub async fn refresh_dataset(&self) -> TodoResult<Fetched> {
        if let Err(e) = self.fetcher.invalidate(&self.dataset_key).await {
            warn!(key = %self.dataset_key, error = %e, "Could not drop cached dataset");
        }
        self.fetch_dataset_detailed().await
    }

    /// Dataset cache counters
    pub fn dataset_stats(&self) -> FetchStats {
        self.fetcher.stats()
    }

    /// Name of the cache backend in use
    pub fn cache_backend(&self) -> &'static str {
        self.fetcher.cache().backend_name()
    }
}
