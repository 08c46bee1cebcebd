//! Origin data sources behind the dataset cache
//!
//! The origin is the authoritative, external source of the dataset. It is
//! slow and may fail; the fetcher in front of it shields it from repeat calls.

pub mod http;

pub use http::HttpOrigin;

use crate::error::{TodoError, TodoResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Deserialized dataset as returned by the origin
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Dataset(Value);

impl Dataset {
    /// Wrap an already parsed JSON document
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// Parse a serialized payload (origin body or cache entry)
    pub fn from_payload(payload: &str) -> TodoResult<Self> {
        Ok(Self(serde_json::from_str(payload)?))
    }

    /// Serialize for storage in the cache
    pub fn to_payload(&self) -> TodoResult<String> {
        Ok(serde_json::to_string(&self.0)?)
    }

    /// Borrow the JSON document
    pub fn value(&self) -> &Value {
        &self.0
    }

    /// Consume into the JSON document
    pub fn into_value(self) -> Value {
        self.0
    }

    /// Number of entries, if the dataset reports or contains a list of them.
    ///
    /// Prefers a top-level `count`, then the length of a top-level `entries`
    /// array, then the length of the document itself when it is an array.
    pub fn entry_count(&self) -> Option<u64> {
        if let Some(count) = self.0.get("count").and_then(Value::as_u64) {
            return Some(count);
        }
        if let Some(entries) = self.0.get("entries").and_then(Value::as_array) {
            return Some(entries.len() as u64);
        }
        self.0.as_array().map(|a| a.len() as u64)
    }
}

/// External source of the dataset
#[async_trait]
pub trait Origin: Send + Sync {
    /// Fetch the full dataset. Any failure is `OriginUnavailable`.
    async fn fetch_remote(&self) -> TodoResult<Dataset>;

    /// Origin name for display and logs
    fn origin_name(&self) -> String;
}

/// Parse an origin response body, mapping malformed bodies to `OriginUnavailable`
pub(crate) fn parse_body(source: &str, body: &str) -> TodoResult<Dataset> {
    Dataset::from_payload(body)
        .map_err(|e| TodoError::origin(format!("{} returned a malformed body: {}", source, e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn entry_count_prefers_count_field() {
        let ds = Dataset::new(json!({"count": 1427, "entries": [{}, {}]}));
        assert_eq!(ds.entry_count(), Some(1427));
    }

    #[test]
    fn entry_count_from_entries_or_array() {
        assert_eq!(
            Dataset::new(json!({"entries": [{}, {}, {}]})).entry_count(),
            Some(3)
        );
        assert_eq!(Dataset::new(json!([1, 2])).entry_count(), Some(2));
        assert_eq!(Dataset::new(json!("text")).entry_count(), None);
    }

    #[test]
    fn payload_roundtrip_preserves_document() {
        let ds = Dataset::new(json!({"count": 1, "entries": [{"API": "Cats"}]}));
        let parsed = Dataset::from_payload(&ds.to_payload().unwrap()).unwrap();
        assert_eq!(parsed, ds);
    }

    #[test]
    fn malformed_body_is_origin_unavailable() {
        let err = parse_body("https://example.test", "<html>").unwrap_err();
        assert!(matches!(err, TodoError::OriginUnavailable(_)));
    }
}
