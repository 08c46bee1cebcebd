//! Error types for todocache
//!
//! All modules use `TodoResult<T>` as their return type.

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for todocache operations
pub type TodoResult<T> = Result<T, TodoError>;

/// Caller-visible error categories.
///
/// Every `TodoError` collapses into exactly one kind. The request layer maps
/// kinds to a transport status through [`ErrorKind::status`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    NotFound,
    InvalidInput,
    OriginUnavailable,
    CacheUnavailable,
    Internal,
}

impl ErrorKind {
    /// Transport status for this kind (HTTP semantics)
    pub fn status(&self) -> u16 {
        match self {
            Self::NotFound => 404,
            Self::InvalidInput => 422,
            Self::OriginUnavailable => 502,
            Self::CacheUnavailable => 503,
            Self::Internal => 500,
        }
    }

    /// Stable lowercase name, used in logs and JSON output
    pub fn name(&self) -> &'static str {
        match self {
            Self::NotFound => "not_found",
            Self::InvalidInput => "invalid_input",
            Self::OriginUnavailable => "origin_unavailable",
            Self::CacheUnavailable => "cache_unavailable",
            Self::Internal => "internal",
        }
    }
}

/// All errors that can occur in todocache
#[derive(Error, Debug)]
pub enum TodoError {
    // Record errors
    #[error("Todo not found: {0}")]
    NotFound(u64),

    #[error("Invalid {field}: {reason}")]
    InvalidInput { field: &'static str, reason: String },

    // Dataset errors
    #[error("Origin unavailable: {0}")]
    OriginUnavailable(String),

    #[error("Cache unavailable: {0}")]
    CacheUnavailable(String),

    // Configuration errors
    #[error("Invalid configuration at {path}: {reason}")]
    ConfigInvalid { path: PathBuf, reason: String },

    #[error("Failed to create config directory {path}: {source}")]
    ConfigDirCreate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    // IO errors
    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerialize(#[from] toml::ser::Error),

    // General errors
    #[error("Internal error: {0}")]
    Internal(String),

    #[error("{0}")]
    User(String),
}

impl TodoError {
    /// Create an IO error with context
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create an invalid input error for a named field
    pub fn invalid(field: &'static str, reason: impl Into<String>) -> Self {
        Self::InvalidInput {
            field,
            reason: reason.into(),
        }
    }

    /// Create an origin unavailable error
    pub fn origin(reason: impl Into<String>) -> Self {
        Self::OriginUnavailable(reason.into())
    }

    /// Create a cache unavailable error
    pub fn cache(reason: impl Into<String>) -> Self {
        Self::CacheUnavailable(reason.into())
    }

    /// Classify the error into its caller-visible kind
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::InvalidInput { .. } | Self::User(_) => ErrorKind::InvalidInput,
            Self::OriginUnavailable(_) => ErrorKind::OriginUnavailable,
            Self::CacheUnavailable(_) => ErrorKind::CacheUnavailable,
            _ => ErrorKind::Internal,
        }
    }

    /// Check if the caller may reasonably retry the whole request.
    ///
    /// Nothing inside the crate retries on its own.
    pub fn is_retryable(&self) -> bool {
        matches!(
            self.kind(),
            ErrorKind::OriginUnavailable | ErrorKind::CacheUnavailable
        )
    }

    /// Get actionable hint for the error
    pub fn hint(&self) -> Option<&'static str> {
        match self {
            Self::NotFound(_) => Some("Run: todocache list"),
            Self::OriginUnavailable(_) => {
                Some("Check origin.url and network access, or raise origin.timeout_secs")
            }
            Self::CacheUnavailable(_) => Some("Check cache.backend and cache.dir settings"),
            Self::ConfigInvalid { .. } => Some("Run: todocache config init --force"),
            _ => None,
        }
    }
}
