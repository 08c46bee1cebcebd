//! Configuration schema for todocache
//!
//! Configuration is stored at `~/.config/todocache/config.toml`

use crate::config::ConfigManager;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;
use std::time::Duration;

/// Root configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// General settings
    pub general: GeneralConfig,

    /// Record store settings
    pub store: StoreConfig,

    /// Origin dataset settings
    pub origin: OriginConfig,

    /// Dataset cache settings
    pub cache: CacheConfig,
}

/// General application settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GeneralConfig {
    /// Log format: "text" or "json"
    pub log_format: String,

    /// Enable audit logging of mutations and cache population
    pub audit_log: bool,
}

impl Default for GeneralConfig {
    fn default() -> Self {
        Self {
            log_format: "text".to_string(),
            audit_log: true,
        }
    }
}

/// Record store settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Start with the two sample records
    pub seed: bool,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self { seed: true }
    }
}

/// Origin dataset settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OriginConfig {
    /// Dataset endpoint
    pub url: String,

    /// Whole-request timeout in seconds
    pub timeout_secs: u64,
}

impl OriginConfig {
    /// Timeout as a duration, at least one second
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs.max(1))
    }
}

impl Default for OriginConfig {
    fn default() -> Self {
        Self {
            url: "https://api.publicapis.org/entries".to_string(),
            timeout_secs: 10,
        }
    }
}

/// Cache backend selector
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum CacheBackendKind {
    /// In-process map, gone when the process exits
    #[default]
    Memory,
    /// One file per key under `cache.dir`
    Dir,
}

impl fmt::Display for CacheBackendKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheBackendKind::Memory => f.write_str("memory"),
            CacheBackendKind::Dir => f.write_str("dir"),
        }
    }
}

/// Dataset cache settings
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CacheConfig {
    /// Backend to use
    pub backend: CacheBackendKind,

    /// Directory for the "dir" backend
    pub dir: PathBuf,

    /// Key the dataset is cached under
    pub key: String,

    /// Collapse concurrent cache misses onto one origin call
    pub single_flight: bool,
}

impl Default for CacheConfig {
    fn default() -> Self {
        Self {
            backend: CacheBackendKind::Memory,
            dir: ConfigManager::cache_dir(),
            key: "entries".to_string(),
            single_flight: false,
        }
    }
}
