//! todocache - task records with a cache-aside dataset read path
//!
//! An in-memory store of todo records with validated CRUD, plus a large
//! external dataset served lazily through a cache that is populated from
//! the origin on a miss and never expires.

pub mod audit;
pub mod cache;
pub mod cli;
pub mod config;
pub mod error;
pub mod fetcher;
pub mod origin;
pub mod service;
pub mod store;
pub mod ui;

pub use error::{TodoError, TodoResult};
