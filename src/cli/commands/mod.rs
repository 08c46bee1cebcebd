//! CLI command implementations

pub mod config;
pub mod request;
pub mod shell;

pub use config::execute as config;
pub use request::execute as request;
pub use shell::execute as shell;
