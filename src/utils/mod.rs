//! Configuration utilities.

/// TOML configuration (`knowbase.toml`).
pub mod toml_config;

pub use toml_config::{ConfigError, KnowbaseConfig, LogFormat};
