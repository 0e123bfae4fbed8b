//! Configuration error types.

use std::path::PathBuf;
use thiserror::Error;

/// Configuration-related errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error when reading `{0}`")]
    Io(PathBuf, #[source] std::io::Error),

    #[error("Config file parsing error")]
    Toml(#[from] toml::de::Error),

    #[error("Config file `{0}` not found (searched upward from the current directory)")]
    NotFound(PathBuf),

    #[error("`{var}` is not a valid port: `{value}`")]
    InvalidPort { var: String, value: String },

    #[error("`{key}` is not an absolute URL: `{value}`")]
    InvalidUrl { key: String, value: String },

    #[error("Config validation error: {0}")]
    Validation(String),
}
