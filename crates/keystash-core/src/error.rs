//! Error types for Keystash core.

use thiserror::Error;

/// Core result type alias.
pub type Result<T> = std::result::Result<T, Error>;

/// Top-level error type for Keystash core operations.
#[derive(Debug, Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-related errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing configuration: {0}")]
    Missing(String),

    #[error("Invalid configuration value for {key}: {reason}")]
    Invalid { key: String, reason: String },
}
