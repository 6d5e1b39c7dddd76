//! Configuration error types

use std::path::PathBuf;

/// Error raised while loading configuration or the camera list
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// A required environment variable is not set
    #[error("{0} is not set")]
    MissingVar(&'static str),

    /// An environment variable could not be parsed
    #[error("invalid value for {name}: {value:?}")]
    InvalidVar { name: &'static str, value: String },

    /// Camera list file does not exist
    #[error("camera list not found at {}", .0.display())]
    NotFound(PathBuf),

    /// Camera list file could not be read
    #[error("failed to read camera list {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// Camera list is not valid JSON or does not match the expected shape
    #[error("invalid JSON in camera list: {0}")]
    Parse(#[from] serde_json::Error),

    /// A camera entry violates the descriptor schema
    #[error("invalid camera #{index} ({address}): {reason}")]
    InvalidCamera {
        index: usize,
        address: String,
        reason: String,
    },

    /// Two cameras share an address
    #[error("duplicate camera address: {0}")]
    DuplicateAddress(String),
}
