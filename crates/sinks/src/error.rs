//! Sink error types

use std::path::Path;

use thiserror::Error;

/// Result type for sink operations
pub type Result<T> = std::result::Result<T, SinkError>;

/// Errors that can occur while exporting or loading records
#[derive(Debug, Error)]
pub enum SinkError {
    /// Filesystem failure on a specific path
    #[error("I/O error on '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// TSV encoding failure
    #[error("TSV write failed: {0}")]
    Csv(#[from] csv::Error),

    /// JSON encoding failure
    #[error("JSON write failed: {0}")]
    Json(#[from] serde_json::Error),

    /// Downstream load failed
    #[error("load failed: {0}")]
    Load(String),

    /// Invalid sink configuration
    #[error("invalid configuration: {0}")]
    Config(String),
}

impl SinkError {
    /// Create an IO error for a path
    pub fn io(path: impl AsRef<Path>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.as_ref().display().to_string(),
            source,
        }
    }

    /// Create a load error
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }
}
