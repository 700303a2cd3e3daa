//! Transform error types
//!
//! Errors that can occur while preparing records for export.

use thiserror::Error;

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;

/// Result type for transform operations
pub type Result<T> = std::result::Result<T, TransformError>;

/// Errors that can occur during transformation
#[derive(Debug, Error)]
pub enum TransformError {
    /// Invalid configuration
    #[error("invalid configuration: {0}")]
    Config(String),

    /// I/O error (e.g., loading the field type file)
    #[error("failed to read '{path}': {source}")]
    Io {
        /// Path that could not be read
        path: String,
        /// Underlying IO error
        #[source]
        source: std::io::Error,
    },

    /// Field type file is not valid JSON or has an unexpected shape
    #[error("invalid field type map: {0}")]
    FieldTypes(#[from] serde_json::Error),
}

impl TransformError {
    /// Create a config error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an IO error for a path
    pub fn io(path: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
