//! Error types for connectors

use thiserror::Error;

/// Result type for connector operations
pub type Result<T> = std::result::Result<T, ConnectorError>;

/// Errors that can occur during connector operations
#[derive(Error, Debug)]
pub enum ConnectorError {
    /// Failed to initialize connector (e.g., HTTP client creation failed)
    #[error("failed to initialize connector: {0}")]
    Init(String),

    /// Connector used before it was fully configured
    #[error("Configuration error: {0}")]
    Config(String),

    /// Start date did not match `YYYY-MM-DD` or does not exist
    #[error("Invalid date '{input}': expected format YYYY-MM-DD")]
    InvalidDate { input: String },

    /// Any failure while issuing a single page request
    #[error("request failed: {0}")]
    Request(#[from] RequestFailure),

    /// The API promised another page but no cursor could be derived
    #[error("failed to fetch next page data: page {page} reported has_more without records")]
    MissingContinuation { page: u32 },
}

impl ConnectorError {
    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid date error
    pub fn invalid_date(input: impl Into<String>) -> Self {
        Self::InvalidDate {
            input: input.into(),
        }
    }
}

/// Underlying cause of a failed page request
#[derive(Error, Debug)]
pub enum RequestFailure {
    /// Network or TLS failure
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    /// Request exceeded the configured timeout
    #[error("timed out after {secs}s")]
    Timeout { secs: u64 },

    /// Server answered with a non-success status
    #[error("HTTP {status}: {body}")]
    Status { status: u16, body: String },

    /// Body did not match `{ data: [...], has_more }`
    #[error("malformed response: {0}")]
    Malformed(#[from] serde_json::Error),

    /// Retry budget for transient failures exhausted
    #[error("failed after {attempts} attempts: {last_error}")]
    Exhausted { attempts: u32, last_error: String },
}

impl RequestFailure {
    /// Whether a retry could plausibly succeed
    pub fn is_transient(&self) -> bool {
        match self {
            Self::Transport(e) => e.is_timeout() || e.is_connect(),
            Self::Timeout { .. } => true,
            // Retry on server errors (5xx) and rate limits (429)
            Self::Status { status, .. } => *status >= 500 || *status == 429,
            Self::Malformed(_) | Self::Exhausted { .. } => false,
        }
    }
}
