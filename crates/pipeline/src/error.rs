//! Pipeline error types

use thiserror::Error;

use tally_connectors::ConnectorError;
use tally_sinks::SinkError;

/// Pipeline errors
///
/// Load failures are not errors at this level; they are reported in the
/// run summary.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Fetching events failed, nothing was exported
    #[error("fetch failed: {0}")]
    Fetch(#[from] ConnectorError),

    /// Writing an export file failed
    #[error("export failed: {0}")]
    Export(#[from] SinkError),
}

/// Result type for pipeline operations
pub type Result<T> = std::result::Result<T, PipelineError>;
