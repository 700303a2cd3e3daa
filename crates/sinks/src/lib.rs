//! Tally - Sinks
//!
//! Where flattened records go once a run has produced them.
//!
//! ```text
//! [records] → Exporter → <stem>.tsv + <stem>.json → Loader → [warehouse]
//! ```
//!
//! | Sink | Purpose |
//! |------|---------|
//! | `export` | Atomic TSV and JSON files |
//! | `load` | Hand the TSV to a warehouse loader (external command or no-op) |

/// File export (TSV + JSON)
pub mod export;

/// Warehouse load hand-off
pub mod load;

pub mod error;

pub use error::{Result, SinkError};
pub use export::{ExportReport, ExportedFiles, Exporter};
pub use load::{CommandLoader, LoadJob, Loader, NullLoader};
