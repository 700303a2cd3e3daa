//! Tally - Pipeline
//!
//! One run, start to finish:
//!
//! ```text
//! Connector::pull ──→ data.object ──→ flatten ──→ coerce? ──→ Exporter ──→ Loader
//!   (all pages)        per event       per record   per record   TSV + JSON    TSV
//! ```
//!
//! Every collaborator is built by the caller and handed to [`Pipeline::new`];
//! the pipeline holds no global state. A fetch or export failure aborts the
//! run. A load failure does not: the exported files are still good, so it is
//! logged and reported in the [`RunSummary`].
//!
//! # Example
//!
//! ```ignore
//! use tally_pipeline::{LoadTarget, Pipeline, TransformOptions};
//! use tally_sinks::{Exporter, NullLoader};
//!
//! let pipeline = Pipeline::new(
//!     stripe,
//!     TransformOptions::default(),
//!     Exporter::new("exports/output"),
//!     Box::new(NullLoader),
//!     LoadTarget::default(),
//! );
//! let summary = pipeline.run().await?;
//! ```

mod error;
mod pipeline;

pub use error::{PipelineError, Result};
pub use pipeline::{LoadOutcome, LoadTarget, Pipeline, RunSummary, Shaped, TransformOptions};
