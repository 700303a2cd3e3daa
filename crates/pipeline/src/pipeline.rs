//! Run orchestration

use std::path::PathBuf;

use tally_connectors::{Connector, Event};
use tally_sinks::load::{DEFAULT_BUCKET, DEFAULT_DATASET, DEFAULT_TABLE};
use tally_sinks::{Exporter, LoadJob, Loader};
use tally_transform::{
    CoercionWarning, FieldTypeMap, FlattenOptions, Record, coerce, extract_payload, flatten,
};
use tracing::{error, info, warn};

use crate::error::Result;

#[cfg(test)]
#[path = "pipeline_test.rs"]
mod pipeline_test;

/// Record shaping settings
#[derive(Debug, Clone, Default)]
pub struct TransformOptions {
    pub flatten: FlattenOptions,
    /// Coerce flattened records to these types (None = export as flattened)
    pub field_types: Option<FieldTypeMap>,
}

/// Where loaded data goes
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadTarget {
    pub dataset: String,
    pub table: String,
    pub bucket: String,
}

impl Default for LoadTarget {
    fn default() -> Self {
        Self {
            dataset: DEFAULT_DATASET.to_string(),
            table: DEFAULT_TABLE.to_string(),
            bucket: DEFAULT_BUCKET.to_string(),
        }
    }
}

impl LoadTarget {
    /// Load job for one exported file
    pub fn job(&self, file: impl Into<PathBuf>) -> LoadJob {
        LoadJob::new(&self.dataset, &self.table, &self.bucket, file)
    }
}

/// Result of the load step
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadOutcome {
    Loaded { loader: &'static str },
    Failed { loader: &'static str, error: String },
}

impl LoadOutcome {
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed { .. })
    }
}

/// What one run did
#[derive(Debug, Clone)]
pub struct RunSummary {
    /// Events returned by the connector
    pub events: usize,
    /// Records written to each export file
    pub records: usize,
    /// Fields dropped during coercion
    pub coercion_warnings: usize,
    pub tsv: PathBuf,
    pub json: PathBuf,
    pub load: LoadOutcome,
}

/// Flattened (and possibly coerced) records with their coercion warnings
#[derive(Debug, Clone, Default)]
pub struct Shaped {
    pub records: Vec<Record>,
    pub warnings: Vec<CoercionWarning>,
}

/// A fully wired run
pub struct Pipeline<C> {
    connector: C,
    transform: TransformOptions,
    exporter: Exporter,
    loader: Box<dyn Loader>,
    target: LoadTarget,
}

impl<C: Connector> Pipeline<C> {
    pub fn new(
        connector: C,
        transform: TransformOptions,
        exporter: Exporter,
        loader: Box<dyn Loader>,
        target: LoadTarget,
    ) -> Self {
        Self {
            connector,
            transform,
            exporter,
            loader,
            target,
        }
    }

    pub fn exporter(&self) -> &Exporter {
        &self.exporter
    }

    /// Turn fetched events into export records
    pub fn shape(&self, events: Vec<Event>) -> Shaped {
        let mut shaped = Shaped::default();

        for event in events {
            let record = flatten(&extract_payload(event.into_payload()), &self.transform.flatten);

            match &self.transform.field_types {
                Some(types) => {
                    let coerced = coerce(&record, types);
                    shaped.warnings.extend(coerced.warnings);
                    shaped.records.push(coerced.record);
                }
                None => shaped.records.push(record),
            }
        }

        shaped
    }

    /// Fetch, shape, export and load
    ///
    /// # Errors
    ///
    /// - `PipelineError::Fetch` - the connector failed, nothing was written
    /// - `PipelineError::Export` - either export file failed (both were attempted)
    pub async fn run(&self) -> Result<RunSummary> {
        let source = self.connector.name();

        let events = self.connector.pull().await?;
        let event_count = events.len();
        info!(connector = source, events = event_count, "fetch complete");

        let shaped = self.shape(events);
        if !shaped.warnings.is_empty() {
            warn!(
                connector = source,
                warnings = shaped.warnings.len(),
                "some fields could not be coerced and were omitted"
            );
        }

        let files = self.exporter.export(&shaped.records).into_result()?;

        let job = self.target.job(&files.tsv);
        let loader = self.loader.name();
        let load = match self.loader.load(&job).await {
            Ok(()) => LoadOutcome::Loaded { loader },
            Err(e) => {
                error!(
                    loader,
                    dataset = %job.dataset,
                    table = %job.table,
                    error = %e,
                    "load failed, exported files are kept"
                );
                LoadOutcome::Failed {
                    loader,
                    error: e.to_string(),
                }
            }
        };

        let summary = RunSummary {
            events: event_count,
            records: shaped.records.len(),
            coercion_warnings: shaped.warnings.len(),
            tsv: files.tsv,
            json: files.json,
            load,
        };

        info!(
            connector = source,
            events = summary.events,
            records = summary.records,
            coercion_warnings = summary.coercion_warnings,
            load_failed = summary.load.is_failed(),
            "run complete"
        );

        Ok(summary)
    }
}
