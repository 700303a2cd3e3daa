//! Warehouse load hand-off
//!
//! After export, the TSV file is handed to a [`Loader`] together with the
//! destination coordinates (dataset, table, staging bucket). Loading is
//! outside the core pipeline: the caller logs a failure and reports it, but
//! the exported files stay valid either way.
//!
//! Two loaders are provided:
//!
//! - [`NullLoader`] - records the job and does nothing (loading disabled)
//! - [`CommandLoader`] - runs an external program, e.g. a script wrapping
//!   `gsutil cp` and `bq load`, with placeholders expanded in its arguments

use std::borrow::Cow;
use std::path::PathBuf;

use async_trait::async_trait;
use tokio::process::Command;
use tracing::{debug, info};

use crate::error::{Result, SinkError};


/// Default destination dataset
pub const DEFAULT_DATASET: &str = "stripe";

/// Default destination table
pub const DEFAULT_TABLE: &str = "initial_load";

/// Default staging bucket
pub const DEFAULT_BUCKET: &str = "gcp-upload-bucket";

/// One file to load into one table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LoadJob {
    pub dataset: String,
    pub table: String,
    pub bucket: String,
    pub file: PathBuf,
}

impl LoadJob {
    pub fn new(
        dataset: impl Into<String>,
        table: impl Into<String>,
        bucket: impl Into<String>,
        file: impl Into<PathBuf>,
    ) -> Self {
        Self {
            dataset: dataset.into(),
            table: table.into(),
            bucket: bucket.into(),
            file: file.into(),
        }
    }

    /// Expand `{dataset}`, `{table}`, `{bucket}` and `{file}` in a template
    ///
    /// Substituted values are not expanded again. Unknown placeholders are
    /// left as they are.
    pub fn expand(&self, template: &str) -> String {
        let mut out = String::with_capacity(template.len());
        let mut rest = template;

        while let Some(open) = rest.find('{') {
            out.push_str(&rest[..open]);
            let tail = &rest[open..];
            let value = tail
                .find('}')
                .and_then(|close| self.placeholder(&tail[1..close]).map(|v| (close, v)));
            match value {
                Some((close, value)) => {
                    out.push_str(&value);
                    rest = &tail[close + 1..];
                }
                None => {
                    out.push('{');
                    rest = &tail[1..];
                }
            }
        }

        out.push_str(rest);
        out
    }

    fn placeholder(&self, name: &str) -> Option<Cow<'_, str>> {
        match name {
            "dataset" => Some(Cow::Borrowed(&self.dataset)),
            "table" => Some(Cow::Borrowed(&self.table)),
            "bucket" => Some(Cow::Borrowed(&self.bucket)),
            "file" => Some(self.file.to_string_lossy()),
            _ => None,
        }
    }
}

/// Loads an exported file into a warehouse table
#[async_trait]
pub trait Loader: Send + Sync {
    /// Loader name for logging
    fn name(&self) -> &'static str;

    /// Run the load, returning once the destination has accepted the file
    async fn load(&self, job: &LoadJob) -> Result<()>;
}

/// Loader that only logs the job
#[derive(Debug, Default, Clone, Copy)]
pub struct NullLoader;

#[async_trait]
impl Loader for NullLoader {
    fn name(&self) -> &'static str {
        "null"
    }

    async fn load(&self, job: &LoadJob) -> Result<()> {
        info!(
            loader = "null",
            dataset = %job.dataset,
            table = %job.table,
            file = %job.file.display(),
            "loading disabled, skipping"
        );
        Ok(())
    }
}

/// Loader that runs an external program
///
/// ```toml
/// [load]
/// enabled = true
/// program = "scripts/bq-load.sh"
/// args = ["{bucket}", "{dataset}.{table}", "{file}"]
/// ```
#[derive(Debug, Clone)]
pub struct CommandLoader {
    program: String,
    args: Vec<String>,
}

impl CommandLoader {
    /// Create a command loader
    ///
    /// # Errors
    ///
    /// Returns `SinkError::Config` if the program is empty
    pub fn new(program: impl Into<String>, args: Vec<String>) -> Result<Self> {
        let program = program.into();
        if program.trim().is_empty() {
            return Err(SinkError::config("load program must not be empty"));
        }
        Ok(Self { program, args })
    }

    pub fn program(&self) -> &str {
        &self.program
    }

    /// Arguments with placeholders expanded for a job
    pub fn expanded_args(&self, job: &LoadJob) -> Vec<String> {
        self.args.iter().map(|a| job.expand(a)).collect()
    }
}

#[async_trait]
impl Loader for CommandLoader {
    fn name(&self) -> &'static str {
        "command"
    }

    async fn load(&self, job: &LoadJob) -> Result<()> {
        let args = self.expanded_args(job);
        debug!(loader = "command", program = %self.program, ?args, "starting load");

        let output = Command::new(&self.program)
            .args(&args)
            .kill_on_drop(true)
            .output()
            .await
            .map_err(|e| SinkError::load(format!("failed to start '{}': {}", self.program, e)))?;

        if !output.stdout.is_empty() {
            debug!(
                loader = "command",
                stdout = %String::from_utf8_lossy(&output.stdout).trim_end(),
                "load output"
            );
        }

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(SinkError::load(format!(
                "'{}' exited with {}: {}",
                self.program,
                output.status,
                stderr.trim()
            )));
        }

        info!(
            loader = "command",
            dataset = %job.dataset,
            table = %job.table,
            file = %job.file.display(),
            "load complete"
        );
        Ok(())
    }
}
