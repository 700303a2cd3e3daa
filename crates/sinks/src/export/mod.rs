//! File exporter
//!
//! Writes one record set to two files sharing a stem:
//!
//! - `<stem>.tsv` - tab-separated, header is the union of record keys in
//!   first-seen order, one line per record
//! - `<stem>.json` - the records as a pretty-printed JSON array
//!
//! Each file is written to a temporary file in the destination directory and
//! renamed into place, so a reader never sees a half-written export. The two
//! writes are independent: a failed TSV does not stop the JSON, and the
//! outcome of each is reported separately in [`ExportReport`].

use std::borrow::Cow;
use std::collections::HashSet;
use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use csv::{QuoteStyle, WriterBuilder};
use serde_json::{Map, Value};
use tempfile::NamedTempFile;
use tracing::{error, info};

use crate::error::{Result, SinkError};


/// Default output stem
pub const DEFAULT_STEM: &str = "exports/output";

/// Paths of a successful export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportedFiles {
    pub tsv: PathBuf,
    pub json: PathBuf,
}

/// Outcome of each format of one export
#[derive(Debug)]
pub struct ExportReport {
    pub tsv: Result<PathBuf>,
    pub json: Result<PathBuf>,
}

impl ExportReport {
    /// True when both files were written
    pub fn is_ok(&self) -> bool {
        self.tsv.is_ok() && self.json.is_ok()
    }

    /// Collapse into a single result, TSV failure first
    pub fn into_result(self) -> Result<ExportedFiles> {
        Ok(ExportedFiles {
            tsv: self.tsv?,
            json: self.json?,
        })
    }
}

/// Writes record sets to `<stem>.tsv` and `<stem>.json`
#[derive(Debug, Clone)]
pub struct Exporter {
    stem: PathBuf,
}

impl Default for Exporter {
    fn default() -> Self {
        Self::new(DEFAULT_STEM)
    }
}

impl Exporter {
    pub fn new(stem: impl Into<PathBuf>) -> Self {
        Self { stem: stem.into() }
    }

    pub fn stem(&self) -> &Path {
        &self.stem
    }

    /// Destination of the TSV file
    pub fn tsv_path(&self) -> PathBuf {
        with_suffix(&self.stem, "tsv")
    }

    /// Destination of the JSON file
    pub fn json_path(&self) -> PathBuf {
        with_suffix(&self.stem, "json")
    }

    /// Write both files, attempting each regardless of the other's outcome
    pub fn export(&self, records: &[Map<String, Value>]) -> ExportReport {
        let tsv_path = self.tsv_path();
        let tsv = write_atomic(&tsv_path, |w| write_tsv(w, records)).map(|()| tsv_path);
        log_outcome("tsv", &tsv, records.len());

        let json_path = self.json_path();
        let json = write_atomic(&json_path, |w| write_json(w, records)).map(|()| json_path);
        log_outcome("json", &json, records.len());

        ExportReport { tsv, json }
    }
}

fn log_outcome(format: &'static str, outcome: &Result<PathBuf>, records: usize) {
    match outcome {
        Ok(path) => info!(sink = "export", format, path = %path.display(), records, "export written"),
        Err(e) => error!(sink = "export", format, error = %e, "export failed"),
    }
}

/// Append `.ext` to the stem without touching dots already in it
fn with_suffix(stem: &Path, ext: &str) -> PathBuf {
    let mut name = stem.as_os_str().to_owned();
    name.push(".");
    name.push(ext);
    PathBuf::from(name)
}

/// Write through a temp file in the destination directory, then rename
fn write_atomic<F>(path: &Path, write_body: F) -> Result<()>
where
    F: FnOnce(&mut dyn Write) -> Result<()>,
{
    let dir = match path.parent() {
        Some(parent) if !parent.as_os_str().is_empty() => parent,
        _ => Path::new("."),
    };
    fs::create_dir_all(dir).map_err(|e| SinkError::io(dir, e))?;

    let mut temp = NamedTempFile::new_in(dir).map_err(|e| SinkError::io(dir, e))?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        write_body(&mut writer)?;
        writer.flush().map_err(|e| SinkError::io(path, e))?;
    }

    temp.persist(path).map_err(|e| SinkError::io(path, e.error))?;
    Ok(())
}

/// Union of record keys in first-seen order
pub fn header(records: &[Map<String, Value>]) -> Vec<&str> {
    let mut seen = HashSet::new();
    let mut columns = Vec::new();
    for key in records.iter().flat_map(|r| r.keys()) {
        if seen.insert(key.as_str()) {
            columns.push(key.as_str());
        }
    }
    columns
}

fn cell(value: Option<&Value>) -> Cow<'_, str> {
    match value {
        None | Some(Value::Null) => Cow::Borrowed(""),
        Some(Value::String(s)) => Cow::Borrowed(s),
        Some(other) => Cow::Owned(other.to_string()),
    }
}

fn write_tsv(out: &mut dyn Write, records: &[Map<String, Value>]) -> Result<()> {
    let columns = header(records);
    if columns.is_empty() {
        return Ok(());
    }

    let mut writer = WriterBuilder::new()
        .delimiter(b'\t')
        .quote_style(QuoteStyle::Necessary)
        .from_writer(out);

    writer.write_record(&columns)?;
    for record in records {
        writer.write_record(columns.iter().map(|c| cell(record.get(*c)).into_owned()))?;
    }
    writer.flush().map_err(csv::Error::from)?;
    Ok(())
}

fn write_json(out: &mut dyn Write, records: &[Map<String, Value>]) -> Result<()> {
    serde_json::to_writer_pretty(&mut *out, records)?;
    out.write_all(b"\n").map_err(serde_json::Error::io)?;
    Ok(())
}
