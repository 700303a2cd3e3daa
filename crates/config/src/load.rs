//! Warehouse load configuration

use serde::Deserialize;

/// Load settings
///
/// Loading is off unless `enabled` is set, in which case `program` names
/// the command that performs it. Arguments may use `{dataset}`, `{table}`,
/// `{bucket}` and `{file}` placeholders.
///
/// # Example
///
/// ```toml
/// [load]
/// enabled = true
/// dataset = "stripe"
/// table = "initial_load"
/// bucket = "gcp-upload-bucket"
/// program = "scripts/bq-load.sh"
/// args = ["{bucket}", "{dataset}.{table}", "{file}"]
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct LoadConfig {
    pub enabled: bool,
    pub dataset: String,
    pub table: String,
    pub bucket: String,
    pub program: Option<String>,
    pub args: Vec<String>,
}

impl Default for LoadConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            dataset: "stripe".to_string(),
            table: "initial_load".to_string(),
            bucket: "gcp-upload-bucket".to_string(),
            program: None,
            args: Vec::new(),
        }
    }
}
