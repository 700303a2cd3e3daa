//! Export configuration

use std::path::PathBuf;

use serde::Deserialize;

/// File export settings
///
/// # Example
///
/// ```toml
/// [export]
/// stem = "exports/output"              # writes output.tsv and output.json
/// field_types = "schemas/fields.json"  # optional, enables type coercion
/// separator = "_"
/// max_depth = 3
/// ```
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ExportConfig {
    /// Output path without extension
    pub stem: String,

    /// Field type file used to coerce records before export
    pub field_types: Option<PathBuf>,

    /// Separator between flattened key segments
    pub separator: String,

    /// Deepest nesting level that is still flattened
    pub max_depth: usize,
}

impl Default for ExportConfig {
    fn default() -> Self {
        Self {
            stem: "exports/output".to_string(),
            field_types: None,
            separator: "_".to_string(),
            max_depth: 3,
        }
    }
}
