//! Flattener
//!
//! Collapses nested JSON objects into a single-level record. Child keys are
//! prefixed with their parent key and a separator:
//!
//! ```text
//! {"plan": {"id": "gold", "amount": 500}}  ->  {"plan_id": "gold", "plan_amount": 500}
//! ```
//!
//! Objects are descended only up to `max_depth` levels. An object found
//! deeper than that is kept whole under its composed key. Arrays are never
//! descended.

use serde_json::{Map, Value};

use crate::Record;
use crate::error::{Result, TransformError};


/// Default key separator
pub const DEFAULT_SEPARATOR: &str = "_";

/// Default flattening depth ceiling
pub const DEFAULT_MAX_DEPTH: usize = 3;

/// Flattening options
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FlattenOptions {
    /// Inserted between parent and child keys
    pub separator: String,
    /// Deepest level whose objects are still descended
    pub max_depth: usize,
}

impl Default for FlattenOptions {
    fn default() -> Self {
        Self {
            separator: DEFAULT_SEPARATOR.to_string(),
            max_depth: DEFAULT_MAX_DEPTH,
        }
    }
}

impl FlattenOptions {
    /// Set the separator
    pub fn with_separator(mut self, separator: impl Into<String>) -> Self {
        self.separator = separator.into();
        self
    }

    /// Set the depth ceiling
    pub fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = max_depth;
        self
    }

    /// Validate options
    pub fn validate(&self) -> Result<()> {
        if self.separator.is_empty() {
            return Err(TransformError::config("separator must not be empty"));
        }
        if self.max_depth == 0 {
            return Err(TransformError::config("max_depth must be at least 1"));
        }
        Ok(())
    }
}

/// Flatten a nested record
///
/// Later keys overwrite earlier ones when two branches compose to the same
/// flat key (`{"a_b": 1, "a": {"b": 2}}` yields `{"a_b": 2}`). Empty nested
/// objects contribute no keys.
pub fn flatten(record: &Map<String, Value>, options: &FlattenOptions) -> Record {
    let mut out = Map::new();
    flatten_into(&mut out, record, "", 1, options);
    out
}

fn flatten_into(
    out: &mut Record,
    obj: &Map<String, Value>,
    prefix: &str,
    depth: usize,
    options: &FlattenOptions,
) {
    for (key, value) in obj {
        let composed = format!("{prefix}{key}");
        match value {
            Value::Object(child) if depth <= options.max_depth => {
                let child_prefix = format!("{composed}{}", options.separator);
                flatten_into(out, child, &child_prefix, depth + 1, options);
            }
            other => {
                // Overwriting keeps the colliding key at its first position
                out.insert(composed, other.clone());
            }
        }
    }
}

/// Extract the flattening input from an event payload
///
/// Object payloads are used as-is; anything else is wrapped as
/// `{"value": payload}` so every event yields a record.
pub fn extract_payload(payload: Value) -> Record {
    match payload {
        Value::Object(map) => map,
        other => {
            let mut map = Map::new();
            map.insert("value".to_string(), other);
            map
        }
    }
}
