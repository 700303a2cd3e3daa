//! Field type coercion
//!
//! Converts flattened records to the column types of a destination schema.
//! The schema is read from a side file mapping field names to a declared
//! type, in the shape warehouse schema exports use:
//!
//! ```json
//! {
//!   "id":       { "type": "STRING" },
//!   "quantity": { "type": "INTEGER", "mode": "NULLABLE" },
//!   "metadata": { "type": "JSON" }
//! }
//! ```
//!
//! Only fields named in the map survive coercion, in the map's order. A value
//! that cannot be converted produces a [`CoercionWarning`] and is left out of
//! the record; the rest of the record is still produced.

use std::fmt;
use std::path::Path;
use std::str::FromStr;

use serde_json::{Map, Number, Value};
use tracing::warn;

use crate::Record;
use crate::error::{Result, TransformError};


/// Declared column type
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FieldType {
    String,
    Integer,
    Float,
    Boolean,
    Json,
    Timestamp,
}

impl FieldType {
    /// Canonical upper-case name
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::String => "STRING",
            Self::Integer => "INTEGER",
            Self::Float => "FLOAT",
            Self::Boolean => "BOOLEAN",
            Self::Json => "JSON",
            Self::Timestamp => "TIMESTAMP",
        }
    }
}

impl fmt::Display for FieldType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldType {
    type Err = TransformError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_uppercase().as_str() {
            "STRING" => Ok(Self::String),
            "INTEGER" | "INT64" => Ok(Self::Integer),
            "FLOAT" | "FLOAT64" | "NUMERIC" => Ok(Self::Float),
            "BOOLEAN" | "BOOL" => Ok(Self::Boolean),
            "JSON" => Ok(Self::Json),
            "TIMESTAMP" => Ok(Self::Timestamp),
            other => Err(TransformError::config(format!(
                "unknown field type '{}'",
                other
            ))),
        }
    }
}

/// Ordered mapping from field name to declared type
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldTypeMap {
    fields: Vec<(String, FieldType)>,
}

impl FieldTypeMap {
    /// Create an empty map
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a field (builder style)
    pub fn with_field(mut self, name: impl Into<String>, kind: FieldType) -> Self {
        self.insert(name, kind);
        self
    }

    /// Add or replace a field, keeping its original position on replace
    pub fn insert(&mut self, name: impl Into<String>, kind: FieldType) {
        let name = name.into();
        match self.fields.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = kind,
            None => self.fields.push((name, kind)),
        }
    }

    /// Load a field type file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .map_err(|e| TransformError::io(path.display().to_string(), e))?;
        content.parse()
    }

    /// Declared type of a field
    pub fn get(&self, name: &str) -> Option<FieldType> {
        self.fields
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, kind)| *kind)
    }

    /// Iterate fields in declaration order
    pub fn iter(&self) -> impl Iterator<Item = (&str, FieldType)> {
        self.fields.iter().map(|(n, k)| (n.as_str(), *k))
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl FromStr for FieldTypeMap {
    type Err = TransformError;

    /// Parse the JSON form
    ///
    /// Each entry is either `{"type": "..."}` (other attributes ignored) or
    /// a bare type name.
    fn from_str(s: &str) -> Result<Self> {
        let raw: Map<String, Value> = serde_json::from_str(s)?;
        let mut map = Self::new();

        for (name, entry) in raw {
            let kind = match &entry {
                Value::String(kind) => kind.as_str(),
                Value::Object(attrs) => match attrs.get("type") {
                    Some(Value::String(kind)) => kind.as_str(),
                    _ => {
                        return Err(TransformError::config(format!(
                            "field '{}' has no \"type\" attribute",
                            name
                        )));
                    }
                },
                _ => {
                    return Err(TransformError::config(format!(
                        "field '{}' must map to an object or a type name",
                        name
                    )));
                }
            };

            let kind = kind.parse().map_err(|_| {
                TransformError::config(format!("field '{}' has unknown type '{}'", name, kind))
            })?;
            map.insert(name, kind);
        }

        Ok(map)
    }
}

/// A field that could not be converted to its declared type
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CoercionWarning {
    pub field: String,
    pub kind: FieldType,
    pub reason: String,
}

impl fmt::Display for CoercionWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "field '{}' as {}: {}", self.field, self.kind, self.reason)
    }
}

/// Outcome of coercing one record
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Coerced {
    pub record: Record,
    pub warnings: Vec<CoercionWarning>,
}

/// Coerce a record to the types declared in `types`
///
/// Fields absent from the map are dropped, fields absent from the record are
/// skipped, and `null` stays `null` whatever the declared type.
pub fn coerce(record: &Map<String, Value>, types: &FieldTypeMap) -> Coerced {
    let mut out = Coerced::default();

    for (field, kind) in types.iter() {
        let Some(value) = record.get(field) else {
            continue;
        };

        match convert(value, kind) {
            Ok(converted) => {
                out.record.insert(field.to_string(), converted);
            }
            Err(reason) => {
                warn!(field, kind = %kind, reason = %reason, "field coercion failed, omitting field");
                out.warnings.push(CoercionWarning {
                    field: field.to_string(),
                    kind,
                    reason,
                });
            }
        }
    }

    out
}

/// Convert one value, returning the failure reason on error
fn convert(value: &Value, kind: FieldType) -> std::result::Result<Value, String> {
    if value.is_null() {
        return Ok(Value::Null);
    }

    match kind {
        FieldType::String => Ok(Value::String(to_text(value))),
        FieldType::Integer => to_integer(value),
        FieldType::Float | FieldType::Timestamp => to_float(value),
        FieldType::Boolean => to_boolean(value),
        FieldType::Json => to_json(value),
    }
}

fn to_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

fn to_integer(value: &Value) -> std::result::Result<Value, String> {
    match value {
        Value::Number(n) if n.is_i64() || n.is_u64() => Ok(value.clone()),
        Value::Number(n) => n
            .as_f64()
            .and_then(whole_number)
            .map(Value::from)
            .ok_or_else(|| format!("{} is not a whole number within range", n)),
        Value::Bool(b) => Ok(Value::from(i64::from(*b))),
        Value::String(s) => {
            let trimmed = s.trim();
            if let Ok(i) = trimmed.parse::<i64>() {
                return Ok(Value::from(i));
            }
            // Digits only: parsing as f64 would round an out-of-range value into range
            if is_integer_literal(trimmed) {
                return Err(format!("'{}' is out of range for an integer", s));
            }
            trimmed
                .parse::<f64>()
                .ok()
                .and_then(whole_number)
                .map(Value::from)
                .ok_or_else(|| format!("'{}' is not an integer", s))
        }
        other => Err(format!("cannot convert {} to an integer", type_name(other))),
    }
}

fn is_integer_literal(s: &str) -> bool {
    let digits = s.strip_prefix(['-', '+']).unwrap_or(s);
    !digits.is_empty() && digits.bytes().all(|b| b.is_ascii_digit())
}

fn whole_number(f: f64) -> Option<i64> {
    // i64::MAX is not representable as f64; 2^63 is the exclusive upper bound
    const UPPER: f64 = 9_223_372_036_854_775_808.0;
    if f.is_finite() && f.fract() == 0.0 && (-UPPER..UPPER).contains(&f) {
        Some(f as i64)
    } else {
        None
    }
}

fn to_float(value: &Value) -> std::result::Result<Value, String> {
    match value {
        Value::Number(_) => Ok(value.clone()),
        Value::Bool(b) => Ok(Value::from(i64::from(*b))),
        Value::String(s) => {
            let parsed = s
                .trim()
                .parse::<f64>()
                .map_err(|_| format!("'{}' is not a number", s))?;
            Number::from_f64(parsed)
                .map(Value::Number)
                .ok_or_else(|| format!("'{}' is not a finite number", s))
        }
        other => Err(format!("cannot convert {} to a number", type_name(other))),
    }
}

fn to_boolean(value: &Value) -> std::result::Result<Value, String> {
    match value {
        Value::Bool(_) => Ok(value.clone()),
        Value::Number(n) => match n.as_f64() {
            Some(f) if f == 0.0 => Ok(Value::Bool(false)),
            Some(f) if f == 1.0 => Ok(Value::Bool(true)),
            _ => Err(format!("{} is not 0 or 1", n)),
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "yes" => Ok(Value::Bool(true)),
            "false" | "0" | "no" => Ok(Value::Bool(false)),
            _ => Err(format!("'{}' is not a boolean", s)),
        },
        other => Err(format!("cannot convert {} to a boolean", type_name(other))),
    }
}

fn to_json(value: &Value) -> std::result::Result<Value, String> {
    match value {
        Value::String(s) => {
            serde_json::from_str(s).map_err(|e| format!("'{}' is not valid JSON: {}", s, e))
        }
        other => Ok(other.clone()),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
