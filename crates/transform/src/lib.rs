//! Tally - Transform
//!
//! Record shaping between fetch and export.
//!
//! # Overview
//!
//! ```text
//! [event payload] → extract_payload → flatten → coerce (optional) → [record]
//! ```
//!
//! - `flatten` - collapse nested objects into prefixed keys, up to a depth ceiling
//! - `coerce` - convert fields to the types declared in a field type map
//!
//! Both stages are pure functions over `serde_json` maps. Key order is
//! preserved throughout, which later decides TSV column order.

pub mod coerce;
pub mod error;
pub mod flatten;

use serde_json::{Map, Value};

/// A single flat record
pub type Record = Map<String, Value>;

pub use coerce::{Coerced, CoercionWarning, FieldType, FieldTypeMap, coerce};
pub use error::{Result, TransformError};
pub use flatten::{DEFAULT_MAX_DEPTH, DEFAULT_SEPARATOR, FlattenOptions, extract_payload, flatten};
