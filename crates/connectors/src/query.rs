//! Bracket-notation query string encoding
//!
//! Nested filter objects are expressed as bracket suffixes on the key:
//!
//! ```text
//! {"created": {"gte": 1688169600}, "type": "invoice.*"}
//!     -> created[gte]=1688169600&type=invoice.*
//! ```
//!
//! Values are written as-is. No percent-encoding is applied here; callers
//! that need escaping layer it on top.

use serde_json::{Map, Value};

/// Encode a nested object into a `&`-joined bracket-notation query string
///
/// Keys keep their insertion order. Arrays become indexed brackets
/// (`ids[0]=a&ids[1]=b`) and empty nested objects contribute nothing.
pub fn encode_nested(obj: &Map<String, Value>) -> String {
    let mut pairs = Vec::new();
    for (key, value) in obj {
        encode_value(key, value, &mut pairs);
    }
    pairs.join("&")
}

fn encode_value(key: &str, value: &Value, pairs: &mut Vec<String>) {
    match value {
        Value::Object(map) => {
            for (child, v) in map {
                encode_value(&format!("{key}[{child}]"), v, pairs);
            }
        }
        Value::Array(items) => {
            for (i, v) in items.iter().enumerate() {
                encode_value(&format!("{key}[{i}]"), v, pairs);
            }
        }
        Value::String(s) => pairs.push(format!("{key}={s}")),
        other => pairs.push(format!("{key}={other}")),
    }
}

/// Decode a bracket-notation query string back into a nested object
///
/// Inverse of [`encode_nested`] for objects whose leaves are strings.
/// Every leaf comes back as a string; bracket indices are treated as
/// object keys.
pub fn decode_nested(query: &str) -> Map<String, Value> {
    let mut root = Map::new();

    'pairs: for pair in query.split('&').filter(|p| !p.is_empty()) {
        let (path, value) = pair.split_once('=').unwrap_or((pair, ""));
        let segments = split_path(path);
        let Some((last, parents)) = segments.split_last() else {
            continue;
        };

        let mut cursor = &mut root;
        for segment in parents {
            let entry = cursor
                .entry(segment.to_string())
                .or_insert_with(|| Value::Object(Map::new()));
            if !entry.is_object() {
                *entry = Value::Object(Map::new());
            }
            match entry {
                Value::Object(next) => cursor = next,
                _ => continue 'pairs,
            }
        }
        cursor.insert(last.to_string(), Value::String(value.to_string()));
    }

    root
}

/// Split `a[b][c]` into `["a", "b", "c"]`
fn split_path(path: &str) -> Vec<&str> {
    let (head, rest) = match path.find('[') {
        Some(idx) => (&path[..idx], &path[idx..]),
        None => (path, ""),
    };

    let mut segments = vec![head];
    segments.extend(
        rest.split('[')
            .filter(|s| !s.is_empty())
            .map(|s| s.trim_end_matches(']')),
    );
    segments
}
