//! Normalization of the backend's inconsistent list envelopes.

use serde::de::DeserializeOwned;
use serde_json::Value;

const LIST_FIELDS: [&str; 2] = ["results", "reviews"];

/// Flattens `{results: [...]}`, `{reviews: [...]}`, a bare array, or a single
/// object into an ordered sequence. `null` yields no rows.
pub fn rows(value: &Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        Value::Array(items) => items.clone(),
        Value::Object(map) => {
            for field in LIST_FIELDS {
                match map.get(field) {
                    Some(Value::Array(items)) => return items.clone(),
                    Some(Value::Null) => return Vec::new(),
                    _ => {}
                }
            }
            vec![value.clone()]
        }
        other => vec![other.clone()],
    }
}

/// Decodes every row that fits `T`; rows that do not fit are skipped.
pub fn decode_rows<T: DeserializeOwned>(value: &Value) -> Vec<T> {
    rows(value)
        .into_iter()
        .filter_map(|row| serde_json::from_value(row).ok())
        .collect()
}

/// Reads an id list such as `{review_ids: [1, 2]}` or a bare `[1, 2]`.
pub fn id_list(value: &Value, field: &str) -> Option<Vec<i64>> {
    let list = match value {
        Value::Array(_) => value,
        Value::Object(map) => map.get(field)?,
        _ => return None,
    };
    match list {
        Value::Array(items) => Some(items.iter().filter_map(Value::as_i64).collect()),
        Value::Null => Some(Vec::new()),
        _ => None,
    }
}
