//! Small readers for playlist objects decoded as `serde_json::Value`.

use serde_json::{Map, Value};
use tracing::warn;

use crate::foundation::error::{AvmixError, AvmixResult};

pub type Object = Map<String, Value>;

pub fn as_object<'a>(v: &'a Value, what: &str) -> AvmixResult<&'a Object> {
    v.as_object()
        .ok_or_else(|| AvmixError::config(format!("{what} must be an object")))
}

pub fn opt_str(obj: &Object, key: &str) -> AvmixResult<Option<String>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => Ok(Some(s.clone())),
        Some(other) => Err(AvmixError::config(format!(
            "'{key}' must be a string, got {other}"
        ))),
    }
}

pub fn str_or(obj: &Object, key: &str, default: &str) -> AvmixResult<String> {
    Ok(opt_str(obj, key)?.unwrap_or_else(|| default.to_owned()))
}

pub fn f64_or(obj: &Object, key: &str, default: f64) -> AvmixResult<f64> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(v) => v
            .as_f64()
            .filter(|n| n.is_finite())
            .ok_or_else(|| AvmixError::config(format!("'{key}' must be a number, got {v}"))),
    }
}

pub fn bool_or(obj: &Object, key: &str, default: bool) -> AvmixResult<bool> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(default),
        Some(Value::Bool(b)) => Ok(*b),
        Some(Value::Number(n)) => Ok(n.as_f64().is_some_and(|n| n != 0.0)),
        Some(other) => Err(AvmixError::config(format!(
            "'{key}' must be a boolean, got {other}"
        ))),
    }
}

/// A single string or an array of strings.
pub fn str_list(obj: &Object, key: &str) -> AvmixResult<Vec<String>> {
    match obj.get(key) {
        None | Some(Value::Null) => Ok(Vec::new()),
        Some(Value::String(s)) => Ok(vec![s.clone()]),
        Some(Value::Array(items)) => items
            .iter()
            .map(|i| {
                i.as_str().map(str::to_owned).ok_or_else(|| {
                    AvmixError::config(format!("'{key}' entries must be strings, got {i}"))
                })
            })
            .collect(),
        Some(other) => Err(AvmixError::config(format!(
            "'{key}' must be a string list, got {other}"
        ))),
    }
}

/// Whether the object is marked `skip`.
pub fn is_skipped(obj: &Object) -> bool {
    match obj.get("skip") {
        Some(Value::Bool(b)) => *b,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty() && s != "false" && s != "0",
        _ => false,
    }
}

/// Warn about keys outside `known`. Keys starting with `_` are private annotations.
pub fn warn_unknown(obj: &Object, known: &[&str], kind: &str, id: Option<&str>) {
    for key in obj.keys() {
        if key.starts_with('_') || key == "skip" || known.contains(&key.as_str()) {
            continue;
        }
        warn!(kind, id = id.unwrap_or(""), property = %key, "unknown property ignored");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/json.rs"]
mod tests;
