use serde_json::Value;
use tracing::{debug, warn};

use crate::foundation::error::{AvmixError, AvmixResult};
use crate::foundation::json;
use crate::props::{PropTarget, PropertyGraph, graph_write};

/// One `{replace, with}` entry of an updates file.
#[derive(Clone, Debug, PartialEq)]
pub struct UpdateEntry {
    pub target: PropTarget,
    pub value: Value,
}

/// Parse an updates document: one entry or an array of entries.
///
/// Malformed JSON fails; individual bad entries are logged and dropped.
pub fn parse_updates(text: &str, file: Option<&str>) -> AvmixResult<Vec<UpdateEntry>> {
    let file = file.unwrap_or("");
    let root: Value = serde_json::from_str(text)
        .map_err(|e| AvmixError::config(format!("{file}: invalid updates JSON: {e}")))?;
    let items = match root {
        Value::Array(items) => items,
        obj @ Value::Object(_) => vec![obj],
        other => {
            return Err(AvmixError::config(format!(
                "updates root must be an object or array, got {other}"
            )));
        }
    };

    let mut out = Vec::with_capacity(items.len());
    for item in &items {
        match parse_entry(item) {
            Ok(Some(entry)) => out.push(entry),
            Ok(None) => {}
            Err(err) => warn!(file, error = %err, "update entry rejected"),
        }
    }
    Ok(out)
}

fn parse_entry(v: &Value) -> AvmixResult<Option<UpdateEntry>> {
    let obj = json::as_object(v, "update")?;
    if json::is_skipped(obj) {
        return Ok(None);
    }
    json::warn_unknown(obj, &["replace", "with"], "update", None);
    let target = json::opt_str(obj, "replace")?
        .ok_or_else(|| AvmixError::config("update requires 'replace'"))?;
    let value = obj
        .get("with")
        .cloned()
        .ok_or_else(|| AvmixError::config(format!("update of '{target}' requires 'with'")))?;
    Ok(Some(UpdateEntry {
        target: PropTarget::parse(&target)?,
        value,
    }))
}

/// Write each entry to the live object it names, checking `with` against the declared type.
///
/// Rejected entries leave their target unchanged. Returns the number applied.
pub fn apply_updates(graph: &mut dyn PropertyGraph, entries: &[UpdateEntry], file: Option<&str>) -> usize {
    let file = file.unwrap_or("");
    let mut applied = 0;
    for e in entries {
        match apply_one(graph, e) {
            Ok(()) => {
                debug!(file, target = %e.target, "update applied");
                applied += 1;
            }
            Err(err) => warn!(
                file,
                id = %e.target.id,
                property = %e.target.property,
                error = %err,
                "update rejected"
            ),
        }
    }
    applied
}

fn apply_one(graph: &mut dyn PropertyGraph, e: &UpdateEntry) -> AvmixResult<()> {
    let target = &e.target;
    let host = graph
        .host(&target.id)
        .ok_or_else(|| AvmixError::update(format!("no object with id '{}'", target.id)))?;
    let ty = host
        .prop_type(&target.property)
        .ok_or_else(|| AvmixError::update(format!("no property '{}'", target.property)))?;
    let ty = match target.index {
        None => ty,
        Some(_) => ty
            .element()
            .ok_or_else(|| AvmixError::update(format!("{target}: property is not an array")))?,
    };
    let value = ty.coerce(&e.value)?;
    graph_write(graph, target, value)
}

#[cfg(test)]
#[path = "../../tests/unit/playlist/update.rs"]
mod tests;
