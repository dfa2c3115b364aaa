use crate::foundation::error::{AvmixError, AvmixResult};
use crate::props::value::{PropValue, PropertyHost};

/// A write target in `id@property[index]` form.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct PropTarget {
    pub id: String,
    pub property: String,
    pub index: Option<usize>,
}

impl PropTarget {
    pub fn parse(s: &str) -> AvmixResult<Self> {
        let s = s.trim();
        let (id, rest) = s
            .split_once('@')
            .ok_or_else(|| AvmixError::config(format!("target '{s}' must be 'id@property'")))?;
        if id.is_empty() || rest.is_empty() {
            return Err(AvmixError::config(format!(
                "target '{s}' must be 'id@property'"
            )));
        }
        let (property, index) = match rest.split_once('[') {
            None => (rest, None),
            Some((prop, idx)) => {
                let idx = idx
                    .strip_suffix(']')
                    .and_then(|i| i.trim().parse::<usize>().ok())
                    .ok_or_else(|| AvmixError::config(format!("invalid index in target '{s}'")))?;
                (prop, Some(idx))
            }
        };
        Ok(Self {
            id: id.to_owned(),
            property: property.to_owned(),
            index,
        })
    }
}

impl std::fmt::Display for PropTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.id, self.property)?;
        if let Some(i) = self.index {
            write!(f, "[{i}]")?;
        }
        Ok(())
    }
}

/// Read a target value, following `[index]` into array properties.
pub fn read_target(host: &dyn PropertyHost, target: &PropTarget) -> Option<PropValue> {
    let v = host.get_property(&target.property)?;
    match (target.index, v) {
        (None, v) => Some(v),
        (Some(i), PropValue::Array(items)) => items.get(i).cloned(),
        (Some(_), _) => None,
    }
}

/// Write a target value, type-checking against the host's declared property type.
pub fn write_target(
    host: &mut dyn PropertyHost,
    target: &PropTarget,
    value: PropValue,
) -> AvmixResult<()> {
    if target.property == "id" {
        return Err(AvmixError::update("'id' is not writable"));
    }
    let ty = host.prop_type(&target.property).ok_or_else(|| {
        AvmixError::update(format!("no property '{}' on '{}'", target.property, target.id))
    })?;

    let Some(index) = target.index else {
        if !ty.accepts(&value) {
            return Err(AvmixError::update(format!(
                "{target}: value {value:?} does not match {ty:?}"
            )));
        }
        return host.set_property(&target.property, value);
    };

    let elem = ty
        .element()
        .ok_or_else(|| AvmixError::update(format!("{target}: property is not an array")))?;
    if !elem.accepts(&value) {
        return Err(AvmixError::update(format!(
            "{target}: value {value:?} does not match {elem:?}"
        )));
    }
    let Some(PropValue::Array(mut items)) = host.get_property(&target.property) else {
        return Err(AvmixError::update(format!("{target}: property is not an array")));
    };
    let slot = items
        .get_mut(index)
        .ok_or_else(|| AvmixError::update(format!("{target}: index out of range")))?;
    *slot = value;
    host.set_property(&target.property, PropValue::Array(items))
}

/// Live objects addressable by id.
pub trait PropertyGraph {
    fn host(&self, id: &str) -> Option<&dyn PropertyHost>;

    fn host_mut(&mut self, id: &str) -> Option<&mut dyn PropertyHost>;
}

/// Resolve `target.id` in `graph` and read the value.
pub fn graph_read(graph: &dyn PropertyGraph, target: &PropTarget) -> Option<PropValue> {
    read_target(graph.host(&target.id)?, target)
}

/// Resolve `target.id` in `graph` and write the value.
pub fn graph_write(
    graph: &mut dyn PropertyGraph,
    target: &PropTarget,
    value: PropValue,
) -> AvmixResult<()> {
    let host = graph
        .host_mut(&target.id)
        .ok_or_else(|| AvmixError::update(format!("{target}: no object with id '{}'", target.id)))?;
    write_target(host, target, value)
}

#[cfg(test)]
#[path = "../../tests/unit/props/target.rs"]
mod tests;
