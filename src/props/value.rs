use crate::foundation::core::Color;
use crate::foundation::error::{AvmixError, AvmixResult};
use crate::units::{Coord, CoordField};

/// A live property value.
#[derive(Clone, Debug, PartialEq)]
pub enum PropValue {
    Number(f64),
    Bool(bool),
    Str(String),
    Color(Color),
    Array(Vec<PropValue>),
    /// Structured value kept as written, e.g. an `mxjs` map or an inline `mix` transition.
    Json(serde_json::Value),
}

impl PropValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Number(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(v) => Some(*v),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_color(&self) -> Option<Color> {
        match self {
            Self::Color(c) => Some(*c),
            Self::Str(s) => Color::parse(s).ok(),
            _ => None,
        }
    }

    /// Untyped conversion, used for module options declared as `Any`.
    pub fn from_json(v: &serde_json::Value) -> AvmixResult<Self> {
        Ok(match v {
            serde_json::Value::Number(n) => Self::Number(n.as_f64().unwrap_or(0.0)),
            serde_json::Value::Bool(b) => Self::Bool(*b),
            serde_json::Value::String(s) => Self::Str(s.clone()),
            serde_json::Value::Array(items) => Self::Array(
                items
                    .iter()
                    .map(Self::from_json)
                    .collect::<AvmixResult<Vec<_>>>()?,
            ),
            serde_json::Value::Object(_) => Self::Json(v.clone()),
            serde_json::Value::Null => {
                return Err(AvmixError::config("null is not a property value"));
            }
        })
    }

    pub fn to_json(&self) -> serde_json::Value {
        match self {
            Self::Number(v) => serde_json::json!(v),
            Self::Bool(b) => serde_json::Value::Bool(*b),
            Self::Str(s) => serde_json::Value::String(s.clone()),
            Self::Color(c) => serde_json::Value::String(c.to_hex()),
            Self::Array(items) => {
                serde_json::Value::Array(items.iter().map(Self::to_json).collect())
            }
            Self::Json(v) => v.clone(),
        }
    }
}

/// Declared type of a property; incoming values must match it.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum PropType {
    Number,
    Integer,
    Bool,
    String,
    Color,
    /// Number offset, `now`, a date string, or a negative number for "inactive".
    Time,
    /// Number or a sentinel reference to the partner field.
    Coord(CoordField),
    NumberArray,
    StringArray,
    Any,
}

impl PropType {
    /// Check `v` against this type and convert it.
    pub fn coerce(self, v: &serde_json::Value) -> AvmixResult<PropValue> {
        let mismatch = || AvmixError::update(format!("expected {self:?}, got {v}"));
        match self {
            Self::Number => v.as_f64().map(PropValue::Number).ok_or_else(mismatch),
            Self::Integer => match v.as_f64() {
                Some(n) if n.fract() == 0.0 => Ok(PropValue::Number(n)),
                _ => Err(mismatch()),
            },
            Self::Bool => v.as_bool().map(PropValue::Bool).ok_or_else(mismatch),
            Self::String => v
                .as_str()
                .map(|s| PropValue::Str(s.to_owned()))
                .ok_or_else(mismatch),
            Self::Color => {
                let s = v.as_str().ok_or_else(mismatch)?;
                Ok(PropValue::Color(Color::parse(s).map_err(|_| mismatch())?))
            }
            Self::Time => match v {
                serde_json::Value::Number(n) => Ok(PropValue::Number(n.as_f64().unwrap_or(0.0))),
                serde_json::Value::String(s) => Ok(PropValue::Str(s.clone())),
                _ => Err(mismatch()),
            },
            Self::Coord(field) => match Coord::parse(v, field).map_err(|_| mismatch())? {
                Coord::Value(n) => Ok(PropValue::Number(n)),
                Coord::Ref { .. } => Ok(PropValue::Str(
                    v.as_str().unwrap_or_default().trim().to_owned(),
                )),
            },
            Self::NumberArray => {
                let items = v.as_array().ok_or_else(mismatch)?;
                items
                    .iter()
                    .map(|i| i.as_f64().map(PropValue::Number).ok_or_else(mismatch))
                    .collect::<AvmixResult<Vec<_>>>()
                    .map(PropValue::Array)
            }
            Self::StringArray => {
                let items = v.as_array().ok_or_else(mismatch)?;
                items
                    .iter()
                    .map(|i| {
                        i.as_str()
                            .map(|s| PropValue::Str(s.to_owned()))
                            .ok_or_else(mismatch)
                    })
                    .collect::<AvmixResult<Vec<_>>>()
                    .map(PropValue::Array)
            }
            Self::Any => PropValue::from_json(v),
        }
    }

    /// Type of one element of an array-valued property.
    pub fn element(self) -> Option<Self> {
        match self {
            Self::NumberArray => Some(Self::Number),
            Self::StringArray => Some(Self::String),
            Self::Any => Some(Self::Any),
            _ => None,
        }
    }

    /// Whether a value produced by an animation or script can be written to this type.
    pub fn accepts(self, v: &PropValue) -> bool {
        match (self, v) {
            (Self::Number | Self::Time | Self::Coord(_), PropValue::Number(_)) => true,
            (Self::Integer, PropValue::Number(n)) => n.fract() == 0.0,
            (Self::Bool, PropValue::Bool(_)) => true,
            (Self::String | Self::Time | Self::Coord(_), PropValue::Str(_)) => true,
            (Self::Color, PropValue::Color(_)) => true,
            (Self::NumberArray | Self::StringArray, PropValue::Array(_)) => true,
            (Self::Any, _) => true,
            _ => false,
        }
    }
}

/// An object whose properties can be read and written by name.
pub trait PropertyHost {
    /// Declared type for `name`, or `None` when the property does not exist.
    fn prop_type(&self, name: &str) -> Option<PropType>;

    fn get_property(&self, name: &str) -> Option<PropValue>;

    /// Write one property, firing any side effects. `id` is never writable.
    fn set_property(&mut self, name: &str, value: PropValue) -> AvmixResult<()>;
}

#[cfg(test)]
#[path = "../../tests/unit/props/value.rs"]
mod tests;
