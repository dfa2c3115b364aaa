use tracing::warn;

use crate::foundation::error::{AvmixError, AvmixResult};

/// Declared transition: `{"id", "type", "dur", "fun", ...module options}`.
#[derive(Clone, Debug, PartialEq)]
pub struct TransitionSpec {
    pub id: Option<String>,
    pub kind: String,
    /// Seconds. Unused for scene-level mixes, which are driven by `mix_ratio`.
    pub dur: f64,
    pub fun: Option<String>,
    pub options: serde_json::Map<String, serde_json::Value>,
}

impl Default for TransitionSpec {
    fn default() -> Self {
        Self {
            id: None,
            kind: "mix".to_owned(),
            dur: 1.0,
            fun: None,
            options: serde_json::Map::new(),
        }
    }
}

impl TransitionSpec {
    pub fn from_json(v: &serde_json::Value) -> AvmixResult<Self> {
        let obj = v
            .as_object()
            .ok_or_else(|| AvmixError::config("transition must be an object"))?;
        let mut spec = Self::default();
        for (k, v) in obj {
            match k.as_str() {
                "id" => {
                    spec.id = Some(
                        v.as_str()
                            .ok_or_else(|| AvmixError::config("transition id must be a string"))?
                            .to_owned(),
                    );
                }
                "type" => {
                    let kind = v
                        .as_str()
                        .ok_or_else(|| AvmixError::config("transition type must be a string"))?
                        .trim();
                    if kind.is_empty() {
                        return Err(AvmixError::config("transition type must be non-empty"));
                    }
                    spec.kind = kind.to_owned();
                }
                "dur" => {
                    let dur = v
                        .as_f64()
                        .ok_or_else(|| AvmixError::config("transition dur must be a number"))?;
                    if !dur.is_finite() || dur < 0.0 {
                        return Err(AvmixError::config(format!(
                            "transition dur must be finite and >= 0, got {dur}"
                        )));
                    }
                    spec.dur = dur;
                }
                "fun" => match v {
                    serde_json::Value::Null => spec.fun = None,
                    serde_json::Value::String(s) => spec.fun = Some(s.clone()),
                    other => {
                        warn!(id = ?spec.id, property = "fun", value = %other, "ignoring non-string transition hook");
                    }
                },
                "skip" => {}
                k if k.starts_with('_') => {}
                _ => {
                    spec.options.insert(k.clone(), v.clone());
                }
            }
        }
        Ok(spec)
    }

    pub fn to_json(&self) -> serde_json::Value {
        let mut obj = self.options.clone();
        if let Some(id) = &self.id {
            obj.insert("id".to_owned(), serde_json::Value::String(id.clone()));
        }
        obj.insert("type".to_owned(), serde_json::Value::String(self.kind.clone()));
        obj.insert("dur".to_owned(), serde_json::json!(self.dur));
        if let Some(fun) = &self.fun {
            obj.insert("fun".to_owned(), serde_json::Value::String(fun.clone()));
        }
        serde_json::Value::Object(obj)
    }
}
