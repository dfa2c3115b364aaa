use std::collections::BTreeSet;

use tracing::warn;

use crate::expression::{Hook, HookMap, SCRIPT_INPUTS, Value};
use crate::foundation::error::{AvmixError, AvmixResult};
use crate::foundation::json;
use crate::props::{PropTarget, PropValue, PropertyGraph, graph_write};
use crate::timing::Clock;

const SCRIPT_KEYS: &[&str] = &["id", "type", "script"];

/// A `script` root object: expressions of `t` and `frame` written to targets every frame.
#[derive(Clone, Debug, PartialEq)]
pub struct ScriptDecl {
    pub id: Option<String>,
    pub entries: Vec<(PropTarget, Hook)>,
}

impl ScriptDecl {
    pub fn from_json(v: &serde_json::Value) -> AvmixResult<Self> {
        let obj = json::as_object(v, "script")?;
        let id = json::opt_str(obj, "id")?;
        json::warn_unknown(obj, SCRIPT_KEYS, "script", id.as_deref());
        let body = obj
            .get("script")
            .and_then(serde_json::Value::as_object)
            .ok_or_else(|| AvmixError::config("script requires a 'script' object of target: expression"))?;
        let hooks = HookMap::compile(body, SCRIPT_INPUTS, None)?;
        let entries = hooks
            .iter()
            .map(|(target, hook)| Ok((PropTarget::parse(target)?, hook.clone())))
            .collect::<AvmixResult<Vec<_>>>()?;
        Ok(Self { id, entries })
    }
}

/// A live script; failing targets are reported once.
#[derive(Debug)]
pub struct Script {
    decl: ScriptDecl,
    reported: BTreeSet<String>,
}

impl Script {
    pub fn new(decl: ScriptDecl) -> Self {
        Self {
            decl,
            reported: BTreeSet::new(),
        }
    }

    pub fn id(&self) -> Option<&str> {
        self.decl.id.as_deref()
    }

    /// Evaluate every entry and write the results. Returns the number of successful writes.
    pub fn run(&mut self, clock: &Clock, graph: &mut dyn PropertyGraph) -> usize {
        let inputs = [clock.now, clock.frame as f64];
        let id = self.decl.id.as_deref().unwrap_or("");
        let mut written = 0;
        for (target, hook) in &self.decl.entries {
            let result = hook.eval(&inputs).and_then(|v| match v {
                Value::F64(n) if n.is_finite() => Ok(PropValue::Number(n)),
                Value::F64(n) => Err(AvmixError::hook(format!("non-finite result {n}"))),
                Value::Bool(b) => Ok(PropValue::Bool(b)),
            });
            match result.and_then(|value| graph_write(graph, target, value)) {
                Ok(()) => written += 1,
                Err(err) => {
                    let key = target.to_string();
                    if self.reported.insert(key.clone()) {
                        warn!(id, target = %key, error = %err, "script write failed");
                    }
                }
            }
        }
        written
    }
}

#[cfg(test)]
#[path = "../../tests/unit/playlist/script.rs"]
mod tests;
