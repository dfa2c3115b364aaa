use crate::expression::ast::Expr;
use crate::expression::eval::{Value, bind, eval};
use crate::expression::parser::parse_expr;
use crate::foundation::error::{AvmixError, AvmixResult};

/// Declared inputs for ratio remapping hooks (transition `fun`, animation `mode`).
pub const RATIO_INPUTS: &[&str] = &["ratio"];
/// Declared inputs for animation `postfun` hooks.
pub const POSTFUN_INPUTS: &[&str] = &["value", "ratio"];
/// Declared inputs for node `mxjs` matrix hooks.
pub const MATRIX_INPUTS: &[&str] = &["t", "x", "y", "width", "height", "ref_width", "ref_height"];
/// Declared inputs for `script` root objects.
pub const SCRIPT_INPUTS: &[&str] = &["t", "frame"];

/// A compiled, sandboxed expression.
///
/// A hook sees exactly the inputs declared at compile time, in that order, and nothing else.
#[derive(Clone, Debug)]
pub struct Hook {
    src: String,
    inputs: &'static [&'static str],
    expr: Expr,
}

impl PartialEq for Hook {
    fn eq(&self, other: &Self) -> bool {
        self.src == other.src && self.inputs == other.inputs
    }
}

impl Hook {
    pub fn compile(src: &str, inputs: &'static [&'static str]) -> AvmixResult<Self> {
        let parsed = parse_expr(src)?;
        let expr = bind(parsed, inputs)?;
        Ok(Self {
            src: src.to_owned(),
            inputs,
            expr,
        })
    }

    pub fn source(&self) -> &str {
        &self.src
    }

    pub fn eval(&self, vals: &[f64]) -> AvmixResult<Value> {
        if vals.len() != self.inputs.len() {
            return Err(AvmixError::hook(format!(
                "hook '{}' expects {} inputs, got {}",
                self.src,
                self.inputs.len(),
                vals.len()
            )));
        }
        Ok(eval(&self.expr, vals)?)
    }

    pub fn eval_f64(&self, vals: &[f64]) -> AvmixResult<f64> {
        let v = self.eval(vals)?.as_f64()?;
        if !v.is_finite() {
            return Err(AvmixError::hook(format!(
                "hook '{}' produced a non-finite value",
                self.src
            )));
        }
        Ok(v)
    }

    /// Remap a ratio through a `{ratio}` hook, clamping the result to `[0, 1]`.
    pub fn remap_ratio(&self, ratio: f64) -> AvmixResult<f64> {
        Ok(self.eval_f64(&[ratio])?.clamp(0.0, 1.0))
    }
}

/// A named set of hooks sharing one input declaration (`mxjs`, `script`).
#[derive(Clone, Debug, PartialEq, Default)]
pub struct HookMap {
    entries: Vec<(String, Hook)>,
}

impl HookMap {
    /// Compile every `name: "expr"` pair. Keys outside `allowed` (when given) are rejected.
    pub fn compile(
        obj: &serde_json::Map<String, serde_json::Value>,
        inputs: &'static [&'static str],
        allowed: Option<&[&str]>,
    ) -> AvmixResult<Self> {
        let mut entries = Vec::with_capacity(obj.len());
        for (k, v) in obj {
            if let Some(allowed) = allowed {
                if !allowed.contains(&k.as_str()) {
                    return Err(AvmixError::hook(format!(
                        "unknown hook output '{k}' (expected one of {})",
                        allowed.join(", ")
                    )));
                }
            }
            let src = match v {
                serde_json::Value::String(s) => s.clone(),
                serde_json::Value::Number(n) => n.to_string(),
                serde_json::Value::Bool(b) => b.to_string(),
                other => {
                    return Err(AvmixError::hook(format!(
                        "hook '{k}' must be an expression string, got {other}"
                    )));
                }
            };
            entries.push((k.clone(), Hook::compile(&src, inputs)?));
        }
        Ok(Self { entries })
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, name: &str) -> Option<&Hook> {
        self.entries.iter().find(|(k, _)| k == name).map(|(_, h)| h)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Hook)> {
        self.entries.iter().map(|(k, h)| (k.as_str(), h))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/hook.rs"]
mod tests;
