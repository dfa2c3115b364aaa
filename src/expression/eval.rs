use crate::expression::ast::{BinaryOp, BuiltinId, Expr, Lit, UnaryOp};
use crate::expression::error::{EvalError, ExprError};

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Value {
    F64(f64),
    Bool(bool),
}

impl Value {
    pub(crate) fn as_f64(self) -> Result<f64, EvalError> {
        match self {
            Self::F64(v) => Ok(v),
            other => Err(EvalError::new(format!("expected numeric, got {other:?}"))),
        }
    }

    pub(crate) fn as_bool(self) -> Result<bool, EvalError> {
        match self {
            Self::Bool(v) => Ok(v),
            // Numbers are truthy when non-zero so `active: "t - 5"` reads naturally.
            Self::F64(v) => Ok(v != 0.0),
        }
    }
}

/// Resolve identifiers against the declared input names and check builtin arity.
///
/// Dotted paths are rejected: hooks only see the inputs they declare.
pub(crate) fn bind(expr: Expr, inputs: &[&str]) -> Result<Expr, ExprError> {
    Ok(match expr {
        Expr::Lit(_) | Expr::Input(_) => expr,
        Expr::Unary { op, expr } => Expr::Unary {
            op,
            expr: Box::new(bind(*expr, inputs)?),
        },
        Expr::Binary { op, left, right } => Expr::Binary {
            op,
            left: Box::new(bind(*left, inputs)?),
            right: Box::new(bind(*right, inputs)?),
        },
        Expr::Cond {
            cond,
            then,
            otherwise,
        } => Expr::Cond {
            cond: Box::new(bind(*cond, inputs)?),
            then: Box::new(bind(*then, inputs)?),
            otherwise: Box::new(bind(*otherwise, inputs)?),
        },
        Expr::Path(path) => {
            if path.len() != 1 {
                return Err(ExprError::new(
                    0,
                    format!("'{}' is not an input of this hook", path.join(".")),
                ));
            }
            let name = path[0].as_str();
            if let Some(idx) = inputs.iter().position(|n| *n == name) {
                Expr::Input(idx)
            } else if name == "pi" {
                Expr::Lit(Lit::F64(std::f64::consts::PI))
            } else {
                return Err(ExprError::new(
                    0,
                    format!(
                        "unknown identifier '{name}' (inputs: {})",
                        inputs.join(", ")
                    ),
                ));
            }
        }
        Expr::Call { func, args } => {
            let Some((id, arity)) = BuiltinId::lookup(&func) else {
                return Err(ExprError::new(0, format!("unknown function '{func}'")));
            };
            if args.len() != arity {
                return Err(ExprError::new(
                    0,
                    format!("{func} expects {arity} args, got {}", args.len()),
                ));
            }
            let args = args
                .into_iter()
                .map(|a| bind(a, inputs))
                .collect::<Result<Vec<_>, _>>()?;
            Expr::Builtin { id, args }
        }
        Expr::Builtin { id, args } => Expr::Builtin {
            id,
            args: args
                .into_iter()
                .map(|a| bind(a, inputs))
                .collect::<Result<Vec<_>, _>>()?,
        },
    })
}

pub(crate) fn eval(expr: &Expr, inputs: &[f64]) -> Result<Value, EvalError> {
    match expr {
        Expr::Lit(Lit::F64(v)) => Ok(Value::F64(*v)),
        Expr::Lit(Lit::Bool(v)) => Ok(Value::Bool(*v)),
        Expr::Input(idx) => inputs
            .get(*idx)
            .copied()
            .map(Value::F64)
            .ok_or_else(|| EvalError::new("input slot out of range")),
        Expr::Unary { op, expr } => {
            let v = eval(expr, inputs)?;
            Ok(match op {
                UnaryOp::Neg => Value::F64(-v.as_f64()?),
                UnaryOp::Not => Value::Bool(!v.as_bool()?),
            })
        }
        Expr::Binary { op, left, right } => {
            // Short-circuit boolean operators before evaluating the right side.
            match op {
                BinaryOp::And => {
                    let l = eval(left, inputs)?.as_bool()?;
                    return Ok(Value::Bool(l && eval(right, inputs)?.as_bool()?));
                }
                BinaryOp::Or => {
                    let l = eval(left, inputs)?.as_bool()?;
                    return Ok(Value::Bool(l || eval(right, inputs)?.as_bool()?));
                }
                _ => {}
            }
            let l = eval(left, inputs)?;
            let r = eval(right, inputs)?;
            Ok(match op {
                BinaryOp::Add => Value::F64(l.as_f64()? + r.as_f64()?),
                BinaryOp::Sub => Value::F64(l.as_f64()? - r.as_f64()?),
                BinaryOp::Mul => Value::F64(l.as_f64()? * r.as_f64()?),
                BinaryOp::Div => Value::F64(l.as_f64()? / r.as_f64()?),
                BinaryOp::Mod => Value::F64(l.as_f64()? % r.as_f64()?),
                BinaryOp::Eq => Value::Bool(values_eq(l, r)?),
                BinaryOp::Ne => Value::Bool(!values_eq(l, r)?),
                BinaryOp::Lt => Value::Bool(l.as_f64()? < r.as_f64()?),
                BinaryOp::Le => Value::Bool(l.as_f64()? <= r.as_f64()?),
                BinaryOp::Gt => Value::Bool(l.as_f64()? > r.as_f64()?),
                BinaryOp::Ge => Value::Bool(l.as_f64()? >= r.as_f64()?),
                BinaryOp::And | BinaryOp::Or => unreachable!("handled above"),
            })
        }
        Expr::Cond {
            cond,
            then,
            otherwise,
        } => {
            if eval(cond, inputs)?.as_bool()? {
                eval(then, inputs)
            } else {
                eval(otherwise, inputs)
            }
        }
        Expr::Builtin { id, args } => {
            let mut vals = [0.0f64; 3];
            for (slot, a) in vals.iter_mut().zip(args) {
                *slot = eval(a, inputs)?.as_f64()?;
            }
            Ok(Value::F64(call_builtin(*id, vals)))
        }
        Expr::Path(p) => Err(EvalError::new(format!(
            "unbound identifier '{}'",
            p.join(".")
        ))),
        Expr::Call { func, .. } => Err(EvalError::new(format!("unbound call '{func}'"))),
    }
}

fn values_eq(a: Value, b: Value) -> Result<bool, EvalError> {
    match (a, b) {
        (Value::Bool(a), Value::Bool(b)) => Ok(a == b),
        (a, b) => Ok(a.as_f64()? == b.as_f64()?),
    }
}

fn call_builtin(id: BuiltinId, a: [f64; 3]) -> f64 {
    match id {
        BuiltinId::Min => a[0].min(a[1]),
        BuiltinId::Max => a[0].max(a[1]),
        BuiltinId::Clamp => {
            if a[1] <= a[2] {
                a[0].clamp(a[1], a[2])
            } else {
                a[0].clamp(a[2], a[1])
            }
        }
        BuiltinId::Abs => a[0].abs(),
        BuiltinId::Sin => a[0].sin(),
        BuiltinId::Cos => a[0].cos(),
        BuiltinId::Tan => a[0].tan(),
        BuiltinId::Sqrt => a[0].sqrt(),
        BuiltinId::Pow => a[0].powf(a[1]),
        BuiltinId::Floor => a[0].floor(),
        BuiltinId::Ceil => a[0].ceil(),
        BuiltinId::Round => a[0].round(),
        BuiltinId::Lerp => crate::foundation::math::lerp(a[0], a[1], a[2]),
        BuiltinId::Smoothstep => crate::foundation::math::smoothstep(a[0], a[1], a[2]),
    }
}

#[cfg(test)]
#[path = "../../tests/unit/expression/eval.rs"]
mod tests;
