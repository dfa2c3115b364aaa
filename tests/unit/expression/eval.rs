use super::*;
use crate::expression::parser::parse_expr;

fn run(src: &str, names: &[&str], vals: &[f64]) -> Value {
    let e = bind(parse_expr(src).unwrap(), names).unwrap();
    eval(&e, vals).unwrap()
}

#[test]
fn evaluates_inputs_and_builtins() {
    assert_eq!(run("ratio * 2", &["ratio"], &[0.25]), Value::F64(0.5));
    assert_eq!(
        run("clamp(x, 0, 1) + max(1, 2)", &["x"], &[3.0]),
        Value::F64(3.0)
    );
    assert_eq!(run("smoothstep(0, 1, 0.5)", &[], &[]), Value::F64(0.5));
}

#[test]
fn ternary_and_short_circuit() {
    assert_eq!(
        run("t < 5 ? 1 : 2", &["t"], &[7.0]),
        Value::F64(2.0)
    );
    // The right side is never evaluated.
    assert_eq!(
        run("false && 1 / 0 > 0", &[], &[]),
        Value::Bool(false)
    );
}

#[test]
fn bind_rejects_unknown_names_and_paths() {
    assert!(bind(parse_expr("foo + 1").unwrap(), &["ratio"]).is_err());
    assert!(bind(parse_expr("scene.x").unwrap(), &["scene"]).is_err());
    assert!(bind(parse_expr("min(1)").unwrap(), &[]).is_err());
    assert!(bind(parse_expr("exec(1)").unwrap(), &[]).is_err());
}

#[test]
fn pi_constant_is_available() {
    match run("cos(pi)", &[], &[]) {
        Value::F64(v) => assert!((v + 1.0).abs() < 1e-12),
        other => panic!("unexpected {other:?}"),
    }
}
