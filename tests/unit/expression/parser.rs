use super::*;

#[test]
fn parses_arithmetic_precedence() {
    let e = parse_expr("1+2*3").unwrap();
    match e {
        Expr::Binary {
            op: BinaryOp::Add,
            right,
            ..
        } => assert!(matches!(
            *right,
            Expr::Binary {
                op: BinaryOp::Mul,
                ..
            }
        )),
        other => panic!("unexpected ast: {other:?}"),
    }
}

#[test]
fn subtraction_is_left_associative() {
    let e = parse_expr("8-4-2").unwrap();
    match e {
        Expr::Binary {
            op: BinaryOp::Sub,
            left,
            right,
        } => {
            assert!(matches!(*left, Expr::Binary { .. }));
            assert_eq!(*right, Expr::Lit(Lit::F64(2.0)));
        }
        other => panic!("unexpected ast: {other:?}"),
    }
}

#[test]
fn parses_ternary_and_calls() {
    let e = parse_expr("ratio < 0.5 ? min(ratio, 1) : 1").unwrap();
    match e {
        Expr::Cond { then, .. } => match *then {
            Expr::Call { func, args } => {
                assert_eq!(func, "min");
                assert_eq!(args.len(), 2);
            }
            other => panic!("unexpected then branch: {other:?}"),
        },
        other => panic!("unexpected ast: {other:?}"),
    }
}

#[test]
fn parses_dotted_paths() {
    assert_eq!(
        parse_expr("scene.x").unwrap(),
        Expr::Path(vec!["scene".to_owned(), "x".to_owned()])
    );
}

#[test]
fn rejects_trailing_garbage() {
    assert!(parse_expr("1 2").is_err());
    assert!(parse_expr("(1").is_err());
    assert!(parse_expr("a ? 1").is_err());
}
