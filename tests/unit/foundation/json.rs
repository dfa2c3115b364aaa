use super::*;

fn obj(v: Value) -> Object {
    v.as_object().cloned().unwrap()
}

#[test]
fn typed_readers_apply_defaults() {
    let o = obj(serde_json::json!({ "a": "x", "n": 2, "b": true, "z": null }));
    assert_eq!(opt_str(&o, "a").unwrap().as_deref(), Some("x"));
    assert_eq!(opt_str(&o, "z").unwrap(), None);
    assert_eq!(str_or(&o, "missing", "d").unwrap(), "d");
    assert_eq!(f64_or(&o, "n", 0.0).unwrap(), 2.0);
    assert_eq!(f64_or(&o, "missing", 7.0).unwrap(), 7.0);
    assert!(bool_or(&o, "b", false).unwrap());
    assert!(bool_or(&o, "n", false).unwrap());
    assert!(f64_or(&o, "a", 0.0).is_err());
    assert!(opt_str(&o, "n").is_err());
}

#[test]
fn string_lists_accept_single_values() {
    let o = obj(serde_json::json!({ "one": "a", "many": ["a", "b"], "bad": [1] }));
    assert_eq!(str_list(&o, "one").unwrap(), ["a"]);
    assert_eq!(str_list(&o, "many").unwrap(), ["a", "b"]);
    assert!(str_list(&o, "missing").unwrap().is_empty());
    assert!(str_list(&o, "bad").is_err());
}

#[test]
fn skip_flag_truthiness() {
    assert!(is_skipped(&obj(serde_json::json!({ "skip": true }))));
    assert!(is_skipped(&obj(serde_json::json!({ "skip": 1 }))));
    assert!(!is_skipped(&obj(serde_json::json!({ "skip": false }))));
    assert!(!is_skipped(&obj(serde_json::json!({}))));
}
