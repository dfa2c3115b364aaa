use super::*;

#[test]
fn ratio_hook_remaps_and_clamps() {
    let h = Hook::compile("ratio * ratio", RATIO_INPUTS).unwrap();
    assert_eq!(h.remap_ratio(0.5).unwrap(), 0.25);
    let h = Hook::compile("ratio * 4", RATIO_INPUTS).unwrap();
    assert_eq!(h.remap_ratio(0.5).unwrap(), 1.0);
}

#[test]
fn hooks_cannot_see_undeclared_state() {
    assert!(Hook::compile("value + 1", RATIO_INPUTS).is_err());
    assert!(Hook::compile("value + ratio", POSTFUN_INPUTS).is_ok());
}

#[test]
fn input_count_is_checked() {
    let h = Hook::compile("value", POSTFUN_INPUTS).unwrap();
    assert!(h.eval(&[1.0]).is_err());
    assert_eq!(h.eval_f64(&[1.0, 0.0]).unwrap(), 1.0);
}

#[test]
fn non_finite_results_are_errors() {
    let h = Hook::compile("1 / ratio", RATIO_INPUTS).unwrap();
    assert!(h.eval_f64(&[0.0]).is_err());
}

#[test]
fn hook_map_validates_outputs() {
    let obj = serde_json::json!({ "rotation": "t * 10", "active": "t < 5" });
    let map = HookMap::compile(
        obj.as_object().unwrap(),
        MATRIX_INPUTS,
        Some(&["active", "rotation"]),
    )
    .unwrap();
    assert_eq!(map.get("rotation").unwrap().source(), "t * 10");

    let bad = serde_json::json!({ "opacity": "1" });
    assert!(HookMap::compile(bad.as_object().unwrap(), MATRIX_INPUTS, Some(&["active"])).is_err());
}
