use serde_json::json;

use super::*;

fn space() -> ReferenceSpace {
    ReferenceSpace::new(200.0, 100.0)
}

fn pix() -> NodeTransform {
    NodeTransform {
        units: Units::Pix,
        ..NodeTransform::default()
    }
}

fn close(a: Point, b: Point) -> bool {
    (a.x - b.x).abs() < 1e-9 && (a.y - b.y).abs() < 1e-9
}

#[test]
fn translate_is_applied_last() {
    let mut tf = pix();
    tf.set("x", PropValue::Number(10.0)).unwrap();
    tf.set("y", PropValue::Number(20.0)).unwrap();
    tf.set("hscale", PropValue::Number(2.0)).unwrap();
    let rc = tf.resolve(space()).unwrap();
    let m = tf.local_matrix(&rc, space());
    assert!(close(m * Point::new(1.0, 1.0), Point::new(12.0, 21.0)));
}

#[test]
fn rotation_pivots_on_centre() {
    let mut tf = pix();
    tf.set("rotation", PropValue::Number(90.0)).unwrap();
    tf.set("cx", PropValue::Number(10.0)).unwrap();
    let rc = tf.resolve(space()).unwrap();
    let m = tf.local_matrix(&rc, space());
    assert!(close(m * Point::new(10.0, 0.0), Point::new(10.0, 0.0)));
    // Counter-clockwise with y up.
    assert!(close(m * Point::new(20.0, 0.0), Point::new(10.0, 10.0)));
}

#[test]
fn relative_units_scale_with_space() {
    let mut tf = NodeTransform::default();
    tf.set("x", PropValue::Number(50.0)).unwrap();
    tf.set("y", PropValue::Number(-50.0)).unwrap();
    tf.set("cx", PropValue::Number(0.0)).unwrap();
    let rc = tf.resolve(space()).unwrap();
    assert_eq!((rc.x, rc.y), (100.0, -50.0));
    assert_eq!((rc.width, rc.height), (200.0, 100.0));
}

#[test]
fn coordinate_cycles_are_rejected_and_leave_state() {
    let mut tf = pix();
    tf.set("width", PropValue::Str("height".into())).unwrap();
    assert!(tf.set("height", PropValue::Str("width".into())).is_err());
    assert_eq!(tf.get("height"), Some(PropValue::Number(-1.0)));
    assert_eq!(tf.get("width"), Some(PropValue::Str("height".into())));
}

#[test]
fn non_finite_numbers_are_rejected() {
    let mut tf = pix();
    assert!(tf.set("rotation", PropValue::Number(f64::NAN)).is_err());
    assert!(tf.set("units", PropValue::Str("furlongs".into())).is_err());
}

#[test]
fn mxjs_appends_a_matrix() {
    let mut tf = pix();
    tf.set("mxjs", PropValue::Json(json!({"tx": "t * 10", "ty": "ref_height / 2"})))
        .unwrap();
    let rc = tf.resolve(space()).unwrap();
    let hm = tf.eval_hook(2.0, &rc, space(), Some("n")).unwrap();
    assert!(close(hm * Point::ORIGIN, Point::new(20.0, 50.0)));
    assert!(matches!(tf.get("mxjs"), Some(PropValue::Json(_))));
}

#[test]
fn mxjs_can_switch_a_node_off() {
    let mut tf = pix();
    tf.set("mxjs", PropValue::Json(json!({"active": "t < 1"}))).unwrap();
    let rc = tf.resolve(space()).unwrap();
    assert!(tf.eval_hook(0.5, &rc, space(), None).is_some());
    assert!(tf.eval_hook(2.0, &rc, space(), None).is_none());
}

#[test]
fn mxjs_rejects_unknown_outputs_and_inputs() {
    let mut tf = pix();
    assert!(tf.set("mxjs", PropValue::Json(json!({"skew": "1"}))).is_err());
    assert!(tf.set("mxjs", PropValue::Json(json!({"tx": "frame"}))).is_err());
    assert!(!tf.has_mxjs());
    tf.set("mxjs", PropValue::Json(json!({"tx": "1"}))).unwrap();
    tf.set("mxjs", PropValue::Str(String::new())).unwrap();
    assert!(!tf.has_mxjs());
}

#[test]
fn explicit_size_needs_both_dimensions() {
    let mut tf = pix();
    assert!(!tf.has_explicit_size());
    tf.set("width", PropValue::Number(10.0)).unwrap();
    assert!(!tf.has_explicit_size());
    tf.set("height", PropValue::Str("width".into())).unwrap();
    assert!(tf.has_explicit_size());
}
