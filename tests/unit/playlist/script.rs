use chrono::{TimeZone, Utc};
use serde_json::json;

use super::*;
use crate::props::PropertyHost;
use crate::scene::{NodeDecl, NodeFactory, SceneGraph};

fn clock(now: f64, frame: u64) -> Clock {
    Clock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()).at(now, frame)
}

fn graph() -> SceneGraph {
    let decl = NodeDecl::from_json(&json!({"id": "s1", "units": "pix"})).unwrap();
    let mut g = SceneGraph::new(NodeFactory::default());
    g.apply_roots(&[decl]);
    g
}

#[test]
fn parses_targets_and_expressions() {
    let d = ScriptDecl::from_json(&json!({"id": "sc", "script": {"s1@x": "t * 10", "s1@active": "frame < 3"}}))
        .unwrap();
    assert_eq!(d.id.as_deref(), Some("sc"));
    assert_eq!(d.entries.len(), 2);
    assert!(d.entries.iter().any(|(t, _)| t.property == "active"));
}

#[test]
fn rejects_bad_targets_and_unknown_inputs() {
    assert!(ScriptDecl::from_json(&json!({"script": {"s1": "t"}})).is_err());
    assert!(ScriptDecl::from_json(&json!({"script": {"s1@x": "ratio"}})).is_err());
    assert!(ScriptDecl::from_json(&json!({"id": "sc"})).is_err());
}

#[test]
fn run_writes_numbers_and_flags() {
    let mut g = graph();
    let d = ScriptDecl::from_json(&json!({"script": {"s1@x": "t * 10", "s1@active": "frame < 3"}}))
        .unwrap();
    let mut s = Script::new(d);
    assert_eq!(s.run(&clock(1.5, 5), &mut g), 2);
    let n = g.by_id("s1").unwrap();
    assert_eq!(n.get_property("x"), Some(PropValue::Number(15.0)));
    assert_eq!(n.get_property("active"), Some(PropValue::Bool(false)));
}

#[test]
fn failing_writes_leave_targets_unchanged() {
    let mut g = graph();
    let d = ScriptDecl::from_json(&json!({"script": {"s1@units": "t", "nope@x": "1", "s1@y": "t / 0"}}))
        .unwrap();
    let mut s = Script::new(d);
    assert_eq!(s.run(&clock(1.0, 1), &mut g), 0);
    assert_eq!(s.run(&clock(2.0, 2), &mut g), 0);
    assert_eq!(
        g.by_id("s1").unwrap().get_property("y"),
        Some(PropValue::Number(0.0))
    );
}
