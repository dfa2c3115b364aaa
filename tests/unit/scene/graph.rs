use serde_json::json;

use super::*;
use crate::props::{PropTarget, PropValue, graph_read, graph_write};

fn decls(v: serde_json::Value) -> Vec<NodeDecl> {
    v.as_array()
        .unwrap()
        .iter()
        .map(|d| NodeDecl::from_json(d).unwrap())
        .collect()
}

fn loaded(v: serde_json::Value) -> SceneGraph {
    let mut g = SceneGraph::new(NodeFactory::default());
    g.apply_roots(&decls(v));
    g
}

#[test]
fn initial_apply_adds_everything() {
    let mut g = SceneGraph::new(NodeFactory::default());
    let changes = g.apply_roots(&decls(json!([
        {"id": "s1"},
        {"id": "g1", "scenes": [{"id": "s2"}, {}]}
    ])));
    assert_eq!(changes.added.len(), 4);
    assert!(changes.removed.is_empty());
    assert_eq!(g.len(), 4);
    assert_eq!(g.roots().len(), 2);
    let group = g.by_id("g1").unwrap().as_group().unwrap();
    assert_eq!(group.children().len(), 2);
    assert_eq!(g.walk_order().len(), 4);
}

#[test]
fn reload_updates_matched_nodes_in_place() {
    let mut g = loaded(json!([{"id": "s1", "x": 0, "y": 5}, {"id": "s2"}]));
    let marker = g.by_id("s1").unwrap().marker();
    let h = g.handle("s1").unwrap();

    let changes = g.apply_roots(&decls(json!([{"id": "s1", "x": 25, "y": 5}, {"id": "s2"}])));
    assert_eq!(changes.updated, vec![("s1".to_owned(), vec!["x".to_owned()])]);
    assert!(changes.added.is_empty());
    assert!(changes.removed.is_empty());
    assert_eq!(g.handle("s1"), Some(h));
    let s1 = g.by_id("s1").unwrap();
    assert_eq!(s1.marker(), marker);
    assert_eq!(s1.get_property("x"), Some(PropValue::Number(25.0)));
}

#[test]
fn omitted_properties_revert_to_defaults() {
    let mut g = loaded(json!([{"id": "s1", "rotation": 45}]));
    let changes = g.apply_roots(&decls(json!([{"id": "s1"}])));
    assert_eq!(changes.updated, vec![("s1".to_owned(), vec!["rotation".to_owned()])]);
    assert_eq!(g.by_id("s1").unwrap().transform.rotation, 0.0);
}

#[test]
fn anonymous_nodes_are_rebuilt() {
    let mut g = loaded(json!([{"x": 1}]));
    let before = g.get(g.roots()[0]).unwrap().marker();
    let changes = g.apply_roots(&decls(json!([{"x": 1}])));
    assert_eq!(changes.added, vec![None]);
    assert_eq!(changes.removed, vec![None]);
    assert_ne!(g.get(g.roots()[0]).unwrap().marker(), before);
    assert_eq!(g.len(), 1);
}

#[test]
fn absent_nodes_are_removed_with_their_surfaces() {
    let mut g = loaded(json!([{"id": "s1"}, {"id": "g1", "scenes": [{"id": "s2"}]}]));
    let gh = g.handle("g1").unwrap();
    g.surfaces.insert(gh, crate::render::CpuCanvas::new(2, 2).unwrap());

    let changes = g.apply_roots(&decls(json!([{"id": "s1"}])));
    assert_eq!(changes.removed.len(), 2);
    assert!(changes.removed.contains(&Some("g1".to_owned())));
    assert!(g.handle("g1").is_none());
    assert!(g.handle("s2").is_none());
    assert!(g.get(gh).is_none());
    assert!(g.surfaces.is_empty());
    assert_eq!(g.len(), 1);
}

#[test]
fn changed_js_recreates_the_node() {
    let mut g = loaded(json!([{"id": "s1"}]));
    let marker = g.by_id("s1").unwrap().marker();
    let changes = g.apply_roots(&decls(json!([{"id": "s1", "js": "clear"}])));
    assert_eq!(changes.recreated, vec!["s1".to_owned()]);
    assert!(changes.removed.is_empty());
    let s1 = g.by_id("s1").unwrap();
    assert_ne!(s1.marker(), marker);
    assert_eq!(s1.as_scene().unwrap().js(), "clear");
}

#[test]
fn nodes_keep_identity_when_moved_into_a_group() {
    let mut g = loaded(json!([{"id": "s1"}]));
    let marker = g.by_id("s1").unwrap().marker();
    g.apply_roots(&decls(json!([{"id": "g1", "scenes": [{"id": "s1"}]}])));
    assert_eq!(g.by_id("s1").unwrap().marker(), marker);
    assert_eq!(g.roots().len(), 1);
}

#[test]
fn duplicate_ids_leave_later_nodes_anonymous() {
    let g = loaded(json!([{"id": "s1", "x": 1}, {"id": "s1", "x": 2}]));
    assert_eq!(g.len(), 2);
    assert_eq!(g.by_id("s1").unwrap().transform.coords.x, crate::units::Coord::Value(1.0));
    let second = g.get(g.roots()[1]).unwrap();
    assert_eq!(second.id(), None);
}

#[test]
fn freed_slots_are_reused() {
    let mut g = loaded(json!([{"id": "a"}, {"id": "b"}]));
    let hb = g.handle("b").unwrap();
    g.apply_roots(&decls(json!([{"id": "a"}])));
    g.add_root(&NodeDecl::from_json(&json!({"id": "c"})).unwrap());
    assert_eq!(g.handle("c"), Some(hb));
}

#[test]
fn property_graph_reaches_nodes_and_mix_transitions() {
    let mut g = loaded(json!([
        {"id": "s1", "sources": ["a", "b"], "mix": {"id": "m1", "type": "mix"}}
    ]));
    let t = PropTarget::parse("s1@mix_ratio").unwrap();
    graph_write(&mut g, &t, PropValue::Number(0.75)).unwrap();
    assert_eq!(graph_read(&g, &t), Some(PropValue::Number(0.75)));

    let dur = PropTarget::parse("m1@dur").unwrap();
    graph_write(&mut g, &dur, PropValue::Number(3.0)).unwrap();
    assert_eq!(g.transition("m1").unwrap().dur(), 3.0);

    let bad = PropTarget::parse("s1@x").unwrap();
    assert!(graph_write(&mut g, &bad, PropValue::Bool(true)).is_err());
    assert!(graph_write(&mut g, &PropTarget::parse("nope@x").unwrap(), PropValue::Number(1.0)).is_err());
}
