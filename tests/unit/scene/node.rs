use serde_json::json;

use super::*;

fn build(v: serde_json::Value) -> Node {
    let decl = NodeDecl::from_json(&v).unwrap();
    Node::build(&decl, &NodeFactory::default(), 1)
}

#[test]
fn group_is_inferred_from_scenes() {
    let d = NodeDecl::from_json(&json!({
        "id": "g",
        "scenes": [
            {"id": "a"},
            {"id": "b", "skip": true},
            {"id": "c", "scenes": []},
            42
        ]
    }))
    .unwrap();
    assert!(d.is_group());
    assert_eq!(d.ids(), vec!["g", "a", "c"]);
    assert!(!d.object.contains_key("scenes"));

    let d = NodeDecl::from_json(&json!({"type": "scene", "js": "clear"})).unwrap();
    assert_eq!(d.kind, NodeDeclKind::Scene { js: "clear".into() });
    assert!(NodeDecl::from_json(&json!({"type": "timer"})).is_err());
}

#[test]
fn build_applies_declared_properties() {
    let n = build(json!({
        "id": "s1",
        "x": 10,
        "width": "height",
        "units": "pix",
        "sources": "seq1",
        "mix_ratio": 0.25,
        "fill": "#00ff00",
        "_note": "ignored"
    }));
    assert_eq!(n.id(), Some("s1"));
    assert_eq!(n.marker(), 1);
    assert_eq!(n.get_property("x"), Some(PropValue::Number(10.0)));
    assert_eq!(n.get_property("width"), Some(PropValue::Str("height".into())));
    assert_eq!(n.get_property("units"), Some(PropValue::Str("pix".into())));
    let s = n.as_scene().unwrap();
    assert_eq!(s.sources, vec!["seq1".to_owned()]);
    assert_eq!(s.mix_ratio, 0.25);
    assert!(matches!(s.options.get("fill"), Some(PropValue::Color(c)) if c.g == 1.0));
}

#[test]
fn invalid_values_keep_defaults() {
    let n = build(json!({"id": "s", "rotation": "fast", "volume": -1, "bogus": 1}));
    assert_eq!(n.get_property("rotation"), Some(PropValue::Number(0.0)));
    assert_eq!(n.get_property("volume"), Some(PropValue::Number(1.0)));
    assert_eq!(n.prop_type("bogus"), None);
}

#[test]
fn unknown_module_leaves_an_inert_scene() {
    let n = build(json!({"id": "s", "js": "missing.js", "x": 5}));
    let s = n.as_scene().unwrap();
    assert!(s.module().is_none());
    assert_eq!(s.js(), "missing.js");
    assert_eq!(n.get_property("x"), Some(PropValue::Number(5.0)));
}

#[test]
fn id_and_js_are_not_writable() {
    let mut n = build(json!({"id": "s"}));
    assert!(n.set_property("id", PropValue::Str("t".into())).is_err());
    assert!(n.set_property("js", PropValue::Str("clear".into())).is_err());
    assert_eq!(n.id(), Some("s"));
}

#[test]
fn module_options_are_typed_properties() {
    let mut n = build(json!({"id": "s"}));
    assert_eq!(n.prop_type("fill"), Some(PropType::Color));
    assert!(n.set_property("fill", PropValue::Str("red".into())).is_err());
    n.set_property("fill", PropValue::Color(Color::WHITE)).unwrap();
    assert_eq!(n.get_property("fill"), Some(PropValue::Color(Color::WHITE)));
    assert!(n.property_names().contains(&"shape".to_owned()));
    assert!(!n.property_names().contains(&"js".to_owned()));
}

#[test]
fn mix_creates_and_updates_a_transition() {
    let mut n = build(json!({"id": "s", "mix": {"id": "m", "type": "fade", "color": "white"}}));
    let t = n.as_scene().unwrap().mix.as_ref().unwrap();
    assert_eq!(t.id(), Some("m"));
    assert_eq!(t.module().name(), "fade");

    n.set_property("mix", PropValue::Str("swipe".into())).unwrap();
    assert_eq!(n.as_scene().unwrap().mix.as_ref().unwrap().module().name(), "swipe");
    n.set_property("mix", PropValue::Str(String::new())).unwrap();
    assert!(n.as_scene().unwrap().mix.is_none());
}

#[test]
fn group_properties_validate() {
    let mut n = build(json!({
        "id": "g",
        "scenes": [],
        "opacity": 0.5,
        "offscreen": "dual",
        "use": "other",
        "use_depth": 3
    }));
    let g = n.as_group().unwrap();
    assert_eq!(g.offscreen, OffscreenMode::Dual);
    assert_eq!(g.use_id.as_deref(), Some("other"));
    assert_eq!(g.use_depth, 3);
    assert!(g.renders_offscreen());

    assert!(n.set_property("offscreen", PropValue::Str("blur".into())).is_err());
    assert!(n.set_property("scaler", PropValue::Number(0.5)).is_err());
    assert!(n.set_property("use_depth", PropValue::Number(1.5)).is_err());
    n.set_property("opacity", PropValue::Number(4.0)).unwrap();
    assert_eq!(n.as_group().unwrap().opacity, 1.0);
    n.set_property("use", PropValue::Str(" ".into())).unwrap();
    assert!(n.as_group().unwrap().use_id.is_none());
    assert_eq!(n.prop_type("fill"), None);
}
