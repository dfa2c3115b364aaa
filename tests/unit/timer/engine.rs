use std::collections::BTreeMap;

use chrono::{TimeZone, Utc};

use super::*;
use crate::foundation::core::Color;
use crate::foundation::error::{AvmixError, AvmixResult};
use crate::props::{PropType, PropertyHost};

#[derive(Default)]
struct Node {
    x: f64,
    fill: Option<Color>,
    list: Vec<f64>,
}

impl PropertyHost for Node {
    fn prop_type(&self, name: &str) -> Option<PropType> {
        match name {
            "x" => Some(PropType::Number),
            "fill" => Some(PropType::Color),
            "list" => Some(PropType::NumberArray),
            _ => None,
        }
    }

    fn get_property(&self, name: &str) -> Option<PropValue> {
        match name {
            "x" => Some(PropValue::Number(self.x)),
            "fill" => self.fill.map(PropValue::Color),
            "list" => Some(PropValue::Array(
                self.list.iter().map(|v| PropValue::Number(*v)).collect(),
            )),
            _ => None,
        }
    }

    fn set_property(&mut self, name: &str, value: PropValue) -> AvmixResult<()> {
        match (name, value) {
            ("x", PropValue::Number(v)) => self.x = v,
            ("fill", PropValue::Color(c)) => self.fill = Some(c),
            ("list", PropValue::Array(items)) => {
                self.list = items.iter().filter_map(PropValue::as_f64).collect();
            }
            _ => return Err(AvmixError::update("bad write")),
        }
        Ok(())
    }
}

#[derive(Default)]
struct Graph {
    nodes: BTreeMap<String, Node>,
}

impl Graph {
    fn with(ids: &[&str]) -> Self {
        Self {
            nodes: ids.iter().map(|i| (i.to_string(), Node::default())).collect(),
        }
    }

    fn x(&self, id: &str) -> f64 {
        self.nodes[id].x
    }
}

impl PropertyGraph for Graph {
    fn host(&self, id: &str) -> Option<&dyn PropertyHost> {
        self.nodes.get(id).map(|n| n as &dyn PropertyHost)
    }

    fn host_mut(&mut self, id: &str) -> Option<&mut dyn PropertyHost> {
        self.nodes.get_mut(id).map(|n| n as &mut dyn PropertyHost)
    }
}

fn clock(now: f64) -> Clock {
    Clock::new(Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap()).at(now, 0)
}

fn timer(v: serde_json::Value) -> Timer {
    Timer::new(TimerDecl::from_json(&v).unwrap(), &clock(0.0))
}

#[test]
fn state_machine_runs_to_freeze() {
    let mut g = Graph::with(&["s1"]);
    let mut t = timer(serde_json::json!({
        "id": "t1", "start": 1, "dur": 2, "keys": [0, 1],
        "anims": [{ "values": [0, 10], "targets": ["s1@x"] }]
    }));
    assert_eq!(t.state(), TimerState::Armed);
    t.tick(&clock(0.5), &mut g);
    assert_eq!(t.state(), TimerState::Armed);
    assert_eq!(g.x("s1"), 0.0);

    t.tick(&clock(2.0), &mut g);
    assert_eq!(t.state(), TimerState::Running);
    assert!((g.x("s1") - 5.0).abs() < 1e-9);

    t.tick(&clock(3.5), &mut g);
    assert_eq!(t.state(), TimerState::Terminal(EndPolicy::Freeze));
    assert_eq!(g.x("s1"), 10.0);
}

#[test]
fn inactive_start_stays_idle() {
    let mut g = Graph::with(&["s1"]);
    let mut t = timer(serde_json::json!({
        "start": -1, "keys": [0, 1],
        "anims": [{ "values": [0, 10], "targets": ["s1@x"] }]
    }));
    t.tick(&clock(100.0), &mut g);
    assert_eq!(t.state(), TimerState::Idle);
    assert_eq!(g.x("s1"), 0.0);
}

#[test]
fn restore_writes_back_snapshot() {
    let mut g = Graph::with(&["s1"]);
    g.nodes.get_mut("s1").unwrap().x = 42.0;
    let mut t = timer(serde_json::json!({
        "dur": 1, "keys": [0, 0.5, 1],
        "anims": [{ "values": [0, 100, 50], "end": "restore", "targets": ["s1@x"] }]
    }));
    t.tick(&clock(0.25), &mut g);
    assert!((g.x("s1") - 50.0).abs() < 1e-9);
    t.tick(&clock(5.0), &mut g);
    assert_eq!(t.state(), TimerState::Terminal(EndPolicy::Restore));
    assert_eq!(g.x("s1"), 42.0);

    // Further ticks leave the restored value alone.
    t.tick(&clock(6.0), &mut g);
    assert_eq!(g.x("s1"), 42.0);
}

#[test]
fn stop_ends_looping_timer() {
    let mut g = Graph::with(&["s1"]);
    let mut t = timer(serde_json::json!({
        "dur": 1, "loop": true, "stop": 10, "keys": [0, 1],
        "anims": [{ "values": [0, 1], "targets": ["s1@x"] }]
    }));
    for i in 0..100 {
        t.tick(&clock(f64::from(i) * 0.1), &mut g);
        assert_eq!(t.state(), TimerState::Running);
    }
    t.tick(&clock(10.0), &mut g);
    assert_eq!(t.state(), TimerState::Terminal(EndPolicy::Freeze));
}

#[test]
fn looping_timer_without_stop_never_ends() {
    let mut g = Graph::with(&["s1"]);
    let mut t = timer(serde_json::json!({
        "dur": 1, "loop": -1, "keys": [0, 1],
        "anims": [{ "values": [0, 1], "targets": ["s1@x"] }]
    }));
    for i in 0..1000 {
        t.tick(&clock(f64::from(i) * 0.37), &mut g);
    }
    assert_eq!(t.state(), TimerState::Running);
}

#[test]
fn repeat_count_bounds_iterations() {
    let mut g = Graph::with(&["s1"]);
    let mut t = timer(serde_json::json!({
        "dur": 1, "loop": 1, "keys": [0, 1],
        "anims": [{ "values": [0, 1], "targets": ["s1@x"] }]
    }));
    t.tick(&clock(1.5), &mut g);
    assert_eq!(t.state(), TimerState::Running);
    assert!((g.x("s1") - 0.5).abs() < 1e-9);
    t.tick(&clock(2.0), &mut g);
    assert_eq!(t.state(), TimerState::Terminal(EndPolicy::Freeze));
}

#[test]
fn missing_target_does_not_stop_others() {
    let mut g = Graph::with(&["s1"]);
    let mut t = timer(serde_json::json!({
        "dur": 2, "keys": [0, 1],
        "anims": [{ "values": [0, 10], "targets": ["ghost@x", "s1@x"] }]
    }));
    t.tick(&clock(1.0), &mut g);
    assert!((g.x("s1") - 5.0).abs() < 1e-9);
}

fn anim(v: serde_json::Value) -> AnimationDecl {
    AnimationDecl::from_json(&v, None).unwrap()
}

#[test]
fn discrete_snaps_to_nearest_key() {
    let a = anim(serde_json::json!({ "values": [0, 10], "mode": "discrete", "targets": ["a@x"] }));
    assert_eq!(sample(&[0.0, 1.0], &a, 0.4), Some(PropValue::Number(0.0)));
    assert_eq!(sample(&[0.0, 1.0], &a, 0.6), Some(PropValue::Number(10.0)));
}

#[test]
fn hook_mode_and_postfun() {
    let a = anim(serde_json::json!({
        "values": [0, 10], "mode": "ratio * ratio", "postfun": "value + 1", "targets": ["a@x"]
    }));
    assert_eq!(sample(&[0.0, 1.0], &a, 0.5), Some(PropValue::Number(3.5)));
}

#[test]
fn broken_hooks_fall_back_to_linear() {
    let a = anim(serde_json::json!({
        "values": [0, 10], "mode": "ratio *", "postfun": "nope(value)", "targets": ["a@x"]
    }));
    assert_eq!(a.mode, AnimMode::Linear);
    assert!(a.postfun.is_none());
    assert_eq!(sample(&[0.0, 1.0], &a, 0.5), Some(PropValue::Number(5.0)));
}

#[test]
fn angle_values_become_radians() {
    let a = anim(serde_json::json!({ "values": [0, 180], "angle": true, "targets": ["a@x"] }));
    let Some(PropValue::Number(v)) = sample(&[0.0, 1.0], &a, 0.5) else {
        panic!("expected number");
    };
    assert!((v - std::f64::consts::FRAC_PI_2).abs() < 1e-12);
}

#[test]
fn color_values_interpolate_componentwise() {
    let a = anim(serde_json::json!({
        "values": ["black", "white"], "color": true, "targets": ["a@fill"]
    }));
    let Some(PropValue::Color(c)) = sample(&[0.0, 1.0], &a, 0.5) else {
        panic!("expected color");
    };
    assert!((c.r - 0.5).abs() < 1e-6);
    assert!((c.a - 1.0).abs() < 1e-6);
}

#[test]
fn postfun_applies_to_color_channels() {
    let a = anim(serde_json::json!({
        "values": ["#000000", "#ffffff"], "color": true, "postfun": "0", "targets": ["a@fill"]
    }));
    assert_eq!(
        sample(&[0.0, 1.0], &a, 0.5),
        Some(PropValue::Color(Color::rgba(0.0, 0.0, 0.0, 1.0)))
    );
}

#[test]
fn postfun_applies_to_each_array_element() {
    let a = anim(serde_json::json!({
        "values": [[0, 0], [10, 20]], "postfun": "value * 2", "targets": ["a@list"]
    }));
    assert_eq!(
        sample(&[0.0, 1.0], &a, 0.5),
        Some(PropValue::Array(vec![PropValue::Number(10.0), PropValue::Number(20.0)]))
    );
}

#[test]
fn indexed_targets_write_array_elements() {
    let mut g = Graph::with(&["s1"]);
    g.nodes.get_mut("s1").unwrap().list = vec![1.0, 2.0, 3.0];
    let mut t = timer(serde_json::json!({
        "dur": 1, "keys": [0, 1],
        "anims": [{ "values": [10, 20], "targets": ["s1@list[1]"] }]
    }));
    t.tick(&clock(0.5), &mut g);
    assert_eq!(g.nodes["s1"].list, [1.0, 15.0, 3.0]);
}

#[test]
fn declaration_errors() {
    assert!(TimerDecl::from_json(&serde_json::json!({ "keys": [] })).is_err());
    assert!(TimerDecl::from_json(&serde_json::json!({ "keys": [0.5, 0.2] })).is_err());
    assert!(TimerDecl::from_json(&serde_json::json!({ "keys": [0, 2] })).is_err());
    assert!(
        TimerDecl::from_json(&serde_json::json!({
            "keys": [0, 1], "anims": [{ "values": [1], "targets": ["a@x"] }]
        }))
        .is_err()
    );
    assert!(
        TimerDecl::from_json(&serde_json::json!({
            "keys": [0, 1], "anims": [{ "values": [1, 2], "end": "loop", "targets": ["a@x"] }]
        }))
        .is_err()
    );
}
