use serde_json::json;

use super::*;

fn obj(v: serde_json::Value) -> Object {
    v.as_object().unwrap().clone()
}

#[test]
fn defaults_match_documented_values() {
    let c = MixerConfig::default();
    assert_eq!((c.width, c.height), (1920, 1080));
    assert_eq!(c.fps, 25.0);
    assert!(!c.live);
    assert_eq!(c.maxdepth, 100);
    assert_eq!(c.wait_timeout_ms, 1000);
    assert_eq!(c.prefetch_ms, 500);
    assert_eq!(c.back_color, Color::BLACK);
    assert_eq!(c.reload_timeout, 1.0);
    c.validate().unwrap();
}

#[test]
fn playlist_config_overrides_fields() {
    let mut c = MixerConfig::default();
    c.apply_object(&obj(json!({
        "width": 640, "height": 360, "fps": 30, "live": true, "maxdepth": 5,
        "back_color": "white", "reload_tests": ["a.json", "b.json"], "reload_loop": 2,
        "_comment": "ignored"
    })));
    assert_eq!((c.width, c.height), (640, 360));
    assert_eq!(c.fps, 30.0);
    assert!(c.live);
    assert_eq!(c.maxdepth, 5);
    assert_eq!(c.back_color, Color::WHITE);
    assert_eq!(c.reload_tests, vec!["a.json", "b.json"]);
    assert_eq!(c.reload_loop, 2);
}

#[test]
fn invalid_and_unknown_entries_are_ignored() {
    let mut c = MixerConfig::default();
    c.apply_object(&obj(json!({
        "width": 0, "height": -4, "fps": "fast", "back_color": "nope", "volume": 3,
        "maxdepth": 2.5
    })));
    assert_eq!(c, MixerConfig::default());
}

#[test]
fn scheduler_settings_follow_config() {
    let c = MixerConfig {
        fps: 50.0,
        prefetch_ms: 250,
        width: 320,
        height: 240,
        ..MixerConfig::default()
    };
    let s = c.scheduler();
    assert_eq!(s.prefetch, 0.25);
    assert_eq!(s.frame_dur, 0.02);
    assert_eq!((s.width, s.height), (320, 240));
    assert!(MixerConfig { fps: 0.0, ..c }.validate().is_err());
}
