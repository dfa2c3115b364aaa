use super::*;
use chrono::TimeZone;

fn clock() -> Clock {
    Clock::new(Utc.with_ymd_and_hms(2024, 1, 1, 12, 0, 0).unwrap())
}

#[test]
fn parses_time_values() {
    assert_eq!(TimeSpec::parse_json(&serde_json::json!(2.5)).unwrap(), TimeSpec::Offset(2.5));
    assert_eq!(TimeSpec::parse_json(&serde_json::json!(-1)).unwrap(), TimeSpec::Inactive);
    assert_eq!(TimeSpec::parse_json(&serde_json::json!("NOW")).unwrap(), TimeSpec::Now);
    assert_eq!(TimeSpec::parse_json(&serde_json::json!("3")).unwrap(), TimeSpec::Offset(3.0));
    assert!(matches!(
        TimeSpec::parse_json(&serde_json::json!("2024-01-01T12:00:10Z")).unwrap(),
        TimeSpec::Date(_)
    ));
    assert!(matches!(
        TimeSpec::parse_json(&serde_json::json!("2024-01-01 12:00:10")).unwrap(),
        TimeSpec::Date(_)
    ));
    assert!(TimeSpec::parse_json(&serde_json::json!("soon")).is_err());
    assert!(TimeSpec::parse_json(&serde_json::json!([1])).is_err());
}

#[test]
fn resolves_relative_to_application_clock() {
    let c = clock().at(100.0, 2500);
    assert_eq!(TimeSpec::Offset(5.0).resolve(&c), Some(105.0));
    assert_eq!(TimeSpec::Now.resolve(&c), Some(100.0));
    assert_eq!(TimeSpec::Inactive.resolve(&c), None);
    let d = TimeSpec::parse_json(&serde_json::json!("2024-01-01T12:00:10Z")).unwrap();
    assert_eq!(d.resolve(&c), Some(10.0));
}

#[test]
fn loop_counts() {
    assert_eq!(LoopCount::parse_json(&serde_json::json!(true)).unwrap(), LoopCount::Forever);
    assert_eq!(LoopCount::parse_json(&serde_json::json!(-1)).unwrap(), LoopCount::Forever);
    assert_eq!(LoopCount::parse_json(&serde_json::json!(0)).unwrap(), LoopCount::Once);
    assert_eq!(LoopCount::parse_json(&serde_json::json!(2)).unwrap(), LoopCount::Repeat(2));
    assert!(LoopCount::parse_json(&serde_json::json!(1.5)).is_err());

    assert!(LoopCount::Once.allows(0));
    assert!(!LoopCount::Once.allows(1));
    assert!(LoopCount::Repeat(2).allows(2));
    assert!(!LoopCount::Repeat(2).allows(3));
    assert!(LoopCount::Forever.allows(u64::MAX));
}
