use super::*;
use serde_json::json;

fn space() -> ReferenceSpace {
    ReferenceSpace::new(1920.0, 1080.0)
}

#[test]
fn rel_positions_scale_by_reference_extent() {
    for v in [-50.0, -25.0, 0.0, 12.5, 50.0] {
        let px = resolve_position(Units::Rel, Axis::Horizontal, v, space());
        assert_eq!(px, v * 1920.0 / 100.0);
        let back = unresolve_position(Units::Rel, Axis::Horizontal, px, space());
        assert!((back - v).abs() < 1e-9);

        let py = resolve_position(Units::Rel, Axis::Vertical, v, space());
        assert_eq!(py, v * 1080.0 / 100.0);
    }
    assert_eq!(
        resolve_position(Units::Rel, Axis::Vertical, 50.0, space()),
        540.0
    );
}

#[test]
fn sizes_inherit_on_negative_and_pix_passes_through() {
    assert_eq!(resolve_size(Units::Rel, Axis::Horizontal, 100.0, space()), 1920.0);
    assert_eq!(resolve_size(Units::Rel, Axis::Vertical, -1.0, space()), 1080.0);
    assert_eq!(resolve_size(Units::Pix, Axis::Horizontal, 320.0, space()), 320.0);
    assert_eq!(resolve_position(Units::Pix, Axis::Vertical, -7.0, space()), -7.0);
}

#[test]
fn sentinels_resolve_in_second_pass() {
    let set = CoordSet {
        x: Coord::parse(&json!("-y"), CoordField::X).unwrap(),
        y: Coord::Value(10.0),
        width: Coord::parse(&json!("height"), CoordField::Width).unwrap(),
        height: Coord::Value(50.0),
    };
    let r = resolve_coords(Units::Rel, &set, space()).unwrap();
    assert_eq!(r.y, 108.0);
    assert_eq!(r.x, -108.0);
    assert_eq!(r.height, 540.0);
    assert_eq!(r.width, 540.0);
}

#[test]
fn reference_cycles_are_rejected() {
    let set = CoordSet {
        width: Coord::Ref {
            field: CoordField::Height,
            negate: false,
        },
        height: Coord::Ref {
            field: CoordField::Width,
            negate: false,
        },
        ..CoordSet::default()
    };
    let err = resolve_coords(Units::Rel, &set, space()).unwrap_err();
    assert!(err.to_string().contains("cycle"));
}

#[test]
fn parse_rejects_non_partner_references() {
    assert!(Coord::parse(&json!("x"), CoordField::Width).is_err());
    assert!(Coord::parse(&json!("-height"), CoordField::Width).is_err());
    assert_eq!(
        Coord::parse(&json!("12.5"), CoordField::X).unwrap(),
        Coord::Value(12.5)
    );
    assert!(Coord::parse(&json!(true), CoordField::X).is_err());
}
