use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(AvmixError::config("x").to_string().contains("config error:"));
    assert!(
        AvmixError::resource("x")
            .to_string()
            .contains("resource error:")
    );
    assert!(AvmixError::hook("x").to_string().contains("hook error:"));
    assert!(AvmixError::update("x").to_string().contains("update error:"));
    assert!(
        AvmixError::evaluation("x")
            .to_string()
            .contains("evaluation error:")
    );
    assert!(
        AvmixError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = AvmixError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn json_errors_map_to_serde() {
    let err: AvmixError = serde_json::from_str::<serde_json::Value>("{")
        .unwrap_err()
        .into();
    assert!(matches!(err, AvmixError::Serde(_)));
}
