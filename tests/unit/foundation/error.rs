use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        SubstrateError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(
        SubstrateError::simulation("x")
            .to_string()
            .contains("simulation error:")
    );
    assert!(
        SubstrateError::replica("x")
            .to_string()
            .contains("replica error:")
    );
    assert!(
        SubstrateError::persistence("x")
            .to_string()
            .contains("persistence error:")
    );
    assert!(
        SubstrateError::serde("x")
            .to_string()
            .contains("serialization error:")
    );
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = SubstrateError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}
