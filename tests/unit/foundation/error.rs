use super::*;

#[test]
fn display_prefixes_are_stable() {
    assert!(
        CoverError::validation("x")
            .to_string()
            .contains("validation error:")
    );
    assert!(CoverError::decode("x").to_string().contains("decode error:"));
    assert!(
        CoverError::font_load("x")
            .to_string()
            .contains("font load error:")
    );
    assert!(
        CoverError::rasterization("x")
            .to_string()
            .contains("rasterization error:")
    );
    assert!(CoverError::encode("x").to_string().contains("encode error:"));
}

#[test]
fn other_preserves_source() {
    let base = std::io::Error::other("boom");
    let err = CoverError::Other(anyhow::Error::new(base));
    assert!(err.to_string().contains("boom"));
}

#[test]
fn export_failed_wraps_once_and_exposes_cause() {
    let err = CoverError::export_failed(CoverError::decode("bad png"));
    let again = CoverError::export_failed(err);

    assert!(again.to_string().starts_with("export failed:"));
    assert!(matches!(again.root_cause(), CoverError::Decode(_)));
    assert!(std::error::Error::source(&again).is_some());
}
