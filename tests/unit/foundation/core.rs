use super::*;

#[test]
fn parses_hex_rgb_and_rgba() {
    assert_eq!(Rgba8::from_hex("#ff0000").unwrap(), Rgba8::rgb(255, 0, 0));
    assert_eq!(
        Rgba8::from_hex("EF444480").unwrap(),
        Rgba8::rgba(0xef, 0x44, 0x44, 0x80)
    );
    assert!(Rgba8::from_hex("#fff").is_err());
    assert!(Rgba8::from_hex("#gg0000").is_err());
}

#[test]
fn hex_serde_uses_string_form() {
    let c: Rgba8 = serde_json::from_value(serde_json::json!("#0E0E0E")).unwrap();
    assert_eq!(c, Rgba8::rgb(14, 14, 14));
    assert_eq!(serde_json::to_value(c).unwrap(), serde_json::json!("#0e0e0e"));
    assert_eq!(
        serde_json::to_value(Rgba8::rgba(1, 2, 3, 4)).unwrap(),
        serde_json::json!("#01020304")
    );
}

#[test]
fn with_opacity_scales_alpha_only() {
    let c = Rgba8::rgb(239, 68, 68).with_opacity(0.5);
    assert_eq!((c.r, c.g, c.b), (239, 68, 68));
    assert_eq!(c.a, 128);
    assert_eq!(Rgba8::WHITE.with_opacity(f32::NAN).a, 0);
}

#[test]
fn canvas_scaling_rounds_up_and_rejects_degenerate_scales() {
    assert_eq!(
        Canvas::VIRTUAL.scaled(1.5).unwrap(),
        Canvas {
            width: 1920,
            height: 1080
        }
    );
    assert_eq!(
        Canvas::VIRTUAL.scaled(0.3).unwrap(),
        Canvas {
            width: 384,
            height: 216
        }
    );
    assert!(Canvas::VIRTUAL.scaled(0.0).is_err());
    assert!(Canvas::VIRTUAL.scaled(f64::NAN).is_err());
    assert!(Canvas::VIRTUAL.scaled(100.0).is_err());
}

#[test]
fn align_factors() {
    assert_eq!(LayoutAlignX::Start.factor(), 0.0);
    assert_eq!(LayoutAlignX::Center.factor(), 0.5);
    assert_eq!(LayoutAlignY::End.factor(), 1.0);
}
