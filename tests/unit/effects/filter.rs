use super::*;

#[test]
fn neutral_filter_needs_no_baking() {
    assert!(FilterParams::NEUTRAL.is_neutral());
    assert!(!FilterParams::default().needs_baking());
    assert!(FilterParams::new(0.5, 100.0).needs_baking());
    assert!(FilterParams::new(0.0, 99.0).needs_baking());
    assert!(FilterParams::new(0.0, 150.0).needs_baking());
}

#[test]
fn bake_sigma_applies_the_multiplier() {
    assert_eq!(FilterParams::new(10.0, 100.0).bake_sigma(), 20.0);
    assert_eq!(FilterParams::new(-3.0, 100.0).bake_sigma(), 0.0);
}

#[test]
fn brightness_scales_channels_and_clamps_to_alpha() {
    let mut px = vec![100u8, 50, 200, 255, 100, 100, 100, 128];
    apply_brightness_premul_in_place(&mut px, 0.5);
    assert_eq!(&px[..4], &[50, 25, 100, 255]);

    let mut bright = vec![100u8, 50, 200, 255, 100, 100, 100, 128];
    apply_brightness_premul_in_place(&mut bright, 2.0);
    assert_eq!(&bright[..4], &[200, 100, 255, 255]);
    assert_eq!(&bright[4..], &[128, 128, 128, 128]);
}

#[test]
fn zero_sigma_filter_is_brightness_only() {
    let src = vec![200u8, 100, 0, 255];
    let out = apply_filter_premul(&src, 1, 1, 0.0, 0.5).unwrap();
    assert_eq!(out, vec![100, 50, 0, 255]);
}
