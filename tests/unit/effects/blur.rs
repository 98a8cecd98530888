use super::*;

fn alpha_sum(buf: &[u8]) -> u32 {
    buf.chunks_exact(4).map(|px| u32::from(px[3])).sum()
}

#[test]
fn zero_radius_returns_the_input() {
    let src = vec![9u8, 8, 7, 200, 1, 2, 3, 4];
    assert_eq!(blur_rgba8_premul(&src, 2, 1, 0, 3.0).unwrap(), src);
}

#[test]
fn flat_color_survives_blurring() {
    let (w, h) = (6u32, 4u32);
    let src = [40u8, 80, 120, 160].repeat((w * h) as usize);
    assert_eq!(blur_rgba8_premul(&src, w, h, 4, 1.5).unwrap(), src);
}

#[test]
fn a_lit_pixel_spreads_but_keeps_its_energy() {
    let (w, h) = (7u32, 7u32);
    let mut src = vec![0u8; (w * h * 4) as usize];
    let center = ((3 * w + 3) * 4) as usize;
    src[center..center + 4].copy_from_slice(&[255; 4]);

    let out = blur_rgba8_premul(&src, w, h, 3, 1.0).unwrap();
    assert!(out[center + 3] < 255);
    assert!(out.chunks_exact(4).filter(|px| px[3] > 0).count() > 5);
    assert!((alpha_sum(&out) as i32 - 255).abs() <= 6);
}

#[test]
fn blur_is_symmetric_around_the_source() {
    let (w, h) = (9u32, 1u32);
    let mut src = vec![0u8; (w * h * 4) as usize];
    src[16..20].copy_from_slice(&[255; 4]);
    let out = blur_rgba8_premul(&src, w, h, 3, 1.0).unwrap();
    for d in 1..=3usize {
        assert_eq!(out[(4 - d) * 4 + 3], out[(4 + d) * 4 + 3]);
    }
}

#[test]
fn mismatched_buffers_and_huge_radii_are_rejected() {
    assert!(blur_rgba8_premul(&[0u8; 7], 1, 2, 1, 1.0).is_err());
    assert!(blur_rgba8_premul(&[0u8; 4], 1, 1, MAX_BLUR_RADIUS + 1, 1.0).is_err());
}

#[test]
fn radius_covers_three_sigma() {
    assert_eq!(radius_for_sigma(0.0), 0);
    assert_eq!(radius_for_sigma(-1.0), 0);
    assert_eq!(radius_for_sigma(f32::NAN), 0);
    assert_eq!(radius_for_sigma(1.0), 3);
    assert_eq!(radius_for_sigma(2.5), 8);
    assert_eq!(radius_for_sigma(1.0e6), MAX_BLUR_RADIUS);
}
