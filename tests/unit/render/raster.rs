use super::*;
use crate::{
    assets::images::{ImageRef, PreparedImage},
    effects::filter::FilterParams,
    render::scene::object_cover,
};

fn solid_image(w: u32, h: u32, px: [u8; 4]) -> Arc<PreparedImage> {
    Arc::new(PreparedImage {
        width: w,
        height: h,
        rgba8_premul: Arc::new(px.repeat((w * h) as usize)),
    })
}

fn assert_close(actual: Option<[u8; 4]>, expected: [u8; 4]) {
    let actual = actual.expect("pixel in bounds");
    for c in 0..4 {
        assert!(
            (i16::from(actual[c]) - i16::from(expected[c])).abs() <= 2,
            "{actual:?} vs {expected:?}"
        );
    }
}

fn with_background(filter: FilterParams) -> Scene {
    let image = solid_image(16, 9, [200, 100, 50, 255]);
    let mut scene = Scene::blank(Rgba8::BLACK);
    scene.background = Some(BackgroundLayer {
        image_ref: ImageRef::from_u64(1),
        dest: object_cover(image.width, image.height, scene.canvas),
        image,
        filter,
    });
    scene
}

#[test]
fn blank_scene_is_the_clear_color_at_scaled_size() {
    let r = CpuRasterizer::new();
    let frame = r.rasterize(&Scene::blank(Rgba8::BLACK), 0.25).unwrap();
    assert_eq!((frame.width, frame.height), (320, 180));
    assert!(frame.premultiplied);
    assert_eq!(frame.pixel(0, 0), Some([0, 0, 0, 255]));
    assert_eq!(frame.pixel(319, 179), Some([0, 0, 0, 255]));
}

#[test]
fn rects_scale_with_the_frame() {
    let mut scene = Scene::blank(Rgba8::BLACK);
    scene.ops.push(DrawOp::FillRect {
        rect: Rect::new(0.0, 0.0, 640.0, 720.0),
        color: Rgba8::WHITE,
    });
    let frame = CpuRasterizer::new().rasterize(&scene, 0.5).unwrap();
    assert_eq!(frame.pixel(10, 10), Some([255, 255, 255, 255]));
    assert_eq!(frame.pixel(630, 10), Some([0, 0, 0, 255]));
}

#[test]
fn unbaked_filters_are_refused() {
    let scene = with_background(FilterParams::new(4.0, 100.0));
    let err = CpuRasterizer::new().rasterize(&scene, 0.25).unwrap_err();
    assert!(matches!(err, CoverError::Rasterization(_)));
}

#[test]
fn neutral_background_draws_the_image() {
    let scene = with_background(FilterParams::NEUTRAL);
    let frame = CpuRasterizer::new().rasterize(&scene, 0.25).unwrap();
    assert_close(frame.pixel(160, 90), [200, 100, 50, 255]);
}

#[test]
fn brightness_only_filters_are_refused_too() {
    let scene = with_background(FilterParams::new(0.0, 50.0));
    let err = CpuRasterizer::new().rasterize(&scene, 0.25).unwrap_err();
    assert!(matches!(err, CoverError::Rasterization(_)));
}

#[test]
fn foreground_draws_over_the_background() {
    let mut scene = with_background(FilterParams::NEUTRAL);
    scene.ops.push(DrawOp::FillRect {
        rect: Rect::new(0.0, 0.0, 100.0, 100.0),
        color: Rgba8::WHITE,
    });
    let frame = CpuRasterizer::new().rasterize(&scene, 0.25).unwrap();
    assert_close(frame.pixel(160, 90), [200, 100, 50, 255]);
    assert_eq!(frame.pixel(5, 5), Some([255, 255, 255, 255]));
}
