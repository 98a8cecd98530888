use super::*;
use crate::{
    assets::decode::encode_png_rgba8,
    config::model::BackgroundMode,
    effects::{
        bake::{FilterBaker, bake},
        filter::FilterParams,
    },
    render::raster::CpuRasterizer,
};

/// Black left half, white right half.
fn split_png(w: u32, h: u32) -> Vec<u8> {
    let mut rgba = Vec::with_capacity((w * h * 4) as usize);
    for _ in 0..h {
        for x in 0..w {
            let v = if x < w / 2 { 0 } else { 255 };
            rgba.extend_from_slice(&[v, v, v, 255]);
        }
    }
    encode_png_rgba8(w, h, rgba).unwrap()
}

fn setup(png: Vec<u8>) -> (Arc<ImageTable>, RenderPipeline, ImageRef) {
    let images = Arc::new(ImageTable::new());
    let id = images.insert_upload(png).unwrap();
    let pipeline = RenderPipeline::new(
        images.clone(),
        Arc::new(FontRegistry::new(false)),
        Arc::new(CpuRasterizer::new()),
        0.0,
    );
    (images, pipeline, id)
}

fn image_config(id: ImageRef, params: FilterParams) -> Configuration {
    Configuration {
        background_mode: BackgroundMode::Image,
        background_image: Some(id),
        blur_amount: params.blur_amount,
        brightness_percent: params.brightness_percent,
        ..Configuration::default()
    }
}

#[tokio::test]
async fn filtered_background_is_the_export_bake() {
    let png = split_png(64, 36);
    let (images, pipeline, source) = setup(png.clone());
    let params = FilterParams::new(4.0, 100.0);

    let (id, pixels) = pipeline
        .background_pixels(&image_config(source, params))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(id, baked_ref(source, params));
    assert_eq!(pixels.rgba8_premul, bake(&png, params).unwrap().pixels.rgba8_premul);

    let exported = FilterBaker::new(images.clone())
        .bake(source, params)
        .await
        .unwrap();
    assert_eq!(exported, id);
    let exported = images.cached(exported).unwrap().unwrap();
    assert_eq!(pixels.rgba8_premul, exported.rgba8_premul);

    // The edge is softened on both sides.
    let row = &pixels.rgba8_premul[..64 * 4];
    assert!(row[31 * 4] > 0);
    assert!(row[32 * 4] < 255);
}

#[tokio::test]
async fn preview_bake_is_reused_until_the_filter_changes() {
    let (_images, pipeline, source) = setup(split_png(16, 9));
    let cfg = image_config(source, FilterParams::new(2.0, 80.0));

    let (a, first) = pipeline.background_pixels(&cfg).await.unwrap().unwrap();
    let (b, second) = pipeline.background_pixels(&cfg).await.unwrap().unwrap();
    assert_eq!(a, b);
    assert!(Arc::ptr_eq(&first, &second));

    let cfg = image_config(source, FilterParams::new(3.0, 80.0));
    let (c, third) = pipeline.background_pixels(&cfg).await.unwrap().unwrap();
    assert_ne!(a, c);
    assert!(!Arc::ptr_eq(&first, &third));
}

#[tokio::test]
async fn unfiltered_background_is_decoded_as_is() {
    let (images, pipeline, source) = setup(split_png(16, 9));
    let (id, pixels) = pipeline
        .background_pixels(&image_config(source, FilterParams::NEUTRAL))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(id, source);
    assert!(Arc::ptr_eq(&pixels, &images.cached(source).unwrap().unwrap()));

    let color = Configuration::default();
    assert!(pipeline.background_pixels(&color).await.unwrap().is_none());
}
