use super::*;
use crate::assets::images::ImageOrigin;

fn gradient_png(w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_fn(w, h, |x, y| {
        image::Rgba([(x * 255 / w.max(1)) as u8, (y * 255 / h.max(1)) as u8, 80, 255])
    });
    decode::encode_png_rgba8(w, h, img.into_raw()).unwrap()
}

#[test]
fn bake_is_deterministic_and_keeps_native_size() {
    let png = gradient_png(16, 9);
    let params = FilterParams::new(1.0, 50.0);
    let a = bake(&png, params).unwrap();
    let b = bake(&png, params).unwrap();
    assert_eq!(a.png, b.png);
    assert_eq!((a.width(), a.height()), (16, 9));
}

#[test]
fn baked_png_decodes_to_cached_pixels() {
    let png = gradient_png(8, 8);
    let baked = bake(&png, FilterParams::new(0.5, 130.0)).unwrap();
    let decoded = decode::decode_image(&baked.png).unwrap();
    assert_eq!(decoded.rgba8_premul, baked.pixels.rgba8_premul);
}

#[test]
fn brightness_only_bake_halves_channels() {
    let png = decode::encode_png_rgba8(1, 1, vec![200, 100, 50, 255]).unwrap();
    let baked = bake(&png, FilterParams::new(0.0, 50.0)).unwrap();
    assert_eq!(baked.pixels.rgba8_premul.as_slice(), &[100, 50, 25, 255]);
}

#[test]
fn bake_rejects_garbage() {
    assert!(matches!(
        bake(b"garbage", FilterParams::new(2.0, 100.0)),
        Err(crate::CoverError::Decode(_))
    ));
}

#[tokio::test]
async fn filter_baker_registers_content_addressed_results() {
    let table = Arc::new(ImageTable::new());
    let source = table.insert_upload(gradient_png(4, 4)).unwrap();
    let baker = FilterBaker::new(table.clone());
    let params = FilterParams::new(2.0, 80.0);

    let baked = baker.bake(source, params).await.unwrap();
    assert_ne!(baked, source);
    assert_eq!(baker.bake_count(), 1);
    assert_eq!(
        table.origin(baked).unwrap(),
        ImageOrigin::Baked { source, params }
    );
    assert!(table.cached(baked).unwrap().is_some());
    assert!(table.contains(source));

    let again = baker.bake(source, params).await.unwrap();
    assert_eq!(again, baked);
}
