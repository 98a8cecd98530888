use std::{io::Cursor, sync::Arc};

use crate::{
    assets::images::PreparedImage,
    foundation::{
        error::{CoverError, CoverResult},
        math::mul_div255,
    },
};

/// Decode any raster format supported by `image` into premultiplied RGBA8.
pub fn decode_image(bytes: &[u8]) -> CoverResult<PreparedImage> {
    if bytes.is_empty() {
        return Err(CoverError::decode("image data is empty"));
    }
    let dyn_img = image::load_from_memory(bytes)
        .map_err(|e| CoverError::decode(format!("decode image from memory: {e}")))?;
    let rgba = dyn_img.to_rgba8();
    let (width, height) = rgba.dimensions();
    if width == 0 || height == 0 {
        return Err(CoverError::decode("decoded image has zero area"));
    }

    let mut rgba8_premul = rgba.into_raw();
    premultiply_rgba8_in_place(&mut rgba8_premul);

    Ok(PreparedImage {
        width,
        height,
        rgba8_premul: Arc::new(rgba8_premul),
    })
}

/// Encode straight-alpha RGBA8 pixels as a PNG file.
pub fn encode_png_rgba8(width: u32, height: u32, rgba8: Vec<u8>) -> CoverResult<Vec<u8>> {
    let img = image::RgbaImage::from_raw(width, height, rgba8).ok_or_else(|| {
        CoverError::encode(format!("pixel buffer does not match {width}x{height} RGBA8"))
    })?;

    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .map_err(|e| CoverError::encode(format!("encode png: {e}")))?;
    Ok(buf)
}

pub(crate) fn premultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = u16::from(px[3]);
        for c in &mut px[..3] {
            *c = mul_div255(u16::from(*c), a);
        }
    }
}

pub(crate) fn unpremultiply_rgba8_in_place(rgba: &mut [u8]) {
    for px in rgba.chunks_exact_mut(4) {
        let a = px[3] as u32;
        if a == 0 {
            px[0] = 0;
            px[1] = 0;
            px[2] = 0;
            continue;
        }
        if a == 255 {
            continue;
        }
        for c in &mut px[..3] {
            *c = ((*c as u32 * 255 + a / 2) / a).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/assets/decode.rs"]
mod tests;
