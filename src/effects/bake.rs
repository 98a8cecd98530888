use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};

use crate::{
    assets::{
        decode::{self, premultiply_rgba8_in_place, unpremultiply_rgba8_in_place},
        images::{ImageRef, ImageTable, PreparedImage},
    },
    effects::filter::{FilterParams, apply_filter_premul},
    foundation::error::CoverResult,
};

/// Self-contained output of a bake: PNG bytes plus the pixels they decode to.
#[derive(Clone, Debug)]
pub struct BakedImage {
    pub png: Arc<Vec<u8>>,
    pub pixels: Arc<PreparedImage>,
}

impl BakedImage {
    pub fn width(&self) -> u32 {
        self.pixels.width
    }

    pub fn height(&self) -> u32 {
        self.pixels.height
    }
}

/// Decode `bytes` and bake `params` into a new image.
pub fn bake(bytes: &[u8], params: FilterParams) -> CoverResult<BakedImage> {
    let src = decode::decode_image(bytes)?;
    bake_prepared(&src, params)
}

/// Bake `params` into `src` at its native resolution. `src` is left untouched.
pub fn bake_prepared(src: &PreparedImage, params: FilterParams) -> CoverResult<BakedImage> {
    let filtered = apply_filter_premul(
        &src.rgba8_premul,
        src.width,
        src.height,
        params.bake_sigma(),
        params.brightness_factor(),
    )?;

    let mut straight = filtered;
    unpremultiply_rgba8_in_place(&mut straight);
    let png = decode::encode_png_rgba8(src.width, src.height, straight.clone())?;

    // Cache exactly what decoding the PNG would produce.
    let mut premul = straight;
    premultiply_rgba8_in_place(&mut premul);

    Ok(BakedImage {
        png: Arc::new(png),
        pixels: Arc::new(PreparedImage {
            width: src.width,
            height: src.height,
            rgba8_premul: Arc::new(premul),
        }),
    })
}

/// Bakes table images off the async executor and registers the results.
#[derive(Debug)]
pub struct FilterBaker {
    images: Arc<ImageTable>,
    bakes: AtomicU64,
}

impl FilterBaker {
    pub fn new(images: Arc<ImageTable>) -> Self {
        Self {
            images,
            bakes: AtomicU64::new(0),
        }
    }

    /// Number of bakes performed so far.
    pub fn bake_count(&self) -> u64 {
        self.bakes.load(Ordering::Relaxed)
    }

    /// Bake `params` into the image at `source` and return the handle of the result.
    #[tracing::instrument(skip(self), fields(source = %source))]
    pub async fn bake(&self, source: ImageRef, params: FilterParams) -> CoverResult<ImageRef> {
        let src = self.images.decode(source).await?;
        let baked = tokio::task::spawn_blocking(move || bake_prepared(&src, params)).await??;
        self.bakes.fetch_add(1, Ordering::Relaxed);

        let (w, h) = (baked.width(), baked.height());
        let id = self
            .images
            .insert_baked(source, params, baked.png, baked.pixels)?;
        tracing::debug!(baked = %id, width = w, height = h, "baked background filter");
        Ok(id)
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/bake.rs"]
mod tests;
