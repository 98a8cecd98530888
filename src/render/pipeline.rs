use std::sync::{Arc, Mutex, MutexGuard};

use crate::{
    assets::images::{ImageRef, ImageTable, PreparedImage, baked_ref},
    config::{model::Configuration, store::Versioned},
    effects::bake::bake_prepared,
    export::orchestrator::ExportRenderer,
    fonts::{registry::FontRegistry, text::TextLayoutEngine},
    foundation::error::{CoverError, CoverResult},
    render::{
        frame::FrameRGBA,
        preview::PreviewState,
        raster::Rasterizer,
        scene::{Scene, compose},
    },
};

type BakeSlot = Option<(ImageRef, Arc<PreparedImage>)>;

/// Composes configurations into scenes and rasterizes them for the preview and the export.
///
/// A filtered background is baked with the same code the export uses and the most recent bake
/// is kept, so dragging a text field does not re-blur the image.
pub struct RenderPipeline {
    images: Arc<ImageTable>,
    fonts: Arc<FontRegistry>,
    engine: Mutex<TextLayoutEngine>,
    rasterizer: Arc<dyn Rasterizer>,
    preview: PreviewState,
    last_bake: Mutex<BakeSlot>,
}

impl std::fmt::Debug for RenderPipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RenderPipeline")
            .field("images", &self.images)
            .field("fonts", &self.fonts)
            .field("preview", &self.preview)
            .finish_non_exhaustive()
    }
}

impl RenderPipeline {
    pub fn new(
        images: Arc<ImageTable>,
        fonts: Arc<FontRegistry>,
        rasterizer: Arc<dyn Rasterizer>,
        viewport_padding_px: f64,
    ) -> Self {
        Self {
            images,
            fonts,
            engine: Mutex::new(TextLayoutEngine::new()),
            rasterizer,
            preview: PreviewState::new(viewport_padding_px),
            last_bake: Mutex::new(None),
        }
    }

    pub fn preview(&self) -> &PreviewState {
        &self.preview
    }

    /// Pixels to draw behind the card for `cfg`, keyed by the handle [`compose`] expects.
    ///
    /// An unfiltered image is decoded as-is. A filtered one is baked at its native resolution,
    /// exactly as an export bakes it, and addressed by [`baked_ref`].
    pub async fn background_pixels(
        &self,
        cfg: &Configuration,
    ) -> CoverResult<BakeSlot> {
        let Some(source) = cfg.active_background_image() else {
            return Ok(None);
        };
        let params = cfg.filter();
        if !params.needs_baking() {
            return Ok(Some((source, self.images.decode(source).await?)));
        }

        let id = baked_ref(source, params);
        let last = self.lock_last_bake()?.clone();
        if let Some((cached, pixels)) = last
            && cached == id
        {
            return Ok(Some((id, pixels)));
        }
        if let Some(pixels) = self.images.cached(id).ok().flatten() {
            return Ok(Some((id, pixels)));
        }

        let src = self.images.decode(source).await?;
        let baked = tokio::task::spawn_blocking(move || bake_prepared(&src, params)).await??;
        tracing::debug!(baked = %id, source = %source, "baked preview background");
        *self.lock_last_bake()? = Some((id, baked.pixels.clone()));
        Ok(Some((id, baked.pixels)))
    }

    /// Prepare the background (off the executor) and lay out `cfg`.
    pub async fn build_scene(&self, cfg: &Configuration) -> CoverResult<Scene> {
        let background = self.background_pixels(cfg).await?;
        let mut engine = self
            .engine
            .lock()
            .map_err(|_| CoverError::Other(anyhow::anyhow!("text engine lock poisoned")))?;
        compose(cfg, background, &self.fonts, &mut engine)
    }

    /// Build and rasterize `cfg` at `scale`.
    pub async fn render(&self, cfg: &Configuration, scale: f64) -> CoverResult<FrameRGBA> {
        let scene = self.build_scene(cfg).await?;
        let rasterizer = self.rasterizer.clone();
        tokio::task::spawn_blocking(move || rasterizer.rasterize(&scene, scale)).await?
    }

    /// Render the preview at the current viewport scale and publish it as `cfg.revision`.
    #[tracing::instrument(skip(self, cfg), fields(revision = cfg.revision))]
    pub async fn render_preview(&self, cfg: &Versioned<Configuration>) -> CoverResult<FrameRGBA> {
        let scale = self.preview.scale();
        let frame = self.render(&cfg.value, scale).await?;
        self.preview.publish(cfg.revision, frame.clone())?;
        Ok(frame)
    }

    fn lock_last_bake(&self) -> CoverResult<MutexGuard<'_, BakeSlot>> {
        self.last_bake
            .lock()
            .map_err(|_| CoverError::Other(anyhow::anyhow!("preview bake lock poisoned")))
    }
}

impl ExportRenderer for RenderPipeline {
    async fn settle(&self, cfg: &Versioned<Configuration>) -> CoverResult<()> {
        if self
            .preview
            .rendered_revision()
            .is_some_and(|r| r >= cfg.revision)
        {
            return Ok(());
        }
        self.render_preview(cfg).await.map(|_| ())
    }

    async fn rasterize(&self, cfg: &Configuration, quality: f64) -> CoverResult<FrameRGBA> {
        self.render(cfg, quality).await
    }
}

#[cfg(test)]
#[path = "../../tests/unit/render/pipeline.rs"]
mod tests;
