use std::{
    collections::HashMap,
    sync::{Arc, Mutex},
};

use crate::{
    effects::composite::{fill, over_in_place},
    fonts::registry::RegisteredFont,
    foundation::{
        core::{Affine, Canvas, Rect, Rgba8},
        error::{CoverError, CoverResult},
    },
    render::{
        frame::FrameRGBA,
        scene::{BackgroundLayer, DrawOp, Scene},
    },
};

/// Draws a [`Scene`] at a uniform scale.
///
/// Background filters are never applied here: a scene whose background still carries one is
/// rejected, so every path draws the same baked pixels.
pub trait Rasterizer: Send + Sync {
    fn rasterize(&self, scene: &Scene, scale: f64) -> CoverResult<FrameRGBA>;
}

/// CPU rasterizer powered by `vello_cpu`.
///
/// The clear color, the background layer and the foreground layer are composited source-over.
#[derive(Default)]
pub struct CpuRasterizer {
    fonts: Mutex<HashMap<String, vello_cpu::peniko::FontData>>,
}

impl std::fmt::Debug for CpuRasterizer {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CpuRasterizer").finish_non_exhaustive()
    }
}

impl CpuRasterizer {
    pub fn new() -> Self {
        Self::default()
    }

    fn font_data(&self, font: &RegisteredFont) -> CoverResult<vello_cpu::peniko::FontData> {
        let mut cache = self
            .fonts
            .lock()
            .map_err(|_| CoverError::Other(anyhow::anyhow!("rasterizer font cache poisoned")))?;
        let data = cache.entry(font.name.clone()).or_insert_with(|| {
            vello_cpu::peniko::FontData::new(
                vello_cpu::peniko::Blob::from(font.data.to_vec()),
                font.index,
            )
        });
        Ok(data.clone())
    }

    fn draw_background(
        &self,
        bg: &BackgroundLayer,
        target: Canvas,
        scale: f64,
    ) -> CoverResult<Vec<u8>> {
        if bg.filter.needs_baking() {
            return Err(CoverError::rasterization(format!(
                "background {} has an unbaked filter (blur {}, brightness {}%)",
                bg.image_ref, bg.filter.blur_amount, bg.filter.brightness_percent
            )));
        }

        let pixmap = pixmap_from_premul_bytes(&bg.image.rgba8_premul, bg.image.width, bg.image.height)?;
        let paint = vello_cpu::Image {
            image: vello_cpu::ImageSource::Pixmap(Arc::new(pixmap)),
            sampler: vello_cpu::peniko::ImageSampler::default(),
        };

        let sx = bg.dest.width() / f64::from(bg.image.width.max(1));
        let sy = bg.dest.height() / f64::from(bg.image.height.max(1));
        let tr = Affine::scale(scale)
            * Affine::translate((bg.dest.x0, bg.dest.y0))
            * Affine::scale_non_uniform(sx, sy);

        render_layer(target, |ctx| {
            ctx.set_transform(affine_to_cpu(tr));
            ctx.set_paint(paint);
            ctx.fill_rect(&vello_cpu::kurbo::Rect::new(
                0.0,
                0.0,
                f64::from(bg.image.width),
                f64::from(bg.image.height),
            ));
            Ok(())
        })
    }

    fn draw_foreground(&self, ops: &[DrawOp], target: Canvas, scale: f64) -> CoverResult<Vec<u8>> {
        render_layer(target, |ctx| {
            for op in ops {
                match op {
                    DrawOp::FillRect { rect, color } => {
                        ctx.set_transform(affine_to_cpu(Affine::scale(scale)));
                        ctx.set_paint(color_to_cpu(*color));
                        ctx.fill_rect(&rect_to_cpu(*rect));
                    }
                    DrawOp::Text { origin, text, font } => {
                        let font = self.font_data(font)?;
                        ctx.set_transform(affine_to_cpu(
                            Affine::scale(scale) * Affine::translate(origin.to_vec2()),
                        ));
                        for run in &text.runs {
                            let b = run.brush;
                            ctx.set_paint(vello_cpu::peniko::Color::from_rgba8(b.r, b.g, b.b, b.a));
                            let glyphs = run.glyphs.iter().map(|g| vello_cpu::Glyph {
                                id: g.id,
                                x: g.x,
                                y: g.y,
                            });
                            ctx.glyph_run(&font)
                                .font_size(run.font_size)
                                .fill_glyphs(glyphs);
                        }
                    }
                }
            }
            Ok(())
        })
    }
}

impl Rasterizer for CpuRasterizer {
    #[tracing::instrument(skip(self, scene), fields(ops = scene.ops.len()))]
    fn rasterize(&self, scene: &Scene, scale: f64) -> CoverResult<FrameRGBA> {
        let target = scene
            .canvas
            .scaled(scale)
            .map_err(|e| CoverError::rasterization(format!("render target: {e}")))?;

        let mut out = vec![0u8; (target.width as usize) * (target.height as usize) * 4];
        fill(&mut out, scene.clear.to_premul());

        if let Some(bg) = &scene.background {
            let layer = self.draw_background(bg, target, scale)?;
            over_in_place(&mut out, &layer, 1.0)?;
        }
        if !scene.ops.is_empty() {
            let fg = self.draw_foreground(&scene.ops, target, scale)?;
            over_in_place(&mut out, &fg, 1.0)?;
        }

        FrameRGBA::new(target.width, target.height, out, true)
    }
}

fn render_layer(
    target: Canvas,
    f: impl FnOnce(&mut vello_cpu::RenderContext) -> CoverResult<()>,
) -> CoverResult<Vec<u8>> {
    let w: u16 = target
        .width
        .try_into()
        .map_err(|_| CoverError::rasterization("render width exceeds u16"))?;
    let h: u16 = target
        .height
        .try_into()
        .map_err(|_| CoverError::rasterization("render height exceeds u16"))?;

    let mut ctx = vello_cpu::RenderContext::new(w, h);
    ctx.set_paint_transform(vello_cpu::kurbo::Affine::IDENTITY);
    f(&mut ctx)?;
    ctx.flush();

    let mut pixmap = vello_cpu::Pixmap::new(w, h);
    ctx.render_to_pixmap(&mut pixmap);
    Ok(pixmap.data_as_u8_slice().to_vec())
}

fn pixmap_from_premul_bytes(
    bytes: &[u8],
    width: u32,
    height: u32,
) -> CoverResult<vello_cpu::Pixmap> {
    let w: u16 = width
        .try_into()
        .map_err(|_| CoverError::rasterization("image width exceeds u16"))?;
    let h: u16 = height
        .try_into()
        .map_err(|_| CoverError::rasterization("image height exceeds u16"))?;
    if bytes.len() != (width as usize) * (height as usize) * 4 {
        return Err(CoverError::rasterization("image byte len mismatch"));
    }
    let pixels = bytes
        .chunks_exact(4)
        .map(|px| vello_cpu::peniko::color::PremulRgba8 {
            r: px[0],
            g: px[1],
            b: px[2],
            a: px[3],
        })
        .collect::<Vec<_>>();
    let opaque = bytes.chunks_exact(4).all(|px| px[3] == 255);
    Ok(vello_cpu::Pixmap::from_parts_with_opacity(
        pixels, w, h, !opaque,
    ))
}

fn affine_to_cpu(a: Affine) -> vello_cpu::kurbo::Affine {
    vello_cpu::kurbo::Affine::new(a.as_coeffs())
}

fn rect_to_cpu(r: Rect) -> vello_cpu::kurbo::Rect {
    vello_cpu::kurbo::Rect::new(r.x0, r.y0, r.x1, r.y1)
}

fn color_to_cpu(c: Rgba8) -> vello_cpu::peniko::Color {
    vello_cpu::peniko::Color::from_rgba8(c.r, c.g, c.b, c.a)
}

#[cfg(test)]
#[path = "../../tests/unit/render/raster.rs"]
mod tests;
