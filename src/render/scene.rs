//! Card layout in virtual-canvas coordinates.
//!
//! [`compose`] turns a [`Configuration`] into a flat [`Scene`] once; rasterizers draw the same
//! scene at any uniform scale, so the preview and the export never lay anything out twice.

use std::sync::Arc;

use crate::{
    assets::images::{ImageRef, PreparedImage, baked_ref},
    config::model::{Configuration, FontFamily, PresetFont},
    effects::filter::FilterParams,
    fonts::{
        registry::{FontRegistry, RegisteredFont},
        text::{ShapedText, TextBrushRgba8, TextLayoutEngine, TextStyle},
    },
    foundation::{
        core::{Canvas, Point, Rect, Rgba8},
        error::CoverResult,
    },
};

/// Padding of the content box.
pub const CONTENT_PAD_TOP: f64 = 96.0;
pub const CONTENT_PAD_RIGHT: f64 = 96.0;
pub const CONTENT_PAD_BOTTOM: f64 = 96.0;
pub const CONTENT_PAD_LEFT: f64 = 160.0;
/// Vertical gap between the stacked content items.
pub const CONTENT_GAP: f64 = 24.0;

pub const LABEL_TEXT: &str = "ARTICLE_LOG";
const LABEL_RULE_WIDTH: f64 = 32.0;
const LABEL_RULE_GAP: f64 = 12.0;
const LABEL_FONT_SIZE: f32 = 12.0;
const LABEL_LINE_BOX: f32 = 16.0;
const LABEL_OPACITY: f32 = 0.6;
const LABEL_FONT: FontFamily = FontFamily::Preset(PresetFont::Monospace);

const TITLE_LINE_HEIGHT: f32 = 0.85;

const SUBTITLE_MARGIN_TOP: f64 = 8.0;
const SUBTITLE_BORDER: f64 = 2.0;
const SUBTITLE_PAD_LEFT: f64 = 24.0;
const SUBTITLE_MAX_WIDTH: f64 = 896.0;
const SUBTITLE_FONT_SIZE: f32 = 30.0;
const SUBTITLE_LINE_HEIGHT: f32 = 1.25;
const SUBTITLE_OPACITY: f32 = 0.9;
const SUBTITLE_BORDER_ALPHA: u8 = 0x80;

const BRACKET_INSET: f64 = 48.0;
const BRACKET_SIZE: f64 = 32.0;
const BRACKET_OPACITY: f32 = 0.5;
const HAIRLINE_X: f64 = 128.0;
const HAIRLINE_COLOR: Rgba8 = Rgba8::rgba(255, 255, 255, 26);

/// Image drawn behind everything else, with the filter it still carries.
///
/// Rasterizers only accept a neutral filter here; non-neutral ones are baked into `image` first.
#[derive(Clone, Debug)]
pub struct BackgroundLayer {
    pub image_ref: ImageRef,
    pub image: Arc<PreparedImage>,
    /// Destination rectangle in virtual coordinates (object-cover placement).
    pub dest: Rect,
    pub filter: FilterParams,
}

#[derive(Clone, Debug)]
pub enum DrawOp {
    FillRect {
        rect: Rect,
        color: Rgba8,
    },
    Text {
        /// Top-left corner of the text block.
        origin: Point,
        text: Arc<ShapedText>,
        font: RegisteredFont,
    },
}

/// Everything needed to rasterize one card, in virtual-canvas coordinates.
#[derive(Clone, Debug)]
pub struct Scene {
    pub canvas: Canvas,
    pub clear: Rgba8,
    pub background: Option<BackgroundLayer>,
    /// Foreground operations in paint order.
    pub ops: Vec<DrawOp>,
}

impl Scene {
    /// A scene with nothing but a clear color.
    pub fn blank(clear: Rgba8) -> Self {
        Self {
            canvas: Canvas::VIRTUAL,
            clear,
            background: None,
            ops: Vec::new(),
        }
    }
}

/// Uniform scale-to-fill placement of a `iw` x `ih` image, centered on `canvas`.
pub fn object_cover(iw: u32, ih: u32, canvas: Canvas) -> Rect {
    let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));
    let (iw, ih) = (f64::from(iw.max(1)), f64::from(ih.max(1)));
    let s = (cw / iw).max(ch / ih);
    let (w, h) = (iw * s, ih * s);
    let x = (cw - w) / 2.0;
    let y = (ch - h) / 2.0;
    Rect::new(x, y, x + w, y + h)
}

/// Lay out `cfg`.
///
/// `background` is the decoded active image, or its bake under [`baked_ref`] for the configured
/// filter, in which case the layer carries no filter. Any other image is ignored.
#[tracing::instrument(skip_all, fields(alignment = %cfg.alignment))]
pub fn compose(
    cfg: &Configuration,
    background: Option<(ImageRef, Arc<PreparedImage>)>,
    fonts: &FontRegistry,
    engine: &mut TextLayoutEngine,
) -> CoverResult<Scene> {
    let canvas = Canvas::VIRTUAL;
    let mut scene = Scene::blank(cfg.background_color);

    if let (Some(active), Some((image_ref, image))) = (cfg.active_background_image(), background)
        && let Some(filter) = remaining_filter(cfg, active, image_ref)
    {
        scene.background = Some(BackgroundLayer {
            image_ref,
            dest: object_cover(image.width, image.height, canvas),
            image,
            filter,
        });
    }

    if cfg.show_decorations {
        push_decorations(&mut scene.ops, cfg.accent_color, canvas);
    }

    let font = fonts.resolve(&cfg.font_family)?;
    let label_font = fonts.resolve(&LABEL_FONT)?;
    let (align_x, align_y) = cfg.alignment.axes();
    let text_brush = TextBrushRgba8::from(cfg.text_color);

    let content = Rect::new(
        CONTENT_PAD_LEFT,
        CONTENT_PAD_TOP,
        f64::from(canvas.width) - CONTENT_PAD_RIGHT,
        f64::from(canvas.height) - CONTENT_PAD_BOTTOM,
    );

    let label = engine.layout_block(
        LABEL_TEXT,
        &label_font,
        &TextStyle {
            size_px: LABEL_FONT_SIZE,
            line_height: LABEL_LINE_BOX / LABEL_FONT_SIZE,
            brush: TextBrushRgba8::from(cfg.text_color.with_opacity(LABEL_OPACITY)),
            max_width_px: None,
            align: align_x,
        },
        &[],
    )?;

    let title_text = format!("{}.", cfg.title);
    let dot = cfg.title.len()..title_text.len();
    let title = engine.layout_block(
        &title_text,
        &font,
        &TextStyle {
            size_px: cfg.font_size_px,
            line_height: TITLE_LINE_HEIGHT,
            brush: text_brush,
            max_width_px: Some(content.width() as f32),
            align: align_x,
        },
        &[(dot, TextBrushRgba8::from(cfg.accent_color))],
    )?;

    let subtitle_block_max = SUBTITLE_MAX_WIDTH.min(content.width());
    let subtitle_text_max = subtitle_block_max - SUBTITLE_BORDER - SUBTITLE_PAD_LEFT;
    let subtitle = engine.layout_block(
        &cfg.subtitle,
        &font,
        &TextStyle {
            size_px: SUBTITLE_FONT_SIZE,
            line_height: SUBTITLE_LINE_HEIGHT,
            brush: TextBrushRgba8::from(cfg.text_color.with_opacity(SUBTITLE_OPACITY)),
            max_width_px: Some(subtitle_text_max as f32),
            align: align_x,
        },
        &[],
    )?;

    let label_w = LABEL_RULE_WIDTH + LABEL_RULE_GAP + f64::from(label.width);
    let label_h = f64::from(LABEL_LINE_BOX);
    let title_w = f64::from(title.width);
    let title_h = f64::from(title.height);
    let subtitle_w = SUBTITLE_BORDER + SUBTITLE_PAD_LEFT + f64::from(subtitle.width);
    let subtitle_h = f64::from(subtitle.height);

    let stack_h =
        label_h + CONTENT_GAP + title_h + CONTENT_GAP + SUBTITLE_MARGIN_TOP + subtitle_h;
    let x_for = |w: f64| content.x0 + align_x.factor() * (content.width() - w);
    let mut y = content.y0 + align_y.factor() * (content.height() - stack_h);

    // Label row: accent rule centered on the text line box.
    let label_x = x_for(label_w);
    let rule_y = y + (label_h - 1.0) / 2.0;
    scene.ops.push(DrawOp::FillRect {
        rect: Rect::new(label_x, rule_y, label_x + LABEL_RULE_WIDTH, rule_y + 1.0),
        color: cfg.accent_color,
    });
    push_text(
        &mut scene.ops,
        Point::new(label_x + LABEL_RULE_WIDTH + LABEL_RULE_GAP, y),
        label,
        &label_font,
    );
    y += label_h + CONTENT_GAP;

    push_text(&mut scene.ops, Point::new(x_for(title_w), y), title, &font);
    y += title_h + CONTENT_GAP + SUBTITLE_MARGIN_TOP;

    let sub_x = x_for(subtitle_w);
    if subtitle_h > 0.0 {
        scene.ops.push(DrawOp::FillRect {
            rect: Rect::new(sub_x, y, sub_x + SUBTITLE_BORDER, y + subtitle_h),
            color: Rgba8 {
                a: SUBTITLE_BORDER_ALPHA,
                ..cfg.accent_color
            },
        });
    }
    push_text(
        &mut scene.ops,
        Point::new(sub_x + SUBTITLE_BORDER + SUBTITLE_PAD_LEFT, y),
        subtitle,
        &font,
    );

    tracing::trace!(ops = scene.ops.len(), stack_h, "composed scene");
    Ok(scene)
}

/// Filter still to apply when drawing `image_ref` for `active`, or `None` if it is unrelated.
fn remaining_filter(
    cfg: &Configuration,
    active: ImageRef,
    image_ref: ImageRef,
) -> Option<FilterParams> {
    let filter = cfg.filter();
    if image_ref == active {
        Some(filter)
    } else if filter.needs_baking() && image_ref == baked_ref(active, filter) {
        Some(FilterParams::NEUTRAL)
    } else {
        None
    }
}

fn push_text(ops: &mut Vec<DrawOp>, origin: Point, text: ShapedText, font: &RegisteredFont) {
    if text.runs.is_empty() {
        return;
    }
    ops.push(DrawOp::Text {
        origin,
        text: Arc::new(text),
        font: font.clone(),
    });
}

fn push_decorations(ops: &mut Vec<DrawOp>, accent: Rgba8, canvas: Canvas) {
    let color = accent.with_opacity(BRACKET_OPACITY);
    let (cw, ch) = (f64::from(canvas.width), f64::from(canvas.height));

    // Top-right bracket: top and right borders.
    let x1 = cw - BRACKET_INSET;
    let x0 = x1 - BRACKET_SIZE;
    let y0 = BRACKET_INSET;
    let y1 = y0 + BRACKET_SIZE;
    ops.push(DrawOp::FillRect {
        rect: Rect::new(x0, y0, x1, y0 + 1.0),
        color,
    });
    ops.push(DrawOp::FillRect {
        rect: Rect::new(x1 - 1.0, y0, x1, y1),
        color,
    });

    // Bottom-left bracket: bottom and left borders.
    let x0 = BRACKET_INSET;
    let x1 = x0 + BRACKET_SIZE;
    let y1 = ch - BRACKET_INSET;
    let y0 = y1 - BRACKET_SIZE;
    ops.push(DrawOp::FillRect {
        rect: Rect::new(x0, y1 - 1.0, x1, y1),
        color,
    });
    ops.push(DrawOp::FillRect {
        rect: Rect::new(x0, y0, x0 + 1.0, y1),
        color,
    });

    ops.push(DrawOp::FillRect {
        rect: Rect::new(HAIRLINE_X, 0.0, HAIRLINE_X + 1.0, ch),
        color: HAIRLINE_COLOR,
    });
}

#[cfg(test)]
#[path = "../../tests/unit/render/scene.rs"]
mod tests;
