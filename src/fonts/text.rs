use std::{borrow::Cow, collections::HashMap, ops::Range};

use crate::{
    fonts::registry::RegisteredFont,
    foundation::{
        core::{LayoutAlignX, Rgba8},
        error::{CoverError, CoverResult},
    },
};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
/// RGBA8 brush color used by Parley text layout.
pub struct TextBrushRgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl From<Rgba8> for TextBrushRgba8 {
    fn from(c: Rgba8) -> Self {
        Self {
            r: c.r,
            g: c.g,
            b: c.b,
            a: c.a,
        }
    }
}

/// Glyph positioned relative to the top-left corner of its text block.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PlacedGlyph {
    pub id: u32,
    pub x: f32,
    pub y: f32,
}

#[derive(Clone, Debug, PartialEq)]
pub struct ShapedRun {
    pub brush: TextBrushRgba8,
    pub font_size: f32,
    pub glyphs: Vec<PlacedGlyph>,
}

/// Text shaped and placed inside a block, ready to be drawn at any offset.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ShapedText {
    /// Width of the widest line, or the full available width once text soft-wraps.
    pub width: f32,
    /// Sum of all line boxes.
    pub height: f32,
    pub line_count: usize,
    pub runs: Vec<ShapedRun>,
}

impl ShapedText {
    pub fn glyph_count(&self) -> usize {
        self.runs.iter().map(|r| r.glyphs.len()).sum()
    }
}

/// Style of one text block.
#[derive(Clone, Debug)]
pub struct TextStyle {
    pub size_px: f32,
    /// Line box height as a multiple of `size_px`.
    pub line_height: f32,
    pub brush: TextBrushRgba8,
    pub max_width_px: Option<f32>,
    pub align: LayoutAlignX,
}

/// Stateful helper for building Parley text layouts from registered fonts.
pub struct TextLayoutEngine {
    font_ctx: parley::FontContext,
    layout_ctx: parley::LayoutContext<TextBrushRgba8>,
    families: HashMap<String, String>,
}

impl Default for TextLayoutEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl TextLayoutEngine {
    pub fn new() -> Self {
        Self {
            font_ctx: parley::FontContext::default(),
            layout_ctx: parley::LayoutContext::new(),
            families: HashMap::new(),
        }
    }

    /// Register `font` with the layout engine once and return its Parley family name.
    fn family_for(&mut self, font: &RegisteredFont) -> CoverResult<String> {
        if let Some(name) = self.families.get(&font.name) {
            return Ok(name.clone());
        }

        let families = self
            .font_ctx
            .collection
            .register_fonts(parley::fontique::Blob::from(font.data.to_vec()), None);
        let family_id = families
            .iter()
            .find(|(_, infos)| infos.iter().any(|i| i.index() == font.index))
            .or_else(|| families.first())
            .map(|(id, _)| *id)
            .ok_or_else(|| {
                CoverError::font_load(format!(
                    "no font families registered from \"{}\"",
                    font.name
                ))
            })?;

        let family_name = self
            .font_ctx
            .collection
            .family_name(family_id)
            .ok_or_else(|| CoverError::font_load("registered font family has no name"))?
            .to_string();

        self.families.insert(font.name.clone(), family_name.clone());
        Ok(family_name)
    }

    /// Shape `text`, painting `overrides` ranges with their own brush.
    ///
    /// Lines are stacked with CSS line-box semantics: each line box is `size * line_height` tall
    /// and the glyphs' ascent+descent is centered inside it. Lines are aligned inside the block,
    /// which is as wide as its widest line.
    pub fn layout_block(
        &mut self,
        text: &str,
        font: &RegisteredFont,
        style: &TextStyle,
        overrides: &[(Range<usize>, TextBrushRgba8)],
    ) -> CoverResult<ShapedText> {
        if !style.size_px.is_finite() || style.size_px <= 0.0 {
            return Err(CoverError::validation("text size must be finite and > 0"));
        }
        if !style.line_height.is_finite() || style.line_height <= 0.0 {
            return Err(CoverError::validation("line height must be finite and > 0"));
        }
        if text.is_empty() {
            return Ok(ShapedText::default());
        }

        let family_name = self.family_for(font)?;

        let mut builder = self
            .layout_ctx
            .ranged_builder(&mut self.font_ctx, text, 1.0, true);
        builder.push_default(parley::style::StyleProperty::FontStack(
            parley::style::FontStack::Source(Cow::Owned(family_name)),
        ));
        builder.push_default(parley::style::StyleProperty::FontSize(style.size_px));
        builder.push_default(parley::style::StyleProperty::Brush(style.brush));
        for (range, brush) in overrides {
            if range.end <= text.len() && text.is_char_boundary(range.start) {
                builder.push(parley::style::StyleProperty::Brush(*brush), range.clone());
            }
        }

        let mut layout: parley::Layout<TextBrushRgba8> = builder.build(text);
        layout.break_all_lines(style.max_width_px);
        layout.align(
            style.max_width_px,
            parley::Alignment::Start,
            parley::AlignmentOptions::default(),
        );

        let line_box = style.size_px * style.line_height;
        let widest = layout
            .lines()
            .map(|l| {
                let m = l.metrics();
                m.advance - m.trailing_whitespace
            })
            .fold(0.0f32, f32::max);
        // A soft-wrapped block fills the available width, like CSS fit-content.
        let soft_wrapped = layout.lines().count() > text.split('\n').count();
        let width = match style.max_width_px {
            Some(max) if soft_wrapped => max.max(widest),
            _ => widest,
        };

        let mut runs = Vec::new();
        let mut line_count = 0usize;
        for (i, line) in layout.lines().enumerate() {
            line_count += 1;
            let m = line.metrics();
            let line_w = m.advance - m.trailing_whitespace;
            let dx = (style.align.factor() as f32) * (width - line_w);
            let baseline =
                i as f32 * line_box + (line_box - (m.ascent + m.descent)) / 2.0 + m.ascent;

            for item in line.items() {
                let parley::layout::PositionedLayoutItem::GlyphRun(run) = item else {
                    continue;
                };
                let glyphs = run
                    .positioned_glyphs()
                    .map(|g| PlacedGlyph {
                        id: g.id,
                        x: g.x + dx,
                        y: baseline + (g.y - m.baseline),
                    })
                    .collect();
                runs.push(ShapedRun {
                    brush: run.style().brush,
                    font_size: run.run().font_size(),
                    glyphs,
                });
            }
        }

        Ok(ShapedText {
            width,
            height: line_count as f32 * line_box,
            line_count,
            runs,
        })
    }
}

#[cfg(test)]
#[path = "../../tests/unit/fonts/text.rs"]
mod tests;
