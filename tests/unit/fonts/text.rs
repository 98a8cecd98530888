use super::*;
use crate::{config::model::FontFamily, fonts::registry::FontRegistry};

fn sans() -> Option<RegisteredFont> {
    let reg = FontRegistry::new(true);
    if !reg.has_system_fonts() {
        return None;
    }
    reg.resolve(&FontFamily::from("sans-serif")).ok()
}

fn style(size: f32, lh: f32, max: Option<f32>) -> TextStyle {
    TextStyle {
        size_px: size,
        line_height: lh,
        brush: TextBrushRgba8::from(Rgba8::WHITE),
        max_width_px: max,
        align: LayoutAlignX::Start,
    }
}

#[test]
fn empty_text_has_no_extent() {
    let font = RegisteredFont {
        name: "unused".to_owned(),
        family: "unused".to_owned(),
        data: std::sync::Arc::new(Vec::new()),
        index: 0,
    };
    let mut engine = TextLayoutEngine::new();
    let shaped = engine
        .layout_block("", &font, &style(12.0, 1.0, None), &[])
        .unwrap();
    assert_eq!(shaped, ShapedText::default());
    assert!(
        engine
            .layout_block("x", &font, &style(0.0, 1.0, None), &[])
            .is_err()
    );
}

#[test]
fn explicit_newlines_produce_line_boxes() {
    let Some(font) = sans() else {
        return;
    };
    let mut engine = TextLayoutEngine::new();
    let shaped = engine
        .layout_block("AB\nCD", &font, &style(100.0, 0.85, None), &[])
        .unwrap();
    assert!(shaped.line_count >= 2);
    assert!((shaped.height - shaped.line_count as f32 * 85.0).abs() < 1e-3);
    assert!(shaped.glyph_count() >= 4);
    assert!(shaped.width > 0.0);
}

#[test]
fn long_text_wraps_to_max_width() {
    let Some(font) = sans() else {
        return;
    };
    let mut engine = TextLayoutEngine::new();
    let text = "WORD ".repeat(40);
    let shaped = engine
        .layout_block(&text, &font, &style(30.0, 1.25, Some(300.0)), &[])
        .unwrap();
    assert!(shaped.line_count > 1);
    assert!(shaped.width <= 300.0 + 1e-3);
}

#[test]
fn overrides_paint_their_own_brush() {
    let Some(font) = sans() else {
        return;
    };
    let accent = TextBrushRgba8::from(Rgba8::rgb(0xef, 0x44, 0x44));
    let mut engine = TextLayoutEngine::new();
    let shaped = engine
        .layout_block("HELLO.", &font, &style(50.0, 1.0, None), &[(5..6, accent)])
        .unwrap();
    assert!(shaped.runs.iter().any(|r| r.brush == accent));
    assert!(shaped.runs.iter().any(|r| r.brush.r == 255 && r.brush.g == 255));
}
