use super::*;
use crate::config::model::Alignment;

fn rects(ops: &[DrawOp]) -> Vec<Rect> {
    ops.iter()
        .filter_map(|op| match op {
            DrawOp::FillRect { rect, .. } => Some(*rect),
            DrawOp::Text { .. } => None,
        })
        .collect()
}

#[test]
fn object_cover_fills_and_centers() {
    let wide = object_cover(2560, 720, Canvas::VIRTUAL);
    assert_eq!(wide, Rect::new(-640.0, 0.0, 1920.0, 720.0));

    let tall = object_cover(100, 100, Canvas::VIRTUAL);
    assert_eq!(tall, Rect::new(0.0, -280.0, 1280.0, 1000.0));
}

#[test]
fn decorations_sit_at_fixed_insets() {
    let mut ops = Vec::new();
    push_decorations(&mut ops, Rgba8::rgb(0xef, 0x44, 0x44), Canvas::VIRTUAL);
    let r = rects(&ops);
    assert_eq!(r.len(), 5);
    assert_eq!(r[0], Rect::new(1200.0, 48.0, 1232.0, 49.0));
    assert_eq!(r[1], Rect::new(1231.0, 48.0, 1232.0, 80.0));
    assert_eq!(r[2], Rect::new(48.0, 671.0, 80.0, 672.0));
    assert_eq!(r[3], Rect::new(48.0, 640.0, 49.0, 672.0));
    assert_eq!(r[4], Rect::new(128.0, 0.0, 129.0, 720.0));

    let DrawOp::FillRect { color, .. } = &ops[0] else {
        panic!("expected a rect");
    };
    assert_eq!(color.a, 128);
}

#[test]
fn compose_requires_a_resolvable_font() {
    let fonts = FontRegistry::new(false);
    let mut engine = TextLayoutEngine::new();
    let err = compose(&Configuration::default(), None, &fonts, &mut engine).unwrap_err();
    assert!(matches!(err, crate::CoverError::Rasterization(_)));
}

#[test]
fn bottom_left_stack_ends_at_the_content_box() {
    let fonts = FontRegistry::new(true);
    if !fonts.has_system_fonts() {
        return;
    }
    let mut engine = TextLayoutEngine::new();
    let cfg = Configuration {
        show_decorations: false,
        ..Configuration::default()
    };
    let scene = compose(&cfg, None, &fonts, &mut engine).unwrap();
    assert!(scene.background.is_none());
    assert_eq!(scene.clear, cfg.background_color);

    let r = rects(&scene.ops);
    // Label rule, then the subtitle border.
    assert_eq!(r.len(), 2);
    assert_eq!(r[0].x0, CONTENT_PAD_LEFT);
    assert_eq!(r[0].width(), 32.0);
    let border = r[1];
    assert_eq!(border.x0, CONTENT_PAD_LEFT);
    assert!((border.y1 - (720.0 - CONTENT_PAD_BOTTOM)).abs() < 1e-6);
}

#[test]
fn right_alignment_mirrors_left() {
    let fonts = FontRegistry::new(true);
    if !fonts.has_system_fonts() {
        return;
    }
    let mut engine = TextLayoutEngine::new();
    let cfg = Configuration {
        show_decorations: false,
        alignment: Alignment::TopRight,
        ..Configuration::default()
    };
    let scene = compose(&cfg, None, &fonts, &mut engine).unwrap();
    let r = rects(&scene.ops);
    assert_eq!(r[0].y0, CONTENT_PAD_TOP + 7.5);
    for op in &scene.ops {
        if let DrawOp::Text { origin, text, .. } = op {
            assert!(origin.x + f64::from(text.width) <= 1184.0 + 1e-3);
        }
    }
}

#[test]
fn background_is_only_attached_for_the_active_image() {
    let fonts = FontRegistry::new(true);
    if !fonts.has_system_fonts() {
        return;
    }
    let mut engine = TextLayoutEngine::new();
    let image = Arc::new(PreparedImage {
        width: 2,
        height: 2,
        rgba8_premul: Arc::new(vec![255; 16]),
    });
    let id = ImageRef::from_u64(5);
    let mut cfg = Configuration {
        background_image: Some(id),
        blur_amount: 3.0,
        ..Configuration::default()
    };

    let scene = compose(&cfg, Some((id, image.clone())), &fonts, &mut engine).unwrap();
    assert!(scene.background.is_none());

    cfg.background_mode = crate::config::model::BackgroundMode::Image;
    let scene = compose(&cfg, Some((id, image)), &fonts, &mut engine).unwrap();
    let bg = scene.background.unwrap();
    assert_eq!(bg.filter, FilterParams::new(3.0, 100.0));
    assert_eq!(bg.dest, Rect::new(0.0, -280.0, 1280.0, 1000.0));
}

#[test]
fn baked_background_is_attached_without_a_filter() {
    let fonts = FontRegistry::new(true);
    if !fonts.has_system_fonts() {
        return;
    }
    let mut engine = TextLayoutEngine::new();
    let image = Arc::new(PreparedImage {
        width: 2,
        height: 2,
        rgba8_premul: Arc::new(vec![255; 16]),
    });
    let id = ImageRef::from_u64(5);
    let cfg = Configuration {
        background_mode: crate::config::model::BackgroundMode::Image,
        background_image: Some(id),
        blur_amount: 3.0,
        ..Configuration::default()
    };

    let baked = baked_ref(id, cfg.filter());
    let scene = compose(&cfg, Some((baked, image.clone())), &fonts, &mut engine).unwrap();
    let bg = scene.background.unwrap();
    assert_eq!(bg.image_ref, baked);
    assert_eq!(bg.filter, FilterParams::NEUTRAL);

    let stale = baked_ref(id, FilterParams::new(9.0, 100.0));
    let scene = compose(&cfg, Some((stale, image)), &fonts, &mut engine).unwrap();
    assert!(scene.background.is_none());
}

#[test]
fn label_uses_the_monospace_preset() {
    let fonts = FontRegistry::new(true);
    if !fonts.has_system_fonts() {
        return;
    }
    let mut engine = TextLayoutEngine::new();
    let cfg = Configuration {
        font_family: FontFamily::Preset(PresetFont::Serif),
        ..Configuration::default()
    };
    let scene = compose(&cfg, None, &fonts, &mut engine).unwrap();

    let names: Vec<&str> = scene
        .ops
        .iter()
        .filter_map(|op| match op {
            DrawOp::Text { font, .. } => Some(font.name.as_str()),
            DrawOp::FillRect { .. } => None,
        })
        .collect();
    assert_eq!(names, ["monospace", "serif", "serif"]);
}
