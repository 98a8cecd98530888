use crate::foundation::{
    core::{Canvas, VIRTUAL_WIDTH},
    error::CoverResult,
};

/// `available / V` for the fixed virtual width, or `1.0` when the width is unusable.
pub fn compute_scale(available_width: f64, padding_px: f64) -> f64 {
    let padding = if padding_px.is_finite() {
        padding_px.max(0.0)
    } else {
        0.0
    };
    let inner = available_width - padding;
    if !inner.is_finite() || inner <= 0.0 {
        return 1.0;
    }
    inner / f64::from(VIRTUAL_WIDTH)
}

/// Tracks the on-screen width and derives the preview scale from it.
#[derive(Clone, Debug, PartialEq)]
pub struct ViewportScaler {
    padding_px: f64,
    width: Option<f64>,
    scale: f64,
}

impl Default for ViewportScaler {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl ViewportScaler {
    pub fn new(padding_px: f64) -> Self {
        Self {
            padding_px,
            width: None,
            scale: 1.0,
        }
    }

    /// Record a new measured width. Returns the recomputed scale.
    pub fn resize(&mut self, available_width: f64) -> f64 {
        self.width = Some(available_width);
        self.scale = compute_scale(available_width, self.padding_px);
        tracing::trace!(available_width, scale = self.scale, "viewport resized");
        self.scale
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn available_width(&self) -> Option<f64> {
        self.width
    }

    /// Pixel size of the scaled preview.
    pub fn preview_canvas(&self) -> CoverResult<Canvas> {
        Canvas::VIRTUAL.scaled(self.scale)
    }
}
