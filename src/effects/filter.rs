use crate::{effects::blur, foundation::error::CoverResult};

/// Blur sigma per control unit when baking at the image's native resolution.
pub const BAKE_BLUR_MULTIPLIER: f32 = 2.0;

/// Brightness value that leaves colors untouched.
pub const NEUTRAL_BRIGHTNESS: f32 = 100.0;

/// Blur/brightness pair applied to the background image.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FilterParams {
    /// Blur in control units; the baked sigma is this times [`BAKE_BLUR_MULTIPLIER`].
    pub blur_amount: f32,
    /// Brightness in percent; `100` is neutral.
    pub brightness_percent: f32,
}

impl Default for FilterParams {
    fn default() -> Self {
        Self::NEUTRAL
    }
}

impl FilterParams {
    pub const NEUTRAL: FilterParams = FilterParams {
        blur_amount: 0.0,
        brightness_percent: NEUTRAL_BRIGHTNESS,
    };

    pub fn new(blur_amount: f32, brightness_percent: f32) -> Self {
        Self {
            blur_amount,
            brightness_percent,
        }
    }

    pub fn is_neutral(self) -> bool {
        self.blur_amount <= 0.0 && self.brightness_percent == NEUTRAL_BRIGHTNESS
    }

    /// Whether export has to pre-render this filter into a new bitmap.
    pub fn needs_baking(self) -> bool {
        !self.is_neutral()
    }

    pub fn brightness_factor(self) -> f32 {
        (self.brightness_percent / 100.0).max(0.0)
    }

    /// Blur sigma when baking at the image's native resolution.
    pub fn bake_sigma(self) -> f32 {
        self.blur_amount.max(0.0) * BAKE_BLUR_MULTIPLIER
    }
}

/// Gaussian blur followed by brightness, on premultiplied RGBA8.
pub fn apply_filter_premul(
    rgba: &[u8],
    width: u32,
    height: u32,
    sigma: f32,
    brightness_factor: f32,
) -> CoverResult<Vec<u8>> {
    let radius = blur::radius_for_sigma(sigma);
    let mut out = blur::blur_rgba8_premul(rgba, width, height, radius, sigma)?;
    apply_brightness_premul_in_place(&mut out, brightness_factor);
    Ok(out)
}

/// Multiply color channels by `factor`, keeping every channel at or below alpha.
pub fn apply_brightness_premul_in_place(rgba: &mut [u8], factor: f32) {
    if factor == 1.0 {
        return;
    }
    let factor = if factor.is_finite() { factor.max(0.0) } else { 0.0 };
    for px in rgba.chunks_exact_mut(4) {
        let a = f32::from(px[3]);
        for c in &mut px[..3] {
            *c = (f32::from(*c) * factor).round().min(a) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/filter.rs"]
mod tests;
