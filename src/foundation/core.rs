use std::{fmt, str::FromStr};

use crate::foundation::error::{CoverError, CoverResult};

pub use kurbo::{Affine, Point, Rect};

/// Logical width of the virtual canvas, in virtual pixels.
pub const VIRTUAL_WIDTH: u32 = 1280;
/// Logical height of the virtual canvas, in virtual pixels.
pub const VIRTUAL_HEIGHT: u32 = 720;

/// Pixel dimensions of a drawing surface.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct Canvas {
    pub width: u32,
    pub height: u32,
}

impl Canvas {
    /// The fixed coordinate space every composition is laid out in.
    pub const VIRTUAL: Canvas = Canvas {
        width: VIRTUAL_WIDTH,
        height: VIRTUAL_HEIGHT,
    };

    pub fn new(width: u32, height: u32) -> CoverResult<Self> {
        if width == 0 || height == 0 {
            return Err(CoverError::validation("canvas dimensions must be > 0"));
        }
        Ok(Self { width, height })
    }

    pub fn rect(self) -> Rect {
        Rect::new(0.0, 0.0, f64::from(self.width), f64::from(self.height))
    }

    /// Pixel size of this canvas after a uniform scale, rounded up to whole pixels.
    pub fn scaled(self, scale: f64) -> CoverResult<Canvas> {
        if !scale.is_finite() || scale <= 0.0 {
            return Err(CoverError::validation("canvas scale must be finite and > 0"));
        }
        // Absorb float noise such as 1280 * 0.3 = 384.00000000000006.
        let w = (f64::from(self.width) * scale - 1e-6).ceil();
        let h = (f64::from(self.height) * scale - 1e-6).ceil();
        if w > f64::from(u16::MAX) || h > f64::from(u16::MAX) {
            return Err(CoverError::validation(format!(
                "scaled canvas {w}x{h} exceeds the maximum surface size"
            )));
        }
        Canvas::new((w as u32).max(1), (h as u32).max(1))
    }
}

/// Straight (non-premultiplied) RGBA8 color.
///
/// Serialized as a `#RRGGBB` / `#RRGGBBAA` hex string.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct Rgba8 {
    pub r: u8,
    pub g: u8,
    pub b: u8,
    pub a: u8,
}

impl Rgba8 {
    pub const BLACK: Rgba8 = Rgba8::rgb(0, 0, 0);
    pub const WHITE: Rgba8 = Rgba8::rgb(255, 255, 255);

    pub const fn rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b, a: 255 }
    }

    pub const fn rgba(r: u8, g: u8, b: u8, a: u8) -> Self {
        Self { r, g, b, a }
    }

    /// Parse `#RRGGBB` or `#RRGGBBAA` (the leading `#` is optional, case-insensitive).
    pub fn from_hex(s: &str) -> CoverResult<Self> {
        let s = s.trim();
        let s = s.strip_prefix('#').unwrap_or(s);

        fn hex_byte(pair: &str) -> CoverResult<u8> {
            u8::from_str_radix(pair, 16)
                .map_err(|_| CoverError::validation(format!("invalid hex byte \"{pair}\"")))
        }

        if !s.is_ascii() {
            return Err(CoverError::validation("hex color must be ASCII"));
        }
        match s.len() {
            6 => Ok(Self::rgb(
                hex_byte(&s[0..2])?,
                hex_byte(&s[2..4])?,
                hex_byte(&s[4..6])?,
            )),
            8 => Ok(Self::rgba(
                hex_byte(&s[0..2])?,
                hex_byte(&s[2..4])?,
                hex_byte(&s[4..6])?,
                hex_byte(&s[6..8])?,
            )),
            _ => Err(CoverError::validation(
                "hex color must be #RRGGBB or #RRGGBBAA (case-insensitive)",
            )),
        }
    }

    /// Lowercase hex form; the alpha pair is omitted for opaque colors.
    pub fn to_hex(self) -> String {
        if self.a == 255 {
            format!("#{:02x}{:02x}{:02x}", self.r, self.g, self.b)
        } else {
            format!("#{:02x}{:02x}{:02x}{:02x}", self.r, self.g, self.b, self.a)
        }
    }

    /// Same color with alpha scaled by `opacity` (clamped to `0..=1`).
    pub fn with_opacity(self, opacity: f32) -> Self {
        let op = if opacity.is_finite() {
            opacity.clamp(0.0, 1.0)
        } else {
            0.0
        };
        Self {
            a: (f32::from(self.a) * op).round() as u8,
            ..self
        }
    }

    pub fn to_premul(self) -> [u8; 4] {
        fn premul(c: u8, a: u8) -> u8 {
            crate::foundation::math::mul_div255(u16::from(c), u16::from(a))
        }
        [
            premul(self.r, self.a),
            premul(self.g, self.a),
            premul(self.b, self.a),
            self.a,
        ]
    }
}

impl fmt::Display for Rgba8 {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.to_hex())
    }
}

impl FromStr for Rgba8 {
    type Err = CoverError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::from_hex(s)
    }
}

impl serde::Serialize for Rgba8 {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&self.to_hex())
    }
}

impl<'de> serde::Deserialize<'de> for Rgba8 {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = <String as serde::Deserialize>::deserialize(deserializer)?;
        Self::from_hex(&s).map_err(serde::de::Error::custom)
    }
}

/// Horizontal placement inside a container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayoutAlignX {
    /// Align to start (left).
    #[default]
    Start,
    /// Align to center.
    Center,
    /// Align to end (right).
    End,
}

/// Vertical placement inside a container.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum LayoutAlignY {
    /// Align to start (top).
    #[default]
    Start,
    /// Align to center.
    Center,
    /// Align to end (bottom).
    End,
}

impl LayoutAlignX {
    /// Fraction of the free space placed before the item.
    pub fn factor(self) -> f64 {
        match self {
            Self::Start => 0.0,
            Self::Center => 0.5,
            Self::End => 1.0,
        }
    }
}

impl LayoutAlignY {
    /// Fraction of the free space placed above the item.
    pub fn factor(self) -> f64 {
        match self {
            Self::Start => 0.0,
            Self::Center => 0.5,
            Self::End => 1.0,
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/core.rs"]
mod tests;
