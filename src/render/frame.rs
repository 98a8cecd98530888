use crate::{
    assets::decode::{encode_png_rgba8, unpremultiply_rgba8_in_place},
    foundation::error::{CoverError, CoverResult},
};

/// A rendered frame as RGBA8 pixels.
///
/// Rasterizers produce **premultiplied alpha**; the `premultiplied` flag makes this explicit at
/// API boundaries.
#[derive(Clone, Debug, PartialEq)]
pub struct FrameRGBA {
    /// Frame width in pixels.
    pub width: u32,
    /// Frame height in pixels.
    pub height: u32,
    /// RGBA8 bytes, tightly packed, row-major.
    pub data: Vec<u8>,
    /// Whether the `data` is premultiplied alpha.
    pub premultiplied: bool,
}

impl FrameRGBA {
    pub fn new(width: u32, height: u32, data: Vec<u8>, premultiplied: bool) -> CoverResult<Self> {
        if data.len() != (width as usize) * (height as usize) * 4 {
            return Err(CoverError::rasterization(format!(
                "frame buffer of {} bytes does not match {width}x{height}",
                data.len()
            )));
        }
        Ok(Self {
            width,
            height,
            data,
            premultiplied,
        })
    }

    /// Pixel at `(x, y)`, or `None` outside the frame.
    pub fn pixel(&self, x: u32, y: u32) -> Option<[u8; 4]> {
        if x >= self.width || y >= self.height {
            return None;
        }
        let i = ((y as usize) * (self.width as usize) + (x as usize)) * 4;
        Some([
            self.data[i],
            self.data[i + 1],
            self.data[i + 2],
            self.data[i + 3],
        ])
    }

    /// Straight-alpha copy of the pixel data.
    pub fn to_straight(&self) -> Vec<u8> {
        let mut out = self.data.clone();
        if self.premultiplied {
            unpremultiply_rgba8_in_place(&mut out);
        }
        out
    }

    /// Encode as PNG (straight alpha, as the format requires).
    pub fn encode_png(&self) -> CoverResult<Vec<u8>> {
        encode_png_rgba8(self.width, self.height, self.to_straight())
    }
}
