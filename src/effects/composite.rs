use crate::foundation::{
    error::{CoverError, CoverResult},
    math::mul_div255,
};

pub type PremulRgba8 = [u8; 4];

/// Porter-Duff source-over for one premultiplied pixel, with `src` scaled by `opacity`.
pub fn over(dst: PremulRgba8, src: PremulRgba8, opacity: f32) -> PremulRgba8 {
    let op = (opacity.clamp(0.0, 1.0) * 255.0).round() as u16;
    let sa = mul_div255(u16::from(src[3]), op);
    if sa == 0 {
        return dst;
    }
    let inv = u16::from(255 - sa);
    std::array::from_fn(|i| {
        let s = if i == 3 {
            sa
        } else {
            mul_div255(u16::from(src[i]), op)
        };
        s.saturating_add(mul_div255(u16::from(dst[i]), inv))
    })
}

/// Composite `src` over `dst` in place; both are premultiplied RGBA8 of equal size.
pub fn over_in_place(dst: &mut [u8], src: &[u8], opacity: f32) -> CoverResult<()> {
    if dst.len() != src.len() || dst.len() % 4 != 0 {
        return Err(CoverError::rasterization(format!(
            "cannot composite {} bytes over {} bytes",
            src.len(),
            dst.len()
        )));
    }
    for (d, s) in dst.chunks_exact_mut(4).zip(src.chunks_exact(4)) {
        let out = over([d[0], d[1], d[2], d[3]], [s[0], s[1], s[2], s[3]], opacity);
        d.copy_from_slice(&out);
    }
    Ok(())
}

/// Fill a premultiplied RGBA8 buffer with one pixel value.
pub fn fill(dst: &mut [u8], px: PremulRgba8) {
    for d in dst.chunks_exact_mut(4) {
        d.copy_from_slice(&px);
    }
}
