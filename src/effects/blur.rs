use crate::foundation::error::{CoverError, CoverResult};

/// Largest kernel radius accepted by [`blur_rgba8_premul`].
pub const MAX_BLUR_RADIUS: u32 = 512;

/// Kernel radius covering three standard deviations.
pub fn radius_for_sigma(sigma: f32) -> u32 {
    if !sigma.is_finite() || sigma <= 0.0 {
        return 0;
    }
    ((sigma * 3.0).ceil() as u32).min(MAX_BLUR_RADIUS)
}

/// Separable Gaussian blur over premultiplied RGBA8 with clamped edges.
pub fn blur_rgba8_premul(
    src: &[u8],
    width: u32,
    height: u32,
    radius: u32,
    sigma: f32,
) -> CoverResult<Vec<u8>> {
    let expected_len = (width as usize)
        .checked_mul(height as usize)
        .and_then(|v| v.checked_mul(4))
        .ok_or_else(|| CoverError::rasterization("blur buffer size overflow"))?;
    if src.len() != expected_len {
        return Err(CoverError::rasterization(format!(
            "blur input of {} bytes does not match {width}x{height}",
            src.len()
        )));
    }
    if radius == 0 || width == 0 || height == 0 {
        return Ok(src.to_vec());
    }
    if radius > MAX_BLUR_RADIUS {
        return Err(CoverError::validation(format!(
            "blur radius must be <= {MAX_BLUR_RADIUS}"
        )));
    }

    let kernel = kernel_q16(radius, sigma)?;
    let (w, h) = (width as usize, height as usize);
    let mut tmp = vec![0u8; expected_len];
    convolve(src, &mut tmp, w, h, Axis::Row, &kernel);
    let mut out = vec![0u8; expected_len];
    convolve(&tmp, &mut out, w, h, Axis::Column, &kernel);
    Ok(out)
}

const Q16_ONE: i64 = 1 << 16;

/// Normalized Gaussian weights in Q16 fixed point, `2 * radius + 1` taps summing to one.
fn kernel_q16(radius: u32, sigma: f32) -> CoverResult<Vec<u32>> {
    if !sigma.is_finite() || sigma <= 0.0 {
        return Err(CoverError::validation("blur sigma must be > 0"));
    }
    let two_s2 = 2.0 * f64::from(sigma).powi(2);
    let r = i64::from(radius);
    let raw: Vec<f64> = (-r..=r).map(|i| ((-(i * i)) as f64 / two_s2).exp()).collect();
    let total: f64 = raw.iter().sum();
    if total <= 0.0 {
        return Err(CoverError::rasterization("gaussian kernel sum is zero"));
    }

    let mut q: Vec<u32> = raw
        .iter()
        .map(|w| ((w / total) * Q16_ONE as f64).round() as u32)
        .collect();
    // Center tap absorbs rounding so a flat image stays flat.
    let sum: i64 = q.iter().map(|&v| i64::from(v)).sum();
    let mid = q.len() / 2;
    q[mid] = (i64::from(q[mid]) + Q16_ONE - sum).clamp(0, Q16_ONE) as u32;
    Ok(q)
}

#[derive(Clone, Copy)]
enum Axis {
    Row,
    Column,
}

fn convolve(src: &[u8], dst: &mut [u8], w: usize, h: usize, axis: Axis, kernel: &[u32]) {
    let r = (kernel.len() / 2) as isize;
    let (n, step) = match axis {
        Axis::Row => (w, 4),
        Axis::Column => (h, w * 4),
    };
    for (i, px) in dst.chunks_exact_mut(4).enumerate() {
        let (x, y) = (i % w, i / w);
        let (pos, base) = match axis {
            Axis::Row => (x, y * w * 4),
            Axis::Column => (y, x * 4),
        };
        let mut acc = [0u64; 4];
        for (k, &weight) in kernel.iter().enumerate() {
            let s = (pos as isize + k as isize - r).clamp(0, n as isize - 1) as usize;
            let idx = base + s * step;
            for (a, &v) in acc.iter_mut().zip(&src[idx..idx + 4]) {
                *a += u64::from(weight) * u64::from(v);
            }
        }
        for (out, a) in px.iter_mut().zip(acc) {
            *out = ((a + (1 << 15)) >> 16).min(255) as u8;
        }
    }
}

#[cfg(test)]
#[path = "../../tests/unit/effects/blur.rs"]
mod tests;
