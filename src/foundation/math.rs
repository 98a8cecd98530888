//! Integer helpers shared by the pixel and asset code.

const FNV_OFFSET: u64 = 0xcbf2_9ce4_8422_2325;
const FNV_PRIME: u64 = 0x0100_0000_01b3;

/// 64-bit FNV-1a over the concatenation of `parts`.
///
/// Image handles are derived from this, so the byte order of each part is part of the format.
pub(crate) fn content_hash<'a>(parts: impl IntoIterator<Item = &'a [u8]>) -> u64 {
    parts
        .into_iter()
        .flatten()
        .fold(FNV_OFFSET, |h, &b| (h ^ u64::from(b)).wrapping_mul(FNV_PRIME))
}

/// `a * b / 255`, rounded to nearest and saturated to a channel value.
pub(crate) fn mul_div255(a: u16, b: u16) -> u8 {
    let product = u32::from(a) * u32::from(b);
    u8::try_from((product + 127) / 255).unwrap_or(u8::MAX)
}
