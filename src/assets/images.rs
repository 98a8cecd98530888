use std::{
    collections::HashMap,
    fmt,
    sync::{Arc, Mutex, MutexGuard},
};

use crate::{
    assets::decode,
    effects::filter::FilterParams,
    foundation::error::{CoverError, CoverResult},
    foundation::math::content_hash,
};

const TAG_UPLOAD: u8 = b'U';
const TAG_BAKED: u8 = b'B';

#[derive(Clone, Debug)]
/// Raster image decoded to premultiplied RGBA8.
pub struct PreparedImage {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
    /// Pixel bytes in row-major premultiplied RGBA8.
    pub rgba8_premul: Arc<Vec<u8>>,
}

/// Session-local handle to an image held by an [`ImageTable`].
///
/// Uploads and baked images are content-addressed, so identical inputs map to the same handle.
#[derive(
    Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, serde::Serialize, serde::Deserialize,
)]
pub struct ImageRef(pub(crate) u64);

impl ImageRef {
    pub fn from_u64(raw: u64) -> Self {
        Self(raw)
    }

    pub fn as_u64(self) -> u64 {
        self.0
    }
}

impl fmt::Display for ImageRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "img:{:016x}", self.0)
    }
}

/// Where an image table entry came from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum ImageOrigin {
    /// Bytes supplied by the user.
    Upload,
    /// Output of the filter baking engine.
    Baked {
        source: ImageRef,
        params: FilterParams,
    },
}

struct ImageEntry {
    bytes: Arc<Vec<u8>>,
    origin: ImageOrigin,
    decoded: Option<Arc<PreparedImage>>,
}

/// In-memory image table for one session (the analogue of blob/data URLs).
///
/// Uploaded bytes are stored as-is; decoding happens lazily and is cached.
#[derive(Default)]
pub struct ImageTable {
    entries: Mutex<HashMap<ImageRef, ImageEntry>>,
}

impl fmt::Debug for ImageTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageTable")
            .field("len", &self.len())
            .finish()
    }
}

impl ImageTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Store uploaded bytes without decoding them.
    pub fn insert_upload(&self, bytes: Vec<u8>) -> CoverResult<ImageRef> {
        if bytes.is_empty() {
            return Err(CoverError::validation("uploaded image is empty"));
        }
        let id = ImageRef(content_hash([&[TAG_UPLOAD][..], &bytes[..]]));

        let mut entries = self.lock()?;
        entries.entry(id).or_insert_with(|| ImageEntry {
            bytes: Arc::new(bytes),
            origin: ImageOrigin::Upload,
            decoded: None,
        });
        tracing::debug!(image = %id, "stored uploaded image");
        Ok(id)
    }

    /// Store a baked image; its handle is derived from the source handle and the filter.
    pub(crate) fn insert_baked(
        &self,
        source: ImageRef,
        params: FilterParams,
        png: Arc<Vec<u8>>,
        decoded: Arc<PreparedImage>,
    ) -> CoverResult<ImageRef> {
        let id = baked_ref(source, params);
        let mut entries = self.lock()?;
        entries.insert(
            id,
            ImageEntry {
                bytes: png,
                origin: ImageOrigin::Baked { source, params },
                decoded: Some(decoded),
            },
        );
        Ok(id)
    }

    pub fn contains(&self, id: ImageRef) -> bool {
        self.lock().map(|e| e.contains_key(&id)).unwrap_or(false)
    }

    pub fn len(&self) -> usize {
        self.lock().map(|e| e.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn origin(&self, id: ImageRef) -> CoverResult<ImageOrigin> {
        self.lock()?
            .get(&id)
            .map(|e| e.origin)
            .ok_or_else(|| unknown(id))
    }

    /// Encoded bytes as uploaded (or the PNG produced by baking).
    pub fn bytes(&self, id: ImageRef) -> CoverResult<Arc<Vec<u8>>> {
        self.lock()?
            .get(&id)
            .map(|e| e.bytes.clone())
            .ok_or_else(|| unknown(id))
    }

    /// Cached decoded pixels, if the image was decoded before.
    pub fn cached(&self, id: ImageRef) -> CoverResult<Option<Arc<PreparedImage>>> {
        self.lock()?
            .get(&id)
            .map(|e| e.decoded.clone())
            .ok_or_else(|| unknown(id))
    }

    /// Decode `id` off the async executor, caching the result.
    pub async fn decode(&self, id: ImageRef) -> CoverResult<Arc<PreparedImage>> {
        if let Some(img) = self.cached(id)? {
            return Ok(img);
        }
        let bytes = self.bytes(id)?;
        let img = tokio::task::spawn_blocking(move || decode::decode_image(&bytes)).await??;
        let img = Arc::new(img);
        self.store_decoded(id, img.clone())?;
        Ok(img)
    }

    /// Drop an entry. Returns whether it existed.
    pub fn release(&self, id: ImageRef) -> bool {
        match self.lock() {
            Ok(mut entries) => entries.remove(&id).is_some(),
            Err(_) => false,
        }
    }

    fn store_decoded(&self, id: ImageRef, img: Arc<PreparedImage>) -> CoverResult<()> {
        let mut entries = self.lock()?;
        let entry = entries.get_mut(&id).ok_or_else(|| unknown(id))?;
        entry.decoded = Some(img);
        Ok(())
    }

    fn lock(&self) -> CoverResult<MutexGuard<'_, HashMap<ImageRef, ImageEntry>>> {
        self.entries
            .lock()
            .map_err(|_| CoverError::Other(anyhow::anyhow!("image table lock poisoned")))
    }
}

/// Handle a baked image of `source` under `params` is stored at.
pub fn baked_ref(source: ImageRef, params: FilterParams) -> ImageRef {
    ImageRef(content_hash([
        &[TAG_BAKED][..],
        &source.0.to_le_bytes()[..],
        &params.blur_amount.to_bits().to_le_bytes()[..],
        &params.brightness_percent.to_bits().to_le_bytes()[..],
    ]))
}

fn unknown(id: ImageRef) -> CoverError {
    CoverError::decode(format!("unknown image {id}"))
}

#[cfg(test)]
#[path = "../../tests/unit/assets/images.rs"]
mod tests;
