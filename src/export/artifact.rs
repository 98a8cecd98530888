use std::{
    path::{Path, PathBuf},
    sync::atomic::{AtomicU64, Ordering},
    time::{SystemTime, UNIX_EPOCH},
};

use anyhow::Context;

use crate::foundation::error::CoverResult;

/// A finished export: PNG bytes plus the name the user downloads them under.
#[derive(Clone, PartialEq, Eq)]
pub struct ExportArtifact {
    pub file_name: String,
    pub width: u32,
    pub height: u32,
    pub png: Vec<u8>,
}

impl std::fmt::Debug for ExportArtifact {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ExportArtifact")
            .field("file_name", &self.file_name)
            .field("width", &self.width)
            .field("height", &self.height)
            .field("png_len", &self.png.len())
            .finish()
    }
}

impl ExportArtifact {
    /// Write the PNG into `dir` (created if missing) and return the full path.
    pub fn write_to_dir(&self, dir: impl AsRef<Path>) -> CoverResult<PathBuf> {
        let dir = dir.as_ref();
        std::fs::create_dir_all(dir)
            .with_context(|| format!("create output directory '{}'", dir.display()))?;
        let path = dir.join(&self.file_name);
        std::fs::write(&path, &self.png)
            .with_context(|| format!("write artifact '{}'", path.display()))?;
        Ok(path)
    }
}

/// `{prefix}-{unix_millis}.png`
pub fn artifact_file_name(prefix: &str, unix_millis: u64) -> String {
    format!("{prefix}-{unix_millis}.png")
}

fn unix_millis() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as u64)
        .unwrap_or(0)
}

/// Unix-millisecond stamps that strictly increase, even within one millisecond.
#[derive(Debug, Default)]
pub(crate) struct MillisClock {
    last: AtomicU64,
}

impl MillisClock {
    pub(crate) fn next(&self) -> u64 {
        let now = unix_millis();
        let mut prev = self.last.load(Ordering::Relaxed);
        loop {
            let next = now.max(prev + 1);
            match self
                .last
                .compare_exchange_weak(prev, next, Ordering::Relaxed, Ordering::Relaxed)
            {
                Ok(_) => return next,
                Err(actual) => prev = actual,
            }
        }
    }
}
