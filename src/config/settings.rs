use std::time::Duration;

use crate::foundation::error::{CoverError, CoverResult};

/// Session-wide knobs that are not part of the card itself.
#[derive(Clone, Debug, PartialEq)]
pub struct SessionSettings {
    /// Multiplier applied to the virtual canvas for exports (1.5 gives 1920x1080).
    pub export_quality: f64,
    /// Upper bound on waiting for the preview to render a substituted configuration.
    pub settle_timeout: Duration,
    /// Leading part of exported file names.
    pub file_prefix: String,
    /// Horizontal padding subtracted from the viewport width before scaling.
    pub viewport_padding_px: f64,
    /// Load the platform font collection for preset families.
    pub load_system_fonts: bool,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            export_quality: 1.5,
            settle_timeout: Duration::from_millis(2000),
            file_prefix: "COVER".to_owned(),
            viewport_padding_px: 0.0,
            load_system_fonts: true,
        }
    }
}

impl SessionSettings {
    /// Defaults overridden by `COVERFORGE_EXPORT_QUALITY`, `COVERFORGE_SETTLE_TIMEOUT_MS` and
    /// `COVERFORGE_FILE_PREFIX`. Unparsable values are ignored.
    pub fn from_env() -> Self {
        let mut s = Self::default();
        if let Some(q) = std::env::var("COVERFORGE_EXPORT_QUALITY")
            .ok()
            .and_then(|v| v.trim().parse::<f64>().ok())
            .filter(|q| q.is_finite() && *q > 0.0)
        {
            s.export_quality = q;
        }
        if let Some(ms) = std::env::var("COVERFORGE_SETTLE_TIMEOUT_MS")
            .ok()
            .and_then(|v| v.trim().parse::<u64>().ok())
        {
            s.settle_timeout = Duration::from_millis(ms);
        }
        if let Some(prefix) = std::env::var("COVERFORGE_FILE_PREFIX")
            .ok()
            .filter(|p| !p.trim().is_empty())
        {
            s.file_prefix = prefix.trim().to_owned();
        }
        s
    }

    pub fn validate(&self) -> CoverResult<()> {
        if !self.export_quality.is_finite() || self.export_quality <= 0.0 {
            return Err(CoverError::validation("export quality must be finite and > 0"));
        }
        if !self.viewport_padding_px.is_finite() || self.viewport_padding_px < 0.0 {
            return Err(CoverError::validation(
                "viewport padding must be finite and >= 0",
            ));
        }
        if self.file_prefix.is_empty()
            || self
                .file_prefix
                .chars()
                .any(|c| matches!(c, '/' | '\\' | ':') || c.is_control())
        {
            return Err(CoverError::validation(format!(
                "file prefix \"{}\" is not a valid file name component",
                self.file_prefix
            )));
        }
        Ok(())
    }
}
