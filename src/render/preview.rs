use std::sync::{Mutex, MutexGuard};

use tokio::sync::watch;

use crate::{
    foundation::error::{CoverError, CoverResult},
    render::frame::FrameRGBA,
    viewport::scaler::ViewportScaler,
};

/// Interactive preview bookkeeping: the viewport scale, the last rendered frame, and a
/// "rendered" signal carrying the newest configuration revision that reached the screen.
#[derive(Debug)]
pub struct PreviewState {
    viewport: Mutex<ViewportScaler>,
    last_frame: Mutex<Option<(u64, FrameRGBA)>>,
    rendered: watch::Sender<Option<u64>>,
}

impl PreviewState {
    pub fn new(viewport_padding_px: f64) -> Self {
        Self {
            viewport: Mutex::new(ViewportScaler::new(viewport_padding_px)),
            last_frame: Mutex::new(None),
            rendered: watch::Sender::new(None),
        }
    }

    pub fn scale(&self) -> f64 {
        self.viewport().map(|v| v.scale()).unwrap_or(1.0)
    }

    pub fn resize(&self, available_width: f64) -> CoverResult<f64> {
        Ok(self.viewport()?.resize(available_width))
    }

    /// Record that `revision` was drawn as `frame`. Older revisions never overwrite newer ones.
    pub fn publish(&self, revision: u64, frame: FrameRGBA) -> CoverResult<()> {
        {
            let mut last = self
                .last_frame
                .lock()
                .map_err(|_| CoverError::Other(anyhow::anyhow!("preview frame lock poisoned")))?;
            if last.as_ref().is_some_and(|(r, _)| *r > revision) {
                return Ok(());
            }
            *last = Some((revision, frame));
        }
        self.rendered.send_if_modified(|current| {
            if current.is_some_and(|r| r >= revision) {
                return false;
            }
            *current = Some(revision);
            true
        });
        tracing::trace!(revision, "preview rendered");
        Ok(())
    }

    pub fn rendered_revision(&self) -> Option<u64> {
        *self.rendered.borrow()
    }

    /// Watch the newest revision that reached the screen.
    pub fn subscribe_rendered(&self) -> watch::Receiver<Option<u64>> {
        self.rendered.subscribe()
    }

    pub fn last_frame(&self) -> Option<(u64, FrameRGBA)> {
        self.last_frame.lock().ok().and_then(|f| f.clone())
    }

    fn viewport(&self) -> CoverResult<MutexGuard<'_, ViewportScaler>> {
        self.viewport
            .lock()
            .map_err(|_| CoverError::Other(anyhow::anyhow!("viewport lock poisoned")))
    }
}
