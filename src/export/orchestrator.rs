use std::{future::Future, sync::Arc, time::Duration};

use tokio::sync::watch;

use crate::{
    assets::images::{ImageRef, ImageTable},
    config::{
        model::{Configuration, ExportSnapshot, FieldUpdate},
        store::{ConfigStore, Versioned},
    },
    effects::{bake::FilterBaker, filter::FilterParams},
    export::artifact::{ExportArtifact, MillisClock, artifact_file_name},
    foundation::error::{CoverError, CoverResult},
    render::frame::FrameRGBA,
};

/// Whether an export is currently running.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum ExportState {
    #[default]
    Idle,
    Exporting,
}

/// The rendering side of an export.
pub trait ExportRenderer {
    /// Make the preview show `cfg` and resolve once it has been drawn.
    fn settle(&self, cfg: &Versioned<Configuration>) -> impl Future<Output = CoverResult<()>>;

    /// Rasterize the unscaled card at `quality` times the virtual canvas.
    fn rasterize(
        &self,
        cfg: &Configuration,
        quality: f64,
    ) -> impl Future<Output = CoverResult<FrameRGBA>>;
}

/// Knobs for [`ExportOrchestrator`].
#[derive(Clone, Debug, PartialEq)]
pub struct ExportOptions {
    pub quality: f64,
    pub settle_timeout: Duration,
    pub file_prefix: String,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            quality: 1.5,
            settle_timeout: Duration::from_secs(2),
            file_prefix: "COVER".to_owned(),
        }
    }
}

/// Runs one export at a time: snapshot, bake, substitute, settle, rasterize, encode, restore.
#[derive(Debug)]
pub struct ExportOrchestrator {
    store: Arc<ConfigStore>,
    images: Arc<ImageTable>,
    baker: FilterBaker,
    state: watch::Sender<ExportState>,
    clock: MillisClock,
    opts: ExportOptions,
}

impl ExportOrchestrator {
    pub fn new(store: Arc<ConfigStore>, images: Arc<ImageTable>, opts: ExportOptions) -> Self {
        Self {
            baker: FilterBaker::new(images.clone()),
            store,
            images,
            state: watch::Sender::new(ExportState::Idle),
            clock: MillisClock::default(),
            opts,
        }
    }

    pub fn state(&self) -> ExportState {
        *self.state.borrow()
    }

    pub fn subscribe_state(&self) -> watch::Receiver<ExportState> {
        self.state.subscribe()
    }

    pub fn baker(&self) -> &FilterBaker {
        &self.baker
    }

    /// Produce an artifact from the current configuration.
    ///
    /// A request while another export runs fails with [`CoverError::ExportInProgress`] and
    /// touches nothing. Any other failure is reported as [`CoverError::ExportFailed`]. On every
    /// exit path (including a dropped future) the export-sensitive fields are restored and the
    /// state returns to [`ExportState::Idle`].
    pub async fn export<R: ExportRenderer>(&self, renderer: &R) -> CoverResult<ExportArtifact> {
        let mut guard = self.begin()?;
        tracing::info!(
            revision = self.store.revision(),
            quality = self.opts.quality,
            "export started"
        );

        let result = self.run(&mut guard, renderer).await;
        drop(guard);

        match result {
            Ok(artifact) => {
                tracing::info!(
                    file = %artifact.file_name,
                    width = artifact.width,
                    height = artifact.height,
                    "export finished"
                );
                Ok(artifact)
            }
            Err(e) => {
                tracing::error!(error = %e, "export failed");
                Err(CoverError::export_failed(e))
            }
        }
    }

    fn begin(&self) -> CoverResult<ExportGuard<'_>> {
        let acquired = self.state.send_if_modified(|s| {
            if *s == ExportState::Exporting {
                return false;
            }
            *s = ExportState::Exporting;
            true
        });
        if !acquired {
            tracing::warn!("export requested while another export is running");
            return Err(CoverError::ExportInProgress);
        }
        Ok(ExportGuard {
            store: &self.store,
            images: &self.images,
            state: &self.state,
            snapshot: self.store.snapshot_for_export(),
            baked: None,
        })
    }

    async fn run<R: ExportRenderer>(
        &self,
        guard: &mut ExportGuard<'_>,
        renderer: &R,
    ) -> CoverResult<ExportArtifact> {
        let cfg = self.store.config();
        if cfg.needs_baking()
            && let Some(source) = cfg.active_background_image()
        {
            let params = cfg.filter();
            tracing::info!(
                source = %source,
                blur = params.blur_amount,
                brightness = params.brightness_percent,
                "baking background filter"
            );
            let baked = self.baker.bake(source, params).await?;
            guard.baked = Some(baked);
            self.store.update_many([
                FieldUpdate::BackgroundImage(Some(baked)),
                FieldUpdate::BlurAmount(FilterParams::NEUTRAL.blur_amount),
                FieldUpdate::BrightnessPercent(FilterParams::NEUTRAL.brightness_percent),
            ])?;
        }

        let substituted = self.store.current();
        match tokio::time::timeout(self.opts.settle_timeout, renderer.settle(&substituted)).await {
            Ok(Ok(())) => tracing::debug!(revision = substituted.revision, "preview settled"),
            Ok(Err(e)) => {
                tracing::warn!(error = %e, "preview did not settle, continuing with export")
            }
            Err(_) => tracing::warn!(
                timeout_ms = self.opts.settle_timeout.as_millis() as u64,
                "preview settle timed out, continuing with export"
            ),
        }

        let frame = renderer
            .rasterize(&substituted.value, self.opts.quality)
            .await?;
        let (width, height) = (frame.width, frame.height);
        let png = tokio::task::spawn_blocking(move || frame.encode_png()).await??;

        Ok(ExportArtifact {
            file_name: artifact_file_name(&self.opts.file_prefix, self.clock.next()),
            width,
            height,
            png,
        })
    }
}

/// Restores the snapshot, releases the baked image and returns to Idle when dropped.
struct ExportGuard<'a> {
    store: &'a ConfigStore,
    images: &'a ImageTable,
    state: &'a watch::Sender<ExportState>,
    snapshot: ExportSnapshot,
    baked: Option<ImageRef>,
}

impl Drop for ExportGuard<'_> {
    fn drop(&mut self) {
        let revision = self.store.restore(self.snapshot);
        if let Some(baked) = self.baked.take()
            && self.snapshot.background_image != Some(baked)
        {
            self.images.release(baked);
        }
        self.state.send_replace(ExportState::Idle);
        tracing::debug!(revision, "export state restored");
    }
}

#[cfg(test)]
#[path = "../../tests/unit/export/orchestrator.rs"]
mod tests;
