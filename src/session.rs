use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    assets::images::{ImageOrigin, ImageRef, ImageTable},
    config::{
        model::{BackgroundMode, Configuration, FieldUpdate, FontFamily},
        settings::SessionSettings,
        store::{ConfigStore, Versioned},
    },
    export::{
        artifact::{ExportArtifact, MillisClock},
        orchestrator::{ExportOptions, ExportOrchestrator, ExportState},
    },
    fonts::registry::{FontRegistry, RegisteredFont},
    foundation::error::{CoverError, CoverResult},
    render::{frame::FrameRGBA, pipeline::RenderPipeline, raster::CpuRasterizer},
};

/// One interactive editing session: the configuration, its assets, the preview and exports.
///
/// This is the surface UI collaborators talk to. Every mutation goes through the versioned
/// [`ConfigStore`]; exports are delegated to the [`ExportOrchestrator`].
#[derive(Debug)]
pub struct CoverSession {
    settings: SessionSettings,
    store: Arc<ConfigStore>,
    images: Arc<ImageTable>,
    fonts: Arc<FontRegistry>,
    pipeline: RenderPipeline,
    exports: ExportOrchestrator,
    font_clock: MillisClock,
}

impl CoverSession {
    /// Start a session with the default card.
    pub fn new(settings: SessionSettings) -> CoverResult<Self> {
        Self::with_config(settings, Configuration::default())
    }

    #[tracing::instrument(skip_all)]
    pub fn with_config(settings: SessionSettings, cfg: Configuration) -> CoverResult<Self> {
        settings.validate()?;
        if let FontFamily::Custom(name) = &cfg.font_family {
            return Err(CoverError::validation(format!(
                "font \"{name}\" must be uploaded before it can be used"
            )));
        }
        let store = Arc::new(ConfigStore::new(cfg)?);
        let images = Arc::new(ImageTable::new());
        let fonts = Arc::new(FontRegistry::new(settings.load_system_fonts));
        let pipeline = RenderPipeline::new(
            images.clone(),
            fonts.clone(),
            Arc::new(CpuRasterizer::new()),
            settings.viewport_padding_px,
        );
        let exports = ExportOrchestrator::new(
            store.clone(),
            images.clone(),
            ExportOptions {
                quality: settings.export_quality,
                settle_timeout: settings.settle_timeout,
                file_prefix: settings.file_prefix.clone(),
            },
        );
        tracing::info!(
            quality = settings.export_quality,
            system_fonts = fonts.has_system_fonts(),
            "session started"
        );
        Ok(Self {
            settings,
            store,
            images,
            fonts,
            pipeline,
            exports,
            font_clock: MillisClock::default(),
        })
    }

    pub fn settings(&self) -> &SessionSettings {
        &self.settings
    }

    /// Snapshot of the current configuration.
    pub fn config(&self) -> Configuration {
        self.store.config()
    }

    pub fn revision(&self) -> u64 {
        self.store.revision()
    }

    /// Watch every configuration revision.
    pub fn subscribe(&self) -> watch::Receiver<Versioned<Configuration>> {
        self.store.subscribe()
    }

    pub fn export_state(&self) -> ExportState {
        self.exports.state()
    }

    pub fn images(&self) -> &ImageTable {
        &self.images
    }

    pub fn fonts(&self) -> &FontRegistry {
        &self.fonts
    }

    /// The single entry point for field edits. Returns the resulting revision.
    ///
    /// A custom font family must have been registered through [`CoverSession::upload_font`].
    pub fn update_field(&self, update: FieldUpdate) -> CoverResult<u64> {
        self.check_references(&update)?;
        self.store.update(update)
    }

    /// Apply several edits under one revision.
    pub fn update_fields(&self, updates: Vec<FieldUpdate>) -> CoverResult<u64> {
        for up in &updates {
            self.check_references(up)?;
        }
        self.store.update_many(updates)
    }

    /// Store an uploaded background and switch the card to image mode.
    ///
    /// The bytes are not decoded here; a broken image surfaces when it is rendered or exported.
    /// The upload it replaces is dropped from the image table unless an export is running.
    pub fn upload_background_image(&self, bytes: Vec<u8>) -> CoverResult<ImageRef> {
        let id = self.images.insert_upload(bytes)?;
        let previous = self.store.config().background_image;
        self.store.update_many([
            FieldUpdate::BackgroundImage(Some(id)),
            FieldUpdate::BackgroundMode(BackgroundMode::Image),
        ])?;
        tracing::info!(image = %id, "background image uploaded");
        if let Some(prev) = previous
            && prev != id
        {
            self.release_superseded_upload(prev);
        }
        Ok(id)
    }

    /// Validate and register a custom font, then make it the active family.
    ///
    /// On failure the active family is left unchanged.
    pub async fn upload_font(&self, bytes: Vec<u8>) -> CoverResult<RegisteredFont> {
        let name = format!("CustomFont_{}", self.font_clock.next());
        let font = match self.fonts.register(name, bytes).await {
            Ok(font) => font,
            Err(e) => {
                tracing::warn!(error = %e, "font upload rejected");
                return Err(e);
            }
        };
        self.store
            .update(FieldUpdate::FontFamily(FontFamily::Custom(font.name.clone())))?;
        Ok(font)
    }

    pub fn current_scale(&self) -> f64 {
        self.pipeline.preview().scale()
    }

    /// Record a new available display width and return the new preview scale.
    pub fn resize_viewport(&self, available_width: f64) -> CoverResult<f64> {
        self.pipeline.preview().resize(available_width)
    }

    /// Watch the newest configuration revision the preview has drawn.
    ///
    /// Revisions only move forward; a stale render finishing late is not reported.
    pub fn subscribe_rendered(&self) -> watch::Receiver<Option<u64>> {
        self.pipeline.preview().subscribe_rendered()
    }

    /// Render the scaled preview of the current configuration.
    pub async fn render_preview(&self) -> CoverResult<FrameRGBA> {
        let current = self.store.current();
        self.pipeline.render_preview(&current).await
    }

    /// Produce the high-resolution artifact. See [`ExportOrchestrator::export`].
    pub async fn request_export(&self) -> CoverResult<ExportArtifact> {
        self.exports.export(&self.pipeline).await
    }

    fn release_superseded_upload(&self, id: ImageRef) {
        if self.exports.state() != ExportState::Idle {
            tracing::debug!(image = %id, "export running, keeping superseded background");
            return;
        }
        if matches!(self.images.origin(id), Ok(ImageOrigin::Upload)) && self.images.release(id) {
            tracing::debug!(image = %id, "released superseded background");
        }
    }

    fn check_references(&self, update: &FieldUpdate) -> CoverResult<()> {
        match update {
            FieldUpdate::FontFamily(FontFamily::Custom(name)) if !self.fonts.is_registered(name) => {
                Err(CoverError::validation(format!(
                    "font \"{name}\" must be uploaded before it can be used"
                )))
            }
            FieldUpdate::BackgroundImage(Some(id)) if !self.images.contains(*id) => Err(
                CoverError::validation(format!("image {id} is not part of this session")),
            ),
            _ => Ok(()),
        }
    }
}
