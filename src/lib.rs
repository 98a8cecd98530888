//! CoverForge renders an editable cover card at interactive speed and exports a high-resolution
//! PNG that matches the preview pixel for pixel.
//!
//! The public API is session-oriented:
//!
//! - Create a [`CoverSession`] (optionally from a JSON [`Configuration`])
//! - Edit it through [`CoverSession::update_field`], upload backgrounds and fonts
//! - Render the scaled preview or request an [`ExportArtifact`]
//!
//! Layout happens once on a fixed 1280x720 virtual canvas, and a background filter is baked into
//! a new bitmap at the image's native resolution before anything is drawn. The preview and the
//! export then only differ in the final uniform scale.
#![forbid(unsafe_code)]

mod assets;
mod foundation;

pub(crate) mod effects;
pub(crate) mod fonts;
pub(crate) mod viewport;

/// Card configuration, its versioned store, and session settings.
pub mod config;
/// Export orchestration and artifacts.
pub mod export;
/// Scene composition and rasterization.
pub mod render;
/// Collaborator-facing session API.
pub mod session;

pub use crate::assets::images::{ImageOrigin, ImageRef, ImageTable, PreparedImage};
pub use crate::effects::bake::{BakedImage, FilterBaker, bake};
pub use crate::effects::filter::FilterParams;
pub use crate::fonts::registry::{FontRegistry, RegisteredFont};
pub use crate::foundation::core::{Canvas, Rgba8, VIRTUAL_HEIGHT, VIRTUAL_WIDTH};
pub use crate::foundation::error::{CoverError, CoverResult};
pub use crate::viewport::scaler::{ViewportScaler, compute_scale};

pub use crate::config::model::{
    Alignment, BackgroundMode, Configuration, ExportSnapshot, FieldUpdate, FontFamily, PresetFont,
};
pub use crate::config::settings::SessionSettings;
pub use crate::config::store::{ConfigStore, Versioned};
pub use crate::export::artifact::{ExportArtifact, artifact_file_name};
pub use crate::export::orchestrator::{
    ExportOptions, ExportOrchestrator, ExportRenderer, ExportState,
};
pub use crate::render::frame::FrameRGBA;
pub use crate::render::raster::{CpuRasterizer, Rasterizer};
pub use crate::render::scene::{BackgroundLayer, DrawOp, Scene};
pub use crate::session::CoverSession;
