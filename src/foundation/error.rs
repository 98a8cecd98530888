/// Convenience result type used across CoverForge.
pub type CoverResult<T> = Result<T, CoverError>;

/// Top-level error taxonomy used by the rendering and export APIs.
#[derive(thiserror::Error, Debug)]
pub enum CoverError {
    /// Invalid user-provided configuration or settings data.
    #[error("validation error: {0}")]
    Validation(String),

    /// A background image could not be decoded.
    #[error("decode error: {0}")]
    Decode(String),

    /// Uploaded font data could not be parsed or activated.
    #[error("font load error: {0}")]
    FontLoad(String),

    /// The rasterizer could not produce a bitmap.
    #[error("rasterization error: {0}")]
    Rasterization(String),

    /// A bitmap could not be encoded into the output format.
    #[error("encode error: {0}")]
    Encode(String),

    /// An export was requested while another one was still running.
    #[error("an export is already in progress")]
    ExportInProgress,

    /// The single user-facing failure signal for an aborted export.
    #[error("export failed: {0}")]
    ExportFailed(#[source] Box<CoverError>),

    /// Wrapped lower-level error from dependencies or IO.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl CoverError {
    /// Build a [`CoverError::Validation`] value.
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`CoverError::Decode`] value.
    pub fn decode(msg: impl Into<String>) -> Self {
        Self::Decode(msg.into())
    }

    /// Build a [`CoverError::FontLoad`] value.
    pub fn font_load(msg: impl Into<String>) -> Self {
        Self::FontLoad(msg.into())
    }

    /// Build a [`CoverError::Rasterization`] value.
    pub fn rasterization(msg: impl Into<String>) -> Self {
        Self::Rasterization(msg.into())
    }

    /// Build a [`CoverError::Encode`] value.
    pub fn encode(msg: impl Into<String>) -> Self {
        Self::Encode(msg.into())
    }

    /// Wrap `err` into [`CoverError::ExportFailed`], leaving already-wrapped errors alone.
    pub fn export_failed(err: CoverError) -> Self {
        match err {
            Self::ExportFailed(_) => err,
            other => Self::ExportFailed(Box::new(other)),
        }
    }

    /// The error that caused an export failure, or `self` for any other variant.
    pub fn root_cause(&self) -> &CoverError {
        match self {
            Self::ExportFailed(inner) => inner.root_cause(),
            other => other,
        }
    }
}

impl From<tokio::task::JoinError> for CoverError {
    fn from(err: tokio::task::JoinError) -> Self {
        Self::Other(anyhow::Error::new(err).context("background task did not complete"))
    }
}

#[cfg(test)]
#[path = "../../tests/unit/foundation/error.rs"]
mod tests;
