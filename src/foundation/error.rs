/// Result alias used across the crate.
pub type UnfurlResult<T> = Result<T, UnfurlError>;

/// Errors surfaced at start-up and configuration boundaries.
///
/// Per-frame failures (missing sources, unavailable surfaces, degenerate geometry) never produce
/// an `UnfurlError`; the render loop absorbs them and retries on the next iteration.
#[derive(thiserror::Error, Debug)]
pub enum UnfurlError {
    /// Invalid parameters or inputs.
    #[error("validation error: {0}")]
    Validation(String),

    /// Timeline or scheduler failure.
    #[error("animation error: {0}")]
    Animation(String),

    /// Compositing or bitmap failure.
    #[error("render error: {0}")]
    Render(String),

    /// JSON (de)serialization failure.
    #[error("serialization error: {0}")]
    Serde(String),

    /// Anything else, with its source preserved.
    #[error(transparent)]
    Other(#[from] anyhow::Error),
}

impl UnfurlError {
    /// Build a [`UnfurlError::Validation`].
    pub fn validation(msg: impl Into<String>) -> Self {
        Self::Validation(msg.into())
    }

    /// Build a [`UnfurlError::Animation`].
    pub fn animation(msg: impl Into<String>) -> Self {
        Self::Animation(msg.into())
    }

    /// Build a [`UnfurlError::Render`].
    pub fn render(msg: impl Into<String>) -> Self {
        Self::Render(msg.into())
    }

    /// Build a [`UnfurlError::Serde`].
    pub fn serde(msg: impl Into<String>) -> Self {
        Self::Serde(msg.into())
    }
}
