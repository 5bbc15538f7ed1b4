//! Transition effects: one strategy per effect, sharing a single render loop.
//!
//! An [`Effect`] describes which values animate, how they land in its per-frame state, and which
//! [`DrawOp`]s a given state produces. Everything here is pure; threads live in `render` and
//! `session`.

pub mod fold2d;
pub mod fold3d;
pub mod shape_cut;
pub mod unveil;

use std::fmt::Debug;

use crate::animation::tween::{Track, TrackId};
use crate::assets::sources::{SourceKey, SourceSet};
use crate::foundation::core::PixelSize;
use crate::foundation::error::{UnfurlError, UnfurlResult};
use crate::render::ops::DrawOp;

pub use fold2d::{Fold2d, Fold2dFrame, Fold2dParams};
pub use fold3d::{Fold3d, Fold3dFrame, Fold3dParams};
pub use shape_cut::{ShapeCut, ShapeCutFrame, ShapeCutParams};
pub use unveil::{Unveil, UnveilFrame, UnveilParams};

pub trait Effect: Send + Sync + 'static {
    /// Immutable per-run configuration.
    type Params: Clone + Debug + Send + Sync + 'static;
    /// Progress-derived values written by the timeline.
    type Frame: Clone + Debug + Default + Send + Sync + 'static;

    fn name(&self) -> &'static str;

    fn validate(&self, params: &Self::Params) -> UnfurlResult<()>;

    fn surface_size(&self, params: &Self::Params) -> PixelSize;

    fn tracks(&self, params: &Self::Params) -> Vec<Track>;

    /// Store one interpolated value.
    fn apply(&self, frame: &mut Self::Frame, track: TrackId, value: f64);

    /// Sources that must be present, after preparation, for a frame to be drawn.
    fn required_sources(&self) -> &'static [SourceKey];

    /// Derive the sources the effect draws from the caller's bitmaps. Runs once per start.
    fn prepare_sources(&self, _params: &Self::Params, sources: SourceSet) -> UnfurlResult<SourceSet> {
        Ok(sources)
    }

    fn frame_ops(&self, params: &Self::Params, frame: &Self::Frame, sources: &SourceSet)
    -> Vec<DrawOp>;
}

pub(crate) fn validate_container(effect: &str, width: f64, height: f64) -> UnfurlResult<()> {
    if !(width.is_finite() && height.is_finite() && width > 0.0 && height > 0.0) {
        return Err(UnfurlError::validation(format!(
            "{effect}: container must be positive, got {width}x{height}"
        )));
    }
    Ok(())
}

pub(crate) fn validate_finite(effect: &str, field: &str, value: f64) -> UnfurlResult<()> {
    if !value.is_finite() {
        return Err(UnfurlError::validation(format!(
            "{effect}: {field} must be finite, got {value}"
        )));
    }
    Ok(())
}
