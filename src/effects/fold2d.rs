use std::time::Duration;

use crate::animation::ease::Ease;
use crate::animation::tween::{Track, TrackId};
use crate::assets::sources::{SourceKey, SourceSet};
use crate::effects::{Effect, validate_container, validate_finite};
use crate::foundation::core::{PixelSize, Point, container_pixels};
use crate::foundation::error::UnfurlResult;
use crate::geometry::perspective_quad;
use crate::render::ops::DrawOp;

pub const PROGRESS: TrackId = TrackId(0);

/// Flat fold: both halves of the cover are pinched toward the center seam as trapezoids.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Fold2dParams {
    pub fold_duration_ms: u64,
    /// How far the outer edges shrink vertically at full progress, in pixels.
    pub vertical_offset: f64,
    pub container_width: f64,
    pub container_height: f64,
    pub ease: Ease,
}

impl Default for Fold2dParams {
    fn default() -> Self {
        Self {
            fold_duration_ms: 0,
            vertical_offset: 0.0,
            container_width: 0.0,
            container_height: 0.0,
            ease: Ease::default(),
        }
    }
}

/// Destination corners of one half, clockwise from top-left.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Quad {
    pub top_left: Point,
    pub top_right: Point,
    pub bottom_right: Point,
    pub bottom_left: Point,
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Fold2dFrame {
    pub progress: f64,
}

impl Fold2dFrame {
    pub fn quads(&self, p: &Fold2dParams) -> (Quad, Quad) {
        let (w, h) = (p.container_width, p.container_height);
        let inset_x = w / 2.0 * self.progress;
        let inset_y = p.vertical_offset * self.progress;
        let center_top = Point::new(w / 2.0, 0.0);
        let center_bottom = Point::new(w / 2.0, h);

        let left = Quad {
            top_left: Point::new(inset_x, inset_y),
            top_right: center_top,
            bottom_right: center_bottom,
            bottom_left: Point::new(inset_x, h - inset_y),
        };
        let right = Quad {
            top_left: center_top,
            top_right: Point::new(w - inset_x, inset_y),
            bottom_right: Point::new(w - inset_x, h - inset_y),
            bottom_left: center_bottom,
        };
        (left, right)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Fold2d;

fn warp_into(source: SourceKey, sources: &SourceSet, quad: Quad) -> Option<DrawOp> {
    let bitmap = sources.get(source)?;
    let transform = perspective_quad(
        bitmap.size().to_size(),
        quad.top_left,
        quad.top_right,
        quad.bottom_right,
        quad.bottom_left,
    )?;
    Some(DrawOp::Warp {
        source,
        transform,
        opacity: 1.0,
    })
}

impl Effect for Fold2d {
    type Params = Fold2dParams;
    type Frame = Fold2dFrame;

    fn name(&self) -> &'static str {
        "fold2d"
    }

    fn validate(&self, p: &Fold2dParams) -> UnfurlResult<()> {
        validate_container("fold2d", p.container_width, p.container_height)?;
        validate_finite("fold2d", "vertical_offset", p.vertical_offset)
    }

    fn surface_size(&self, p: &Fold2dParams) -> PixelSize {
        container_pixels(p.container_width, p.container_height)
    }

    fn tracks(&self, p: &Fold2dParams) -> Vec<Track> {
        vec![Track::new(PROGRESS, 0.0, 1.0, Duration::from_millis(p.fold_duration_ms)).with_ease(p.ease)]
    }

    fn apply(&self, frame: &mut Fold2dFrame, track: TrackId, value: f64) {
        if track == PROGRESS {
            frame.progress = value;
        }
    }

    fn required_sources(&self) -> &'static [SourceKey] {
        &[SourceKey::LeftHalf, SourceKey::RightHalf]
    }

    fn prepare_sources(&self, _: &Fold2dParams, sources: SourceSet) -> UnfurlResult<SourceSet> {
        split_cover(sources, 0.5)
    }

    fn frame_ops(&self, p: &Fold2dParams, frame: &Fold2dFrame, sources: &SourceSet) -> Vec<DrawOp> {
        let (left, right) = frame.quads(p);
        [
            warp_into(SourceKey::LeftHalf, sources, left),
            warp_into(SourceKey::RightHalf, sources, right),
        ]
        .into_iter()
        .flatten()
        .collect()
    }
}

/// Replace the cover with its two halves split at `fraction` of its width.
pub(crate) fn split_cover(mut sources: SourceSet, fraction: f64) -> UnfurlResult<SourceSet> {
    let Some(cover) = sources.remove(SourceKey::Cover) else {
        tracing::debug!("no cover to split yet");
        return Ok(sources);
    };
    let (left, right) = if fraction == 0.5 {
        cover.split_vertical()?
    } else {
        cover.split_at_fraction(fraction)?
    };
    sources.insert(SourceKey::LeftHalf, left);
    sources.insert(SourceKey::RightHalf, right);
    Ok(sources)
}
