use std::time::Duration;

use crate::animation::ease::Ease;
use crate::animation::tween::{Playback, Track, TrackId};
use crate::assets::sources::{SourceKey, SourceSet};
use crate::effects::fold2d::split_cover;
use crate::effects::{Effect, validate_container, validate_finite};
use crate::foundation::core::{PixelSize, Size, container_pixels};
use crate::foundation::error::UnfurlResult;
use crate::geometry::{Hinge, Projective, focal_length_px, fold_half_transform};
use crate::render::ops::DrawOp;

pub const ANGLE: TrackId = TrackId(0);

const MIN_FOLD_POSITION: f64 = 0.1;
const MAX_FOLD_POSITION: f64 = 0.9;
const SEAM_SHADE: [u8; 4] = [0, 0, 0, 0x55];
const CLEAR: [u8; 4] = [0, 0, 0, 0];

/// Fold the two halves of the cover away from the viewer around the seam under a virtual camera.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct Fold3dParams {
    pub start_angle: f64,
    /// Final rotation of each half, in degrees.
    pub fold_angle: f64,
    pub fold_duration_ms: u64,
    /// Camera distance from the image plane, in inches.
    pub fold_depth: f64,
    /// Display density used to convert the camera distance to pixels.
    pub density: f64,
    /// Seam position as a fraction of the cover width, clamped to `0.1..=0.9`.
    pub fold_position: f64,
    pub container_width: f64,
    pub container_height: f64,
    pub ease: Ease,
    pub playback: Playback,
}

impl Default for Fold3dParams {
    fn default() -> Self {
        Self {
            start_angle: 0.0,
            fold_angle: 0.0,
            fold_duration_ms: 0,
            fold_depth: 20.0,
            density: 1.0,
            fold_position: 0.5,
            container_width: 0.0,
            container_height: 0.0,
            ease: Ease::default(),
            playback: Playback::Once,
        }
    }
}

impl Fold3dParams {
    /// Fold to 90 degrees and back, twice per `duration_ms`, until cancelled.
    pub fn fold_and_unfold(self, duration_ms: u64) -> Self {
        Self {
            start_angle: 0.0,
            fold_angle: 90.0,
            fold_duration_ms: duration_ms / 2,
            ease: Ease::Linear,
            playback: Playback::Yoyo { cycles: None },
            ..self
        }
    }

    /// Continue from `current` to `angle` at a constant rate.
    pub fn fold_to_angle(self, current: f64, angle: f64, duration_ms: u64) -> Self {
        Self {
            start_angle: current,
            fold_angle: angle,
            fold_duration_ms: duration_ms,
            ease: Ease::Linear,
            playback: Playback::Once,
            ..self
        }
    }

    pub fn clamped_fold_position(&self) -> f64 {
        self.fold_position.clamp(MIN_FOLD_POSITION, MAX_FOLD_POSITION)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct Fold3dFrame {
    pub angle: f64,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FoldMatrices {
    pub left: Projective,
    pub right: Projective,
}

impl Fold3dFrame {
    pub fn matrices(&self, p: &Fold3dParams, left: Size, right: Size) -> FoldMatrices {
        let focal = focal_length_px(p.fold_depth, p.density);
        FoldMatrices {
            left: fold_half_transform(self.angle, focal, left, Hinge::RightEdge),
            right: fold_half_transform(self.angle, focal, right, Hinge::LeftEdge),
        }
    }
}

/// Canvas offset that centers the joined halves in the container.
pub fn placement_origin(p: &Fold3dParams, left: Size, right: Size) -> (f64, f64) {
    let total_w = left.width + right.width;
    let max_h = left.height.max(right.height);
    (
        (p.container_width - total_w) / 2.0,
        (p.container_height - max_h) / 2.0,
    )
}

/// Shade strength at `angle` degrees: 1.5 alpha steps per degree, capped at 220.
pub fn shade_opacity(angle: f64) -> f32 {
    if angle > 0.0 {
        ((angle * 1.5).min(220.0) / 255.0) as f32
    } else {
        0.0
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Fold3d;

impl Effect for Fold3d {
    type Params = Fold3dParams;
    type Frame = Fold3dFrame;

    fn name(&self) -> &'static str {
        "fold3d"
    }

    fn validate(&self, p: &Fold3dParams) -> UnfurlResult<()> {
        validate_container("fold3d", p.container_width, p.container_height)?;
        validate_finite("fold3d", "start_angle", p.start_angle)?;
        validate_finite("fold3d", "fold_angle", p.fold_angle)?;
        validate_finite("fold3d", "fold_depth", p.fold_depth)?;
        validate_finite("fold3d", "density", p.density)?;
        validate_finite("fold3d", "fold_position", p.fold_position)
    }

    fn surface_size(&self, p: &Fold3dParams) -> PixelSize {
        container_pixels(p.container_width, p.container_height)
    }

    fn tracks(&self, p: &Fold3dParams) -> Vec<Track> {
        vec![
            Track::new(
                ANGLE,
                p.start_angle,
                p.fold_angle,
                Duration::from_millis(p.fold_duration_ms),
            )
            .with_ease(p.ease)
            .with_playback(p.playback),
        ]
    }

    fn apply(&self, frame: &mut Fold3dFrame, track: TrackId, value: f64) {
        if track == ANGLE {
            frame.angle = value;
        }
    }

    fn required_sources(&self) -> &'static [SourceKey] {
        &[SourceKey::LeftHalf, SourceKey::RightHalf]
    }

    fn prepare_sources(&self, p: &Fold3dParams, sources: SourceSet) -> UnfurlResult<SourceSet> {
        split_cover(sources, p.clamped_fold_position())
    }

    fn frame_ops(&self, p: &Fold3dParams, frame: &Fold3dFrame, sources: &SourceSet) -> Vec<DrawOp> {
        let (Some(left), Some(right)) = (
            sources.get(SourceKey::LeftHalf),
            sources.get(SourceKey::RightHalf),
        ) else {
            return Vec::new();
        };
        let (left_size, right_size) = (left.size().to_size(), right.size().to_size());
        let m = frame.matrices(p, left_size, right_size);
        let (x, y) = placement_origin(p, left_size, right_size);

        let left_transform = m.left.then(&Projective::translate(x, y));
        let right_transform = m.right.then(&Projective::translate(x + left_size.width, y));

        let mut ops = vec![
            DrawOp::Warp {
                source: SourceKey::LeftHalf,
                transform: left_transform,
                opacity: 1.0,
            },
            DrawOp::Warp {
                source: SourceKey::RightHalf,
                transform: right_transform,
                opacity: 1.0,
            },
        ];
        let shade = shade_opacity(frame.angle);
        if shade > 0.0 {
            // Both halves darken toward the seam.
            ops.push(DrawOp::Shade {
                size: left.size(),
                transform: left_transform,
                from: CLEAR,
                to: SEAM_SHADE,
                opacity: shade,
            });
            ops.push(DrawOp::Shade {
                size: right.size(),
                transform: right_transform,
                from: SEAM_SHADE,
                to: CLEAR,
                opacity: shade,
            });
        }
        ops
    }
}
