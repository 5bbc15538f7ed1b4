use std::time::Duration;

use crate::animation::ease::Ease;
use crate::animation::tween::{Track, TrackId};
use crate::assets::sources::{SourceKey, SourceSet};
use crate::effects::{Effect, validate_container, validate_finite};
use crate::foundation::core::{PixelSize, Rect, container_pixels};
use crate::foundation::error::{UnfurlError, UnfurlResult};
use crate::geometry::scaled_rect_around_center;
use crate::render::ops::DrawOp;

pub const SCALE: TrackId = TrackId(0);
pub const ALPHA: TrackId = TrackId(1);

/// Cut the cover down to a shape that scales about the target rect's center while the cutout
/// fades out and the raw shape fades in.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct ShapeCutParams {
    /// Rect the shape occupies at scale 1.
    pub target_rect: Rect,
    /// Scale multipliers of `target_rect` (0.25 draws it at a quarter of its size).
    pub scale_start: f64,
    pub scale_end: f64,
    pub scale_duration_ms: u64,
    pub alpha_duration_ms: u64,
    pub container_width: f64,
    pub container_height: f64,
    pub ease: Ease,
}

impl Default for ShapeCutParams {
    fn default() -> Self {
        Self {
            target_rect: Rect::ZERO,
            scale_start: 0.5,
            scale_end: 1.0,
            scale_duration_ms: 0,
            alpha_duration_ms: 0,
            container_width: 0.0,
            container_height: 0.0,
            ease: Ease::default(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ShapeCutFrame {
    pub scale: f64,
    /// Opacity of the cover cutout; the raw shape is drawn with `1 - alpha`.
    pub alpha: f64,
}

impl Default for ShapeCutFrame {
    fn default() -> Self {
        Self {
            scale: 0.0,
            alpha: 1.0,
        }
    }
}

impl ShapeCutFrame {
    pub fn shape_rect(&self, params: &ShapeCutParams) -> Rect {
        scaled_rect_around_center(params.target_rect, self.scale)
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct ShapeCut;

impl Effect for ShapeCut {
    type Params = ShapeCutParams;
    type Frame = ShapeCutFrame;

    fn name(&self) -> &'static str {
        "shape-cut"
    }

    fn validate(&self, p: &ShapeCutParams) -> UnfurlResult<()> {
        validate_container("shape-cut", p.container_width, p.container_height)?;
        validate_finite("shape-cut", "scale_start", p.scale_start)?;
        validate_finite("shape-cut", "scale_end", p.scale_end)?;
        if p.scale_start < 0.0 || p.scale_end < 0.0 {
            return Err(UnfurlError::validation(
                "shape-cut: scale multipliers must not be negative",
            ));
        }
        let r = p.target_rect;
        if ![r.x0, r.y0, r.x1, r.y1].iter().all(|v| v.is_finite()) || r.area() <= 0.0 {
            return Err(UnfurlError::validation(format!(
                "shape-cut: target_rect must be a non-empty rect, got {r:?}"
            )));
        }
        Ok(())
    }

    fn surface_size(&self, p: &ShapeCutParams) -> PixelSize {
        container_pixels(p.container_width, p.container_height)
    }

    fn tracks(&self, p: &ShapeCutParams) -> Vec<Track> {
        vec![
            Track::new(
                SCALE,
                p.scale_start,
                p.scale_end,
                Duration::from_millis(p.scale_duration_ms),
            )
            .with_ease(p.ease),
            Track::new(ALPHA, 1.0, 0.0, Duration::from_millis(p.alpha_duration_ms))
                .with_ease(p.ease),
        ]
    }

    fn apply(&self, frame: &mut ShapeCutFrame, track: TrackId, value: f64) {
        match track {
            SCALE => frame.scale = value,
            ALPHA => frame.alpha = value.clamp(0.0, 1.0),
            _ => {}
        }
    }

    fn required_sources(&self) -> &'static [SourceKey] {
        &[SourceKey::Cover, SourceKey::Shape]
    }

    fn frame_ops(&self, p: &ShapeCutParams, frame: &ShapeCutFrame, _: &SourceSet) -> Vec<DrawOp> {
        let shape_rect = frame.shape_rect(p);
        let alpha = frame.alpha as f32;
        vec![
            DrawOp::MaskIn {
                mask: vec![DrawOp::Image {
                    source: SourceKey::Shape,
                    dst: shape_rect,
                    opacity: 1.0,
                }],
                content: vec![DrawOp::Image {
                    source: SourceKey::Cover,
                    dst: Rect::new(0.0, 0.0, p.container_width, p.container_height),
                    opacity: 1.0,
                }],
                opacity: alpha,
            },
            DrawOp::Image {
                source: SourceKey::Shape,
                dst: shape_rect,
                opacity: 1.0 - alpha,
            },
        ]
    }
}
