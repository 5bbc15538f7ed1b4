use std::time::Duration;

use crate::animation::ease::Ease;
use crate::animation::tween::{Track, TrackId};
use crate::assets::sources::{SourceKey, SourceSet};
use crate::effects::{Effect, validate_container, validate_finite};
use crate::foundation::core::{BezPath, PixelSize, Point, Rect, Size, container_pixels};
use crate::foundation::error::UnfurlResult;
use crate::geometry::{alpha_mask_path, centered_rect};
use crate::render::ops::DrawOp;

pub const EDGE: TrackId = TrackId(0);
pub const PEAK: TrackId = TrackId(1);
pub const BRAND: TrackId = TrackId(2);

/// Reveal the content beneath the cover through a curved edge sweeping upward, while a brand
/// image travels vertically.
///
/// Edge, peak and brand positions are fractions of the container height.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct UnveilParams {
    pub edge_start: f64,
    pub edge_end: f64,
    pub edge_duration_ms: u64,
    pub peak_start: f64,
    pub peak_end: f64,
    pub peak_duration_ms: u64,
    pub container_width: f64,
    pub container_height: f64,
    pub brand_width: f64,
    pub brand_height: f64,
    pub brand_start: f64,
    pub brand_end: f64,
    pub brand_duration_ms: u64,
    pub brand_start_delay_ms: u64,
    /// Horizontal center of the peak and the brand.
    pub cx: f64,
    pub ease: Ease,
}

impl Default for UnveilParams {
    fn default() -> Self {
        Self {
            edge_start: 1.0,
            edge_end: 0.0,
            edge_duration_ms: 5000,
            peak_start: 0.0,
            peak_end: 0.0,
            peak_duration_ms: 3000,
            container_width: 0.0,
            container_height: 0.0,
            brand_width: 0.0,
            brand_height: 0.0,
            brand_start: 0.0,
            brand_end: 0.0,
            brand_duration_ms: 2000,
            brand_start_delay_ms: 1000,
            cx: 0.0,
            ease: Ease::default(),
        }
    }
}

impl UnveilParams {
    pub fn for_container(width: f64, height: f64) -> Self {
        Self {
            container_width: width,
            container_height: height,
            cx: width / 2.0,
            ..Self::default()
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UnveilFrame {
    pub edge_y: f64,
    pub peak_y: f64,
    pub brand_cy: f64,
}

impl UnveilFrame {
    pub fn mask_path(&self, params: &UnveilParams) -> BezPath {
        alpha_mask_path(
            params.cx,
            self.edge_y,
            self.peak_y,
            params.container_width,
            params.container_height,
        )
    }

    pub fn brand_rect(&self, params: &UnveilParams) -> Rect {
        centered_rect(
            Point::new(params.cx, self.brand_cy),
            Size::new(params.brand_width, params.brand_height),
        )
    }
}

#[derive(Clone, Copy, Debug, Default)]
pub struct Unveil;

impl Effect for Unveil {
    type Params = UnveilParams;
    type Frame = UnveilFrame;

    fn name(&self) -> &'static str {
        "unveil"
    }

    fn validate(&self, p: &UnveilParams) -> UnfurlResult<()> {
        validate_container("unveil", p.container_width, p.container_height)?;
        for (field, v) in [
            ("edge_start", p.edge_start),
            ("edge_end", p.edge_end),
            ("peak_start", p.peak_start),
            ("peak_end", p.peak_end),
            ("brand_start", p.brand_start),
            ("brand_end", p.brand_end),
            ("brand_width", p.brand_width),
            ("brand_height", p.brand_height),
            ("cx", p.cx),
        ] {
            validate_finite("unveil", field, v)?;
        }
        Ok(())
    }

    fn surface_size(&self, p: &UnveilParams) -> PixelSize {
        container_pixels(p.container_width, p.container_height)
    }

    fn tracks(&self, p: &UnveilParams) -> Vec<Track> {
        let h = p.container_height;
        vec![
            Track::new(
                EDGE,
                h * p.edge_start,
                h * p.edge_end,
                Duration::from_millis(p.edge_duration_ms),
            )
            .with_ease(p.ease),
            Track::new(
                PEAK,
                h * p.peak_start,
                h * p.peak_end,
                Duration::from_millis(p.peak_duration_ms),
            )
            .with_ease(p.ease),
            Track::new(
                BRAND,
                h * p.brand_start,
                h * p.brand_end,
                Duration::from_millis(p.brand_duration_ms),
            )
            .with_delay(Duration::from_millis(p.brand_start_delay_ms))
            .with_ease(p.ease),
        ]
    }

    fn apply(&self, frame: &mut UnveilFrame, track: TrackId, value: f64) {
        match track {
            EDGE => frame.edge_y = value,
            PEAK => frame.peak_y = value,
            BRAND => frame.brand_cy = value,
            _ => {}
        }
    }

    fn required_sources(&self) -> &'static [SourceKey] {
        &[SourceKey::Cover, SourceKey::Brand]
    }

    fn frame_ops(&self, p: &UnveilParams, frame: &UnveilFrame, _: &SourceSet) -> Vec<DrawOp> {
        vec![
            DrawOp::ClipOut {
                mask: frame.mask_path(p),
                content: vec![DrawOp::Image {
                    source: SourceKey::Cover,
                    dst: Rect::new(0.0, 0.0, p.container_width, p.container_height),
                    opacity: 1.0,
                }],
            },
            DrawOp::Image {
                source: SourceKey::Brand,
                dst: frame.brand_rect(p),
                opacity: 1.0,
            },
        ]
    }
}
