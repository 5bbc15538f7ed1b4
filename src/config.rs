use std::path::Path;
use std::time::Duration;

use anyhow::Context;

use crate::assets::sources::SourceSet;
use crate::effects::{
    Effect, Fold2d, Fold2dParams, Fold3d, Fold3dParams, ShapeCut, ShapeCutParams, Unveil,
    UnveilParams,
};
use crate::foundation::core::PixelSize;
use crate::foundation::error::{UnfurlError, UnfurlResult};
use crate::render::driver::render_frame_at;
use crate::render::pacing::PacingPolicy;
use crate::render::surface::FrameSurface;

/// Environment override: render at a fixed interval of this many milliseconds.
pub const ENV_FRAME_INTERVAL_MS: &str = "UNFURL_FRAME_INTERVAL_MS";
/// Environment override: tween tick interval in milliseconds.
pub const ENV_TWEEN_TICK_MS: &str = "UNFURL_TWEEN_TICK_MS";

/// Options for the threads of one animation run.
#[derive(Clone, Copy, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(default)]
pub struct RenderLoopOpts {
    pub pacing: PacingPolicy,
    pub tween_tick_ms: u64,
}

impl Default for RenderLoopOpts {
    fn default() -> Self {
        Self {
            pacing: PacingPolicy::Uncapped,
            tween_tick_ms: 16,
        }
    }
}

impl RenderLoopOpts {
    /// Defaults with environment overrides applied.
    pub fn from_env() -> Self {
        Self::default().with_overrides(|key| std::env::var(key).ok())
    }

    fn with_overrides(mut self, lookup: impl Fn(&str) -> Option<String>) -> Self {
        if let Some(ms) = lookup(ENV_FRAME_INTERVAL_MS)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&n| n > 0)
        {
            self.pacing = PacingPolicy::FixedInterval { interval_ms: ms };
        }
        if let Some(ms) = lookup(ENV_TWEEN_TICK_MS)
            .and_then(|v| v.trim().parse::<u64>().ok())
            .filter(|&n| n > 0)
        {
            self.tween_tick_ms = ms;
        }
        self
    }

    pub fn tween_tick(&self) -> Duration {
        Duration::from_millis(self.tween_tick_ms)
    }
}

/// A complete effect description, as read from JSON: `{"effect": "unveil", ...params}`.
#[derive(Clone, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "effect", rename_all = "snake_case")]
pub enum EffectSpec {
    Unveil(UnveilParams),
    ShapeCut(ShapeCutParams),
    Fold2d(Fold2dParams),
    Fold3d(Fold3dParams),
}

impl EffectSpec {
    pub fn from_json(text: &str) -> UnfurlResult<Self> {
        serde_json::from_str(text).map_err(|e| UnfurlError::serde(format!("effect spec: {e}")))
    }

    pub fn from_path(path: &Path) -> UnfurlResult<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("read effect spec '{}'", path.display()))?;
        Self::from_json(&text)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Unveil(_) => Unveil.name(),
            Self::ShapeCut(_) => ShapeCut.name(),
            Self::Fold2d(_) => Fold2d.name(),
            Self::Fold3d(_) => Fold3d.name(),
        }
    }

    pub fn validate(&self) -> UnfurlResult<()> {
        match self {
            Self::Unveil(p) => Unveil.validate(p),
            Self::ShapeCut(p) => ShapeCut.validate(p),
            Self::Fold2d(p) => Fold2d.validate(p),
            Self::Fold3d(p) => Fold3d.validate(p),
        }
    }

    pub fn surface_size(&self) -> PixelSize {
        match self {
            Self::Unveil(p) => Unveil.surface_size(p),
            Self::ShapeCut(p) => ShapeCut.surface_size(p),
            Self::Fold2d(p) => Fold2d.surface_size(p),
            Self::Fold3d(p) => Fold3d.surface_size(p),
        }
    }

    /// Time until every track has finished.
    pub fn duration(&self) -> Duration {
        let tracks = match self {
            Self::Unveil(p) => Unveil.tracks(p),
            Self::ShapeCut(p) => ShapeCut.tracks(p),
            Self::Fold2d(p) => Fold2d.tracks(p),
            Self::Fold3d(p) => Fold3d.tracks(p),
        };
        tracks
            .iter()
            .map(|t| t.end_time())
            .max()
            .unwrap_or(Duration::ZERO)
    }

    /// Render the single frame shown `at` after start.
    pub fn render_frame(&self, sources: SourceSet, at: Duration) -> UnfurlResult<FrameSurface> {
        match self {
            Self::Unveil(p) => render_frame_at(&Unveil, p.clone(), sources, at),
            Self::ShapeCut(p) => render_frame_at(&ShapeCut, p.clone(), sources, at),
            Self::Fold2d(p) => render_frame_at(&Fold2d, p.clone(), sources, at),
            Self::Fold3d(p) => render_frame_at(&Fold3d, p.clone(), sources, at),
        }
    }
}
