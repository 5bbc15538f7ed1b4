//! Unfurl composites frame-synchronous transition effects on a CPU render thread.
//!
//! Each effect (unveil, shape cut, flat fold, perspective fold) is an [`Effect`] strategy. An
//! [`EffectController`] starts its tween tracks and one render thread per run:
//!
//! - tween callbacks publish [`AnimState`] snapshots
//! - the render loop draws the latest snapshot into a [`SurfaceProvider`] frame
//! - lifecycle [`AnimationEvent`]s reach the caller through a [`UiDispatcher`]
#![forbid(unsafe_code)]

mod animation;
mod assets;
mod foundation;

pub mod config;
pub mod effects;
pub mod geometry;
pub mod render;
pub(crate) mod session;

pub use crate::foundation::core::{Affine, BezPath, PixelSize, Point, Rect, Size, Vec2};
pub use crate::foundation::error::{UnfurlError, UnfurlResult};

pub use crate::animation::ease::Ease;
pub use crate::animation::scheduler::{
    CompleteFn, HostFrameScheduler, ThreadTicker, TweenRun, TweenScheduler, UpdateFn,
};
pub use crate::animation::state::{AnimState, Phase, StateSlot};
pub use crate::animation::tween::{Playback, Timeline, Track, TrackId};
pub use crate::assets::bitmap::Bitmap;
pub use crate::assets::decode::{bitmap_from_rgba_image, decode_bitmap, load_bitmap};
pub use crate::assets::sources::{SourceKey, SourceSet};
pub use crate::config::{EffectSpec, RenderLoopOpts};
pub use crate::effects::Effect;
pub use crate::render::cpu::{CpuCompositor, DrawOutcome};
pub use crate::render::driver::{RenderLoop, render_frame_at};
pub use crate::render::ops::DrawOp;
pub use crate::render::pacing::{FixedInterval, FramePacing, PacingPolicy, Uncapped};
pub use crate::render::stats::{FrameReport, FrameStats};
pub use crate::render::surface::{
    FrameSurface, OffscreenSurface, PngSequenceSurface, SurfaceProvider,
};
pub use crate::session::controller::{AnimationHandle, EffectController};
pub use crate::session::dispatch::{UiDispatcher, UiQueue, UiTask};
pub use crate::session::event::{AnimationEvent, EventSink};
