use std::sync::Arc;
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::animation::state::{AnimState, StateSlot};
use crate::assets::sources::SourceSet;
use crate::effects::Effect;
use crate::foundation::error::{UnfurlError, UnfurlResult};
use crate::render::cpu::{CpuCompositor, DrawOutcome};
use crate::render::pacing::{FramePacing, Uncapped};
use crate::render::stats::{FrameReport, FrameStats};
use crate::render::surface::{FrameSurface, SurfaceProvider};
use crate::session::event::{AnimationEvent, EventSink};

/// The per-run render thread body.
///
/// Each iteration loads the latest published state and sources, acquires a surface, clears it,
/// draws the effect's ops and presents. The loop exits after the iteration in which it first
/// observes the ended phase, so the final state is drawn exactly once.
pub struct RenderLoop<E: Effect> {
    effect: Arc<E>,
    state: Arc<StateSlot<AnimState<E>>>,
    sources: Arc<StateSlot<SourceSet>>,
    surfaces: Arc<dyn SurfaceProvider>,
    events: EventSink,
    pacing: Box<dyn FramePacing>,
    compositor: CpuCompositor,
}

impl<E: Effect> RenderLoop<E> {
    pub fn new(
        effect: Arc<E>,
        state: Arc<StateSlot<AnimState<E>>>,
        sources: Arc<StateSlot<SourceSet>>,
        surfaces: Arc<dyn SurfaceProvider>,
        events: EventSink,
    ) -> Self {
        Self {
            effect,
            state,
            sources,
            surfaces,
            events,
            pacing: Box::new(Uncapped),
            compositor: CpuCompositor::new(),
        }
    }

    pub fn with_pacing(mut self, pacing: Box<dyn FramePacing>) -> Self {
        self.pacing = pacing;
        self
    }

    /// Run on a dedicated, named thread. The handle yields the frame report.
    pub fn spawn(self) -> UnfurlResult<JoinHandle<FrameReport>> {
        let name = format!("unfurl-render-{}", self.effect.name());
        thread::Builder::new()
            .name(name)
            .spawn(move || self.run())
            .map_err(|e| UnfurlError::render(format!("spawn render thread: {e}")))
    }

    /// Run to completion on the current thread.
    pub fn run(mut self) -> FrameReport {
        let effect_name = self.effect.name();
        tracing::debug!(effect = effect_name, "render loop started");

        let mut stats = FrameStats::default();
        let mut first_frame_sent = false;
        loop {
            let state = self.state.load();
            let ended = state.is_ended();

            if self.draw_once(&state, &mut stats, &mut first_frame_sent) {
                if let Some(cost) = stats.last_cost() {
                    self.pacing.after_frame(cost);
                }
            } else {
                stats.record_skip();
                thread::yield_now();
            }

            if ended {
                break;
            }
        }

        self.compositor.trim();
        let report = stats.report();
        tracing::info!(
            effect = effect_name,
            frames = report.frames,
            skipped = report.skipped,
            avg_cost_ms = report.mean_ms(),
            "render loop stopped"
        );
        self.events.emit(AnimationEvent::RenderStopped(report));
        report
    }

    /// One iteration. Returns `false` when nothing was presented.
    fn draw_once(
        &mut self,
        state: &AnimState<E>,
        stats: &mut FrameStats,
        first_frame_sent: &mut bool,
    ) -> bool {
        let sources = self.sources.load();
        if let Some(missing) = self
            .effect
            .required_sources()
            .iter()
            .find(|k| !sources.contains(**k))
        {
            tracing::trace!(?missing, "sources not ready");
            return false;
        }

        let Some(mut surface) = self.surfaces.acquire() else {
            tracing::trace!("surface unavailable");
            return false;
        };

        let started = Instant::now();
        surface.clear();
        let ops = self.effect.frame_ops(&state.params, &state.frame, &sources);
        match self.compositor.draw(&mut surface, &ops, &sources) {
            Ok(DrawOutcome::Drawn) => {
                if !*first_frame_sent {
                    *first_frame_sent = true;
                    self.events.emit(AnimationEvent::FirstFrameRendered);
                }
            }
            Ok(DrawOutcome::Skipped) => {}
            Err(e) => tracing::debug!(error = %e, "frame composite failed"),
        }
        stats.record(started.elapsed());
        tracing::trace!(frame = stats.frames(), "frame presented");
        self.surfaces.present(surface);
        true
    }
}

/// Render the frame an effect shows `at` after start, without threads or events.
pub fn render_frame_at<E: Effect>(
    effect: &E,
    params: E::Params,
    sources: SourceSet,
    at: Duration,
) -> UnfurlResult<FrameSurface> {
    effect.validate(&params)?;
    let sources = effect.prepare_sources(&params, sources)?;
    if let Some(missing) = effect
        .required_sources()
        .iter()
        .find(|k| !sources.contains(**k))
    {
        return Err(UnfurlError::validation(format!(
            "{}: missing source {missing:?}",
            effect.name()
        )));
    }

    let state = AnimState::at(effect, Arc::new(params), at)?;
    let mut surface = FrameSurface::new(effect.surface_size(&state.params))?;
    let ops = effect.frame_ops(&state.params, &state.frame, &sources);
    CpuCompositor::new().draw(&mut surface, &ops, &sources)?;
    Ok(surface)
}
