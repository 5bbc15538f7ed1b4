use std::sync::Arc;
use std::thread::JoinHandle;
use std::time::Duration;

use crossbeam_channel::{Receiver, RecvTimeoutError, unbounded};

use crate::animation::scheduler::{ThreadTicker, TweenRun, TweenScheduler};
use crate::animation::state::{AnimState, StateSlot};
use crate::animation::tween::Timeline;
use crate::assets::sources::SourceSet;
use crate::config::RenderLoopOpts;
use crate::effects::{Effect, Fold3d};
use crate::foundation::error::{UnfurlError, UnfurlResult};
use crate::render::driver::RenderLoop;
use crate::render::stats::FrameReport;
use crate::render::surface::SurfaceProvider;
use crate::session::dispatch::UiDispatcher;
use crate::session::event::{AnimationEvent, EventSink};

/// Caller's view of a started run: its event stream and latest state.
pub struct AnimationHandle<E: Effect> {
    events: Receiver<AnimationEvent>,
    state: Arc<StateSlot<AnimState<E>>>,
}

impl<E: Effect> AnimationHandle<E> {
    /// Events are delivered once the dispatcher has run the posted sends.
    pub fn events(&self) -> &Receiver<AnimationEvent> {
        &self.events
    }

    pub fn try_next_event(&self) -> Option<AnimationEvent> {
        self.events.try_recv().ok()
    }

    pub fn next_event_timeout(&self, timeout: Duration) -> Option<AnimationEvent> {
        match self.events.recv_timeout(timeout) {
            Ok(ev) => Some(ev),
            Err(RecvTimeoutError::Timeout | RecvTimeoutError::Disconnected) => None,
        }
    }

    /// Latest published snapshot.
    pub fn state(&self) -> Arc<AnimState<E>> {
        self.state.load()
    }

    pub fn is_ended(&self) -> bool {
        self.state.load().is_ended()
    }
}

impl<E: Effect> std::fmt::Debug for AnimationHandle<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimationHandle")
            .field("state", &self.state.load())
            .finish_non_exhaustive()
    }
}

struct ActiveRun<E: Effect> {
    params: Arc<E::Params>,
    state: Arc<StateSlot<AnimState<E>>>,
    sources: Arc<StateSlot<SourceSet>>,
    tween: TweenRun,
    render: Option<JoinHandle<FrameReport>>,
}

/// Owns the bitmaps, state slot, tween run and render thread of one effect instance.
///
/// Starting again on the same controller detaches the previous run first. Dropping the controller
/// detaches as well.
pub struct EffectController<E: Effect> {
    effect: Arc<E>,
    surfaces: Arc<dyn SurfaceProvider>,
    scheduler: Arc<dyn TweenScheduler>,
    dispatcher: Arc<dyn UiDispatcher>,
    opts: RenderLoopOpts,
    active: Option<ActiveRun<E>>,
}

impl<E: Effect> EffectController<E> {
    /// Controller ticking its timelines on a [`ThreadTicker`] configured from `opts`.
    pub fn new(
        effect: E,
        surfaces: Arc<dyn SurfaceProvider>,
        dispatcher: Arc<dyn UiDispatcher>,
        opts: RenderLoopOpts,
    ) -> Self {
        let scheduler = Arc::new(ThreadTicker::new(opts.tween_tick()));
        Self::with_scheduler(effect, surfaces, scheduler, dispatcher, opts)
    }

    pub fn with_scheduler(
        effect: E,
        surfaces: Arc<dyn SurfaceProvider>,
        scheduler: Arc<dyn TweenScheduler>,
        dispatcher: Arc<dyn UiDispatcher>,
        opts: RenderLoopOpts,
    ) -> Self {
        Self {
            effect: Arc::new(effect),
            surfaces,
            scheduler,
            dispatcher,
            opts,
            active: None,
        }
    }

    pub fn effect(&self) -> &E {
        &self.effect
    }

    /// True while a run is attached (it may already have ended).
    pub fn is_attached(&self) -> bool {
        self.active.is_some()
    }

    /// Start a run: prepare sources, publish the initial state, then start the tween tracks and
    /// exactly one render thread.
    #[tracing::instrument(skip_all, fields(effect = self.effect.name()))]
    pub fn start_animation(
        &mut self,
        sources: SourceSet,
        params: E::Params,
    ) -> UnfurlResult<AnimationHandle<E>> {
        if self.active.is_some() {
            tracing::debug!("restarting; detaching previous run");
            self.detach();
        }

        self.effect.validate(&params)?;
        let prepared = self.effect.prepare_sources(&params, sources)?;
        let timeline = Timeline::new(self.effect.tracks(&params))?;
        let params = Arc::new(params);

        let state = Arc::new(StateSlot::new(AnimState::initial(
            &*self.effect,
            params.clone(),
        )));
        let sources = Arc::new(StateSlot::new(prepared));
        let (tx, rx) = unbounded();
        let events = EventSink::new(tx, self.dispatcher.clone());

        let total = timeline.total_duration();
        let tween = {
            let effect = self.effect.clone();
            let on_update_state = state.clone();
            let on_complete_state = state.clone();
            let events = events.clone();
            self.scheduler.start(
                timeline,
                Box::new(move |track, value| {
                    on_update_state.update(|s| s.with_value(&effect, track, value));
                }),
                Box::new(move || {
                    on_complete_state.update(AnimState::ended);
                    events.emit(AnimationEvent::Ended);
                }),
            )?
        };

        let render = RenderLoop::new(
            self.effect.clone(),
            state.clone(),
            sources.clone(),
            self.surfaces.clone(),
            events,
        )
        .with_pacing(self.opts.pacing.build())
        .spawn();
        let render = match render {
            Ok(handle) => handle,
            Err(e) => {
                tween.cancel();
                state.update(AnimState::ended);
                return Err(e);
            }
        };

        tracing::info!(duration_ms = total.as_millis() as u64, "animation started");
        self.active = Some(ActiveRun {
            params,
            state: state.clone(),
            sources,
            tween,
            render: Some(render),
        });
        Ok(AnimationHandle { events: rx, state })
    }

    /// Restart from the attached run's latest state, keeping its prepared sources.
    ///
    /// `next` builds the new run's parameters from that state.
    pub fn continue_with(
        &mut self,
        next: impl FnOnce(&AnimState<E>) -> E::Params,
    ) -> UnfurlResult<AnimationHandle<E>> {
        let Some(run) = &self.active else {
            return Err(UnfurlError::animation(format!(
                "{}: no attached run to continue",
                self.effect.name()
            )));
        };
        let current = run.state.load();
        let sources = SourceSet::clone(&run.sources.load());
        self.start_animation(sources, next(current.as_ref()))
    }

    /// Replace the bitmaps of the attached run, for images that arrive after the start.
    pub fn update_sources(&self, sources: SourceSet) -> UnfurlResult<()> {
        let Some(run) = &self.active else {
            tracing::debug!("no attached run; sources ignored");
            return Ok(());
        };
        let prepared = self.effect.prepare_sources(&run.params, sources)?;
        run.sources.publish(prepared);
        Ok(())
    }

    /// Force the attached run to end, wait for its render thread and release its bitmaps.
    ///
    /// Returns the render thread's frame report, if a run was attached.
    pub fn detach(&mut self) -> Option<FrameReport> {
        let mut run = self.active.take()?;
        let completed = !run.tween.cancel();
        run.state.update(AnimState::ended);

        let report = run.render.take().and_then(|handle| match handle.join() {
            Ok(report) => Some(report),
            Err(_) => {
                tracing::warn!("render thread panicked");
                None
            }
        });
        run.sources.publish(SourceSet::new());
        run.tween.join();
        tracing::debug!(frames = report.map(|r| r.frames), completed, "run detached");
        report
    }

    /// Wait for the attached run to finish on its own, then detach it.
    pub fn wait(&mut self) -> Option<FrameReport> {
        let handle = self.active.as_mut()?.render.take()?;
        let report = match handle.join() {
            Ok(report) => Some(report),
            Err(_) => {
                tracing::warn!("render thread panicked");
                None
            }
        };
        self.detach();
        report
    }
}

impl EffectController<Fold3d> {
    /// Fold from wherever the attached run is now to `angle`, at a constant rate.
    pub fn fold_to_angle(
        &mut self,
        angle: f64,
        duration_ms: u64,
    ) -> UnfurlResult<AnimationHandle<Fold3d>> {
        self.continue_with(|state| {
            (*state.params)
                .clone()
                .fold_to_angle(state.frame.angle, angle, duration_ms)
        })
    }
}

impl<E: Effect> Drop for EffectController<E> {
    fn drop(&mut self) {
        self.detach();
    }
}
