use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};
use std::sync::{Arc, Mutex, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::{Duration, Instant};

use crate::animation::tween::{Timeline, TrackId};
use crate::foundation::error::{UnfurlError, UnfurlResult};

/// Receives every interpolated value.
pub type UpdateFn = Box<dyn FnMut(TrackId, f64) + Send>;
/// Fires once, after every track has finished.
pub type CompleteFn = Box<dyn FnOnce() + Send>;

/// Drives a [`Timeline`], calling back with interpolated values and a final completion notice.
pub trait TweenScheduler: Send + Sync {
    fn start(
        &self,
        timeline: Timeline,
        on_update: UpdateFn,
        on_complete: CompleteFn,
    ) -> UnfurlResult<TweenRun>;
}

const RUNNING: u8 = 0;
const COMPLETED: u8 = 1;
const CANCELLED: u8 = 2;

/// Outcome of a run, settled exactly once: whichever of completion and cancellation gets there
/// first wins.
#[derive(Clone, Default)]
struct Outcome(Arc<AtomicU8>);

impl Outcome {
    fn settle(&self, to: u8) -> bool {
        self.0
            .compare_exchange(RUNNING, to, Ordering::AcqRel, Ordering::Acquire)
            .is_ok()
    }

    fn is(&self, state: u8) -> bool {
        self.0.load(Ordering::Acquire) == state
    }
}

/// Handle to a started timeline.
///
/// Cancelling stops further updates and suppresses the completion callback. A cancel that loses
/// the race against completion has no effect.
pub struct TweenRun {
    outcome: Outcome,
    finished: Arc<AtomicBool>,
    thread: Option<JoinHandle<()>>,
}

impl TweenRun {
    /// Returns false if the run had already completed.
    pub fn cancel(&self) -> bool {
        self.outcome.settle(CANCELLED)
    }

    pub fn is_cancelled(&self) -> bool {
        self.outcome.is(CANCELLED)
    }

    /// True once the timeline completed or observed its cancellation.
    pub fn is_finished(&self) -> bool {
        self.finished.load(Ordering::Acquire)
    }

    /// Wait for a thread-backed run to exit. Host-driven runs return immediately.
    pub fn join(mut self) {
        if let Some(handle) = self.thread.take()
            && handle.join().is_err()
        {
            tracing::warn!("tween thread panicked");
        }
    }
}

impl std::fmt::Debug for TweenRun {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TweenRun")
            .field("cancelled", &self.is_cancelled())
            .field("finished", &self.is_finished())
            .finish()
    }
}

/// Emit values for tracks that are active between `prev` and `now`.
///
/// Tracks whose final value was already delivered at `prev` are skipped.
fn emit_changes(timeline: &Timeline, prev: Option<Duration>, now: Duration, on_update: &mut UpdateFn) {
    for track in timeline.tracks() {
        if let Some(prev) = prev
            && prev >= track.end_time()
        {
            continue;
        }
        if let Some(v) = track.value_at(now) {
            on_update(track.id, v);
        }
    }
}

/// Ticks timelines on a dedicated thread at a fixed interval.
#[derive(Clone, Copy, Debug)]
pub struct ThreadTicker {
    interval: Duration,
}

impl Default for ThreadTicker {
    fn default() -> Self {
        Self::new(Duration::from_millis(16))
    }
}

impl ThreadTicker {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval: interval.max(Duration::from_millis(1)),
        }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }
}

impl TweenScheduler for ThreadTicker {
    fn start(
        &self,
        timeline: Timeline,
        mut on_update: UpdateFn,
        on_complete: CompleteFn,
    ) -> UnfurlResult<TweenRun> {
        let outcome = Outcome::default();
        let finished = Arc::new(AtomicBool::new(false));
        let interval = self.interval;

        let thread = {
            let outcome = outcome.clone();
            let finished = finished.clone();
            thread::Builder::new()
                .name("unfurl-tween".to_owned())
                .spawn(move || {
                    let started = Instant::now();
                    let mut prev = None;
                    loop {
                        if outcome.is(CANCELLED) {
                            tracing::trace!("tween run cancelled");
                            break;
                        }
                        let now = started.elapsed();
                        emit_changes(&timeline, prev, now, &mut on_update);
                        prev = Some(now);
                        if timeline.is_complete(now) {
                            if outcome.settle(COMPLETED) {
                                on_complete();
                            }
                            break;
                        }
                        thread::sleep(interval);
                    }
                    finished.store(true, Ordering::Release);
                })
                .map_err(|e| UnfurlError::animation(format!("spawn tween thread: {e}")))?
        };

        Ok(TweenRun {
            outcome,
            finished,
            thread: Some(thread),
        })
    }
}

struct HostRun {
    timeline: Timeline,
    on_update: UpdateFn,
    on_complete: Option<CompleteFn>,
    outcome: Outcome,
    finished: Arc<AtomicBool>,
    elapsed: Duration,
    prev: Option<Duration>,
}

/// Timelines advanced explicitly by the host's own frame callbacks.
///
/// Callbacks run on whichever thread calls [`HostFrameScheduler::advance`].
#[derive(Default)]
pub struct HostFrameScheduler {
    runs: Mutex<Vec<HostRun>>,
}

impl HostFrameScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of timelines still held, including cancelled ones not yet swept by `advance`.
    pub fn active_runs(&self) -> usize {
        self.runs.lock().unwrap_or_else(PoisonError::into_inner).len()
    }

    /// Advance every active timeline by `dt` and deliver updates and completions.
    pub fn advance(&self, dt: Duration) {
        let mut runs = std::mem::take(&mut *self.runs.lock().unwrap_or_else(PoisonError::into_inner));
        runs.retain_mut(|run| {
            if run.outcome.is(CANCELLED) {
                run.finished.store(true, Ordering::Release);
                return false;
            }
            run.elapsed = run.elapsed.saturating_add(dt);
            emit_changes(&run.timeline, run.prev, run.elapsed, &mut run.on_update);
            run.prev = Some(run.elapsed);
            if run.timeline.is_complete(run.elapsed) {
                if let Some(done) = run.on_complete.take()
                    && run.outcome.settle(COMPLETED)
                {
                    done();
                }
                run.finished.store(true, Ordering::Release);
                return false;
            }
            true
        });

        // Runs started from inside a callback were pushed meanwhile; keep them after ours.
        let mut guard = self.runs.lock().unwrap_or_else(PoisonError::into_inner);
        let started_meanwhile = std::mem::take(&mut *guard);
        *guard = runs;
        guard.extend(started_meanwhile);
    }
}

impl TweenScheduler for HostFrameScheduler {
    fn start(
        &self,
        timeline: Timeline,
        on_update: UpdateFn,
        on_complete: CompleteFn,
    ) -> UnfurlResult<TweenRun> {
        let outcome = Outcome::default();
        let finished = Arc::new(AtomicBool::new(false));
        self.runs
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(HostRun {
                timeline,
                on_update,
                on_complete: Some(on_complete),
                outcome: outcome.clone(),
                finished: finished.clone(),
                elapsed: Duration::ZERO,
                prev: None,
            });
        Ok(TweenRun {
            outcome,
            finished,
            thread: None,
        })
    }
}
