use std::sync::Arc;
use std::time::Duration;

use arc_swap::{ArcSwap, Guard};

use crate::animation::tween::{Timeline, TrackId};
use crate::effects::Effect;
use crate::foundation::error::UnfurlResult;

/// Single-slot publication of immutable snapshots.
///
/// Writers swap in a whole new `Arc`; readers take the current one without locking, so a reader
/// never waits on a writer and never observes a partially applied update.
pub struct StateSlot<T> {
    current: ArcSwap<T>,
}

impl<T> StateSlot<T> {
    pub fn new(value: T) -> Self {
        Self {
            current: ArcSwap::from_pointee(value),
        }
    }

    /// Latest published snapshot.
    pub fn load(&self) -> Arc<T> {
        self.current.load_full()
    }

    /// Replace the snapshot.
    pub fn publish(&self, value: T) {
        self.current.store(Arc::new(value));
    }

    /// Derive a new snapshot from the current one and publish it.
    ///
    /// `f` runs outside the swap and is re-run if another writer published in the meantime, so
    /// concurrent updates are never lost.
    pub fn update(&self, mut f: impl FnMut(&T) -> T) -> Arc<T> {
        let mut current = self.current.load_full();
        loop {
            let next = Arc::new(f(&current));
            let prev = self.current.compare_and_swap(&current, next.clone());
            if Arc::ptr_eq(&prev, &current) {
                return next;
            }
            current = Guard::into_inner(prev);
        }
    }
}

impl<T: std::fmt::Debug> std::fmt::Debug for StateSlot<T> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_tuple("StateSlot").field(&self.load()).finish()
    }
}

/// Lifecycle of one animation run. `Ended` is terminal.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Phase {
    #[default]
    Running,
    Ended,
}

/// Snapshot consumed by the render loop: params, progress-derived fields and phase.
pub struct AnimState<E: Effect> {
    pub params: Arc<E::Params>,
    pub frame: E::Frame,
    pub phase: Phase,
}

impl<E: Effect> Clone for AnimState<E> {
    fn clone(&self) -> Self {
        Self {
            params: self.params.clone(),
            frame: self.frame.clone(),
            phase: self.phase,
        }
    }
}

impl<E: Effect> std::fmt::Debug for AnimState<E> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AnimState")
            .field("params", &self.params)
            .field("frame", &self.frame)
            .field("phase", &self.phase)
            .finish()
    }
}

impl<E: Effect> AnimState<E> {
    /// State before any tick: every track sits at its start value.
    pub fn initial(effect: &E, params: Arc<E::Params>) -> Self {
        let mut frame = E::Frame::default();
        for track in effect.tracks(&params) {
            effect.apply(&mut frame, track.id, track.from);
        }
        Self {
            params,
            frame,
            phase: Phase::Running,
        }
    }

    /// Evaluate the snapshot the timeline would publish at `elapsed`, without threads.
    pub fn at(effect: &E, params: Arc<E::Params>, elapsed: Duration) -> UnfurlResult<Self> {
        let timeline = Timeline::new(effect.tracks(&params))?;
        let mut state = Self::initial(effect, params);
        for track in timeline.tracks() {
            effect.apply(&mut state.frame, track.id, track.value_or_start(elapsed));
        }
        if timeline.is_complete(elapsed) {
            state.phase = Phase::Ended;
        }
        Ok(state)
    }

    /// Copy with one track value applied.
    pub fn with_value(&self, effect: &E, track: TrackId, value: f64) -> Self {
        let mut next = self.clone();
        effect.apply(&mut next.frame, track, value);
        next
    }

    /// Copy in the terminal phase.
    pub fn ended(&self) -> Self {
        Self {
            phase: Phase::Ended,
            ..self.clone()
        }
    }

    pub fn is_ended(&self) -> bool {
        self.phase == Phase::Ended
    }
}
