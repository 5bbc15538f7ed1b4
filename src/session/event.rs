use std::sync::Arc;

use crossbeam_channel::Sender;

use crate::render::stats::FrameReport;
use crate::session::dispatch::UiDispatcher;

/// Lifecycle notifications of one animation run, in the order they can occur.
#[derive(Clone, Debug, PartialEq)]
pub enum AnimationEvent {
    /// The first frame was composited and presented.
    FirstFrameRendered,
    /// Every track finished. Not sent when the run is detached early.
    Ended,
    /// The render thread exited; carries its frame-cost summary.
    RenderStopped(FrameReport),
}

/// Sends events to the run's channel from the UI context.
///
/// Emitting never runs user code on the calling thread: the send itself is posted through the
/// dispatcher.
#[derive(Clone)]
pub struct EventSink {
    tx: Sender<AnimationEvent>,
    dispatcher: Arc<dyn UiDispatcher>,
}

impl EventSink {
    pub fn new(tx: Sender<AnimationEvent>, dispatcher: Arc<dyn UiDispatcher>) -> Self {
        Self { tx, dispatcher }
    }

    pub fn emit(&self, event: AnimationEvent) {
        let tx = self.tx.clone();
        self.dispatcher.post(Box::new(move || {
            // A dropped handle means nobody listens anymore.
            let _ = tx.send(event);
        }));
    }
}

impl std::fmt::Debug for EventSink {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EventSink").finish_non_exhaustive()
    }
}
