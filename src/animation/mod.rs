pub(crate) mod ease;
pub(crate) mod scheduler;
pub(crate) mod state;
pub(crate) mod tween;
