//! Effect controllers and the UI-context plumbing their events travel through.

pub(crate) mod controller;
pub(crate) mod dispatch;
pub(crate) mod event;
