//! CPU compositing and the per-run render thread.

pub(crate) mod composite;
pub mod cpu;
pub(crate) mod driver;
pub mod ops;
pub(crate) mod pacing;
pub(crate) mod stats;
pub mod surface;
pub(crate) mod surface_pool;
pub(crate) mod warp;
