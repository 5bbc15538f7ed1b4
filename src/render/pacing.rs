use std::time::Duration;

/// Decides how long the render loop waits between frames.
pub trait FramePacing: Send {
    /// Called after a frame was presented; `frame_cost` is the time spent on that frame.
    fn after_frame(&mut self, frame_cost: Duration);
}

/// Render as fast as surfaces are handed out.
#[derive(Clone, Copy, Debug, Default)]
pub struct Uncapped;

impl FramePacing for Uncapped {
    fn after_frame(&mut self, _frame_cost: Duration) {}
}

/// Hold each frame to a fixed budget by sleeping the remainder.
#[derive(Clone, Copy, Debug)]
pub struct FixedInterval {
    interval: Duration,
}

impl FixedInterval {
    pub fn new(interval: Duration) -> Self {
        Self { interval }
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Time left in the budget after a frame that took `frame_cost`.
    pub fn remaining(&self, frame_cost: Duration) -> Duration {
        self.interval.saturating_sub(frame_cost)
    }
}

impl FramePacing for FixedInterval {
    fn after_frame(&mut self, frame_cost: Duration) {
        let rest = self.remaining(frame_cost);
        if !rest.is_zero() {
            std::thread::sleep(rest);
        }
    }
}

/// Serializable choice of pacing policy.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case", tag = "kind")]
pub enum PacingPolicy {
    #[default]
    Uncapped,
    FixedInterval { interval_ms: u64 },
}

impl PacingPolicy {
    pub fn build(self) -> Box<dyn FramePacing> {
        match self {
            Self::Uncapped => Box::new(Uncapped),
            Self::FixedInterval { interval_ms } => {
                Box::new(FixedInterval::new(Duration::from_millis(interval_ms)))
            }
        }
    }
}
