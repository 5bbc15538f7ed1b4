use std::time::Duration;

/// Per-frame draw costs, written only by the render thread.
#[derive(Clone, Debug, Default)]
pub struct FrameStats {
    costs: Vec<Duration>,
    skipped: u64,
}

impl FrameStats {
    pub fn record(&mut self, cost: Duration) {
        self.costs.push(cost);
    }

    /// Count an iteration that drew nothing (sources missing or surface unavailable).
    pub fn record_skip(&mut self) {
        self.skipped = self.skipped.saturating_add(1);
    }

    pub fn last_cost(&self) -> Option<Duration> {
        self.costs.last().copied()
    }

    pub fn frames(&self) -> usize {
        self.costs.len()
    }

    pub fn report(&self) -> FrameReport {
        let frames = self.costs.len() as u64;
        let total: Duration = self.costs.iter().sum();
        let mean = u32::try_from(self.costs.len())
            .ok()
            .filter(|&n| n > 0)
            .map_or(Duration::ZERO, |n| total / n);
        FrameReport {
            frames,
            skipped: self.skipped,
            mean,
            min: self.costs.iter().min().copied().unwrap_or_default(),
            max: self.costs.iter().max().copied().unwrap_or_default(),
        }
    }
}

/// Aggregate frame costs of one render loop run.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize)]
pub struct FrameReport {
    pub frames: u64,
    pub skipped: u64,
    pub mean: Duration,
    pub min: Duration,
    pub max: Duration,
}

impl FrameReport {
    pub fn mean_ms(&self) -> f64 {
        self.mean.as_secs_f64() * 1000.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn report_aggregates_costs() {
        let mut s = FrameStats::default();
        for ms in [4, 8, 6] {
            s.record(Duration::from_millis(ms));
        }
        s.record_skip();
        let r = s.report();
        assert_eq!(r.frames, 3);
        assert_eq!(r.skipped, 1);
        assert_eq!(r.mean, Duration::from_millis(6));
        assert_eq!(r.min, Duration::from_millis(4));
        assert_eq!(r.max, Duration::from_millis(8));
        assert!((r.mean_ms() - 6.0).abs() < 1e-9);
    }

    #[test]
    fn empty_report_is_zero() {
        assert_eq!(FrameStats::default().report(), FrameReport::default());
    }
}
