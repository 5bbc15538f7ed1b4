use std::time::Duration;

use crate::animation::ease::Ease;
use crate::foundation::error::{UnfurlError, UnfurlResult};

/// Identifies which state field a track writes.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TrackId(pub u8);

/// How a track repeats once it has reached `to`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Playback {
    #[default]
    Once,
    /// `from -> to -> from` per cycle, each cycle lasting the track's duration. `None` repeats
    /// until the run is cancelled.
    Yoyo { cycles: Option<u32> },
}

/// One interpolated value: `from -> to` over `duration`, starting after `delay`.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Track {
    pub id: TrackId,
    pub from: f64,
    pub to: f64,
    pub duration: Duration,
    pub delay: Duration,
    pub ease: Ease,
    pub playback: Playback,
}

impl Track {
    pub fn new(id: TrackId, from: f64, to: f64, duration: Duration) -> Self {
        Self {
            id,
            from,
            to,
            duration,
            delay: Duration::ZERO,
            ease: Ease::default(),
            playback: Playback::Once,
        }
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    pub fn with_ease(mut self, ease: Ease) -> Self {
        self.ease = ease;
        self
    }

    pub fn with_playback(mut self, playback: Playback) -> Self {
        self.playback = playback;
        self
    }

    /// Time at which the track settles on its final value; `Duration::MAX` for endless yoyos.
    pub fn end_time(&self) -> Duration {
        let active = match self.playback {
            Playback::Once => self.duration,
            Playback::Yoyo { cycles: None } => Duration::MAX,
            Playback::Yoyo { cycles: Some(n) } => {
                self.duration.checked_mul(n).unwrap_or(Duration::MAX)
            }
        };
        self.delay.saturating_add(active)
    }

    /// Value the track holds once it has settled.
    pub fn final_value(&self) -> f64 {
        match self.playback {
            Playback::Once => self.to,
            Playback::Yoyo { .. } => self.from,
        }
    }

    /// Value at `elapsed` since timeline start, or `None` while still in the start delay.
    pub fn value_at(&self, elapsed: Duration) -> Option<f64> {
        if elapsed < self.delay {
            return None;
        }
        if self.duration.is_zero() || elapsed >= self.end_time() {
            return Some(self.final_value());
        }
        let t = (elapsed - self.delay).as_secs_f64() / self.duration.as_secs_f64();
        let progress = match self.playback {
            Playback::Once => t.min(1.0),
            Playback::Yoyo { .. } => {
                let phase = t.fract();
                if phase < 0.5 { phase * 2.0 } else { (1.0 - phase) * 2.0 }
            }
        };
        Some(self.from + (self.to - self.from) * self.ease.apply(progress))
    }

    /// Like [`Track::value_at`], but yields `from` during the delay.
    pub fn value_or_start(&self, elapsed: Duration) -> f64 {
        self.value_at(elapsed).unwrap_or(self.from)
    }

    pub fn validate(&self) -> UnfurlResult<()> {
        if !self.from.is_finite() || !self.to.is_finite() {
            return Err(UnfurlError::animation(format!(
                "track {:?} has non-finite endpoints",
                self.id
            )));
        }
        match self.playback {
            Playback::Yoyo { .. } if self.duration.is_zero() => Err(UnfurlError::animation(
                format!("track {:?} repeats with a zero duration", self.id),
            )),
            Playback::Yoyo { cycles: Some(0) } => Err(UnfurlError::animation(format!(
                "track {:?} repeats zero times",
                self.id
            ))),
            _ => Ok(()),
        }
    }
}

/// A set of tracks that run together; complete once every track has finished.
#[derive(Clone, Debug, Default)]
pub struct Timeline {
    tracks: Vec<Track>,
}

impl Timeline {
    pub fn new(tracks: Vec<Track>) -> UnfurlResult<Self> {
        for t in &tracks {
            t.validate()?;
        }
        Ok(Self { tracks })
    }

    pub fn tracks(&self) -> &[Track] {
        &self.tracks
    }

    /// Total running time, the latest track end.
    pub fn total_duration(&self) -> Duration {
        self.tracks
            .iter()
            .map(Track::end_time)
            .max()
            .unwrap_or(Duration::ZERO)
    }

    pub fn is_complete(&self, elapsed: Duration) -> bool {
        elapsed >= self.total_duration()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const A: TrackId = TrackId(0);
    const B: TrackId = TrackId(1);

    fn ms(v: u64) -> Duration {
        Duration::from_millis(v)
    }

    #[test]
    fn value_respects_delay_and_clamps_at_end() {
        let t = Track::new(A, 10.0, 20.0, ms(100))
            .with_delay(ms(50))
            .with_ease(Ease::Linear);
        assert_eq!(t.value_at(ms(0)), None);
        assert_eq!(t.value_or_start(ms(49)), 10.0);
        assert_eq!(t.value_at(ms(50)), Some(10.0));
        assert!((t.value_at(ms(100)).unwrap() - 15.0).abs() < 1e-9);
        assert_eq!(t.value_at(ms(150)), Some(20.0));
        assert_eq!(t.value_at(ms(10_000)), Some(20.0));
    }

    #[test]
    fn zero_duration_jumps_to_end() {
        let t = Track::new(A, 1.0, 0.0, Duration::ZERO);
        assert_eq!(t.value_at(ms(0)), Some(0.0));
    }

    #[test]
    fn timeline_completes_after_latest_track() {
        let tl = Timeline::new(vec![
            Track::new(A, 0.0, 1.0, ms(100)),
            Track::new(B, 0.0, 1.0, ms(100)).with_delay(ms(80)),
        ])
        .unwrap();
        assert_eq!(tl.total_duration(), ms(180));
        assert!(!tl.is_complete(ms(179)));
        assert!(tl.is_complete(ms(180)));
        let started = |at| tl.tracks().iter().filter_map(|t| t.value_at(at)).count();
        assert_eq!(started(ms(10)), 1);
        assert_eq!(started(ms(180)), 2);
    }

    #[test]
    fn non_finite_tracks_are_rejected() {
        let err = Timeline::new(vec![Track::new(A, f64::NAN, 1.0, ms(1))]).unwrap_err();
        assert!(err.to_string().contains("animation error"));
    }

    #[test]
    fn empty_timeline_is_complete_immediately() {
        let tl = Timeline::new(vec![]).unwrap();
        assert!(tl.is_complete(Duration::ZERO));
    }

    #[test]
    fn yoyo_goes_out_and_back_each_cycle() {
        let t = Track::new(A, 0.0, 90.0, ms(1000))
            .with_ease(Ease::Linear)
            .with_playback(Playback::Yoyo { cycles: Some(2) });
        assert_eq!(t.end_time(), ms(2000));
        assert!((t.value_at(ms(250)).unwrap() - 45.0).abs() < 1e-9);
        assert!((t.value_at(ms(500)).unwrap() - 90.0).abs() < 1e-9);
        assert!((t.value_at(ms(750)).unwrap() - 45.0).abs() < 1e-9);
        assert!(t.value_at(ms(1000)).unwrap().abs() < 1e-9);
        assert!((t.value_at(ms(1500)).unwrap() - 90.0).abs() < 1e-9);
        assert_eq!(t.value_at(ms(5000)), Some(0.0));
    }

    #[test]
    fn endless_yoyo_never_completes() {
        let tl = Timeline::new(vec![
            Track::new(A, 0.0, 1.0, ms(100)).with_playback(Playback::Yoyo { cycles: None }),
        ])
        .unwrap();
        assert_eq!(tl.total_duration(), Duration::MAX);
        assert!(!tl.is_complete(Duration::from_secs(3600)));
    }

    #[test]
    fn degenerate_yoyo_is_rejected() {
        let zero_period = Track::new(A, 0.0, 1.0, Duration::ZERO)
            .with_playback(Playback::Yoyo { cycles: None });
        assert!(zero_period.validate().is_err());
        let no_cycles =
            Track::new(A, 0.0, 1.0, ms(10)).with_playback(Playback::Yoyo { cycles: Some(0) });
        assert!(no_cycles.validate().is_err());
    }
}
