//! Frames-per-second measurement.

use std::time::{Duration, Instant};

const REPORT_INTERVAL: Duration = Duration::from_secs(1);

/// Counts presented frames and reports the rate about once per second.
#[derive(Debug, Default)]
pub struct FpsCounter {
    checkpoint: Option<Instant>,
    frames: u32,
}

impl FpsCounter {
    /// A counter with no frames recorded.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one frame at `now`.
    ///
    /// Returns the number of frames since the previous report once more
    /// than a second has elapsed. The first call only starts the clock.
    pub fn tick(&mut self, now: Instant) -> Option<u32> {
        let Some(checkpoint) = self.checkpoint else {
            self.checkpoint = Some(now);
            self.frames = 1;
            return None;
        };

        if now.saturating_duration_since(checkpoint) > REPORT_INTERVAL {
            let fps = self.frames;
            self.checkpoint = Some(now);
            self.frames = 1;
            return Some(fps);
        }

        self.frames += 1;
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn first_tick_starts_the_clock() {
        let mut fps = FpsCounter::new();
        assert_eq!(fps.tick(Instant::now()), None);
    }

    #[test]
    fn reports_frames_counted_in_the_last_second() {
        let start = Instant::now();
        let mut fps = FpsCounter::new();
        for i in 0..60 {
            assert_eq!(fps.tick(start + Duration::from_millis(i * 16)), None);
        }
        assert_eq!(fps.tick(start + Duration::from_millis(1001)), Some(60));
    }

    #[test]
    fn exactly_one_second_does_not_report() {
        let start = Instant::now();
        let mut fps = FpsCounter::new();
        fps.tick(start);
        assert_eq!(fps.tick(start + REPORT_INTERVAL), None);
        assert_eq!(fps.tick(start + Duration::from_millis(1500)), Some(2));
    }

    #[test]
    fn counting_restarts_after_a_report() {
        let start = Instant::now();
        let mut fps = FpsCounter::new();
        fps.tick(start);
        fps.tick(start + Duration::from_millis(1100));
        fps.tick(start + Duration::from_millis(1200));
        assert_eq!(fps.tick(start + Duration::from_millis(2150)), Some(2));
    }
}
