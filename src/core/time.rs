//! Frame timing

use std::time::{Duration, Instant};

/// Time tracking for the frame loop
#[derive(Debug, Clone)]
pub struct Time {
    start: Instant,
    last_frame: Instant,
    delta: Duration,
    /// Overrides measured deltas when set
    fixed_delta: Option<Duration>,
    frame_count: u64,
}

impl Default for Time {
    fn default() -> Self {
        Self::new()
    }
}

impl Time {
    #[must_use]
    pub fn new() -> Self {
        let now = Instant::now();
        Self {
            start: now,
            last_frame: now,
            delta: Duration::ZERO,
            fixed_delta: None,
            frame_count: 0,
        }
    }

    /// Use a constant delta instead of wall-clock time
    #[must_use]
    pub fn fixed(delta: Duration) -> Self {
        Self {
            fixed_delta: Some(delta),
            ..Self::new()
        }
    }

    /// Advance to a new frame
    pub fn update(&mut self) {
        let now = Instant::now();
        self.delta = self
            .fixed_delta
            .unwrap_or_else(|| now.duration_since(self.last_frame));
        self.last_frame = now;
        self.frame_count += 1;
    }

    /// Time between the last two frames
    #[must_use]
    pub fn delta(&self) -> Duration {
        self.delta
    }

    /// Delta in seconds
    #[must_use]
    pub fn delta_seconds(&self) -> f32 {
        self.delta.as_secs_f32()
    }

    /// Wall-clock time since creation
    #[must_use]
    pub fn elapsed(&self) -> Duration {
        self.start.elapsed()
    }

    /// Frames advanced so far
    #[must_use]
    pub fn frame_count(&self) -> u64 {
        self.frame_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fixed_delta() {
        let mut time = Time::fixed(Duration::from_millis(20));
        time.update();
        time.update();
        assert_eq!(time.delta(), Duration::from_millis(20));
        assert!((time.delta_seconds() - 0.02).abs() < 1e-6);
        assert_eq!(time.frame_count(), 2);
    }
}
