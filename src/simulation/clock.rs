use std::time::Duration;

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ClockTick {
    pub should_fetch_snapshot: bool,
    /// Progress between the last two snapshots, in [0, 1].
    pub interpolation_factor: f32,
}

/// Fixed-period snapshot trigger and interpolation progress.
///
/// Time accumulates across ticks; once a full interval has elapsed the tick
/// asks for a fetch and the accumulator restarts at zero. An overrunning
/// fetch only pushes the next trigger back, nothing is replayed to catch up.
#[derive(Debug, Clone, PartialEq)]
pub struct InterpolationClock {
    interval: Duration,
    accumulated: Duration,
}

impl InterpolationClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            accumulated: Duration::ZERO,
        }
    }

    pub fn from_millis(interval_ms: u64) -> Self {
        Self::new(Duration::from_millis(interval_ms))
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    pub fn accumulated(&self) -> Duration {
        self.accumulated
    }

    pub fn interpolation_factor(&self) -> f32 {
        if self.interval.is_zero() {
            return 1.0;
        }
        (self.accumulated.as_secs_f32() / self.interval.as_secs_f32()).min(1.0)
    }

    /// Advances by `delta`. The returned factor is computed before any reset,
    /// so the triggering frame still renders the end of the interval.
    pub fn tick(&mut self, delta: Duration) -> ClockTick {
        self.accumulated = self.accumulated.saturating_add(delta);
        let interpolation_factor = self.interpolation_factor();

        let should_fetch_snapshot = self.accumulated >= self.interval;
        if should_fetch_snapshot {
            self.accumulated = Duration::ZERO;
        }

        ClockTick {
            should_fetch_snapshot,
            interpolation_factor,
        }
    }

    /// Restarts the interval, e.g. when a snapshot has just been applied.
    pub fn reset(&mut self) {
        self.accumulated = Duration::ZERO;
    }
}
