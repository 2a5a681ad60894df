use std::time::Duration;

/// Nominal tick length: one 60 Hz frame, rounded up to the next millisecond.
pub const DEFAULT_TICK_INTERVAL: Duration = Duration::from_millis(1000 / 60 + 1);

/// Fixed-interval pacing clock.
///
/// Works on durations read from the platform's monotonic clock rather than on
/// `Instant`s, so a scripted platform can drive it deterministically.
///
/// Pacing is best effort: a tick that overruns its interval is not made up for
/// and the next one starts immediately.
#[derive(Debug, Clone)]
pub struct TickClock {
    interval: Duration,
    started: Duration,
    tick_index: u64,
}

impl TickClock {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            started: Duration::ZERO,
            tick_index: 0,
        }
    }

    /// Marks the start of a tick at platform time `now`.
    pub fn begin(&mut self, now: Duration) {
        self.started = now;
        self.tick_index = self.tick_index.wrapping_add(1);
    }

    /// How long to wait at `now` to fill the current tick. Zero once overrun.
    pub fn remaining(&self, now: Duration) -> Duration {
        let spent = now.saturating_sub(self.started);
        self.interval.saturating_sub(spent)
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Ticks begun so far.
    pub fn tick_index(&self) -> u64 {
        self.tick_index
    }
}

impl Default for TickClock {
    fn default() -> Self {
        Self::new(DEFAULT_TICK_INTERVAL)
    }
}
