//! Poll timing decisions, independent of real timers

use std::time::Duration;

/// Shortest accepted poll interval, in seconds
pub const MIN_INTERVAL_SECS: u64 = 1;

/// Longest accepted poll interval, in seconds
pub const MAX_INTERVAL_SECS: u64 = 10_000;

/// Retry delay while the camera is unreachable
pub const DISCONNECTED_BACKOFF: Duration = Duration::from_secs(10);

/// Slow signals are re-queried once every this many cycles
pub const SLOW_POLL_EVERY: u32 = 11;

/// Clamp a configured interval into the accepted range
#[must_use]
pub fn clamp_interval(secs: i64) -> Duration {
    let secs = u64::try_from(secs).unwrap_or(0);
    Duration::from_secs(secs.clamp(MIN_INTERVAL_SECS, MAX_INTERVAL_SECS))
}

/// Picks the delay before the next poll cycle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollPolicy {
    interval: Duration,
    backoff: Duration,
}

impl PollPolicy {
    /// Policy for a configured interval, clamped to the accepted range
    #[must_use]
    pub fn new(interval_secs: i64) -> Self {
        Self {
            interval: clamp_interval(interval_secs),
            backoff: DISCONNECTED_BACKOFF,
        }
    }

    #[must_use]
    pub const fn interval(&self) -> Duration {
        self.interval
    }

    #[must_use]
    pub const fn backoff(&self) -> Duration {
        self.backoff
    }

    /// Delay before the next cycle given current connection health
    #[must_use]
    pub const fn schedule_next(&self, connected: bool) -> Duration {
        if connected {
            self.interval
        } else {
            self.backoff
        }
    }
}

/// Counts cycles to gate the slow sub-poll
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollCycleCounter {
    count: u32,
    threshold: u32,
}

impl Default for PollCycleCounter {
    fn default() -> Self {
        Self::new(SLOW_POLL_EVERY)
    }
}

impl PollCycleCounter {
    #[must_use]
    pub const fn new(threshold: u32) -> Self {
        Self {
            count: 0,
            threshold,
        }
    }

    #[must_use]
    pub const fn count(&self) -> u32 {
        self.count
    }

    /// Count one cycle; returns `true` (and resets) when the slow poll is due
    pub const fn tick(&mut self) -> bool {
        self.count += 1;
        if self.count >= self.threshold {
            self.count = 0;
            true
        } else {
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -- clamp_interval --------------------------------------------------

    #[test]
    fn interval_within_range_is_kept() {
        assert_eq!(clamp_interval(30), Duration::from_secs(30));
        assert_eq!(clamp_interval(1), Duration::from_secs(1));
        assert_eq!(clamp_interval(10_000), Duration::from_secs(10_000));
    }

    #[test]
    fn interval_outside_range_is_clamped() {
        assert_eq!(clamp_interval(0), Duration::from_secs(1));
        assert_eq!(clamp_interval(-5), Duration::from_secs(1));
        assert_eq!(clamp_interval(10_001), Duration::from_secs(10_000));
        assert_eq!(clamp_interval(i64::MAX), Duration::from_secs(10_000));
    }

    // -- PollPolicy ------------------------------------------------------

    #[test]
    fn disconnected_uses_backoff_regardless_of_interval() {
        for secs in [1, 10, 300, 10_000] {
            let policy = PollPolicy::new(secs);
            assert_eq!(policy.schedule_next(false), DISCONNECTED_BACKOFF);
        }
    }

    #[test]
    fn connected_uses_configured_interval() {
        let policy = PollPolicy::new(45);
        assert_eq!(policy.schedule_next(true), Duration::from_secs(45));
    }

    // -- PollCycleCounter ------------------------------------------------

    #[test]
    fn counter_fires_on_eleventh_tick_and_resets() {
        let mut counter = PollCycleCounter::default();
        for _ in 0..10 {
            assert!(!counter.tick());
        }
        assert_eq!(counter.count(), 10);
        assert!(counter.tick());
        assert_eq!(counter.count(), 0);
        assert!(!counter.tick());
    }
}
