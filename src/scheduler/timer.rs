//! Single-slot poll timer

use std::time::Duration;

use tokio::time::Instant;

/// An armed timer
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PendingTimer {
    pub delay: Duration,
    pub deadline: Instant,
}

/// Holds at most one pending timer
///
/// Arming replaces (cancels) any previous timer, so two cycles can never be
/// scheduled at once.
#[derive(Debug, Default)]
pub struct TimerSlot {
    pending: Option<PendingTimer>,
}

impl TimerSlot {
    #[must_use]
    pub const fn new() -> Self {
        Self { pending: None }
    }

    /// Arm a timer firing after `delay`, cancelling any pending one
    pub fn arm(&mut self, delay: Duration, source: &str) -> PendingTimer {
        if self.pending.take().is_some() {
            tracing::debug!(source, "pending poll timer cleared");
        }
        let timer = PendingTimer {
            delay,
            deadline: Instant::now() + delay,
        };
        self.pending = Some(timer);
        timer
    }

    /// Cancel the pending timer, if any
    pub fn cancel(&mut self) -> Option<PendingTimer> {
        self.pending.take()
    }

    #[must_use]
    pub const fn pending(&self) -> Option<PendingTimer> {
        self.pending
    }

    #[must_use]
    pub const fn is_armed(&self) -> bool {
        self.pending.is_some()
    }

    /// Wait for the pending timer and disarm it
    ///
    /// Never resolves while no timer is armed.
    pub async fn fired(&mut self) {
        match self.pending {
            Some(timer) => {
                tokio::time::sleep_until(timer.deadline).await;
                self.pending = None;
            }
            None => std::future::pending::<()>().await,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test(start_paused = true)]
    async fn arming_replaces_previous_timer() {
        let mut slot = TimerSlot::new();
        slot.arm(Duration::from_secs(60), "first");
        let second = slot.arm(Duration::from_secs(5), "second");
        assert_eq!(slot.pending(), Some(second));

        let start = Instant::now();
        slot.fired().await;
        assert_eq!(start.elapsed(), Duration::from_secs(5));
        assert!(!slot.is_armed());
    }

    #[test]
    fn unarmed_slot_never_fires() {
        let mut slot = TimerSlot::new();
        let mut fired = tokio_test::task::spawn(slot.fired());
        tokio_test::assert_pending!(fired.poll());
        tokio_test::assert_pending!(fired.poll());
    }

    #[tokio::test(start_paused = true)]
    async fn cancel_disarms() {
        let mut slot = TimerSlot::new();
        slot.arm(Duration::from_secs(1), "test");
        assert!(slot.cancel().is_some());
        assert!(!slot.is_armed());
        assert!(slot.cancel().is_none());
    }
}
