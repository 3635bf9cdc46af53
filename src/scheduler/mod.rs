//! Adaptive polling scheduler
//!
//! Runs one poll cycle, then arms exactly one timer whose delay depends on
//! connection health, and repeats. Manual refresh requests cancel the
//! pending timer and run a cycle immediately.

pub mod policy;
pub mod timer;

pub use policy::{
    DISCONNECTED_BACKOFF, MAX_INTERVAL_SECS, MIN_INTERVAL_SECS, PollCycleCounter, PollPolicy,
    SLOW_POLL_EVERY, clamp_interval,
};
pub use timer::{PendingTimer, TimerSlot};

use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use crate::refresh::Refresher;

/// What one poll cycle did
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CycleReport {
    /// Slow signals were re-queried
    pub slow_poll: bool,
    /// This cycle completed the initial settings sync
    pub synced_now: bool,
}

/// Owns the poll timer and cycle counter
pub struct Scheduler {
    refresher: Refresher,
    policy: PollPolicy,
    counter: PollCycleCounter,
    timer: TimerSlot,
    synced: bool,
}

impl Scheduler {
    #[must_use]
    pub fn new(refresher: Refresher, policy: PollPolicy) -> Self {
        Self {
            refresher,
            policy,
            counter: PollCycleCounter::default(),
            timer: TimerSlot::new(),
            synced: false,
        }
    }

    /// Mark the initial sync as done, or not
    #[must_use]
    pub const fn with_synced(mut self, synced: bool) -> Self {
        self.synced = synced;
        self
    }

    #[must_use]
    pub const fn is_synced(&self) -> bool {
        self.synced
    }

    #[must_use]
    pub const fn timer(&self) -> &TimerSlot {
        &self.timer
    }

    #[must_use]
    pub const fn counter(&self) -> PollCycleCounter {
        self.counter
    }

    #[must_use]
    pub const fn policy(&self) -> PollPolicy {
        self.policy
    }

    /// Run one poll cycle
    ///
    /// Until the device has been identified once, each cycle first retries
    /// identification and, on success, reads the one-shot settings after the
    /// fast signals.
    pub async fn run_cycle(&mut self) -> CycleReport {
        let identified = if self.synced {
            false
        } else {
            self.refresher.identify().await
        };

        self.refresher.fast_signals().await;

        let slow_poll = self.counter.tick();
        if slow_poll {
            tracing::debug!("slow signal refresh");
            self.refresher.slow_signals().await;
        }

        let synced_now = identified && !self.synced;
        if synced_now {
            self.refresher.settings().await;
            self.synced = true;
            tracing::info!("initial sync complete");
        }

        CycleReport {
            slow_poll,
            synced_now,
        }
    }

    /// Run a cycle, then arm the next timer
    pub async fn step(&mut self, source: &str) -> PendingTimer {
        tracing::debug!(source, "refresh state started");
        self.run_cycle().await;

        let connected = self.refresher.client().health().is_connected();
        let delay = self.policy.schedule_next(connected);
        let timer = self.timer.arm(delay, source);
        tracing::debug!(
            connected,
            delay_secs = delay.as_secs(),
            "next refresh scheduled"
        );
        timer
    }

    /// Poll until `shutdown` flips to `true` or its sender is dropped
    pub async fn run(mut self, mut triggers: mpsc::Receiver<()>, mut shutdown: watch::Receiver<bool>) {
        if *shutdown.borrow() {
            return;
        }

        self.step("startup").await;

        loop {
            tokio::select! {
                () = self.timer.fired() => {
                    self.step("timer").await;
                }
                Some(()) = triggers.recv() => {
                    self.timer.cancel();
                    self.step("manual").await;
                }
                changed = shutdown.changed() => {
                    if changed.is_err() || *shutdown.borrow() {
                        break;
                    }
                }
            }
        }

        if self.timer.cancel().is_some() {
            tracing::debug!("pending poll timer cancelled on shutdown");
        }
    }

    /// Run on a background task
    #[must_use]
    pub fn spawn(self) -> SchedulerHandle {
        let (trigger_tx, trigger_rx) = mpsc::channel(4);
        let (shutdown_tx, shutdown_rx) = watch::channel(false);
        let task = tokio::spawn(self.run(trigger_rx, shutdown_rx));

        SchedulerHandle {
            trigger: trigger_tx,
            shutdown: shutdown_tx,
            task,
        }
    }
}

/// Control handle for a spawned [`Scheduler`]
pub struct SchedulerHandle {
    trigger: mpsc::Sender<()>,
    shutdown: watch::Sender<bool>,
    task: JoinHandle<()>,
}

impl SchedulerHandle {
    /// Sender that requests an immediate cycle
    #[must_use]
    pub fn trigger(&self) -> mpsc::Sender<()> {
        self.trigger.clone()
    }

    /// Stop polling and wait for the loop to exit
    ///
    /// A cycle in progress finishes first.
    pub async fn shutdown(self) {
        let _ = self.shutdown.send(true);
        if let Err(e) = self.task.await {
            tracing::error!(error = %e, "scheduler task failed");
        }
    }
}
