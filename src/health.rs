//! Connection health state machine
//!
//! `Disconnected` is the initial state. Any successful call moves to
//! `Connected`. A transport failure, or a device error from a refresh query,
//! moves to `Disconnected`. Device errors for dispatched commands leave the
//! state alone: the camera is reachable, it merely rejected one command.

use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::{Mutex, watch};

use crate::device::Normalized;
use crate::state::{StateStore, StateValue};

/// State ids mirroring the connection flag
pub const CONNECTION_STATES: [&str; 2] = ["network.connected", "info.connection"];

/// Who issued the call whose outcome is being observed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// Poll cycle or startup sync
    Refresh,
    /// Host-requested command
    Command,
}

/// Last failure that caused a disconnect
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorInfo {
    pub kind: ErrorKind,
    pub message: String,
    pub at: DateTime<Utc>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Transport,
    Device,
}

/// Current connection health
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize)]
pub struct HealthState {
    pub connected: bool,
    pub last_error: Option<ErrorInfo>,
}

/// Next health state after observing `outcome`
///
/// Returns `None` when the outcome does not affect health.
#[must_use]
pub fn transition(
    current: &HealthState,
    outcome: &Normalized,
    origin: Origin,
    now: DateTime<Utc>,
) -> Option<HealthState> {
    let (kind, message) = match (outcome, origin) {
        (Normalized::Success(_), _) => {
            return Some(HealthState {
                connected: true,
                last_error: current.last_error.clone(),
            });
        }
        (Normalized::DeviceError(_), Origin::Command) => return None,
        (Normalized::DeviceError(detail), Origin::Refresh) => (ErrorKind::Device, detail.to_string()),
        (Normalized::TransportError(e), _) => (ErrorKind::Transport, e.to_string()),
    };

    Some(HealthState {
        connected: false,
        last_error: Some(ErrorInfo {
            kind,
            message,
            at: now,
        }),
    })
}

/// Shared handle to the connection health
///
/// Writes are last-write-wins through a watch channel, so concurrent poll
/// and command tasks never observe a torn value. Flips of the connected
/// flag are mirrored to the state store.
#[derive(Clone)]
pub struct ConnectionHealth {
    tx: Arc<watch::Sender<HealthState>>,
    store: Arc<dyn StateStore>,
    /// Held while mirroring, so the last mirror always carries the latest flag
    mirror: Arc<Mutex<()>>,
}

impl ConnectionHealth {
    /// Create in the disconnected state
    #[must_use]
    pub fn new(store: Arc<dyn StateStore>) -> Self {
        let (tx, _) = watch::channel(HealthState::default());
        Self {
            tx: Arc::new(tx),
            store,
            mirror: Arc::new(Mutex::new(())),
        }
    }

    #[must_use]
    pub fn is_connected(&self) -> bool {
        self.tx.borrow().connected
    }

    #[must_use]
    pub fn snapshot(&self) -> HealthState {
        self.tx.borrow().clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<HealthState> {
        self.tx.subscribe()
    }

    /// Apply the outcome of one camera call
    pub async fn observe(&self, outcome: &Normalized, origin: Origin) {
        let mut flipped = false;
        self.tx.send_if_modified(|state| {
            let Some(next) = transition(state, outcome, origin, Utc::now()) else {
                return false;
            };
            flipped = next.connected != state.connected;
            let modified = next != *state;
            *state = next;
            modified
        });

        if flipped {
            let connected = self.is_connected();
            if connected {
                tracing::info!("camera connected");
            } else {
                tracing::warn!(
                    error = %outcome.failure().unwrap_or_default(),
                    "camera disconnected"
                );
            }
            // Publish what is current now, not what this call saw
            self.publish_current().await;
        }
    }

    /// Mirror the current flag to the state store
    ///
    /// These ids are written nowhere else.
    pub async fn publish_current(&self) {
        let _guard = self.mirror.lock().await;
        let connected = self.is_connected();
        for id in CONNECTION_STATES {
            self.store.publish(id, StateValue::Bool(connected)).await;
        }
    }
}
