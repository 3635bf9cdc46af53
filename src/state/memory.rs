//! In-memory state tree with change notifications

use std::collections::BTreeMap;

use async_trait::async_trait;
use chrono::Utc;
use tokio::sync::{RwLock, broadcast, mpsc};

use super::{StateChange, StateEntry, StateStore, StateValue};

const CHANGE_CAPACITY: usize = 256;

/// Process-local state tree
///
/// Every change is broadcast to subscribers, which may lag and skip some.
/// Host writes are additionally queued on a lossless feed when one was
/// requested with [`MemoryStore::with_host_writes`].
#[derive(Debug)]
pub struct MemoryStore {
    entries: RwLock<BTreeMap<String, StateEntry>>,
    changes: broadcast::Sender<StateChange>,
    host_writes: Option<mpsc::UnboundedSender<StateChange>>,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        let (changes, _) = broadcast::channel(CHANGE_CAPACITY);
        Self {
            entries: RwLock::new(BTreeMap::new()),
            changes,
            host_writes: None,
        }
    }

    /// Store plus the receiving end of its host write feed
    #[must_use]
    pub fn with_host_writes() -> (Self, mpsc::UnboundedReceiver<StateChange>) {
        let (tx, rx) = mpsc::unbounded_channel();
        let store = Self {
            host_writes: Some(tx),
            ..Self::new()
        };
        (store, rx)
    }

    /// Record a host-side write (`ack = false`)
    pub async fn write(&self, id: &str, value: StateValue) {
        self.set(id, value.clone(), false).await;

        if let Some(feed) = &self.host_writes {
            let change = StateChange {
                id: id.to_string(),
                value,
                ack: false,
            };
            if feed.send(change).is_err() {
                tracing::warn!(id, "host write feed closed");
            }
        }
    }

    /// Full entry for `id`, including ack flag
    pub async fn entry(&self, id: &str) -> Option<StateEntry> {
        self.entries.read().await.get(id).cloned()
    }

    /// Snapshot of every entry, sorted by id
    pub async fn entries(&self) -> BTreeMap<String, StateEntry> {
        self.entries.read().await.clone()
    }

    #[must_use]
    pub fn subscribe(&self) -> broadcast::Receiver<StateChange> {
        self.changes.subscribe()
    }

    async fn set(&self, id: &str, value: StateValue, ack: bool) {
        let entry = StateEntry {
            value: value.clone(),
            ack,
            ts: Utc::now(),
        };
        self.entries.write().await.insert(id.to_string(), entry);

        // No subscribers is fine
        let _ = self.changes.send(StateChange {
            id: id.to_string(),
            value,
            ack,
        });
    }
}

#[async_trait]
impl StateStore for MemoryStore {
    async fn publish(&self, id: &str, value: StateValue) {
        tracing::trace!(id, value = %value, "publish");
        self.set(id, value, true).await;
    }

    async fn get(&self, id: &str) -> Option<StateValue> {
        self.entries.read().await.get(id).map(|e| e.value.clone())
    }
}
