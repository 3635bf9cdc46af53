//! Reolink Gateway - state synchronization and command gateway for Reolink cameras
//!
//! This library provides the core functionality for the gateway:
//! - Camera HTTP/JSON API client with two-layer response normalization
//! - Connection health tracking
//! - Adaptive polling of sensor and settings state
//! - Dispatch of host writes to camera commands
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                 Host state surface                   │
//! │        MemoryStore  │  HTTP control surface          │
//! └──────────┬───────────────────────────▲──────────────┘
//!            │ unacknowledged writes      │ published states
//! ┌──────────▼──────────┐     ┌──────────┴──────────────┐
//! │     Dispatcher       │     │  Scheduler → Refresher  │
//! └──────────┬──────────┘     └──────────▲──────────────┘
//!            │                            │
//! ┌──────────▼────────────────────────────┴──────────────┐
//! │   DeviceClient: build → transport → normalize        │
//! │                 → ConnectionHealth                   │
//! └──────────────────────────────────────────────────────┘
//! ```

pub mod codec;
pub mod config;
pub mod daemon;
pub mod device;
pub mod dispatch;
pub mod error;
pub mod health;
pub mod refresh;
pub mod scheduler;
pub mod server;
pub mod snapshot;
pub mod state;

pub use config::Config;
pub use daemon::Daemon;
pub use device::{
    CommandEnvelope, CommandName, DeviceClient, DeviceEndpoint, Normalized, Transport,
    TransportError,
};
pub use dispatch::{Dispatched, Dispatcher, Feature, ValidationError};
pub use error::{Error, Result};
pub use health::{ConnectionHealth, HealthState, Origin};
pub use refresh::Refresher;
pub use scheduler::{PollCycleCounter, PollPolicy, Scheduler};
pub use snapshot::Snapshot;
pub use state::{MemoryStore, StateStore, StateValue};
