//! HTTP control surface
//!
//! Stands in for the host platform's state tree: published states can be
//! read, host writes are recorded unacknowledged (the daemon forwards them
//! to the dispatcher), and snapshots or immediate refreshes can be
//! requested.

pub mod health;
pub mod states;

use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tokio::sync::mpsc;
use tower_http::trace::TraceLayer;

use crate::Result;
use crate::device::DeviceClient;
use crate::health::ConnectionHealth;
use crate::state::MemoryStore;

/// Shared state for handlers
#[derive(Clone)]
pub struct ServerState {
    pub store: Arc<MemoryStore>,
    pub health: ConnectionHealth,
    pub client: DeviceClient,
    /// Requests an immediate poll cycle
    pub refresh: mpsc::Sender<()>,
}

/// Build the router with all routes
#[must_use]
pub fn router(state: ServerState) -> Router {
    let state = Arc::new(state);
    Router::new()
        .merge(health::router(state.clone()))
        .merge(states::router(state))
        .layer(TraceLayer::new_for_http())
}

/// Control surface bound to an address
pub struct ApiServer {
    addr: SocketAddr,
    state: ServerState,
}

impl ApiServer {
    #[must_use]
    pub const fn new(addr: SocketAddr, state: ServerState) -> Self {
        Self { addr, state }
    }

    /// Serve until the process exits
    ///
    /// # Errors
    ///
    /// Returns error if the address cannot be bound
    pub async fn run(self) -> Result<()> {
        let listener = TcpListener::bind(self.addr)
            .await
            .map_err(|e| crate::Error::Config(format!("failed to bind API server: {e}")))?;

        tracing::info!(addr = %self.addr, "API server listening");

        axum::serve(listener, router(self.state))
            .await
            .map_err(|e| crate::Error::Config(format!("API server error: {e}")))?;

        Ok(())
    }

    /// Run the server in a background task
    #[must_use]
    pub fn spawn(self) -> tokio::task::JoinHandle<Result<()>> {
        tokio::spawn(async move { self.run().await })
    }
}
