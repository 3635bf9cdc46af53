//! Daemon - the main gateway service
//!
//! Wires transport, health, refreshers, scheduler, dispatcher and control
//! surface together, then forwards unacknowledged host writes to the
//! dispatcher until shutdown.

use std::future::Future;
use std::sync::Arc;

use tokio::sync::mpsc;

use crate::config::ServerConfig;
use crate::device::{DeviceClient, HttpTransport, Transport};
use crate::dispatch::{Dispatched, Dispatcher};
use crate::health::ConnectionHealth;
use crate::refresh::Refresher;
use crate::scheduler::{PollPolicy, Scheduler};
use crate::server::{ApiServer, ServerState};
use crate::state::{MemoryStore, StateChange, StateStore, StateValue};
use crate::{Config, Result};

/// The gateway daemon
pub struct Daemon {
    store: Arc<MemoryStore>,
    client: DeviceClient,
    refresher: Refresher,
    dispatcher: Dispatcher,
    policy: PollPolicy,
    server: Option<ServerConfig>,
    host_writes: mpsc::UnboundedReceiver<StateChange>,
}

impl Daemon {
    /// Create a daemon talking to the configured camera over HTTP
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be built
    pub fn new(config: Config) -> Result<Self> {
        let transport = HttpTransport::new(config.endpoint)?;
        Ok(Self::with_transport(
            Arc::new(transport),
            config.poll_interval_secs,
            Some(config.server),
        ))
    }

    /// Create a daemon on top of an arbitrary transport
    ///
    /// The control surface is only started when `server` is set.
    #[must_use]
    pub fn with_transport(
        transport: Arc<dyn Transport>,
        poll_interval_secs: i64,
        server: Option<ServerConfig>,
    ) -> Self {
        let (store, host_writes) = MemoryStore::with_host_writes();
        let store = Arc::new(store);
        let shared: Arc<dyn StateStore> = store.clone();
        let health = ConnectionHealth::new(shared.clone());
        let client = DeviceClient::new(transport, health);
        let refresher = Refresher::new(client.clone(), shared.clone());
        let dispatcher = Dispatcher::new(refresher.clone(), shared);

        Self {
            store,
            client,
            refresher,
            dispatcher,
            policy: PollPolicy::new(poll_interval_secs),
            server,
            host_writes,
        }
    }

    #[must_use]
    pub fn store(&self) -> Arc<MemoryStore> {
        self.store.clone()
    }

    #[must_use]
    pub const fn client(&self) -> &DeviceClient {
        &self.client
    }

    #[must_use]
    pub const fn refresher(&self) -> &Refresher {
        &self.refresher
    }

    #[must_use]
    pub const fn dispatcher(&self) -> &Dispatcher {
        &self.dispatcher
    }

    /// Publish the states known before the camera has been reached
    pub async fn publish_startup(&self) {
        self.client.health().publish_current().await;
        let endpoint = self.client.endpoint();
        self.store
            .publish("network.ip", StateValue::Text(endpoint.host.clone()))
            .await;
        self.store
            .publish("network.channel", i64::from(endpoint.channel).into())
            .await;
    }

    /// Run until Ctrl-C
    ///
    /// # Errors
    ///
    /// Returns error if the daemon fails to start
    pub async fn run(self) -> Result<()> {
        self.run_until(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!(error = %e, "failed to listen for ctrl-c");
            }
        })
        .await
    }

    /// Run until `shutdown` resolves
    ///
    /// # Errors
    ///
    /// Returns error if the daemon fails to start
    pub async fn run_until(mut self, shutdown: impl Future<Output = ()>) -> Result<()> {
        let endpoint = self.client.endpoint();
        tracing::info!(
            host = %endpoint.host,
            protocol = %endpoint.protocol,
            channel = endpoint.channel,
            interval_secs = self.policy.interval().as_secs(),
            "starting gateway"
        );

        self.publish_startup().await;

        let scheduler = Scheduler::new(self.refresher.clone(), self.policy).spawn();

        let server = self.server.map(|config| {
            ApiServer::new(
                config.socket_addr(),
                ServerState {
                    store: self.store.clone(),
                    health: self.client.health().clone(),
                    client: self.client.clone(),
                    refresh: scheduler.trigger(),
                },
            )
            .spawn()
        });

        tokio::pin!(shutdown);
        loop {
            tokio::select! {
                () = &mut shutdown => {
                    tracing::info!("shutdown requested");
                    break;
                }
                write = self.host_writes.recv() => match write {
                    Some(change) => self.forward(change),
                    None => break,
                },
            }
        }

        scheduler.shutdown().await;
        if let Some(server) = server {
            server.abort();
        }

        tracing::info!("gateway stopped");
        Ok(())
    }

    /// Dispatch a host write on its own task
    fn forward(&self, change: StateChange) {
        let dispatcher = self.dispatcher.clone();
        tokio::spawn(async move {
            match dispatcher.dispatch(&change.id, &change.value).await {
                Ok(Dispatched::Rejected { error, .. }) => {
                    tracing::debug!(id = %change.id, error = %error, "write rejected");
                }
                Ok(_) => {}
                Err(e) => tracing::warn!(id = %change.id, error = %e, "write ignored"),
            }
        });
    }
}
