//! Camera client: build, send, normalize, feed health

use std::sync::Arc;

use serde_json::Value;

use super::command::{CommandEnvelope, CommandName};
use super::endpoint::DeviceEndpoint;
use super::request::{QueryOptions, build_target};
use super::response::{DeviceResponse, Normalized, normalize};
use super::transport::{Method, RawResponse, Transport, TransportError};
use crate::health::{ConnectionHealth, Origin};

/// High-level handle for talking to one camera channel
///
/// Every call's normalized outcome is reported to [`ConnectionHealth`],
/// tagged with whether it came from a refresh or a command.
#[derive(Clone)]
pub struct DeviceClient {
    transport: Arc<dyn Transport>,
    health: ConnectionHealth,
}

impl DeviceClient {
    #[must_use]
    pub fn new(transport: Arc<dyn Transport>, health: ConnectionHealth) -> Self {
        Self { transport, health }
    }

    #[must_use]
    pub fn endpoint(&self) -> &DeviceEndpoint {
        self.transport.endpoint()
    }

    #[must_use]
    pub fn channel(&self) -> u8 {
        self.endpoint().channel
    }

    #[must_use]
    pub const fn health(&self) -> &ConnectionHealth {
        &self.health
    }

    /// Refresh query sent as a bare GET
    pub async fn query(&self, cmd: CommandName, options: QueryOptions) -> Normalized {
        self.call(Method::Get, cmd, options, None, Origin::Refresh)
            .await
    }

    /// Refresh query that needs a request body
    pub async fn query_with(&self, envelope: &CommandEnvelope) -> Normalized {
        self.call(
            Method::Post,
            envelope.cmd,
            Self::envelope_options(envelope),
            Some(envelope.body()),
            Origin::Refresh,
        )
        .await
    }

    /// Host-requested command
    pub async fn execute(&self, envelope: &CommandEnvelope) -> Normalized {
        self.call(
            Method::Post,
            envelope.cmd,
            Self::envelope_options(envelope),
            Some(envelope.body()),
            Origin::Command,
        )
        .await
    }

    /// Host-requested command without a body
    pub async fn execute_get(&self, cmd: CommandName) -> Normalized {
        self.call(Method::Get, cmd, QueryOptions::NONE, None, Origin::Command)
            .await
    }

    /// Raw GET, for binary responses; health is not touched
    ///
    /// # Errors
    ///
    /// Returns error if no response was obtained
    pub async fn fetch_raw(
        &self,
        cmd: CommandName,
        options: QueryOptions,
    ) -> Result<RawResponse, TransportError> {
        let target = build_target(self.endpoint(), cmd, options);
        self.transport.send(Method::Get, &target, None).await
    }

    const fn envelope_options(envelope: &CommandEnvelope) -> QueryOptions {
        if envelope.channel_query {
            QueryOptions::CHANNEL
        } else {
            QueryOptions::NONE
        }
    }

    async fn call(
        &self,
        method: Method,
        cmd: CommandName,
        options: QueryOptions,
        body: Option<Value>,
        origin: Origin,
    ) -> Normalized {
        let target = build_target(self.endpoint(), cmd, options);
        tracing::debug!(command = %cmd, ?method, ?origin, "camera request");

        let outcome = self
            .transport
            .send(method, &target, body.as_ref())
            .await
            .map(|raw| DeviceResponse::from_raw(&raw));
        let normalized = normalize(outcome);

        self.health.observe(&normalized, origin).await;
        normalized
    }
}
