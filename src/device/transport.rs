//! HTTP transport to the camera
//!
//! The [`Transport`] trait is the seam between the protocol logic and the
//! network. [`HttpTransport`] is the production implementation built on
//! reqwest; tests substitute a scripted transport.

use async_trait::async_trait;
use serde_json::Value;

use super::endpoint::DeviceEndpoint;
use crate::{Error, Result};

/// HTTP method of a camera request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Get,
    Post,
}

/// Undecoded camera response
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RawResponse {
    pub status: u16,
    pub content_type: Option<String>,
    pub body: Vec<u8>,
}

impl RawResponse {
    #[must_use]
    pub fn is_json(&self) -> bool {
        self.content_type
            .as_deref()
            .is_some_and(|ct| ct.contains("json"))
    }
}

/// Category of a transport failure
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransportErrorKind {
    Timeout,
    Connect,
    Other,
}

impl TransportErrorKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Timeout => "timeout",
            Self::Connect => "connect",
            Self::Other => "other",
        }
    }
}

/// No response was obtained from the camera
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{}: {cause}", .kind.as_str())]
pub struct TransportError {
    pub kind: TransportErrorKind,
    pub cause: String,
}

impl TransportError {
    #[must_use]
    pub fn new(kind: TransportErrorKind, cause: impl Into<String>) -> Self {
        Self {
            kind,
            cause: cause.into(),
        }
    }

    #[must_use]
    pub fn timeout(cause: impl Into<String>) -> Self {
        Self::new(TransportErrorKind::Timeout, cause)
    }

    #[must_use]
    pub const fn is_timeout(&self) -> bool {
        matches!(self.kind, TransportErrorKind::Timeout)
    }
}

impl From<reqwest::Error> for TransportError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            TransportErrorKind::Timeout
        } else if e.is_connect() {
            TransportErrorKind::Connect
        } else {
            TransportErrorKind::Other
        };
        Self::new(kind, e.to_string())
    }
}

impl From<TransportError> for Error {
    fn from(e: TransportError) -> Self {
        Self::Transport(e.to_string())
    }
}

/// Sends one request to the camera
#[async_trait]
pub trait Transport: Send + Sync {
    /// Endpoint this transport talks to
    fn endpoint(&self) -> &DeviceEndpoint;

    /// Send a request to `target` (path and query, relative to the base URL)
    ///
    /// Non-success HTTP statuses are returned as responses, not errors.
    async fn send(
        &self,
        method: Method,
        target: &str,
        body: Option<&Value>,
    ) -> std::result::Result<RawResponse, TransportError>;
}

/// reqwest-backed transport honoring the endpoint's timeout and trust policy
pub struct HttpTransport {
    endpoint: DeviceEndpoint,
    client: reqwest::Client,
}

impl HttpTransport {
    /// Build a transport for `endpoint`
    ///
    /// # Errors
    ///
    /// Returns error if the HTTP client cannot be constructed
    pub fn new(endpoint: DeviceEndpoint) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(endpoint.timeout)
            .danger_accept_invalid_certs(endpoint.trust.accepts_invalid_certs())
            .build()?;

        tracing::debug!(
            host = %endpoint.host,
            protocol = %endpoint.protocol,
            timeout_ms = endpoint.timeout.as_millis(),
            "camera transport ready"
        );

        Ok(Self { endpoint, client })
    }
}

#[async_trait]
impl Transport for HttpTransport {
    fn endpoint(&self) -> &DeviceEndpoint {
        &self.endpoint
    }

    async fn send(
        &self,
        method: Method,
        target: &str,
        body: Option<&Value>,
    ) -> std::result::Result<RawResponse, TransportError> {
        let url = self
            .endpoint
            .base_url()
            .and_then(|base| {
                base.join(target)
                    .map_err(|e| Error::Config(format!("invalid request target: {e}")))
            })
            .map_err(|e| TransportError::new(TransportErrorKind::Other, e.to_string()))?;

        let request = match method {
            Method::Get => self.client.get(url),
            Method::Post => {
                let req = self.client.post(url);
                match body {
                    Some(body) => req.json(body),
                    None => req,
                }
            }
        };

        let response = request.send().await?;
        let status = response.status().as_u16();
        let content_type = response
            .headers()
            .get(reqwest::header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        let body = response.bytes().await?.to_vec();

        Ok(RawResponse {
            status,
            content_type,
            body,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn json_content_type_detection() {
        let raw = RawResponse {
            status: 200,
            content_type: Some("application/json; charset=utf-8".to_string()),
            body: Vec::new(),
        };
        assert!(raw.is_json());

        let image = RawResponse {
            content_type: Some("image/jpeg".to_string()),
            ..raw
        };
        assert!(!image.is_json());
    }

    #[test]
    fn transport_error_display_includes_kind() {
        let err = TransportError::timeout("no reply after 4000ms");
        assert!(err.is_timeout());
        assert_eq!(err.to_string(), "timeout: no reply after 4000ms");
    }
}
