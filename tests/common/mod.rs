//! Shared test utilities

#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use reolink_gateway::Daemon;
use reolink_gateway::device::{
    Credentials, DeviceEndpoint, Method, Protocol, RawResponse, Transport, TransportError,
    TransportErrorKind,
};
use serde_json::{Value, json};

/// Scripted reply for one command
#[derive(Debug, Clone)]
pub enum Reply {
    Json(u16, Value),
    Raw(RawResponse),
    Timeout,
    Refused,
}

impl Reply {
    /// 200 with a single success record
    pub fn value(value: Value) -> Self {
        Self::Json(200, json!([{ "code": 0, "value": value }]))
    }

    /// 200 with a single embedded error record
    pub fn device_error(detail: &str) -> Self {
        Self::Json(
            200,
            json!([{ "code": 1, "error": { "detail": detail, "rspCode": -9 } }]),
        )
    }
}

/// One request as seen by the mock
#[derive(Debug, Clone)]
pub struct Recorded {
    pub method: Method,
    pub target: String,
    pub body: Option<Value>,
}

impl Recorded {
    /// Value of the `cmd` query parameter
    pub fn cmd(&self) -> &str {
        query_param(&self.target, "cmd").unwrap_or_default()
    }
}

pub fn query_param<'a>(target: &'a str, key: &str) -> Option<&'a str> {
    let query = target.split_once('?')?.1;
    query
        .split('&')
        .filter_map(|pair| pair.split_once('='))
        .find(|(k, _)| *k == key)
        .map(|(_, v)| v)
}

/// Transport that records requests and replies from a script
pub struct MockTransport {
    endpoint: DeviceEndpoint,
    replies: Mutex<HashMap<String, Reply>>,
    requests: Mutex<Vec<Recorded>>,
    offline: AtomicBool,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::with_channel(0)
    }

    pub fn with_channel(channel: u8) -> Self {
        Self {
            endpoint: DeviceEndpoint::new(
                Protocol::Http,
                "cam.test",
                channel,
                Credentials::new("admin", "secret"),
            ),
            replies: Mutex::new(HashMap::new()),
            requests: Mutex::new(Vec::new()),
            offline: AtomicBool::new(false),
        }
    }

    pub fn reply(&self, cmd: &str, reply: Reply) {
        self.replies.lock().unwrap().insert(cmd.to_string(), reply);
    }

    /// Make every request time out
    pub fn set_offline(&self, offline: bool) {
        self.offline.store(offline, Ordering::SeqCst);
    }

    pub fn requests(&self) -> Vec<Recorded> {
        self.requests.lock().unwrap().clone()
    }

    pub fn commands(&self) -> Vec<String> {
        self.requests()
            .iter()
            .map(|r| r.cmd().to_string())
            .collect()
    }

    pub fn count(&self, cmd: &str) -> usize {
        self.requests().iter().filter(|r| r.cmd() == cmd).count()
    }

    pub fn last(&self, cmd: &str) -> Option<Recorded> {
        self.requests().into_iter().rev().find(|r| r.cmd() == cmd)
    }

    pub fn clear(&self) {
        self.requests.lock().unwrap().clear();
    }
}

#[async_trait]
impl Transport for MockTransport {
    fn endpoint(&self) -> &DeviceEndpoint {
        &self.endpoint
    }

    async fn send(
        &self,
        method: Method,
        target: &str,
        body: Option<&Value>,
    ) -> Result<RawResponse, TransportError> {
        let recorded = Recorded {
            method,
            target: target.to_string(),
            body: body.cloned(),
        };
        let cmd = recorded.cmd().to_string();
        self.requests.lock().unwrap().push(recorded);

        if self.offline.load(Ordering::SeqCst) {
            return Err(TransportError::timeout("timeout of 4000ms exceeded"));
        }

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&cmd)
            .cloned()
            .unwrap_or_else(|| {
                Reply::Json(200, json!([{ "cmd": cmd, "code": 0, "value": { "rspCode": 200 } }]))
            });

        match reply {
            Reply::Json(status, body) => Ok(RawResponse {
                status,
                content_type: Some("application/json".to_string()),
                body: serde_json::to_vec(&body).unwrap(),
            }),
            Reply::Raw(raw) => Ok(raw),
            Reply::Timeout => Err(TransportError::timeout("timeout of 4000ms exceeded")),
            Reply::Refused => Err(TransportError::new(
                TransportErrorKind::Connect,
                "connection refused",
            )),
        }
    }
}

/// Daemon wired to a mock transport, without the control surface
pub fn harness(interval_secs: i64) -> (Arc<MockTransport>, Daemon) {
    let transport = Arc::new(MockTransport::new());
    let daemon = Daemon::with_transport(transport.clone(), interval_secs, None);
    (transport, daemon)
}
