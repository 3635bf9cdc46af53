//! External state surface
//!
//! Published telemetry and settings live in a flat key/value tree
//! (`sensor.motion`, `settings.ir`, ...). Values written by the gateway are
//! acknowledged; values written by the host are not, and only those are
//! forwarded to the dispatcher.

mod memory;

pub use memory::MemoryStore;

use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A single state value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum StateValue {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl StateValue {
    /// Convert a JSON value, keeping structured values as JSON text
    #[must_use]
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => n
                .as_i64()
                .map_or_else(|| Self::Float(n.as_f64().unwrap_or_default()), Self::Int),
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => Self::Text(value.to_string()),
        }
    }

    /// Parse a command-line style argument (`true`, `42`, `Auto`, ...)
    #[must_use]
    pub fn parse_loose(raw: &str) -> Self {
        let trimmed = raw.trim();
        match trimmed {
            "true" => Self::Bool(true),
            "false" => Self::Bool(false),
            _ => trimmed
                .parse::<i64>()
                .map_or_else(|_| Self::Text(raw.to_string()), Self::Int),
        }
    }

    /// Interpret as an on/off flag
    ///
    /// Accepts `true`/`false`, `1`/`0` and their string forms.
    #[must_use]
    pub fn as_flag(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Int(1) => Some(true),
            Self::Int(0) => Some(false),
            Self::Text(s) => match s.trim() {
                "true" | "1" => Some(true),
                "false" | "0" => Some(false),
                _ => None,
            },
            _ => None,
        }
    }

    /// Interpret as an integer; integral floats and numeric strings qualify
    #[must_use]
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            Self::Float(f) if f.fract() == 0.0 && f.is_finite() => Some(*f as i64),
            Self::Text(s) => s.trim().parse().ok(),
            _ => None,
        }
    }

    #[must_use]
    pub fn as_text(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }
}

impl fmt::Display for StateValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Null => f.write_str("null"),
            Self::Bool(b) => write!(f, "{b}"),
            Self::Int(i) => write!(f, "{i}"),
            Self::Float(v) => write!(f, "{v}"),
            Self::Text(s) => f.write_str(s),
        }
    }
}

impl From<bool> for StateValue {
    fn from(value: bool) -> Self {
        Self::Bool(value)
    }
}

impl From<i64> for StateValue {
    fn from(value: i64) -> Self {
        Self::Int(value)
    }
}

impl From<&str> for StateValue {
    fn from(value: &str) -> Self {
        Self::Text(value.to_string())
    }
}

impl From<String> for StateValue {
    fn from(value: String) -> Self {
        Self::Text(value)
    }
}

/// Stored value with acknowledgement flag and timestamp
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StateEntry {
    #[serde(rename = "val")]
    pub value: StateValue,
    pub ack: bool,
    pub ts: DateTime<Utc>,
}

/// Notification of a changed state
#[derive(Debug, Clone, PartialEq)]
pub struct StateChange {
    pub id: String,
    pub value: StateValue,
    pub ack: bool,
}

/// Write side of the host's state tree, as seen by the gateway
#[async_trait]
pub trait StateStore: Send + Sync {
    /// Publish a gateway-confirmed value (`ack = true`)
    async fn publish(&self, id: &str, value: StateValue);

    /// Current value of `id`
    async fn get(&self, id: &str) -> Option<StateValue>;
}
