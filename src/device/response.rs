//! Response normalization
//!
//! The camera reports failures in two layers: the HTTP status and an
//! `error` object embedded in the first element of the JSON array it
//! returns with status 200. [`normalize`] folds both layers, plus the
//! transport outcome, into a single [`Normalized`] value.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use super::transport::{RawResponse, TransportError};

/// Failure reported by the camera
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ErrorDetail {
    pub detail: String,
    #[serde(rename = "rspCode", default, skip_serializing_if = "Option::is_none")]
    pub rsp_code: Option<i64>,
}

impl ErrorDetail {
    #[must_use]
    pub fn new(detail: impl Into<String>) -> Self {
        Self {
            detail: detail.into(),
            rsp_code: None,
        }
    }
}

impl std::fmt::Display for ErrorDetail {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self.rsp_code {
            Some(code) => write!(f, "{} (rspCode {code})", self.detail),
            None => f.write_str(&self.detail),
        }
    }
}

/// One element of the camera's response array
#[derive(Debug, Clone, PartialEq)]
pub enum ResultRecord {
    Success { value: Value },
    Failure { error: ErrorDetail },
}

impl ResultRecord {
    fn from_json(record: &Value) -> Self {
        if let Some(error) = record.get("error") {
            let error = serde_json::from_value::<ErrorDetail>(error.clone()).unwrap_or_else(|_| {
                ErrorDetail::new(error.to_string())
            });
            return Self::Failure { error };
        }
        Self::Success {
            value: record.get("value").cloned().unwrap_or(Value::Null),
        }
    }
}

/// HTTP status plus parsed payload records
#[derive(Debug, Clone, PartialEq)]
pub struct DeviceResponse {
    pub http_status: u16,
    pub payload: Vec<ResultRecord>,
}

impl DeviceResponse {
    /// Parse a raw response body
    ///
    /// Bodies that are not a JSON array or object become a single failure
    /// record so callers never mistake garbage for success.
    #[must_use]
    pub fn from_raw(raw: &RawResponse) -> Self {
        let payload = match serde_json::from_slice::<Value>(&raw.body) {
            Ok(Value::Array(records)) => records.iter().map(ResultRecord::from_json).collect(),
            Ok(record @ Value::Object(_)) => vec![ResultRecord::from_json(&record)],
            Ok(_) | Err(_) => vec![ResultRecord::Failure {
                error: ErrorDetail::new("malformed payload"),
            }],
        };

        Self {
            http_status: raw.status,
            payload,
        }
    }
}

/// Uniform outcome of one camera call
#[derive(Debug, Clone, PartialEq)]
pub enum Normalized {
    Success(Value),
    DeviceError(ErrorDetail),
    TransportError(TransportError),
}

impl Normalized {
    #[must_use]
    pub const fn is_success(&self) -> bool {
        matches!(self, Self::Success(_))
    }

    /// Value of a successful call
    #[must_use]
    pub const fn value(&self) -> Option<&Value> {
        match self {
            Self::Success(value) => Some(value),
            _ => None,
        }
    }

    /// Human-readable failure description, if any
    #[must_use]
    pub fn failure(&self) -> Option<String> {
        match self {
            Self::Success(_) => None,
            Self::DeviceError(detail) => Some(detail.to_string()),
            Self::TransportError(e) => Some(e.to_string()),
        }
    }
}

/// Fold a transport outcome into a [`Normalized`] result
///
/// HTTP status is checked first; a 200 response is then judged by its first
/// payload record.
#[must_use]
pub fn normalize(outcome: Result<DeviceResponse, TransportError>) -> Normalized {
    let response = match outcome {
        Ok(response) => response,
        Err(e) => return Normalized::TransportError(e),
    };

    if response.http_status != 200 {
        return Normalized::DeviceError(ErrorDetail::new(format!(
            "http status {}",
            response.http_status
        )));
    }

    match response.payload.into_iter().next() {
        Some(ResultRecord::Success { value }) => Normalized::Success(value),
        Some(ResultRecord::Failure { error }) => Normalized::DeviceError(error),
        None => Normalized::DeviceError(ErrorDetail::new("empty payload")),
    }
}
