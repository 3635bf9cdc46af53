//! On-demand snapshot retrieval

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};

use crate::device::{CommandName, DeviceClient, QueryOptions, RawResponse};
use crate::{Error, Result};

const DEFAULT_CONTENT_TYPE: &str = "image/jpeg";

/// A camera image, base64 encoded for transport as text
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Snapshot {
    #[serde(rename = "type")]
    pub content_type: String,
    pub base64: String,
}

impl Snapshot {
    /// Encode a raw camera response
    ///
    /// # Errors
    ///
    /// Returns `Error::Snapshot` if the camera did not return an image
    pub fn from_raw(raw: &RawResponse) -> Result<Self> {
        if raw.status != 200 {
            return Err(Error::Snapshot(format!("http status {}", raw.status)));
        }
        // The firmware reports errors as a JSON body
        if raw.is_json() {
            let detail = String::from_utf8_lossy(&raw.body);
            return Err(Error::Snapshot(format!("camera returned an error: {detail}")));
        }

        Ok(Self {
            content_type: raw
                .content_type
                .clone()
                .unwrap_or_else(|| DEFAULT_CONTENT_TYPE.to_string()),
            base64: STANDARD.encode(&raw.body),
        })
    }

    /// Decode back into image bytes
    ///
    /// # Errors
    ///
    /// Returns `Error::Snapshot` if the payload is not valid base64
    pub fn decode(&self) -> Result<Vec<u8>> {
        STANDARD
            .decode(&self.base64)
            .map_err(|e| Error::Snapshot(format!("invalid base64 payload: {e}")))
    }
}

/// Fetch a fresh snapshot from the camera
///
/// # Errors
///
/// Returns error if the camera is unreachable or does not return an image
pub async fn capture(client: &DeviceClient) -> Result<Snapshot> {
    let raw = client
        .fetch_raw(CommandName::Snap, QueryOptions::SNAPSHOT)
        .await
        .map_err(|e| Error::Snapshot(e.to_string()))?;

    let snapshot = Snapshot::from_raw(&raw)?;
    tracing::info!(
        content_type = %snapshot.content_type,
        bytes = raw.body.len(),
        "snapshot captured"
    );
    Ok(snapshot)
}
