//! Shapes of the `value` objects returned by refresh queries
//!
//! Only the fields the gateway publishes are modelled. Missing numeric
//! fields default to zero, which the firmware also uses for "off".

use serde::Deserialize;
use serde_json::Value;

/// `GetDevInfo` fields and where they are published
pub const DEVICE_INFO_FIELDS: [(&str, &str); 9] = [
    ("device.buildDay", "/DevInfo/buildDay"),
    ("device.cfgVer", "/DevInfo/cfgVer"),
    ("device.detail", "/DevInfo/detail"),
    ("device.diskNum", "/DevInfo/diskNum"),
    ("device.firmVer", "/DevInfo/firmVer"),
    ("device.model", "/DevInfo/model"),
    ("device.name", "/DevInfo/name"),
    ("device.serial", "/DevInfo/serial"),
    ("device.wifi", "/DevInfo/wifi"),
];

/// `GetLocalLink` fields and where they are published
pub const LOCAL_LINK_FIELDS: [(&str, &str); 6] = [
    ("network.activeLink", "/LocalLink/activeLink"),
    ("network.mac", "/LocalLink/mac"),
    ("network.dns", "/LocalLink/dns/dns1"),
    ("network.gateway", "/LocalLink/static/gateway"),
    ("network.mask", "/LocalLink/static/mask"),
    ("network.networkType", "/LocalLink/type"),
];

/// AI detection classes reported by `GetAiState`
pub const AI_CLASSES: [&str; 4] = ["dog_cat", "face", "people", "vehicle"];

#[derive(Debug, Deserialize)]
pub struct MdState {
    pub state: Value,
}

#[derive(Debug, Deserialize)]
pub struct AiClassState {
    #[serde(default)]
    pub alarm_state: Value,
    #[serde(default)]
    pub support: Value,
}

#[derive(Debug, Deserialize)]
pub struct HddInfo {
    #[serde(rename = "HddInfo", default)]
    pub disks: Vec<Disk>,
}

#[derive(Debug, Deserialize)]
pub struct Disk {
    #[serde(default)]
    pub capacity: i64,
    #[serde(default)]
    pub format: i64,
    /// Free space
    #[serde(default)]
    pub size: i64,
    #[serde(default)]
    pub mount: i64,
}

#[derive(Debug, Deserialize)]
pub struct AutoFocus {
    #[serde(rename = "AutoFocus")]
    pub auto_focus: AutoFocusInner,
}

#[derive(Debug, Deserialize)]
pub struct AutoFocusInner {
    pub disable: Value,
}

#[derive(Debug, Deserialize)]
pub struct ZoomFocus {
    #[serde(rename = "ZoomFocus")]
    pub zoom_focus: ZoomFocusInner,
}

#[derive(Debug, Deserialize)]
pub struct ZoomFocusInner {
    pub zoom: Position,
    pub focus: Position,
}

#[derive(Debug, Deserialize)]
pub struct Position {
    pub pos: i64,
}

#[derive(Debug, Deserialize)]
pub struct IrLights {
    #[serde(rename = "IrLights")]
    pub ir_lights: IrLightsInner,
}

#[derive(Debug, Deserialize)]
pub struct IrLightsInner {
    pub state: String,
}

#[derive(Debug, Deserialize)]
pub struct WhiteLed {
    #[serde(rename = "WhiteLed")]
    pub white_led: WhiteLedInner,
}

#[derive(Debug, Deserialize)]
pub struct WhiteLedInner {
    #[serde(default)]
    pub bright: i64,
    #[serde(default)]
    pub mode: i64,
    #[serde(default)]
    pub state: Value,
}

#[derive(Debug, Deserialize)]
pub struct Recording {
    #[serde(rename = "Rec")]
    pub rec: RecordingInner,
}

#[derive(Debug, Deserialize)]
pub struct RecordingInner {
    pub enable: Value,
}

#[derive(Debug, Deserialize)]
pub struct PtzGuard {
    #[serde(rename = "PtzGuard")]
    pub guard: PtzGuardInner,
}

#[derive(Debug, Deserialize)]
pub struct PtzGuardInner {
    pub benable: Option<Value>,
    pub timeout: Option<i64>,
}

/// Mail settings carried back in `SetEmailV20`
pub const EMAIL_FIELDS: [&str; 9] = [
    "ssl",
    "smtpPort",
    "smtpServer",
    "userName",
    "nickName",
    "addr1",
    "addr2",
    "addr3",
    "interval",
];

/// `Email` object out of a stored `GetEmailV20` value
///
/// Accepts both the bare value and the full response record.
#[must_use]
pub fn email_settings(stored: &Value) -> Option<&Value> {
    stored
        .pointer("/Email")
        .or_else(|| stored.pointer("/value/Email"))
        .filter(|v| v.is_object())
}
