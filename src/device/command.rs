//! Enumerated camera commands and their JSON request bodies

use std::fmt;

use serde::Serialize;
use serde_json::{Value, json};

/// Every command the gateway sends to the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum CommandName {
    AudioAlarmPlay,
    GetAiCfg,
    GetAiState,
    GetAutoFocus,
    GetDevInfo,
    GetEmailV20,
    GetHddInfo,
    GetIrLights,
    GetLocalLink,
    GetMdState,
    GetPtzGuard,
    GetRecV20,
    GetWhiteLed,
    GetZoomFocus,
    PtzCheck,
    PtzCtrl,
    Reboot,
    SetAiCfg,
    SetAutoFocus,
    SetEmailV20,
    SetFtpV20,
    SetIrLights,
    SetPtzGuard,
    SetPushV20,
    SetRecV20,
    SetWhiteLed,
    Snap,
    StartZoomFocus,
}

impl CommandName {
    /// Wire name used in the `cmd` query parameter and request body
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::AudioAlarmPlay => "AudioAlarmPlay",
            Self::GetAiCfg => "GetAiCfg",
            Self::GetAiState => "GetAiState",
            Self::GetAutoFocus => "GetAutoFocus",
            Self::GetDevInfo => "GetDevInfo",
            Self::GetEmailV20 => "GetEmailV20",
            Self::GetHddInfo => "GetHddInfo",
            Self::GetIrLights => "GetIrLights",
            Self::GetLocalLink => "GetLocalLink",
            Self::GetMdState => "GetMdState",
            Self::GetPtzGuard => "GetPtzGuard",
            Self::GetRecV20 => "GetRecV20",
            Self::GetWhiteLed => "GetWhiteLed",
            Self::GetZoomFocus => "GetZoomFocus",
            Self::PtzCheck => "PtzCheck",
            Self::PtzCtrl => "PtzCtrl",
            Self::Reboot => "Reboot",
            Self::SetAiCfg => "SetAiCfg",
            Self::SetAutoFocus => "SetAutoFocus",
            Self::SetEmailV20 => "SetEmailV20",
            Self::SetFtpV20 => "SetFtpV20",
            Self::SetIrLights => "SetIrLights",
            Self::SetPtzGuard => "SetPtzGuard",
            Self::SetPushV20 => "SetPushV20",
            Self::SetRecV20 => "SetRecV20",
            Self::SetWhiteLed => "SetWhiteLed",
            Self::Snap => "Snap",
            Self::StartZoomFocus => "StartZoomFocus",
        }
    }
}

impl fmt::Display for CommandName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// One command as posted to the camera
///
/// Serializes to `{"cmd": ..., "action": ..., "param": {...}}`; the camera
/// expects a JSON array of these, see [`CommandEnvelope::body`].
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommandEnvelope {
    pub cmd: CommandName,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<u8>,
    pub param: Value,
    /// Also pass the channel as a query parameter
    #[serde(skip)]
    pub channel_query: bool,
}

impl CommandEnvelope {
    #[must_use]
    pub const fn new(cmd: CommandName, param: Value) -> Self {
        Self {
            cmd,
            action: None,
            param,
            channel_query: false,
        }
    }

    /// Query-style body: `{"channel": n}` with the given action
    #[must_use]
    pub fn channel_query(cmd: CommandName, action: u8, channel: u8) -> Self {
        Self::new(cmd, json!({ "channel": channel })).with_action(action)
    }

    #[must_use]
    pub const fn with_action(mut self, action: u8) -> Self {
        self.action = Some(action);
        self
    }

    #[must_use]
    pub const fn with_channel_in_query(mut self) -> Self {
        self.channel_query = true;
        self
    }

    /// JSON array body sent with the request
    #[must_use]
    pub fn body(&self) -> Value {
        json!([self])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn envelope_serializes_as_single_element_array() {
        let envelope = CommandEnvelope::new(
            CommandName::SetPushV20,
            json!({ "Push": { "enable": 1 } }),
        );
        assert_eq!(
            envelope.body(),
            json!([{ "cmd": "SetPushV20", "param": { "Push": { "enable": 1 } } }])
        );
    }

    #[test]
    fn action_is_included_when_set() {
        let envelope = CommandEnvelope::channel_query(CommandName::GetRecV20, 1, 2);
        assert_eq!(
            envelope.body(),
            json!([{ "cmd": "GetRecV20", "action": 1, "param": { "channel": 2 } }])
        );
    }

    #[test]
    fn channel_query_flag_is_not_serialized() {
        let envelope =
            CommandEnvelope::channel_query(CommandName::GetWhiteLed, 0, 0).with_channel_in_query();
        let body = envelope.body();
        assert!(body[0].get("channel_query").is_none());
    }

    #[test]
    fn serialized_name_matches_wire_name() {
        let value = serde_json::to_value(CommandName::StartZoomFocus).unwrap();
        assert_eq!(value, json!(CommandName::StartZoomFocus.as_str()));
    }
}
