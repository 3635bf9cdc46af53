//! Host-writable features

use std::fmt;

/// A controllable camera feature, identified by the last segment of its
/// state id
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Feature {
    Ir,
    SwitchLed,
    LedBrightness,
    LedMode,
    PtzPreset,
    PtzPatrol,
    AutoFocus,
    SetZoomFocus,
    Push,
    Ftp,
    ScheduledRecording,
    PlayAlarm,
    GetDiscData,
    PtzEnableGuard,
    PtzCheck,
    PtzGuardTimeout,
    EmailNotification,
    AiConfig,
    Reboot,
}

impl Feature {
    pub const ALL: [Self; 19] = [
        Self::Ir,
        Self::SwitchLed,
        Self::LedBrightness,
        Self::LedMode,
        Self::PtzPreset,
        Self::PtzPatrol,
        Self::AutoFocus,
        Self::SetZoomFocus,
        Self::Push,
        Self::Ftp,
        Self::ScheduledRecording,
        Self::PlayAlarm,
        Self::GetDiscData,
        Self::PtzEnableGuard,
        Self::PtzCheck,
        Self::PtzGuardTimeout,
        Self::EmailNotification,
        Self::AiConfig,
        Self::Reboot,
    ];

    /// Full state id the feature is published under
    #[must_use]
    pub const fn state_id(self) -> &'static str {
        match self {
            Self::Ir => "settings.ir",
            Self::SwitchLed => "settings.switchLed",
            Self::LedBrightness => "settings.ledBrightness",
            Self::LedMode => "settings.ledMode",
            Self::PtzPreset => "settings.ptzPreset",
            Self::PtzPatrol => "settings.ptzPatrol",
            Self::AutoFocus => "settings.autoFocus",
            Self::SetZoomFocus => "settings.setZoomFocus",
            Self::Push => "settings.push",
            Self::Ftp => "settings.ftp",
            Self::ScheduledRecording => "settings.scheduledRecording",
            Self::PlayAlarm => "settings.playAlarm",
            Self::GetDiscData => "settings.getDiscData",
            Self::PtzEnableGuard => "settings.ptzEnableGuard",
            Self::PtzCheck => "settings.ptzCheck",
            Self::PtzGuardTimeout => "settings.ptzGuardTimeout",
            Self::EmailNotification => "settings.EmailNotification",
            Self::AiConfig => "ai_config.raw",
            Self::Reboot => "command.reboot",
        }
    }

    /// Resolve a state id such as `reolink.0.settings.ir` or `ir`
    #[must_use]
    pub fn from_id(id: &str) -> Option<Self> {
        if id.ends_with("ai_config.raw") {
            return Some(Self::AiConfig);
        }

        let name = id.rsplit('.').next().unwrap_or(id);
        Some(match name {
            "ir" => Self::Ir,
            "switchLed" => Self::SwitchLed,
            "ledBrightness" => Self::LedBrightness,
            "ledMode" => Self::LedMode,
            "ptzPreset" => Self::PtzPreset,
            "ptzPatrol" => Self::PtzPatrol,
            "autoFocus" => Self::AutoFocus,
            "setZoomFocus" => Self::SetZoomFocus,
            "push" => Self::Push,
            "ftp" => Self::Ftp,
            "scheduledRecording" => Self::ScheduledRecording,
            "playAlarm" => Self::PlayAlarm,
            "getDiscData" => Self::GetDiscData,
            "ptzEnableGuard" => Self::PtzEnableGuard,
            "ptzCheck" => Self::PtzCheck,
            "ptzGuardTimeout" => Self::PtzGuardTimeout,
            "EmailNotification" => Self::EmailNotification,
            "reboot" | "Reboot" => Self::Reboot,
            _ => return None,
        })
    }

    /// Resolve only the exact published id, e.g. `settings.ir`
    #[must_use]
    pub fn from_state_id(id: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|f| f.state_id() == id)
    }
}

impl fmt::Display for Feature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.state_id())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_state_id_resolves_back() {
        for feature in Feature::ALL {
            assert_eq!(Feature::from_id(feature.state_id()), Some(feature));
        }
    }

    #[test]
    fn exact_lookup_rejects_other_prefixes() {
        assert_eq!(Feature::from_state_id("settings.ir"), Some(Feature::Ir));
        assert_eq!(
            Feature::from_state_id("ai_config.raw"),
            Some(Feature::AiConfig)
        );
        assert_eq!(Feature::from_state_id("foo.bar.ir"), None);
        assert_eq!(Feature::from_state_id("ir"), None);
    }

    #[test]
    fn prefixed_ids_resolve_by_last_segment() {
        assert_eq!(Feature::from_id("reolink.0.settings.ir"), Some(Feature::Ir));
        assert_eq!(Feature::from_id("switchLed"), Some(Feature::SwitchLed));
        assert_eq!(
            Feature::from_id("reolink.0.ai_config.raw"),
            Some(Feature::AiConfig)
        );
        assert_eq!(Feature::from_id("sensor.motion"), None);
    }
}
