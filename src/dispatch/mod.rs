//! Command dispatcher
//!
//! Turns host writes into camera commands. Each feature has its own guard
//! clause in [`Dispatcher::plan`]: values outside the feature's domain are
//! rejected before any network call and the feature is re-queried so the
//! published state snaps back to what the camera actually has.

pub mod feature;

pub use feature::Feature;

use std::sync::Arc;

use serde_json::{Map, Value, json};

use crate::codec::{IrMode, Toggle, UNSUPPORTED, is_sentinel};
use crate::device::{CommandEnvelope, CommandName, DeviceClient, Normalized};
use crate::refresh::Refresher;
use crate::refresh::payload::{EMAIL_FIELDS, email_settings};
use crate::state::{StateStore, StateValue};
use crate::{Error, Result};

/// PTZ speed used when moving to a preset
const PTZ_PRESET_SPEED: u8 = 32;

/// A value outside a feature's accepted domain
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid value '{value}' for {feature}: expected {expected}")]
pub struct ValidationError {
    pub feature: Feature,
    pub value: String,
    pub expected: &'static str,
}

impl ValidationError {
    fn new(feature: Feature, value: &StateValue, expected: &'static str) -> Self {
        Self {
            feature,
            value: value.to_string(),
            expected,
        }
    }
}

/// What a dispatch did
#[derive(Debug, Clone, PartialEq)]
pub enum Dispatched {
    /// A command was sent; `outcome` is its normalized result
    Sent {
        command: CommandName,
        outcome: Normalized,
    },
    /// No command; the feature was re-queried instead
    Requeried(Feature),
    /// The value was rejected locally
    Rejected {
        error: ValidationError,
        requeried: bool,
    },
    /// Echo of a sentinel value; nothing to do
    Ignored,
}

enum Plan {
    Command {
        envelope: CommandEnvelope,
        confirm: Option<StateValue>,
        followup: Option<Feature>,
    },
    Get(CommandName),
    Requery,
    Ignore,
}

impl Plan {
    const fn command(envelope: CommandEnvelope, confirm: StateValue) -> Self {
        Self::Command {
            envelope,
            confirm: Some(confirm),
            followup: None,
        }
    }
}

/// Maps host writes to camera commands
#[derive(Clone)]
pub struct Dispatcher {
    refresher: Refresher,
    store: Arc<dyn StateStore>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(refresher: Refresher, store: Arc<dyn StateStore>) -> Self {
        Self { refresher, store }
    }

    fn client(&self) -> &DeviceClient {
        self.refresher.client()
    }

    /// Handle a host write of `value` to state `id`
    ///
    /// # Errors
    ///
    /// Returns `Error::UnknownFeature` if `id` names no writable feature.
    /// Validation failures and camera errors are reported through
    /// [`Dispatched`], not as errors.
    pub async fn dispatch(&self, id: &str, value: &StateValue) -> Result<Dispatched> {
        let feature = Feature::from_id(id).ok_or_else(|| Error::UnknownFeature(id.to_string()))?;
        tracing::info!(%feature, value = %value, "changed state");

        let plan = match self.plan(feature, value).await {
            Ok(plan) => plan,
            Err(error) => {
                tracing::error!(error = %error, "value not supported");
                let requeried = self.requery(feature).await;
                return Ok(Dispatched::Rejected { error, requeried });
            }
        };

        match plan {
            Plan::Ignore => Ok(Dispatched::Ignored),
            Plan::Requery => {
                self.requery(feature).await;
                Ok(Dispatched::Requeried(feature))
            }
            Plan::Get(command) => {
                let outcome = self.client().execute_get(command).await;
                match &outcome {
                    Normalized::Success(_) => {
                        tracing::info!(host = %self.client().endpoint().host, "reboot triggered");
                    }
                    failed => log_command_failure(command, failed),
                }
                Ok(Dispatched::Sent { command, outcome })
            }
            Plan::Command {
                envelope,
                confirm,
                followup,
            } => {
                let outcome = self.send(feature, &envelope, confirm).await;
                if let Some(followup) = followup {
                    self.requery(followup).await;
                }
                Ok(Dispatched::Sent {
                    command: envelope.cmd,
                    outcome,
                })
            }
        }
    }

    async fn send(
        &self,
        feature: Feature,
        envelope: &CommandEnvelope,
        confirm: Option<StateValue>,
    ) -> Normalized {
        tracing::debug!(command = %envelope.cmd, body = %envelope.body(), "send command");
        let outcome = self.client().execute(envelope).await;

        match &outcome {
            Normalized::Success(_) => {
                if let Some(value) = confirm {
                    self.store.publish(feature.state_id(), value).await;
                }
            }
            Normalized::DeviceError(_) => {
                log_command_failure(envelope.cmd, &outcome);
                if matches!(
                    envelope.cmd,
                    CommandName::SetAutoFocus | CommandName::SetIrLights
                ) {
                    self.store
                        .publish(feature.state_id(), UNSUPPORTED.into())
                        .await;
                }
            }
            Normalized::TransportError(_) => log_command_failure(envelope.cmd, &outcome),
        }
        outcome
    }

    /// Re-read the feature's current value from the camera
    ///
    /// Returns `false` for features that cannot be read back.
    async fn requery(&self, feature: Feature) -> bool {
        let r = &self.refresher;
        match feature {
            Feature::Ir => r.ir_lights().await,
            Feature::AutoFocus => r.auto_focus().await,
            Feature::ScheduledRecording => r.recording().await,
            Feature::EmailNotification => r.email().await,
            Feature::SwitchLed | Feature::LedBrightness | Feature::LedMode => r.white_led().await,
            Feature::SetZoomFocus => r.zoom_focus().await,
            Feature::PtzEnableGuard | Feature::PtzGuardTimeout => r.ptz_guard().await,
            Feature::AiConfig => r.ai_config().await,
            Feature::GetDiscData => r.drive().await,
            Feature::PtzPreset
            | Feature::PtzPatrol
            | Feature::Push
            | Feature::Ftp
            | Feature::PlayAlarm
            | Feature::PtzCheck
            | Feature::Reboot => return false,
        };
        true
    }

    #[allow(clippy::too_many_lines)]
    async fn plan(
        &self,
        feature: Feature,
        value: &StateValue,
    ) -> std::result::Result<Plan, ValidationError> {
        let channel = self.client().channel();
        let invalid = |expected| ValidationError::new(feature, value, expected);

        let plan = match feature {
            Feature::Ir => {
                if is_sentinel(value) {
                    return Ok(Plan::Ignore);
                }
                let mode = value
                    .as_text()
                    .and_then(|s| s.parse::<IrMode>().ok())
                    .ok_or_else(|| invalid("Auto, On or Off"))?;
                Plan::command(
                    CommandEnvelope::new(
                        CommandName::SetIrLights,
                        json!({ "IrLights": { "channel": channel, "state": mode.as_str() } }),
                    )
                    .with_action(0),
                    mode.as_str().into(),
                )
            }
            Feature::SwitchLed => {
                let on = value.as_flag().ok_or_else(|| invalid("a flag"))?;
                Plan::command(
                    white_led(channel, "state", Toggle::WhiteLed.to_device(on)),
                    on.into(),
                )
            }
            Feature::LedBrightness => {
                let bright = int_in(value, 0..=100).ok_or_else(|| invalid("0 to 100"))?;
                Plan::command(white_led(channel, "bright", bright.into()), bright.into())
            }
            Feature::LedMode => {
                let mode = int_in(value, 0..=3).ok_or_else(|| invalid("0 to 3"))?;
                Plan::command(white_led(channel, "mode", mode.into()), mode.into())
            }
            Feature::PtzPreset => {
                let id = int_in(value, 0..=i64::MAX).ok_or_else(|| invalid("a preset id"))?;
                Plan::command(
                    CommandEnvelope::new(
                        CommandName::PtzCtrl,
                        json!({
                            "channel": channel,
                            "id": id,
                            "op": "ToPos",
                            "speed": PTZ_PRESET_SPEED,
                        }),
                    )
                    .with_action(0),
                    id.into(),
                )
            }
            Feature::PtzPatrol => {
                let id = int_in(value, 0..=i64::MAX).ok_or_else(|| invalid("a patrol id"))?;
                let param = if id == 0 {
                    json!({ "channel": channel, "op": "StopPatrol" })
                } else {
                    json!({ "channel": channel, "op": "StartPatrol", "id": id })
                };
                Plan::command(CommandEnvelope::new(CommandName::PtzCtrl, param), id.into())
            }
            Feature::AutoFocus => {
                if is_sentinel(value) {
                    return Ok(Plan::Ignore);
                }
                let disable = int_in(value, 0..=1).ok_or_else(|| invalid("0 or 1"))?;
                let canonical = Toggle::AutoFocusDisabled
                    .to_host(&Value::from(disable))
                    .unwrap_or_else(|| disable.to_string().into());
                Plan::command(
                    CommandEnvelope::new(
                        CommandName::SetAutoFocus,
                        json!({ "AutoFocus": { "channel": channel, "disable": disable } }),
                    )
                    .with_action(0),
                    canonical,
                )
            }
            Feature::SetZoomFocus => {
                let pos = int_in(value, 0..=i64::MAX).ok_or_else(|| invalid("a zoom position"))?;
                Plan::command(
                    CommandEnvelope::new(
                        CommandName::StartZoomFocus,
                        json!({ "ZoomFocus": { "channel": channel, "pos": pos, "op": "ZoomPos" } }),
                    )
                    .with_action(0),
                    pos.into(),
                )
            }
            Feature::Push => {
                let on = value.as_flag().ok_or_else(|| invalid("a flag"))?;
                Plan::command(
                    CommandEnvelope::new(
                        CommandName::SetPushV20,
                        json!({ "Push": { "enable": Toggle::Push.to_device(on) } }),
                    ),
                    on.into(),
                )
            }
            Feature::Ftp => {
                let on = value.as_flag().ok_or_else(|| invalid("a flag"))?;
                Plan::command(
                    CommandEnvelope::new(
                        CommandName::SetFtpV20,
                        json!({ "Ftp": { "enable": Toggle::Ftp.to_device(on) } }),
                    ),
                    on.into(),
                )
            }
            Feature::ScheduledRecording => {
                let on = value.as_flag().ok_or_else(|| invalid("a flag"))?;
                Plan::command(
                    CommandEnvelope::new(
                        CommandName::SetRecV20,
                        json!({
                            "Rec": {
                                "enable": Toggle::ScheduledRecording.to_device(on),
                                "schedule": { "channel": channel },
                            }
                        }),
                    ),
                    on.into(),
                )
            }
            Feature::PlayAlarm => {
                let times = int_in(value, 1..=i64::MAX).ok_or_else(|| invalid("a count of 1 or more"))?;
                Plan::command(
                    CommandEnvelope::new(
                        CommandName::AudioAlarmPlay,
                        json!({
                            "alarm_mode": "times",
                            "manual_switch": 0,
                            "times": times,
                            "channel": channel,
                        }),
                    )
                    .with_action(0),
                    times.into(),
                )
            }
            Feature::GetDiscData => Plan::Requery,
            Feature::PtzEnableGuard => {
                let on = value.as_flag().ok_or_else(|| invalid("a flag"))?;
                Plan::Command {
                    envelope: ptz_guard(channel, "benable", Toggle::PtzGuard.to_device(on)),
                    confirm: Some(on.into()),
                    followup: Some(Feature::PtzEnableGuard),
                }
            }
            Feature::PtzCheck => Plan::Command {
                envelope: CommandEnvelope::channel_query(CommandName::PtzCheck, 0, channel),
                confirm: None,
                followup: None,
            },
            Feature::PtzGuardTimeout => {
                let timeout = int_in(value, 0..=i64::MAX).ok_or_else(|| invalid("seconds"))?;
                Plan::Command {
                    envelope: ptz_guard(channel, "timeout", timeout.into()),
                    confirm: Some(timeout.into()),
                    followup: Some(Feature::PtzGuardTimeout),
                }
            }
            Feature::EmailNotification => {
                let enable = int_in(value, 0..=1).ok_or_else(|| invalid("0 or 1"))?;
                let stored = self
                    .store
                    .get("RAW.Email")
                    .await
                    .and_then(|raw| raw.as_text().and_then(|s| serde_json::from_str::<Value>(s).ok()));
                let Some(settings) = stored.as_ref().and_then(email_settings) else {
                    return Err(invalid("stored mail settings (RAW.Email)"));
                };

                let mut email = Map::new();
                for field in EMAIL_FIELDS {
                    if let Some(v) = settings.get(field) {
                        email.insert(field.to_string(), v.clone());
                    }
                }
                email.insert("enable".to_string(), Value::from(enable));

                Plan::command(
                    CommandEnvelope::new(CommandName::SetEmailV20, json!({ "Email": email })),
                    enable.into(),
                )
            }
            Feature::AiConfig => {
                let param = value
                    .as_text()
                    .and_then(|s| serde_json::from_str::<Value>(s).ok())
                    .filter(Value::is_object)
                    .ok_or_else(|| invalid("a JSON object"))?;
                Plan::Command {
                    envelope: CommandEnvelope::new(CommandName::SetAiCfg, param),
                    confirm: None,
                    followup: Some(Feature::AiConfig),
                }
            }
            Feature::Reboot => Plan::Get(CommandName::Reboot),
        };

        Ok(plan)
    }
}

fn int_in(value: &StateValue, range: std::ops::RangeInclusive<i64>) -> Option<i64> {
    value.as_int().filter(|v| range.contains(v))
}

fn white_led(channel: u8, key: &str, value: Value) -> CommandEnvelope {
    let mut led = Map::new();
    led.insert("channel".to_string(), Value::from(channel));
    led.insert(key.to_string(), value);
    CommandEnvelope::new(CommandName::SetWhiteLed, json!({ "WhiteLed": led }))
}

fn ptz_guard(channel: u8, key: &str, value: Value) -> CommandEnvelope {
    let mut guard = Map::new();
    guard.insert("channel".to_string(), Value::from(channel));
    guard.insert("cmdStr".to_string(), Value::from("setPos"));
    guard.insert(key.to_string(), value);
    guard.insert("bSaveCurrentPos".to_string(), Value::from(0));
    CommandEnvelope::new(CommandName::SetPtzGuard, json!({ "PtzGuard": guard })).with_action(0)
}

fn log_command_failure(cmd: CommandName, outcome: &Normalized) {
    match outcome {
        Normalized::Success(_) => {}
        Normalized::DeviceError(detail) => {
            tracing::error!(command = %cmd, error = %detail, "command rejected by camera");
        }
        Normalized::TransportError(e) => {
            tracing::error!(command = %cmd, error = %e, "command not delivered");
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn int_range_guard() {
        assert_eq!(int_in(&StateValue::Int(100), 0..=100), Some(100));
        assert_eq!(int_in(&StateValue::Int(101), 0..=100), None);
        assert_eq!(int_in(&StateValue::from("3"), 0..=3), Some(3));
        assert_eq!(int_in(&StateValue::Bool(true), 0..=3), None);
    }

    #[test]
    fn white_led_body_carries_single_setting() {
        let envelope = white_led(1, "bright", Value::from(40));
        assert_eq!(
            envelope.body(),
            json!([{ "cmd": "SetWhiteLed", "param": { "WhiteLed": { "channel": 1, "bright": 40 } } }])
        );
    }

    #[test]
    fn ptz_guard_body_keeps_position() {
        let envelope = ptz_guard(0, "benable", Value::from(1));
        assert_eq!(
            envelope.body()[0]["param"]["PtzGuard"],
            json!({ "channel": 0, "cmdStr": "setPos", "benable": 1, "bSaveCurrentPos": 0 })
        );
    }

    #[test]
    fn validation_error_message() {
        let err = ValidationError::new(Feature::LedMode, &StateValue::Int(7), "0 to 3");
        assert_eq!(
            err.to_string(),
            "invalid value '7' for settings.ledMode: expected 0 to 3"
        );
    }
}
