//! State refreshers
//!
//! One method per camera query. Each sends its query through the
//! [`DeviceClient`] (which feeds connection health), publishes what it
//! learned, and returns the normalized outcome.

pub mod payload;

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde_json::Value;

use crate::codec::{IrMode, Reading, Toggle, UNSUPPORTED};
use crate::device::{CommandEnvelope, CommandName, DeviceClient, Normalized, QueryOptions};
use crate::state::{StateStore, StateValue};

use payload::{
    AI_CLASSES, AiClassState, AutoFocus, DEVICE_INFO_FIELDS, HddInfo, IrLights, LOCAL_LINK_FIELDS,
    MdState, PtzGuard, Recording, WhiteLed, ZoomFocus,
};

/// Queries the camera and publishes the results
#[derive(Clone)]
pub struct Refresher {
    client: DeviceClient,
    store: Arc<dyn StateStore>,
}

impl Refresher {
    #[must_use]
    pub fn new(client: DeviceClient, store: Arc<dyn StateStore>) -> Self {
        Self { client, store }
    }

    #[must_use]
    pub const fn client(&self) -> &DeviceClient {
        &self.client
    }

    /// Device identity and network link
    ///
    /// Returns whether the device info query succeeded.
    pub async fn identify(&self) -> bool {
        let identified = self.device_info().await.is_success();
        self.local_link().await;
        identified
    }

    /// Signals re-queried every cycle
    pub async fn fast_signals(&self) {
        self.motion().await;
        self.ai_state().await;
        self.ai_config().await;
    }

    /// Signals re-queried every Nth cycle
    pub async fn slow_signals(&self) {
        self.recording().await;
        self.drive().await;
    }

    /// One-shot settings read after the first successful identify
    pub async fn settings(&self) {
        self.drive().await;
        self.ptz_guard().await;
        self.auto_focus().await;
        self.zoom_focus().await;
        self.ir_lights().await;
        self.white_led().await;
        self.recording().await;
        self.email().await;
    }

    pub async fn device_info(&self) -> Normalized {
        let outcome = self
            .client
            .query(CommandName::GetDevInfo, QueryOptions::CHANNEL)
            .await;
        match &outcome {
            Normalized::Success(value) => self.publish_pointers(value, &DEVICE_INFO_FIELDS).await,
            failed => log_failure(CommandName::GetDevInfo, failed),
        }
        outcome
    }

    pub async fn local_link(&self) -> Normalized {
        let outcome = self
            .client
            .query(CommandName::GetLocalLink, QueryOptions::CHANNEL)
            .await;
        match &outcome {
            Normalized::Success(value) => self.publish_pointers(value, &LOCAL_LINK_FIELDS).await,
            failed => log_failure(CommandName::GetLocalLink, failed),
        }
        outcome
    }

    pub async fn motion(&self) -> Normalized {
        let outcome = self
            .client
            .query(CommandName::GetMdState, QueryOptions::CHANNEL)
            .await;
        if let Some(md) = decode::<MdState>(CommandName::GetMdState, &outcome) {
            let value = Toggle::Motion
                .to_host(&md.state)
                .unwrap_or_else(|| StateValue::Bool(truthy(&md.state)));
            tracing::debug!(state = %md.state, "motion detection");
            self.store.publish("sensor.motion", value).await;
        }
        outcome
    }

    pub async fn ai_state(&self) -> Normalized {
        let outcome = self
            .client
            .query(CommandName::GetAiState, QueryOptions::CHANNEL)
            .await;
        let Some(value) = success_value(CommandName::GetAiState, &outcome) else {
            return outcome;
        };

        for class in AI_CLASSES {
            let Some(state) = value
                .get(class)
                .and_then(|v| serde_json::from_value::<AiClassState>(v.clone()).ok())
            else {
                tracing::debug!(class, "ai class not reported");
                continue;
            };
            self.store
                .publish(
                    &format!("sensor.{class}.state"),
                    truthy(&state.alarm_state).into(),
                )
                .await;
            self.store
                .publish(
                    &format!("sensor.{class}.support"),
                    truthy(&state.support).into(),
                )
                .await;
        }
        outcome
    }

    pub async fn ai_config(&self) -> Normalized {
        let outcome = self
            .client
            .query(CommandName::GetAiCfg, QueryOptions::CHANNEL)
            .await;
        if let Some(value) = success_value(CommandName::GetAiCfg, &outcome) {
            self.store
                .publish("ai_config.raw", StateValue::Text(value.to_string()))
                .await;
        }
        outcome
    }

    pub async fn drive(&self) -> Normalized {
        let outcome = self
            .client
            .query(CommandName::GetHddInfo, QueryOptions::NONE)
            .await;
        let Some(info) = decode::<HddInfo>(CommandName::GetHddInfo, &outcome) else {
            return outcome;
        };

        let (capacity, formatted, free, mounted) = match info.disks.as_slice() {
            [] => (0, false, 0, false),
            [first, rest @ ..] => {
                if !rest.is_empty() {
                    tracing::warn!(discs = info.disks.len(), "only the first disc is read");
                }
                (first.capacity, first.format == 1, first.size, first.mount == 1)
            }
        };

        self.store.publish("disc.capacity", capacity.into()).await;
        self.store.publish("disc.formatted", formatted.into()).await;
        self.store.publish("disc.free", free.into()).await;
        self.store.publish("disc.mounted", mounted.into()).await;
        outcome
    }

    pub async fn ptz_guard(&self) -> Normalized {
        let outcome = self
            .client
            .query(CommandName::GetPtzGuard, QueryOptions::NONE)
            .await;
        if let Some(guard) = decode::<PtzGuard>(CommandName::GetPtzGuard, &outcome) {
            tracing::debug!(
                enabled = ?guard.guard.benable,
                timeout = ?guard.guard.timeout,
                "ptz guard"
            );
            if let Some(timeout) = guard.guard.timeout {
                self.store
                    .publish("settings.ptzGuardTimeout", timeout.into())
                    .await;
            }
            if let Some(enabled) = guard
                .guard
                .benable
                .as_ref()
                .and_then(|v| Toggle::PtzGuard.to_host(v))
            {
                self.store.publish("settings.ptzEnableGuard", enabled).await;
            }
        }
        outcome
    }

    pub async fn auto_focus(&self) -> Normalized {
        let envelope = self.channel_body(CommandName::GetAutoFocus, 0);
        let outcome = self.client.query_with(&envelope).await;

        let reading = match &outcome {
            Normalized::DeviceError(_) => Reading::Unsupported,
            Normalized::TransportError(_) => {
                log_failure(CommandName::GetAutoFocus, &outcome);
                return outcome;
            }
            Normalized::Success(_) => decode::<AutoFocus>(CommandName::GetAutoFocus, &outcome)
                .and_then(|af| Toggle::AutoFocusDisabled.to_host(&af.auto_focus.disable))
                .map_or(Reading::Unknown, Reading::Known),
        };

        if reading == Reading::Unsupported {
            tracing::debug!("autofocus not supported");
        }
        self.store
            .publish("settings.autoFocus", reading.into_state_with(|v| v))
            .await;
        outcome
    }

    pub async fn zoom_focus(&self) -> Normalized {
        let envelope = self.channel_body(CommandName::GetZoomFocus, 0);
        let outcome = self.client.query_with(&envelope).await;
        if let Some(zf) = decode::<ZoomFocus>(CommandName::GetZoomFocus, &outcome) {
            self.store
                .publish("settings.setZoomFocus", zf.zoom_focus.zoom.pos.into())
                .await;
            self.store
                .publish("settings.focus", zf.zoom_focus.focus.pos.into())
                .await;
        }
        outcome
    }

    pub async fn ir_lights(&self) -> Normalized {
        let outcome = self
            .client
            .query(CommandName::GetIrLights, QueryOptions::CHANNEL)
            .await;

        let reading = match &outcome {
            Normalized::DeviceError(_) => {
                tracing::debug!("ir lights not supported");
                Reading::Unsupported
            }
            Normalized::TransportError(_) => {
                log_failure(CommandName::GetIrLights, &outcome);
                return outcome;
            }
            Normalized::Success(_) => decode::<IrLights>(CommandName::GetIrLights, &outcome)
                .and_then(|ir| ir.ir_lights.state.parse::<IrMode>().ok())
                .map_or(Reading::Unknown, Reading::Known),
        };

        self.store
            .publish(
                "settings.ir",
                reading.into_state_with(|mode| mode.as_str().into()),
            )
            .await;
        outcome
    }

    pub async fn white_led(&self) -> Normalized {
        let envelope = self
            .channel_body(CommandName::GetWhiteLed, 0)
            .with_channel_in_query();
        let outcome = self.client.query_with(&envelope).await;
        if let Some(led) = decode::<WhiteLed>(CommandName::GetWhiteLed, &outcome) {
            let led = led.white_led;
            self.store
                .publish("settings.ledBrightness", led.bright.into())
                .await;
            self.store.publish("settings.ledMode", led.mode.into()).await;
            self.store
                .publish("settings.switchLed", truthy(&led.state).into())
                .await;
        }
        outcome
    }

    pub async fn recording(&self) -> Normalized {
        let envelope = self.channel_body(CommandName::GetRecV20, 1);
        let outcome = self.client.query_with(&envelope).await;
        if let Some(rec) = decode::<Recording>(CommandName::GetRecV20, &outcome) {
            match Toggle::ScheduledRecording.to_host(&rec.rec.enable) {
                Some(value) => {
                    self.store
                        .publish("settings.scheduledRecording", value)
                        .await;
                }
                None => tracing::error!(
                    state = %rec.rec.enable,
                    "unknown scheduled recording state"
                ),
            }
        }
        outcome
    }

    pub async fn email(&self) -> Normalized {
        let outcome = self
            .client
            .query(CommandName::GetEmailV20, QueryOptions::NONE)
            .await;

        match &outcome {
            Normalized::Success(value) => {
                self.store
                    .publish("RAW.Email", StateValue::Text(value.to_string()))
                    .await;
                let enabled = value
                    .pointer("/Email/enable")
                    .and_then(|v| Toggle::EmailNotification.to_host(v))
                    .map_or(Reading::Unknown, Reading::Known);
                self.store
                    .publish("settings.EmailNotification", enabled.into_state_with(|v| v))
                    .await;
            }
            Normalized::DeviceError(_) => {
                tracing::debug!("mail notification not supported");
                self.store
                    .publish("settings.EmailNotification", UNSUPPORTED.into())
                    .await;
            }
            Normalized::TransportError(_) => log_failure(CommandName::GetEmailV20, &outcome),
        }
        outcome
    }

    fn channel_body(&self, cmd: CommandName, action: u8) -> CommandEnvelope {
        CommandEnvelope::channel_query(cmd, action, self.client.channel())
    }

    async fn publish_pointers(&self, value: &Value, fields: &[(&str, &str)]) {
        for (id, pointer) in fields {
            if let Some(field) = value.pointer(pointer) {
                self.store.publish(id, StateValue::from_json(field)).await;
            }
        }
    }
}

/// Log a failed query; timeouts are expected while the camera is offline
pub(crate) fn log_failure(cmd: CommandName, outcome: &Normalized) {
    match outcome {
        Normalized::Success(_) => {}
        Normalized::TransportError(e) if e.is_timeout() => {
            tracing::debug!(command = %cmd, error = %e, "query timed out");
        }
        Normalized::TransportError(e) => {
            tracing::error!(command = %cmd, error = %e, "query failed");
        }
        Normalized::DeviceError(detail) => {
            tracing::debug!(command = %cmd, error = %detail, "query rejected");
        }
    }
}

fn success_value(cmd: CommandName, outcome: &Normalized) -> Option<&Value> {
    if outcome.value().is_none() {
        log_failure(cmd, outcome);
    }
    outcome.value()
}

fn decode<T: DeserializeOwned>(cmd: CommandName, outcome: &Normalized) -> Option<T> {
    let value = success_value(cmd, outcome)?;
    match serde_json::from_value(value.clone()) {
        Ok(decoded) => Some(decoded),
        Err(e) => {
            tracing::warn!(command = %cmd, error = %e, "unexpected response shape");
            None
        }
    }
}

/// Loose truthiness of a wire value (non-zero numbers, `true`, non-empty text)
fn truthy(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::Number(n) => n.as_f64().is_some_and(|f| f != 0.0),
        Value::String(s) => !s.is_empty(),
        Value::Null => false,
        Value::Array(_) | Value::Object(_) => true,
    }
}
