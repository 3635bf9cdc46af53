//! Feature value encodings
//!
//! The camera uses three encodings for on/off settings: native JSON booleans,
//! `0`/`1` integers and named strings. Published host values use yet another
//! mix. Each [`Toggle`] maps to one [`BoolEncoding`] per [`Side`], and
//! conversion in either direction is a pure function of that pair.

use std::fmt;
use std::str::FromStr;

use serde_json::Value;

use crate::state::StateValue;

/// Published in place of a reading when the camera rejects a feature
pub const UNSUPPORTED: &str = "Error or not supported";

/// Published when the camera reports a value outside the known domain
pub const UNKNOWN: &str = "Unknown";

/// A feature reading that may not have a real value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Reading<T> {
    Known(T),
    Unknown,
    Unsupported,
}

impl<T> Reading<T> {
    /// Published form, with `known` rendering real values
    ///
    /// The sentinels share the state slot with real values, so readers of
    /// the published state cannot tell them apart by type alone.
    pub fn into_state_with(self, known: impl FnOnce(T) -> StateValue) -> StateValue {
        match self {
            Self::Known(value) => known(value),
            Self::Unknown => StateValue::from(UNKNOWN),
            Self::Unsupported => StateValue::from(UNSUPPORTED),
        }
    }
}

/// Whether a published value is one of the sentinels
#[must_use]
pub fn is_sentinel(value: &StateValue) -> bool {
    matches!(value.as_text(), Some(UNSUPPORTED | UNKNOWN))
}

/// Wire form of an on/off value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BoolEncoding {
    Native,
    ZeroOne,
    Named {
        on: &'static str,
        off: &'static str,
    },
}

impl BoolEncoding {
    #[must_use]
    pub fn encode(self, value: bool) -> Value {
        match self {
            Self::Native => Value::Bool(value),
            Self::ZeroOne => Value::from(u8::from(value)),
            Self::Named { on, off } => Value::from(if value { on } else { off }),
        }
    }

    /// Decode strictly; values of the wrong shape yield `None`
    #[must_use]
    pub fn decode(self, value: &Value) -> Option<bool> {
        match (self, value) {
            (Self::Native, Value::Bool(b)) => Some(*b),
            (Self::ZeroOne, Value::Number(n)) => match n.as_i64() {
                Some(1) => Some(true),
                Some(0) => Some(false),
                _ => None,
            },
            (Self::Named { on, off }, Value::String(s)) => {
                if s == on {
                    Some(true)
                } else if s == off {
                    Some(false)
                } else {
                    None
                }
            }
            _ => None,
        }
    }
}

/// Which side of the gateway a value lives on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Side {
    Device,
    Host,
}

/// Every on/off setting or signal exchanged with the camera
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Toggle {
    Motion,
    AiDetection,
    /// `disable` flag of the autofocus setting; on means autofocus is off
    AutoFocusDisabled,
    WhiteLed,
    Push,
    Ftp,
    ScheduledRecording,
    PtzGuard,
    EmailNotification,
}

impl Toggle {
    pub const ALL: [Self; 9] = [
        Self::Motion,
        Self::AiDetection,
        Self::AutoFocusDisabled,
        Self::WhiteLed,
        Self::Push,
        Self::Ftp,
        Self::ScheduledRecording,
        Self::PtzGuard,
        Self::EmailNotification,
    ];

    #[must_use]
    pub const fn encoding(self, side: Side) -> BoolEncoding {
        match (self, side) {
            (_, Side::Device) => BoolEncoding::ZeroOne,
            (Self::AutoFocusDisabled, Side::Host) => BoolEncoding::Named { on: "1", off: "0" },
            (Self::EmailNotification, Side::Host) => BoolEncoding::ZeroOne,
            (_, Side::Host) => BoolEncoding::Native,
        }
    }

    /// Device wire value to published host value
    #[must_use]
    pub fn to_host(self, wire: &Value) -> Option<StateValue> {
        self.encoding(Side::Device)
            .decode(wire)
            .map(|b| StateValue::from_json(&self.encoding(Side::Host).encode(b)))
    }

    /// Canonical value to device wire value
    #[must_use]
    pub fn to_device(self, value: bool) -> Value {
        self.encoding(Side::Device).encode(value)
    }
}

/// Infrared light mode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IrMode {
    Auto,
    On,
    Off,
}

impl IrMode {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Auto => "Auto",
            Self::On => "On",
            Self::Off => "Off",
        }
    }
}

impl fmt::Display for IrMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for IrMode {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "Auto" => Ok(Self::Auto),
            "On" => Ok(Self::On),
            "Off" => Ok(Self::Off),
            _ => Err(()),
        }
    }
}
