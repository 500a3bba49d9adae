//! The control surface exposed by the accessory host.

use serde::{Deserialize, Serialize};
use strum_macros::{AsRefStr, Display, EnumIter, EnumString};
use uuid::Uuid;

use crate::identity::AccessoryIdentity;

/// A controllable or informational value the host shows for an accessory.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    Hash,
    Serialize,
    Deserialize,
    Display,
    AsRefStr,
    EnumIter,
    EnumString,
)]
pub enum Characteristic {
    On,
    Brightness,
    Hue,
    Saturation,
    ColorTemperature,
    Name,
}

impl Characteristic {
    /// Whether the host may write this characteristic.
    pub fn is_writable(self) -> bool {
        !matches!(self, Characteristic::Name)
    }
}

/// A characteristic value as exchanged with the host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum CharacteristicValue {
    Bool(bool),
    Int(i64),
    Float(f64),
    Text(String),
}

impl CharacteristicValue {
    /// Interpret the value as a power flag; hosts send either booleans or 0/1.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            CharacteristicValue::Bool(b) => Some(*b),
            CharacteristicValue::Int(i) => Some(*i != 0),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            CharacteristicValue::Int(i) => Some(*i as f64),
            CharacteristicValue::Float(f) if f.is_finite() => Some(*f),
            _ => None,
        }
    }
}

impl From<bool> for CharacteristicValue {
    fn from(value: bool) -> Self {
        CharacteristicValue::Bool(value)
    }
}

impl From<u8> for CharacteristicValue {
    fn from(value: u8) -> Self {
        CharacteristicValue::Int(i64::from(value))
    }
}

impl From<u16> for CharacteristicValue {
    fn from(value: u16) -> Self {
        CharacteristicValue::Int(i64::from(value))
    }
}

impl From<f32> for CharacteristicValue {
    fn from(value: f32) -> Self {
        CharacteristicValue::Float(f64::from(value))
    }
}

impl From<&str> for CharacteristicValue {
    fn from(value: &str) -> Self {
        CharacteristicValue::Text(value.to_string())
    }
}

/// What the bridge pushes to the host for one characteristic.
#[derive(Debug, Clone, PartialEq)]
pub enum UpdateValue {
    Value(CharacteristicValue),
    /// The device is not answering; the host should show it as unreachable.
    NoResponse,
}

impl From<CharacteristicValue> for UpdateValue {
    fn from(value: CharacteristicValue) -> Self {
        UpdateValue::Value(value)
    }
}

impl UpdateValue {
    pub fn value<T: Into<CharacteristicValue>>(value: T) -> Self {
        UpdateValue::Value(value.into())
    }
}

/// The host side of the bridge.
///
/// Calls are synchronous: the host only records registrations and values,
/// the bridge never waits on it.
pub trait ControlSurface: Send + Sync {
    /// Expose a new accessory with the given characteristics.
    fn register_accessory(&self, identity: &AccessoryIdentity, characteristics: &[Characteristic]);

    /// Remove an accessory from the host.
    fn unregister_accessory(&self, identity: &AccessoryIdentity);

    /// Publish a new value (or the unreachable sentinel) for a characteristic.
    fn update_characteristic(&self, accessory: Uuid, characteristic: Characteristic, value: UpdateValue);
}
