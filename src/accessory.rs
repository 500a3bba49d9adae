//! One bridged device and its per-kind behavior.

use std::time::{Duration, Instant};

use serde_json::{Value, json};
use uuid::Uuid;

use crate::client::{Action, DeviceCommand};
use crate::coalescer::{ColorSlot, PairedWriteCoalescer};
use crate::errors::Error;
use crate::identity::AccessoryIdentity;
use crate::kind::DeviceKind;
use crate::push::{PushField, topic_for};
use crate::snapshot::DeviceSnapshot;
use crate::state::{LightState, Updates};
use crate::surface::{Characteristic, CharacteristicValue};
use crate::throttle::SyncState;
use crate::translate::{hue_saturation_to_hex, mired_to_kelvin, percentage_to_device};
use crate::types::{Brightness, Mired, PowerState};

type Result<T> = std::result::Result<T, Error>;

/// Registry record for one physical device.
#[derive(Debug)]
pub struct Accessory {
    identity: AccessoryIdentity,
    kind: DeviceKind,
    pub(crate) sync: SyncState,
    state: LightState,
    coalescer: PairedWriteCoalescer,
    pub(crate) subscribed: bool,
}

impl Accessory {
    pub fn new(identity: AccessoryIdentity, kind: DeviceKind, pair_timeout: Option<Duration>) -> Self {
        Accessory {
            identity,
            kind,
            sync: SyncState::default(),
            state: LightState::default(),
            coalescer: PairedWriteCoalescer::new(pair_timeout),
            subscribed: false,
        }
    }

    pub fn identity(&self) -> &AccessoryIdentity {
        &self.identity
    }

    pub(crate) fn identity_mut(&mut self) -> &mut AccessoryIdentity {
        &mut self.identity
    }

    pub fn kind(&self) -> DeviceKind {
        self.kind
    }

    pub fn uuid(&self) -> Uuid {
        self.identity.uuid()
    }

    pub fn state(&self) -> &LightState {
        &self.state
    }

    pub fn sync_state(&self) -> &SyncState {
        &self.sync
    }

    pub fn is_subscribed(&self) -> bool {
        self.subscribed
    }

    /// Push topic this accessory needs while online, if its kind has one.
    pub fn push_topic(&self) -> Option<String> {
        self.kind
            .features()
            .push
            .then(|| topic_for(self.identity.device_id()))
    }

    /// Apply a poll snapshot. Throttling is the caller's business.
    pub fn apply_snapshot(&mut self, snapshot: &DeviceSnapshot) -> Updates {
        self.state.merge_snapshot(self.kind, snapshot)
    }

    /// Apply pushed fields in arrival order.
    pub fn apply_push(&mut self, fields: &[PushField]) -> Updates {
        fields
            .iter()
            .flat_map(|field| self.state.merge_push(self.kind, field))
            .collect()
    }

    /// Translate a host write into a device command.
    ///
    /// `Ok(None)` means the write was accepted but nothing is sent yet: the
    /// first half of a color write waits for its pair.
    pub fn prepare_write(
        &mut self,
        characteristic: Characteristic,
        value: Option<&CharacteristicValue>,
        now: Instant,
    ) -> Result<Option<DeviceCommand>> {
        if !characteristic.is_writable() || !self.kind.supports(characteristic) {
            return Err(Error::unsupported(self.identity.device_id(), characteristic));
        }
        let value = value.ok_or_else(|| Error::invalid_argument(characteristic, "missing value"))?;

        let action = match characteristic {
            Characteristic::On => {
                let on = value
                    .as_bool()
                    .ok_or_else(|| Error::invalid_argument(characteristic, "expected a boolean"))?;
                Action::Switch(PowerState::from(on).flag().to_string())
            }
            Characteristic::Brightness => {
                let brightness = Brightness::clamped(number(characteristic, value)?);
                Action::Brightness(percentage_to_device(brightness, self.kind.brightness_range()))
            }
            Characteristic::ColorTemperature => {
                let mired = Mired::clamped(number(characteristic, value)?);
                Action::ColorTemperature(mired_to_kelvin(mired).kelvin())
            }
            Characteristic::Hue | Characteristic::Saturation => {
                let slot = if characteristic == Characteristic::Hue {
                    ColorSlot::Hue
                } else {
                    ColorSlot::Saturation
                };
                match self.coalescer.write(slot, number(characteristic, value)?, now) {
                    Some(hs) => Action::Color(hue_saturation_to_hex(&hs)),
                    None => return Ok(None),
                }
            }
            Characteristic::Name => {
                return Err(Error::unsupported(self.identity.device_id(), characteristic));
            }
        };

        Ok(Some(DeviceCommand::new(
            self.identity.device_id(),
            self.identity.product_code(),
            action,
        )))
    }

    /// Debug view of the record.
    pub fn diagnostics(&self) -> Value {
        let pending = self
            .coalescer
            .pending()
            .map(|(slot, value)| json!({ "slot": slot, "value": value }));
        json!({
            "uuid": self.uuid().to_string(),
            "identity": self.identity,
            "kind": self.kind,
            "sync": self.sync,
            "state": self.state,
            "pendingColor": pending,
            "subscribed": self.subscribed,
        })
    }
}

fn number(characteristic: Characteristic, value: &CharacteristicValue) -> Result<f64> {
    value
        .as_f64()
        .ok_or_else(|| Error::invalid_argument(characteristic, "expected a number"))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn color_light() -> Accessory {
        let identity = AccessoryIdentity::new("AA", "wifielement", "W21-N13", "Desk");
        Accessory::new(identity, DeviceKind::ColorLight, Some(Duration::from_secs(5)))
    }

    fn white_light() -> Accessory {
        let identity = AccessoryIdentity::new("BB", "light", "E11-G13", "Hall");
        Accessory::new(identity, DeviceKind::WhiteLight, None)
    }

    #[test]
    fn test_power_and_brightness_commands() {
        let mut light = white_light();
        let now = Instant::now();

        let command = light
            .prepare_write(Characteristic::On, Some(&CharacteristicValue::Int(1)), now)
            .unwrap()
            .unwrap();
        assert_eq!(command.action, Action::Switch("1".to_string()));
        assert_eq!(command.device_id(), "BB");
        assert_eq!(command.product_code, "E11-G13");

        let command = light
            .prepare_write(Characteristic::Brightness, Some(&CharacteristicValue::Int(100)), now)
            .unwrap()
            .unwrap();
        assert_eq!(command.action, Action::Brightness(255));
    }

    #[test]
    fn test_color_temperature_command() {
        let mut light = color_light();
        let command = light
            .prepare_write(
                Characteristic::ColorTemperature,
                Some(&CharacteristicValue::Int(500)),
                Instant::now(),
            )
            .unwrap()
            .unwrap();
        assert_eq!(command.action, Action::ColorTemperature(2700));
    }

    #[test]
    fn test_color_halves_make_one_command() {
        let mut light = color_light();
        let now = Instant::now();

        let first = light
            .prepare_write(Characteristic::Hue, Some(&CharacteristicValue::Int(120)), now)
            .unwrap();
        assert!(first.is_none());

        let second = light
            .prepare_write(Characteristic::Saturation, Some(&CharacteristicValue::Int(80)), now)
            .unwrap()
            .unwrap();
        assert_eq!(second.action, Action::Color("33ff33".to_string()));
    }

    #[test]
    fn test_write_errors() {
        let mut light = white_light();
        let now = Instant::now();

        assert!(matches!(
            light.prepare_write(Characteristic::Brightness, None, now),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(matches!(
            light.prepare_write(Characteristic::On, Some(&CharacteristicValue::from("on")), now),
            Err(Error::InvalidArgument { .. })
        ));
        assert!(matches!(
            light.prepare_write(Characteristic::Hue, Some(&CharacteristicValue::Int(10)), now),
            Err(Error::UnsupportedCharacteristic { .. })
        ));
        assert!(matches!(
            light.prepare_write(Characteristic::Name, Some(&CharacteristicValue::from("x")), now),
            Err(Error::UnsupportedCharacteristic { .. })
        ));
    }

    #[test]
    fn test_missing_value_does_not_arm_coalescer() {
        let mut light = color_light();
        assert!(light.prepare_write(Characteristic::Hue, None, Instant::now()).is_err());
        assert!(light.diagnostics()["pendingColor"].is_null());
    }

    #[test]
    fn test_push_topic_only_for_push_kinds() {
        assert_eq!(color_light().push_topic().as_deref(), Some("wifielement/AA/status"));
        assert_eq!(white_light().push_topic(), None);
    }

    #[test]
    fn test_apply_push_in_order() {
        let mut light = color_light();
        let updates = light.apply_push(&[PushField::Brightness(10.0), PushField::Brightness(20.0)]);
        assert_eq!(updates.len(), 2);
        assert_eq!(light.state().brightness().map(|b| b.value()), Some(20));
    }
}
