//! Cached device state, merged from the poll and push channels.

use log::debug;
use serde::Serialize;

use crate::kind::DeviceKind;
use crate::push::PushField;
use crate::snapshot::DeviceSnapshot;
use crate::surface::{Characteristic, UpdateValue};
use crate::translate::{device_to_percentage, hex_to_hue_saturation, kelvin_to_mired};
use crate::types::{Brightness, HueSaturation, Mired, PowerState};

/// Characteristic updates produced by one merge.
pub type Updates = Vec<(Characteristic, UpdateValue)>;

/// Last known state of a device, in host units.
///
/// Fields are `None` until a channel reports them and are cleared again
/// while the device is offline.
#[serde_with::skip_serializing_none]
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LightState {
    online: bool,
    power: Option<PowerState>,
    brightness: Option<Brightness>,
    color: Option<HueSaturation>,
    color_mode: Option<u8>,
    color_temperature: Option<Mired>,
}

impl LightState {
    pub fn is_online(&self) -> bool {
        self.online
    }

    pub fn power(&self) -> Option<PowerState> {
        self.power
    }

    pub fn brightness(&self) -> Option<Brightness> {
        self.brightness
    }

    pub fn color(&self) -> Option<HueSaturation> {
        self.color
    }

    pub fn color_mode(&self) -> Option<u8> {
        self.color_mode
    }

    pub fn color_temperature(&self) -> Option<Mired> {
        self.color_temperature
    }

    /// Merge a poll snapshot.
    ///
    /// An offline device yields a single unreachable marker on `On` and
    /// nothing else. Lights with a push channel only take power from the
    /// poll; everything finer arrives by push.
    pub fn merge_snapshot(&mut self, kind: DeviceKind, snapshot: &DeviceSnapshot) -> Updates {
        if !snapshot.is_online() {
            *self = LightState::default();
            return vec![(Characteristic::On, UpdateValue::NoResponse)];
        }

        self.online = true;
        let mut updates = Updates::new();
        let attrs = &snapshot.attributes;
        let features = kind.features();

        if let Some(power) = snapshot.power() {
            self.power = Some(power);
            updates.push((Characteristic::On, UpdateValue::value(power.is_on())));
        }
        if features.push {
            return updates;
        }

        if features.brightness {
            if let Some(raw) = attrs.brightness {
                let brightness = device_to_percentage(raw, kind.brightness_range());
                self.brightness = Some(brightness);
                updates.push((Characteristic::Brightness, UpdateValue::value(brightness.value())));
            }
        }
        if features.color_temperature {
            if let Some(kelvin) = attrs.color_temperature {
                let mired = kelvin_to_mired(kelvin);
                self.color_temperature = Some(mired);
                updates.push((Characteristic::ColorTemperature, UpdateValue::value(mired.mired())));
            }
        }
        updates
    }

    /// Merge one pushed field.
    pub fn merge_push(&mut self, kind: DeviceKind, field: &PushField) -> Updates {
        let features = kind.features();

        match field {
            PushField::Brightness(raw) if features.brightness => {
                let brightness = device_to_percentage(*raw, kind.brightness_range());
                self.brightness = Some(brightness);
                vec![(Characteristic::Brightness, UpdateValue::value(brightness.value()))]
            }
            PushField::ColorTemperature(kelvin) if features.color_temperature => {
                let mired = kelvin_to_mired(*kelvin);
                self.color_temperature = Some(mired);
                vec![(Characteristic::ColorTemperature, UpdateValue::value(mired.mired()))]
            }
            PushField::Color(hex) if features.color => match hex_to_hue_saturation(hex) {
                Ok(hs) => {
                    self.color = Some(hs);
                    vec![
                        (Characteristic::Hue, UpdateValue::value(hs.hue())),
                        (Characteristic::Saturation, UpdateValue::value(hs.saturation())),
                    ]
                }
                Err(e) => {
                    debug!("ignoring pushed color: {e}");
                    Vec::new()
                }
            },
            PushField::ColorMode(mode) if features.color => {
                self.color_mode = Some(*mode);
                Vec::new()
            }
            other => {
                debug!("{kind} has no use for pushed {other:?}");
                Vec::new()
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_offline_yields_only_no_response() {
        let mut state = LightState::default();
        state.merge_snapshot(
            DeviceKind::WhiteLight,
            &DeviceSnapshot::new("AA", "Desk", "light", "E11-G13").with_power(true),
        );
        assert_eq!(state.power(), Some(PowerState::On));

        let offline = DeviceSnapshot::new("AA", "Desk", "light", "E11-G13")
            .with_online(false)
            .with_power(true)
            .with_brightness(255.0);
        let updates = state.merge_snapshot(DeviceKind::WhiteLight, &offline);

        assert_eq!(updates, vec![(Characteristic::On, UpdateValue::NoResponse)]);
        assert_eq!(state, LightState::default());
    }

    #[test]
    fn test_tunable_light_takes_everything_from_poll() {
        let mut state = LightState::default();
        let snapshot = DeviceSnapshot::new("AA", "Desk", "light", "Z01-A19NAE26")
            .with_power(false)
            .with_brightness(255.0)
            .with_color_temperature(6500.0);
        let updates = state.merge_snapshot(DeviceKind::TunableLight, &snapshot);

        assert_eq!(
            updates,
            vec![
                (Characteristic::On, UpdateValue::value(false)),
                (Characteristic::Brightness, UpdateValue::value(100u8)),
                (Characteristic::ColorTemperature, UpdateValue::value(140u16)),
            ]
        );
    }

    #[test]
    fn test_push_light_takes_power_only_from_poll() {
        let mut state = LightState::default();
        let snapshot = DeviceSnapshot::new("AA", "Desk", "wifielement", "W21-N13")
            .with_power(true)
            .with_brightness(50.0)
            .with_color("ff0000");
        let updates = state.merge_snapshot(DeviceKind::ColorLight, &snapshot);

        assert_eq!(updates, vec![(Characteristic::On, UpdateValue::value(true))]);
        assert_eq!(state.brightness(), None);
    }

    #[test]
    fn test_push_fields() {
        let mut state = LightState::default();
        let kind = DeviceKind::ColorLight;

        let updates = state.merge_push(kind, &PushField::Brightness(50.0));
        assert_eq!(updates, vec![(Characteristic::Brightness, UpdateValue::value(50u8))]);

        let updates = state.merge_push(kind, &PushField::Color("0000ff".into()));
        assert_eq!(
            updates,
            vec![
                (Characteristic::Hue, UpdateValue::value(240.0f32)),
                (Characteristic::Saturation, UpdateValue::value(100.0f32)),
            ]
        );

        assert!(state.merge_push(kind, &PushField::ColorMode(1)).is_empty());
        assert_eq!(state.color_mode(), Some(1));
    }

    #[test]
    fn test_bad_pushed_color_keeps_state() {
        let mut state = LightState::default();
        state.merge_push(DeviceKind::ColorLight, &PushField::Color("ff0000".into()));
        let before = state.clone();

        assert!(state
            .merge_push(DeviceKind::ColorLight, &PushField::Color("zz".into()))
            .is_empty());
        assert_eq!(state, before);
    }

    #[test]
    fn test_push_ignored_without_feature() {
        let mut state = LightState::default();
        assert!(state
            .merge_push(DeviceKind::Plug, &PushField::Brightness(10.0))
            .is_empty());
        assert_eq!(state.brightness(), None);
    }
}
