//! Device kind detection.

use serde::{Deserialize, Serialize};
use strum::IntoEnumIterator;
use strum_macros::{Display, EnumIter};

use crate::surface::Characteristic;
use crate::translate::{Range, WIFI_BRIGHTNESS, ZIGBEE_BRIGHTNESS};

/// Classification of supported Sengled devices.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
pub enum DeviceKind {
    /// Smart plug, power only.
    Plug,
    /// Dimmable white Zigbee bulb.
    WhiteLight,
    /// Tunable white Zigbee bulb.
    TunableLight,
    /// Wi-Fi color bulb or strip; fine-grained state arrives by push.
    ColorLight,
}

/// Feature flags for a device kind.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Features {
    pub brightness: bool,
    pub color_temperature: bool,
    pub color: bool,
    pub push: bool,
}

// (type code, product code, kind)
const LOOKUP: &[(&str, &str, DeviceKind)] = &[
    ("plug", "E1C-NB6", DeviceKind::Plug),
    ("plug", "E1C-NB7", DeviceKind::Plug),
    ("light", "E11-G13", DeviceKind::WhiteLight),
    ("light", "E11-G14", DeviceKind::WhiteLight),
    ("light", "E11-G23", DeviceKind::WhiteLight),
    ("light", "E11-G33", DeviceKind::WhiteLight),
    ("light", "E11-N13", DeviceKind::WhiteLight),
    ("light", "E11-N14", DeviceKind::WhiteLight),
    ("light", "E12-N14", DeviceKind::WhiteLight),
    ("light", "E1A-AC2", DeviceKind::WhiteLight),
    ("light", "E21-N13A", DeviceKind::WhiteLight),
    ("light", "Z01-A19NAE26", DeviceKind::TunableLight),
    ("light", "Z01-A60EAE27", DeviceKind::TunableLight),
    ("light", "Z01-CIA19NAE26", DeviceKind::TunableLight),
    ("light", "E1F-N5E", DeviceKind::TunableLight),
    ("wifielement", "W21-N11", DeviceKind::ColorLight),
    ("wifielement", "W21-N13", DeviceKind::ColorLight),
    ("wifielement", "W31-N11", DeviceKind::ColorLight),
    ("wifielement", "W31-N15", DeviceKind::ColorLight),
];

impl DeviceKind {
    /// Classify a device from its type and product codes.
    ///
    /// Returns `None` for devices the bridge does not support. Codes compare
    /// case-insensitively; there is no prefix or fuzzy matching.
    ///
    /// # Examples
    ///
    /// ```
    /// use sengled_bridge::DeviceKind;
    ///
    /// assert_eq!(DeviceKind::classify("wifielement", "W21-N13"), Some(DeviceKind::ColorLight));
    /// assert_eq!(DeviceKind::classify("Plug", "E1C-NB6"), Some(DeviceKind::Plug));
    /// assert_eq!(DeviceKind::classify("light", "W21-N13"), None);
    /// assert_eq!(DeviceKind::classify("S1Gateway", "E39-G8"), None);
    /// ```
    pub fn classify(type_code: &str, product_code: &str) -> Option<Self> {
        LOOKUP
            .iter()
            .find(|(ty, product, _)| {
                ty.eq_ignore_ascii_case(type_code) && product.eq_ignore_ascii_case(product_code)
            })
            .map(|(_, _, kind)| *kind)
    }

    pub fn features(self) -> Features {
        match self {
            DeviceKind::Plug => Features::default(),
            DeviceKind::WhiteLight => Features {
                brightness: true,
                ..Features::default()
            },
            DeviceKind::TunableLight => Features {
                brightness: true,
                color_temperature: true,
                ..Features::default()
            },
            DeviceKind::ColorLight => Features {
                brightness: true,
                color_temperature: true,
                color: true,
                push: true,
            },
        }
    }

    /// Device-side brightness scale.
    pub fn brightness_range(self) -> Range {
        match self {
            DeviceKind::ColorLight => WIFI_BRIGHTNESS,
            _ => ZIGBEE_BRIGHTNESS,
        }
    }

    /// Characteristics the host shows for this kind, in declaration order.
    pub fn characteristics(self) -> Vec<Characteristic> {
        Characteristic::iter().filter(|c| self.supports(*c)).collect()
    }

    pub fn supports(self, characteristic: Characteristic) -> bool {
        let features = self.features();
        match characteristic {
            Characteristic::On | Characteristic::Name => true,
            Characteristic::Brightness => features.brightness,
            Characteristic::ColorTemperature => features.color_temperature,
            Characteristic::Hue | Characteristic::Saturation => features.color,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_kind_is_reachable_from_the_table() {
        for kind in DeviceKind::iter() {
            assert!(LOOKUP.iter().any(|(_, _, k)| *k == kind), "{kind} unreachable");
        }
    }

    #[test]
    fn test_table_has_no_duplicates() {
        for (i, (ty, product, _)) in LOOKUP.iter().enumerate() {
            assert!(
                LOOKUP[i + 1..]
                    .iter()
                    .all(|(t, p, _)| !(t.eq_ignore_ascii_case(ty) && p.eq_ignore_ascii_case(product)))
            );
        }
    }

    #[test]
    fn test_case_insensitive() {
        assert_eq!(DeviceKind::classify("LIGHT", "e11-g13"), Some(DeviceKind::WhiteLight));
        assert_eq!(DeviceKind::classify("light", "E11-G1"), None);
    }

    #[test]
    fn test_characteristics_follow_features() {
        assert_eq!(
            DeviceKind::Plug.characteristics(),
            vec![Characteristic::On, Characteristic::Name]
        );
        assert_eq!(
            DeviceKind::ColorLight.characteristics(),
            Characteristic::iter().collect::<Vec<_>>()
        );
        assert!(DeviceKind::TunableLight.supports(Characteristic::ColorTemperature));
        assert!(!DeviceKind::TunableLight.supports(Characteristic::Hue));
        assert!(DeviceKind::ColorLight.supports(Characteristic::Saturation));
        assert_eq!(DeviceKind::ColorLight.brightness_range(), WIFI_BRIGHTNESS);
    }
}
