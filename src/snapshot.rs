//! Device snapshots as returned by one poll of the Sengled cloud.

use serde::{Deserialize, Serialize};
use serde_with::{DisplayFromStr, PickFirst, serde_as};

use crate::errors::Error;
use crate::types::PowerState;

type Result<T> = std::result::Result<T, Error>;

/// The full device list of one poll cycle.
#[serde_as]
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DeviceList {
    /// Cycle timestamp in epoch milliseconds.
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    pub ts: u64,
    pub data: DeviceListData,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DeviceListData {
    #[serde(default)]
    pub device_list: Vec<DeviceSnapshot>,
}

impl DeviceList {
    pub fn new(ts: u64, devices: Vec<DeviceSnapshot>) -> Self {
        DeviceList {
            ts,
            data: DeviceListData {
                device_list: devices,
            },
        }
    }

    /// Parse the cloud's JSON answer.
    ///
    /// # Examples
    ///
    /// ```
    /// use sengled_bridge::DeviceList;
    ///
    /// let list = DeviceList::from_json(r#"{
    ///     "ts": "1700000000000",
    ///     "data": {"device_list": [{
    ///         "deviceUuid": "B0:CE:18:00:00:01",
    ///         "attributes": {
    ///             "name": "Desk", "typeCode": "wifielement", "productCode": "W21-N13",
    ///             "isOnline": "1", "onoff": "1", "brightness": 80
    ///         }
    ///     }]}
    /// }"#).unwrap();
    /// assert_eq!(list.ts, 1_700_000_000_000);
    /// assert_eq!(list.devices()[0].attributes.brightness, Some(80.0));
    /// ```
    pub fn from_json(json: &str) -> Result<Self> {
        serde_json::from_str(json).map_err(Error::JsonLoad)
    }

    pub fn devices(&self) -> &[DeviceSnapshot] {
        &self.data.device_list
    }
}

/// One device as seen in one poll cycle. Read-only for the bridge.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceSnapshot {
    /// Stable vendor identifier (the device MAC).
    pub device_uuid: String,
    pub attributes: DeviceAttributes,
}

/// Named attribute values reported for a device.
///
/// The cloud sends numbers either as JSON numbers or as numeric strings.
#[serde_as]
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceAttributes {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub type_code: String,
    #[serde(default)]
    pub product_code: String,
    #[serde_as(as = "PickFirst<(_, DisplayFromStr)>")]
    #[serde(default)]
    pub is_online: u8,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub onoff: Option<u8>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub brightness: Option<f64>,
    pub color: Option<String>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub color_mode: Option<u8>,
    #[serde_as(as = "Option<PickFirst<(_, DisplayFromStr)>>")]
    pub color_temperature: Option<f64>,
}

impl DeviceSnapshot {
    /// An online snapshot with no state attributes.
    pub fn new(device_id: &str, name: &str, type_code: &str, product_code: &str) -> Self {
        DeviceSnapshot {
            device_uuid: device_id.to_string(),
            attributes: DeviceAttributes {
                name: name.to_string(),
                type_code: type_code.to_string(),
                product_code: product_code.to_string(),
                is_online: 1,
                ..DeviceAttributes::default()
            },
        }
    }

    pub fn with_online(mut self, online: bool) -> Self {
        self.attributes.is_online = u8::from(online);
        self
    }

    pub fn with_power(mut self, on: bool) -> Self {
        self.attributes.onoff = Some(u8::from(on));
        self
    }

    pub fn with_brightness(mut self, brightness: f64) -> Self {
        self.attributes.brightness = Some(brightness);
        self
    }

    pub fn with_color(mut self, color: &str) -> Self {
        self.attributes.color = Some(color.to_string());
        self
    }

    pub fn with_color_temperature(mut self, kelvin: f64) -> Self {
        self.attributes.color_temperature = Some(kelvin);
        self
    }

    pub fn device_id(&self) -> &str {
        &self.device_uuid
    }

    pub fn is_online(&self) -> bool {
        self.attributes.is_online != 0
    }

    pub fn power(&self) -> Option<PowerState> {
        self.attributes.onoff.map(PowerState::from)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numbers_or_strings() {
        let snapshot: DeviceSnapshot = serde_json::from_str(
            r#"{"deviceUuid": "AA", "attributes": {
                "typeCode": "E11", "productCode": "E11-G13",
                "isOnline": 0, "onoff": "1", "brightness": "128", "colorTemperature": 4000
            }}"#,
        )
        .unwrap();

        assert!(!snapshot.is_online());
        assert_eq!(snapshot.power(), Some(PowerState::On));
        assert_eq!(snapshot.attributes.brightness, Some(128.0));
        assert_eq!(snapshot.attributes.color_temperature, Some(4000.0));
        assert_eq!(snapshot.attributes.color, None);
        assert_eq!(snapshot.attributes.name, "");
    }

    #[test]
    fn test_bad_list_is_json_error() {
        let err = DeviceList::from_json(r#"{"ts": "yesterday", "data": {}}"#).unwrap_err();
        assert!(matches!(err, Error::JsonLoad(_)));
    }

    #[test]
    fn test_missing_device_list_defaults_empty() {
        let list = DeviceList::from_json(r#"{"ts": 5, "data": {}}"#).unwrap();
        assert!(list.devices().is_empty());
    }
}
