//! Accessory identity and the identity matcher.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::snapshot::DeviceSnapshot;

/// Identity metadata of an accessory.
///
/// This is the only state the host is expected to persist across restarts;
/// it round-trips through serde for that purpose.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AccessoryIdentity {
    device_id: String,
    type_code: String,
    product_code: String,
    name: String,
}

impl AccessoryIdentity {
    pub const MANUFACTURER: &'static str = "Sengled";

    pub fn new(device_id: &str, type_code: &str, product_code: &str, name: &str) -> Self {
        AccessoryIdentity {
            device_id: device_id.to_string(),
            type_code: type_code.to_string(),
            product_code: product_code.to_string(),
            name: name.to_string(),
        }
    }

    pub fn from_snapshot(snapshot: &DeviceSnapshot) -> Self {
        let attrs = &snapshot.attributes;
        Self::new(
            &snapshot.device_uuid,
            &attrs.type_code,
            &attrs.product_code,
            &attrs.name,
        )
    }

    pub fn device_id(&self) -> &str {
        &self.device_id
    }

    pub fn type_code(&self) -> &str {
        &self.type_code
    }

    pub fn product_code(&self) -> &str {
        &self.product_code
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Host accessory id, stable for a given device identifier.
    ///
    /// # Examples
    ///
    /// ```
    /// use sengled_bridge::AccessoryIdentity;
    ///
    /// let a = AccessoryIdentity::new("B0:CE:18:00:00:01", "wifielement", "W21-N13", "Desk");
    /// let b = AccessoryIdentity::new("B0:CE:18:00:00:01", "wifielement", "W21-N13", "Lamp");
    /// assert_eq!(a.uuid(), b.uuid());
    /// ```
    pub fn uuid(&self) -> Uuid {
        accessory_uuid(&self.device_id)
    }

    /// Whether this identity describes the device in `snapshot`.
    ///
    /// Only the stable identifier counts; name, type and model may change
    /// without making it a different accessory.
    pub fn matches(&self, snapshot: &DeviceSnapshot) -> bool {
        self.device_id == snapshot.device_uuid
    }

    /// Refresh mutable metadata from a matching snapshot.
    ///
    /// Returns `true` when the display name changed.
    pub(crate) fn refresh(&mut self, snapshot: &DeviceSnapshot) -> bool {
        let attrs = &snapshot.attributes;
        if !attrs.type_code.is_empty() {
            self.type_code.clone_from(&attrs.type_code);
        }
        if !attrs.product_code.is_empty() {
            self.product_code.clone_from(&attrs.product_code);
        }
        if attrs.name.is_empty() || self.name == attrs.name {
            return false;
        }
        self.name.clone_from(&attrs.name);
        true
    }
}

/// Host accessory id for a device identifier.
pub fn accessory_uuid(device_id: &str) -> Uuid {
    Uuid::new_v5(&Uuid::NAMESPACE_URL, format!("sengled://device/{device_id}").as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_matches_on_identifier_only() {
        let identity = AccessoryIdentity::new("AA", "wifielement", "W21-N13", "Desk");
        let renamed = DeviceSnapshot::new("AA", "Kitchen", "other", "W11-N13");
        let stranger = DeviceSnapshot::new("BB", "Desk", "wifielement", "W21-N13");

        assert!(identity.matches(&renamed));
        assert!(!identity.matches(&stranger));
    }

    #[test]
    fn test_no_fuzzy_matching() {
        let identity = AccessoryIdentity::new("AA:BB", "", "", "");
        assert!(!identity.matches(&DeviceSnapshot::new("aa:bb", "", "", "")));
        assert!(!identity.matches(&DeviceSnapshot::new("AA:BB ", "", "", "")));
    }

    #[test]
    fn test_refresh_reports_rename() {
        let mut identity = AccessoryIdentity::new("AA", "wifielement", "W21-N13", "Desk");
        assert!(!identity.refresh(&DeviceSnapshot::new("AA", "Desk", "wifielement", "W21-N13")));
        assert!(identity.refresh(&DeviceSnapshot::new("AA", "Lamp", "wifielement", "W21-N13")));
        assert_eq!(identity.name(), "Lamp");
        assert_eq!(identity.uuid(), accessory_uuid("AA"));
    }

    #[test]
    fn test_identity_persists_as_json() {
        let identity = AccessoryIdentity::new("AA", "wifielement", "W21-N13", "Desk");
        let json = serde_json::to_value(&identity).unwrap();
        assert_eq!(json["deviceId"], "AA");
        assert_eq!(json["productCode"], "W21-N13");
        let back: AccessoryIdentity = serde_json::from_value(json).unwrap();
        assert_eq!(back, identity);
    }
}
