//! Bridge configuration.

use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_with::{DurationMilliSeconds, serde_as};

use crate::snapshot::DeviceSnapshot;

/// Tunables of the bridge.
///
/// Every field has a default, so an empty JSON object is a valid config.
/// Durations are written in milliseconds.
///
/// # Examples
///
/// ```
/// use std::time::Duration;
/// use sengled_bridge::BridgeConfig;
///
/// let config: BridgeConfig = serde_json::from_str(r#"{
///     "refreshInterval": 15000,
///     "pairTimeout": null,
///     "ignoredDevices": ["B0:CE:18:00:00:09"]
/// }"#).unwrap();
/// assert_eq!(config.refresh_interval, Duration::from_secs(15));
/// assert_eq!(config.throttle_window, Duration::from_secs(1));
/// assert_eq!(config.pair_timeout, None);
/// ```
#[serde_as]
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct BridgeConfig {
    /// Delay between two poll cycles.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub refresh_interval: Duration,
    /// Minimum gap between two applied snapshots of one accessory.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub throttle_window: Duration,
    /// Timestamp regressions larger than this are taken as a clock reset.
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub skew_tolerance: Duration,
    /// How long one half of a color write waits for the other.
    ///
    /// A missing key keeps the five second default; `null` disables expiry.
    #[serde_as(as = "Option<DurationMilliSeconds<u64>>", no_default)]
    pub pair_timeout: Option<Duration>,
    #[serde_as(as = "DurationMilliSeconds<u64>")]
    pub fetch_timeout: Duration,
    pub ignored_devices: Vec<String>,
    pub ignored_types: Vec<String>,
}

impl Default for BridgeConfig {
    fn default() -> Self {
        BridgeConfig {
            refresh_interval: Duration::from_secs(30),
            throttle_window: Duration::from_millis(1000),
            skew_tolerance: Duration::from_secs(60),
            pair_timeout: Some(Duration::from_secs(5)),
            fetch_timeout: Duration::from_secs(10),
            ignored_devices: Vec::new(),
            ignored_types: Vec::new(),
        }
    }
}

impl BridgeConfig {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn refresh_interval(mut self, interval: Duration) -> Self {
        self.refresh_interval = interval;
        self
    }

    pub fn throttle_window(mut self, window: Duration) -> Self {
        self.throttle_window = window;
        self
    }

    pub fn skew_tolerance(mut self, tolerance: Duration) -> Self {
        self.skew_tolerance = tolerance;
        self
    }

    pub fn pair_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.pair_timeout = timeout;
        self
    }

    pub fn fetch_timeout(mut self, timeout: Duration) -> Self {
        self.fetch_timeout = timeout;
        self
    }

    pub fn ignore_device(mut self, device_id: &str) -> Self {
        self.ignored_devices.push(device_id.to_string());
        self
    }

    pub fn ignore_type(mut self, type_code: &str) -> Self {
        self.ignored_types.push(type_code.to_string());
        self
    }

    /// Whether the ignore lists exclude this snapshot.
    pub fn is_ignored(&self, snapshot: &DeviceSnapshot) -> bool {
        self.ignored_devices
            .iter()
            .any(|id| id == snapshot.device_id())
            || self
                .ignored_types
                .iter()
                .any(|ty| ty.eq_ignore_ascii_case(&snapshot.attributes.type_code))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_object_is_default() {
        let config: BridgeConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config, BridgeConfig::default());
    }

    #[test]
    fn test_omitted_pair_timeout_keeps_default() {
        let config: BridgeConfig = serde_json::from_str(r#"{"refreshInterval": 1000}"#).unwrap();
        assert_eq!(config.refresh_interval, Duration::from_secs(1));
        assert_eq!(config.pair_timeout, Some(Duration::from_secs(5)));

        let config: BridgeConfig = serde_json::from_str(r#"{"pairTimeout": null}"#).unwrap();
        assert_eq!(config.pair_timeout, None);

        let config: BridgeConfig = serde_json::from_str(r#"{"pairTimeout": 750}"#).unwrap();
        assert_eq!(config.pair_timeout, Some(Duration::from_millis(750)));
    }

    #[test]
    fn test_serializes_milliseconds() {
        let config = BridgeConfig::new()
            .throttle_window(Duration::from_millis(250))
            .pair_timeout(None);
        let json = serde_json::to_value(&config).unwrap();
        assert_eq!(json["throttleWindow"], 250);
        assert_eq!(json["refreshInterval"], 30_000);
        assert!(json["pairTimeout"].is_null());
    }

    #[test]
    fn test_ignore_lists() {
        let config = BridgeConfig::new().ignore_device("AA").ignore_type("plug");

        assert!(config.is_ignored(&DeviceSnapshot::new("AA", "Desk", "light", "E11-G13")));
        assert!(config.is_ignored(&DeviceSnapshot::new("BB", "Fan", "Plug", "E1C-NB6")));
        assert!(!config.is_ignored(&DeviceSnapshot::new("CC", "Desk", "light", "E11-G13")));
    }
}
