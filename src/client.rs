//! The Sengled cloud as seen by the bridge.

use std::future::Future;

use serde::{Deserialize, Serialize};

use crate::errors::ClientError;
use crate::push::PushHandler;
use crate::snapshot::DeviceList;

/// Snapshot source, push subscription and device-command channel.
///
/// Authentication, sessions and the wire protocol live behind this trait.
pub trait CloudClient: Send + Sync + 'static {
    /// Fetch the full current device list.
    fn fetch_all_devices(&self) -> impl Future<Output = Result<DeviceList, ClientError>> + Send;

    /// Start delivering payloads of `topic` to `handler`.
    fn subscribe(
        &self,
        topic: &str,
        handler: PushHandler,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;

    fn unsubscribe(&self, topic: &str) -> impl Future<Output = Result<(), ClientError>> + Send;

    /// Send one command to a device.
    fn send_command(
        &self,
        command: &DeviceCommand,
    ) -> impl Future<Output = Result<(), ClientError>> + Send;
}

/// What a command changes, with the value already in device units.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "camelCase")]
pub enum Action {
    /// `"1"` or `"0"`.
    Switch(String),
    Brightness(u16),
    /// Kelvin.
    ColorTemperature(u16),
    /// `rrggbb`.
    Color(String),
}

/// A device command, ready for the device-command channel.
///
/// # Examples
///
/// ```
/// use sengled_bridge::client::{Action, DeviceCommand};
///
/// let command = DeviceCommand::new("AA", "W21-N13", Action::Color("33ff33".into()));
/// let json = serde_json::to_value(&command).unwrap();
/// assert_eq!(json, serde_json::json!({
///     "deviceUuid": "AA", "productCode": "W21-N13", "type": "color", "value": "33ff33"
/// }));
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DeviceCommand {
    pub device_uuid: String,
    pub product_code: String,
    #[serde(flatten)]
    pub action: Action,
}

impl DeviceCommand {
    pub fn new(device_id: &str, product_code: &str, action: Action) -> Self {
        DeviceCommand {
            device_uuid: device_id.to_string(),
            product_code: product_code.to_string(),
            action,
        }
    }

    pub fn device_id(&self) -> &str {
        &self.device_uuid
    }
}
