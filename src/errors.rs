use crate::surface::Characteristic;

/// Boxed error produced by an external collaborator (cloud client, host).
pub type ClientError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// All error types that can occur while bridging Sengled devices.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Failed to serialize data to JSON.
    #[error("failed to dump json: {0:?}")]
    JsonDump(serde_json::Error),

    /// Failed to deserialize JSON data.
    #[error("failed to load json: {0:?}")]
    JsonLoad(serde_json::Error),

    /// The device list could not be fetched from the cloud.
    #[error("failed to fetch device list: {0}")]
    Fetch(#[source] ClientError),

    /// A cloud operation did not finish in time.
    #[error("{action} timed out")]
    Timeout { action: String },

    /// Opening a push subscription failed.
    #[error("failed to subscribe to {topic}: {source}")]
    Subscribe {
        topic: String,
        #[source]
        source: ClientError,
    },

    /// The device-command channel rejected a command.
    #[error("device {device_id} rejected command: {source}")]
    CommandRejected {
        device_id: String,
        #[source]
        source: ClientError,
    },

    /// A write carried no value or a value of the wrong type.
    #[error("invalid value for {characteristic}: {reason}")]
    InvalidArgument {
        characteristic: Characteristic,
        reason: String,
    },

    /// No accessory is registered for the device identifier.
    #[error("no accessory for device {0}")]
    AccessoryNotFound(String),

    /// The accessory kind does not expose the characteristic.
    #[error("device {device_id} does not support {characteristic}")]
    UnsupportedCharacteristic {
        device_id: String,
        characteristic: Characteristic,
    },

    /// Failed to parse a device color string.
    #[error("invalid color string: {0}")]
    InvalidColorString(String),
}

impl Error {
    /// Create a new timeout error
    pub fn timeout(action: &str) -> Self {
        Error::Timeout {
            action: action.to_string(),
        }
    }

    /// Create a new subscribe error
    pub fn subscribe(topic: &str, source: ClientError) -> Self {
        Error::Subscribe {
            topic: topic.to_string(),
            source,
        }
    }

    /// Create a new command rejected error
    pub fn command_rejected(device_id: &str, source: ClientError) -> Self {
        Error::CommandRejected {
            device_id: device_id.to_string(),
            source,
        }
    }

    /// Create a new invalid argument error
    pub fn invalid_argument(characteristic: Characteristic, reason: &str) -> Self {
        Error::InvalidArgument {
            characteristic,
            reason: reason.to_string(),
        }
    }

    /// Create a new unsupported characteristic error
    pub fn unsupported(device_id: &str, characteristic: Characteristic) -> Self {
        Error::UnsupportedCharacteristic {
            device_id: device_id.to_string(),
            characteristic,
        }
    }
}

/// Hacky implementation of PartialEq for testing
#[cfg(test)]
impl PartialEq for Error {
    fn eq(&self, other: &Self) -> bool {
        self.to_string() == other.to_string()
    }
}
