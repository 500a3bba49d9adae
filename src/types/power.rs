//! Power state for lights and plugs.

use serde::{Deserialize, Serialize};

/// Power state of a device.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub enum PowerState {
    On,
    Off,
}

impl PowerState {
    /// The flag the Sengled API uses: `"1"` for on, `"0"` for off.
    pub fn flag(self) -> &'static str {
        match self {
            PowerState::On => "1",
            PowerState::Off => "0",
        }
    }

    pub fn is_on(self) -> bool {
        matches!(self, PowerState::On)
    }
}

impl From<bool> for PowerState {
    fn from(on: bool) -> Self {
        if on { PowerState::On } else { PowerState::Off }
    }
}

impl From<u8> for PowerState {
    fn from(onoff: u8) -> Self {
        PowerState::from(onoff != 0)
    }
}
