//! Host-side brightness.

use serde::{Deserialize, Serialize};

/// Brightness level from 0 to 100 percent, as the host shows it.
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Brightness {
    pub(crate) value: u8,
}

impl Brightness {
    pub const MIN: u8 = 0;
    pub const MAX: u8 = 100;

    pub fn new() -> Self {
        Brightness { value: Self::MAX }
    }

    pub fn value(&self) -> u8 {
        self.value
    }

    /// Returns None if value is outside valid range (0-100).
    ///
    /// # Examples
    ///
    /// ```
    /// use sengled_bridge::Brightness;
    ///
    /// assert!(Brightness::create(100).is_some());
    /// assert!(Brightness::create(101).is_none());
    /// ```
    pub fn create(value: u8) -> Option<Self> {
        if value <= Self::MAX {
            Some(Brightness { value })
        } else {
            None
        }
    }

    /// Rounds and clamps any number into the valid range.
    ///
    /// # Examples
    ///
    /// ```
    /// use sengled_bridge::Brightness;
    ///
    /// assert_eq!(Brightness::clamped(42.6).value(), 43);
    /// assert_eq!(Brightness::clamped(250.0).value(), 100);
    /// assert_eq!(Brightness::clamped(-3.0).value(), 0);
    /// ```
    pub fn clamped(value: f64) -> Self {
        let value = if value.is_nan() { 0.0 } else { value };
        Brightness {
            value: value.round().clamp(f64::from(Self::MIN), f64::from(Self::MAX)) as u8,
        }
    }
}
