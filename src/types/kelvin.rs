//! Color temperature on both sides of the bridge.

use serde::{Deserialize, Serialize};

/// Device-side color temperature in Kelvin, valid from 2700K to 6500K.
///
/// Lower values produce warmer light, higher values cooler light.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Kelvin {
    pub(crate) kelvin: u16,
}

impl Default for Kelvin {
    fn default() -> Self {
        Kelvin { kelvin: Self::MIN }
    }
}

impl Kelvin {
    pub const MIN: u16 = 2700;
    pub const MAX: u16 = 6500;

    pub fn kelvin(&self) -> u16 {
        self.kelvin
    }

    /// Returns `None` if value is outside the valid range (2700-6500).
    ///
    /// # Examples
    ///
    /// ```
    /// use sengled_bridge::Kelvin;
    ///
    /// assert!(Kelvin::create(2699).is_none());
    /// assert!(Kelvin::create(2700).is_some());
    /// assert!(Kelvin::create(6500).is_some());
    /// assert!(Kelvin::create(6501).is_none());
    /// ```
    pub fn create(kelvin: u16) -> Option<Self> {
        if (Self::MIN..=Self::MAX).contains(&kelvin) {
            Some(Kelvin { kelvin })
        } else {
            None
        }
    }

    pub fn clamped(kelvin: f64) -> Self {
        let kelvin = if kelvin.is_nan() { f64::from(Self::MIN) } else { kelvin };
        Kelvin {
            kelvin: kelvin
                .round()
                .clamp(f64::from(Self::MIN), f64::from(Self::MAX)) as u16,
        }
    }
}

/// Host-side color temperature in mireds, valid from 140 (cool) to 500 (warm).
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Mired {
    pub(crate) mired: u16,
}

impl Default for Mired {
    fn default() -> Self {
        Mired { mired: Self::WARMEST }
    }
}

impl Mired {
    pub const COOLEST: u16 = 140;
    pub const WARMEST: u16 = 500;

    pub fn mired(&self) -> u16 {
        self.mired
    }

    /// # Examples
    ///
    /// ```
    /// use sengled_bridge::Mired;
    ///
    /// assert!(Mired::create(139).is_none());
    /// assert_eq!(Mired::create(300).unwrap().mired(), 300);
    /// ```
    pub fn create(mired: u16) -> Option<Self> {
        if (Self::COOLEST..=Self::WARMEST).contains(&mired) {
            Some(Mired { mired })
        } else {
            None
        }
    }

    pub fn clamped(mired: f64) -> Self {
        let mired = if mired.is_nan() { f64::from(Self::WARMEST) } else { mired };
        Mired {
            mired: mired
                .round()
                .clamp(f64::from(Self::COOLEST), f64::from(Self::WARMEST)) as u16,
        }
    }
}
