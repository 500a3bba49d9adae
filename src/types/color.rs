//! RGB color as the Sengled cloud encodes it.

use serde::{Deserialize, Serialize};
use std::str::FromStr;

use crate::errors::Error;

/// An RGB color with red, green, and blue components (0-255 each).
///
/// Sengled devices report and accept colors as six hex digits (`rrggbb`).
#[derive(Default, Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub(crate) red: u8,
    pub(crate) green: u8,
    pub(crate) blue: u8,
}

impl Color {
    /// Create a color with the given RGB values.
    pub fn rgb(red: u8, green: u8, blue: u8) -> Self {
        Self { red, green, blue }
    }

    pub fn red(&self) -> u8 {
        self.red
    }

    pub fn green(&self) -> u8 {
        self.green
    }

    pub fn blue(&self) -> u8 {
        self.blue
    }

    /// Lowercase `rrggbb` without a leading `#`.
    ///
    /// # Examples
    ///
    /// ```
    /// use sengled_bridge::Color;
    ///
    /// assert_eq!(Color::rgb(255, 128, 0).to_hex(), "ff8000");
    /// ```
    pub fn to_hex(&self) -> String {
        format!("{:02x}{:02x}{:02x}", self.red, self.green, self.blue)
    }
}

impl FromStr for Color {
    type Err = Error;

    /// Parse from six hex digits, with or without a leading `#`.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::str::FromStr;
    /// use sengled_bridge::Color;
    ///
    /// assert_eq!(Color::from_str("#00FF7f").unwrap(), Color::rgb(0, 255, 127));
    /// assert!(Color::from_str("12345").is_err());
    /// ```
    fn from_str(s: &str) -> Result<Self, Error> {
        let hex = s.trim().trim_start_matches('#');
        if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(Error::InvalidColorString(s.to_string()));
        }

        let channel = |at: usize| {
            u8::from_str_radix(&hex[at..at + 2], 16)
                .map_err(|_| Error::InvalidColorString(s.to_string()))
        };
        Ok(Self::rgb(channel(0)?, channel(2)?, channel(4)?))
    }
}
