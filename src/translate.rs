//! Numeric mappings between host ranges and device ranges.
//!
//! Everything here is pure. Out-of-range inputs are clamped, never rejected;
//! only a malformed hex color string is an error.

use std::str::FromStr;

use crate::errors::Error;
use crate::types::{Brightness, Color, HueSaturation, Kelvin, Mired};

type Result<T> = std::result::Result<T, Error>;

/// An inclusive numeric range on one side of the bridge.
///
/// `start` may be greater than `end` for inverted scales (mireds run from
/// warm 500 down to cool 140 while kelvin runs the other way).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Range {
    pub start: f64,
    pub end: f64,
}

impl Range {
    pub const fn new(start: f64, end: f64) -> Self {
        Range { start, end }
    }
}

/// Brightness scale of Zigbee lights behind a Sengled hub.
pub const ZIGBEE_BRIGHTNESS: Range = Range::new(0.0, 255.0);
/// Brightness scale of Sengled Wi-Fi lights.
pub const WIFI_BRIGHTNESS: Range = Range::new(0.0, 100.0);
/// Host color temperature scale, warmest first.
pub const HOST_COLOR_TEMPERATURE: Range =
    Range::new(Mired::WARMEST as f64, Mired::COOLEST as f64);
/// Device color temperature scale, warmest first.
pub const DEVICE_COLOR_TEMPERATURE: Range = Range::new(Kelvin::MIN as f64, Kelvin::MAX as f64);

/// Position of `value` inside `range` as a float in `[0, 1]`.
///
/// # Examples
///
/// ```
/// use sengled_bridge::translate::{range_to_float, Range};
///
/// assert_eq!(range_to_float(50.0, Range::new(0.0, 200.0)), 0.25);
/// assert_eq!(range_to_float(500.0, Range::new(500.0, 140.0)), 0.0);
/// assert_eq!(range_to_float(-10.0, Range::new(0.0, 100.0)), 0.0);
/// ```
pub fn range_to_float(value: f64, range: Range) -> f64 {
    let span = range.end - range.start;
    if span == 0.0 || value.is_nan() {
        return 0.0;
    }
    ((value - range.start) / span).clamp(0.0, 1.0)
}

/// Value at position `fraction` (clamped to `[0, 1]`) inside `range`.
pub fn float_to_range(fraction: f64, range: Range) -> f64 {
    let fraction = if fraction.is_nan() { 0.0 } else { fraction.clamp(0.0, 1.0) };
    range.start + fraction * (range.end - range.start)
}

/// Device brightness to host percentage.
///
/// # Examples
///
/// ```
/// use sengled_bridge::translate::{device_to_percentage, ZIGBEE_BRIGHTNESS};
///
/// assert_eq!(device_to_percentage(255.0, ZIGBEE_BRIGHTNESS).value(), 100);
/// assert_eq!(device_to_percentage(128.0, ZIGBEE_BRIGHTNESS).value(), 50);
/// assert_eq!(device_to_percentage(999.0, ZIGBEE_BRIGHTNESS).value(), 100);
/// ```
pub fn device_to_percentage(value: f64, device: Range) -> Brightness {
    Brightness::clamped(range_to_float(value, device) * 100.0)
}

/// Host percentage to device brightness.
pub fn percentage_to_device(brightness: Brightness, device: Range) -> u16 {
    let fraction = f64::from(brightness.value()) / 100.0;
    float_to_range(fraction, device).round() as u16
}

/// Host mireds to device kelvin, by linear interpolation between the scales.
///
/// # Examples
///
/// ```
/// use sengled_bridge::translate::mired_to_kelvin;
/// use sengled_bridge::Mired;
///
/// assert_eq!(mired_to_kelvin(Mired::create(500).unwrap()).kelvin(), 2700);
/// assert_eq!(mired_to_kelvin(Mired::create(140).unwrap()).kelvin(), 6500);
/// ```
pub fn mired_to_kelvin(mired: Mired) -> Kelvin {
    let fraction = range_to_float(f64::from(mired.mired()), HOST_COLOR_TEMPERATURE);
    Kelvin::clamped(float_to_range(fraction, DEVICE_COLOR_TEMPERATURE))
}

/// Device kelvin (any number, clamped) to host mireds.
pub fn kelvin_to_mired(kelvin: f64) -> Mired {
    let fraction = range_to_float(kelvin, DEVICE_COLOR_TEMPERATURE);
    Mired::clamped(float_to_range(fraction, HOST_COLOR_TEMPERATURE))
}

/// Device hex color to host hue/saturation.
///
/// # Examples
///
/// ```
/// use sengled_bridge::translate::hex_to_hue_saturation;
///
/// let hs = hex_to_hue_saturation("ff0000").unwrap();
/// assert_eq!((hs.hue(), hs.saturation()), (0.0, 100.0));
/// assert!(hex_to_hue_saturation("not-a-color").is_err());
/// ```
pub fn hex_to_hue_saturation(hex: &str) -> Result<HueSaturation> {
    let color = Color::from_str(hex)?;
    Ok(HueSaturation::from(&color))
}

/// Host hue/saturation to the device hex color, at full value.
pub fn hue_saturation_to_hex(hs: &HueSaturation) -> String {
    hs.to_color().to_hex()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_brightness_round_trip() {
        for device in [ZIGBEE_BRIGHTNESS, WIFI_BRIGHTNESS] {
            for p in 0..=100u8 {
                let raw = percentage_to_device(Brightness::create(p).unwrap(), device);
                let back = device_to_percentage(f64::from(raw), device).value();
                assert!(back.abs_diff(p) <= 1, "{p} -> {raw} -> {back}");
            }
        }
    }

    #[test]
    fn test_brightness_clamps() {
        assert_eq!(device_to_percentage(-20.0, WIFI_BRIGHTNESS).value(), 0);
        assert_eq!(device_to_percentage(f64::NAN, WIFI_BRIGHTNESS).value(), 0);
        assert_eq!(percentage_to_device(Brightness::clamped(300.0), ZIGBEE_BRIGHTNESS), 255);
    }

    #[test]
    fn test_color_temperature_is_monotonic() {
        let mut previous = 0;
        for m in (Mired::COOLEST..=Mired::WARMEST).rev() {
            let k = mired_to_kelvin(Mired::create(m).unwrap()).kelvin();
            assert!(k >= previous);
            previous = k;
        }
    }

    #[test]
    fn test_color_temperature_round_trip_and_clamp() {
        let k = mired_to_kelvin(Mired::create(320).unwrap());
        assert_eq!(k.kelvin(), 4600);
        assert_eq!(kelvin_to_mired(f64::from(k.kelvin())).mired(), 320);
        assert_eq!(kelvin_to_mired(1000.0).mired(), Mired::WARMEST);
        assert_eq!(kelvin_to_mired(10_000.0).mired(), Mired::COOLEST);
    }

    #[test]
    fn test_hex_round_trip() {
        let hs = HueSaturation::create(120.0, 80.0).unwrap();
        let hex = hue_saturation_to_hex(&hs);
        assert_eq!(hex, "33ff33");
        let back = hex_to_hue_saturation(&hex).unwrap();
        assert!((back.hue() - 120.0).abs() < 1.0);
        assert!((back.saturation() - 80.0).abs() < 1.0);
    }

    #[test]
    fn test_degenerate_range() {
        assert_eq!(range_to_float(5.0, Range::new(3.0, 3.0)), 0.0);
        assert_eq!(float_to_range(2.0, Range::new(0.0, 10.0)), 10.0);
    }
}
