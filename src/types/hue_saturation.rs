//! Hue and Saturation color representation.

use serde::{Deserialize, Serialize};

use super::Color;

/// Hue and Saturation color representation, as the host models color.
///
/// - Hue: The color angle on the color wheel (0-360 degrees)
/// - Saturation: The intensity of the color (0-100 percent)
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct HueSaturation {
    hue: f32,
    saturation: f32,
}

impl HueSaturation {
    /// Returns `None` if values are outside valid ranges.
    ///
    /// # Examples
    ///
    /// ```
    /// use sengled_bridge::HueSaturation;
    ///
    /// assert!(HueSaturation::create(0.0, 100.0).is_some());
    /// assert!(HueSaturation::create(120.0, 50.0).is_some());
    /// assert!(HueSaturation::create(361.0, 50.0).is_none());
    /// assert!(HueSaturation::create(180.0, 101.0).is_none());
    /// ```
    pub fn create(hue: f32, saturation: f32) -> Option<Self> {
        if (0.0..=360.0).contains(&hue) && (0.0..=100.0).contains(&saturation) {
            Some(HueSaturation { hue, saturation })
        } else {
            None
        }
    }

    /// Clamps both components into their valid ranges.
    ///
    /// # Examples
    ///
    /// ```
    /// use sengled_bridge::HueSaturation;
    ///
    /// let hs = HueSaturation::clamped(400.0, -5.0);
    /// assert_eq!(hs.hue(), 360.0);
    /// assert_eq!(hs.saturation(), 0.0);
    /// ```
    pub fn clamped(hue: f64, saturation: f64) -> Self {
        let clamp = |v: f64, max: f64| if v.is_nan() { 0.0 } else { v.clamp(0.0, max) };
        HueSaturation {
            hue: clamp(hue, 360.0) as f32,
            saturation: clamp(saturation, 100.0) as f32,
        }
    }

    pub fn hue(&self) -> f32 {
        self.hue
    }

    pub fn saturation(&self) -> f32 {
        self.saturation
    }

    /// Convert to RGB Color.
    ///
    /// Uses HSV to RGB conversion with Value fixed at 100%.
    ///
    /// # Examples
    ///
    /// ```
    /// use sengled_bridge::HueSaturation;
    ///
    /// let color = HueSaturation::create(0.0, 100.0).unwrap().to_color();
    /// assert_eq!((color.red(), color.green(), color.blue()), (255, 0, 0));
    /// ```
    pub fn to_color(&self) -> Color {
        let s = self.saturation / 100.0;
        let v = 1.0_f32;

        if s == 0.0 {
            let gray = (v * 255.0).round() as u8;
            return Color::rgb(gray, gray, gray);
        }

        let h = (self.hue % 360.0) / 60.0;
        let i = h.floor() as i32;
        let f = h - i as f32;
        let p = v * (1.0 - s);
        let q = v * (1.0 - s * f);
        let t = v * (1.0 - s * (1.0 - f));

        let (r, g, b) = match i % 6 {
            0 => (v, t, p),
            1 => (q, v, p),
            2 => (p, v, t),
            3 => (p, q, v),
            4 => (t, p, v),
            _ => (v, p, q),
        };

        let channel = |c: f32| (c * 255.0).round().clamp(0.0, 255.0) as u8;
        Color::rgb(channel(r), channel(g), channel(b))
    }
}

impl From<&HueSaturation> for Color {
    fn from(hs: &HueSaturation) -> Self {
        hs.to_color()
    }
}

impl From<&Color> for HueSaturation {
    /// RGB to HSV, dropping the value component.
    fn from(color: &Color) -> Self {
        let r = f32::from(color.red) / 255.0;
        let g = f32::from(color.green) / 255.0;
        let b = f32::from(color.blue) / 255.0;

        let max = r.max(g).max(b);
        let min = r.min(g).min(b);
        let delta = max - min;

        let hue = if delta == 0.0 {
            0.0
        } else if max == r {
            60.0 * ((g - b) / delta).rem_euclid(6.0)
        } else if max == g {
            60.0 * ((b - r) / delta + 2.0)
        } else {
            60.0 * ((r - g) / delta + 4.0)
        };
        let saturation = if max == 0.0 { 0.0 } else { delta / max * 100.0 };

        HueSaturation {
            hue: hue.clamp(0.0, 360.0),
            saturation: saturation.clamp(0.0, 100.0),
        }
    }
}
