//! Value types for light control parameters.

mod brightness;
mod color;
mod hue_saturation;
mod kelvin;
mod power;

pub use brightness::Brightness;
pub use color::Color;
pub use hue_saturation::HueSaturation;
pub use kelvin::{Kelvin, Mired};
pub use power::PowerState;
