//! Push channel: per-device status topics and their payloads.

use log::debug;
use serde::Deserialize;
use serde_json::Value;

use crate::errors::Error;

type Result<T> = std::result::Result<T, Error>;

/// Callback a cloud client invokes with each raw payload of a topic.
pub type PushHandler = Box<dyn Fn(&str) + Send + Sync + 'static>;

/// Status topic of a device.
///
/// # Examples
///
/// ```
/// use sengled_bridge::push::topic_for;
///
/// let topic = topic_for("B0:CE:18:00:00:01");
/// assert_eq!(topic, "wifielement/B0:CE:18:00:00:01/status");
/// ```
pub fn topic_for(device_id: &str) -> String {
    format!("wifielement/{device_id}/status")
}

/// A raw payload received for one device, queued for the bridge.
#[derive(Debug, Clone, PartialEq)]
pub struct PushMessage {
    pub device_id: String,
    pub payload: String,
}

/// One field update carried by a push payload.
#[derive(Debug, Clone, PartialEq)]
pub enum PushField {
    /// Device-range brightness.
    Brightness(f64),
    /// Hex color, `rrggbb`.
    Color(String),
    ColorMode(u8),
    /// Kelvin.
    ColorTemperature(f64),
}

#[derive(Debug, Deserialize)]
struct RawEntry {
    #[serde(rename = "type")]
    field: Option<String>,
    dn: Option<String>,
    value: Option<Value>,
}

/// Decode the fields of a payload addressed to `device_id`.
///
/// An unparsable payload is an error. Individual entries that lack a type
/// or target, address another device, name an unknown field or carry an
/// unusable value are dropped.
///
/// # Examples
///
/// ```
/// use sengled_bridge::push::{parse_payload, PushField};
///
/// let fields = parse_payload("AA", r#"[
///     {"dn": "AA", "type": "brightness", "value": "60"},
///     {"dn": "BB", "type": "brightness", "value": "10"},
///     {"dn": "AA", "type": "color", "value": "ff0000"}
/// ]"#).unwrap();
/// assert_eq!(fields, vec![PushField::Brightness(60.0), PushField::Color("ff0000".into())]);
/// assert!(parse_payload("AA", "{not json").is_err());
/// ```
pub fn parse_payload(device_id: &str, payload: &str) -> Result<Vec<PushField>> {
    let entries: Vec<RawEntry> = serde_json::from_str(payload).map_err(Error::JsonLoad)?;

    let fields = entries
        .into_iter()
        .filter_map(|entry| {
            let (Some(field), Some(dn)) = (entry.field, entry.dn) else {
                debug!("dropping push entry without type or target");
                return None;
            };
            if dn != device_id {
                debug!("dropping push entry for {dn} on topic of {device_id}");
                return None;
            }
            let parsed = entry.value.as_ref().and_then(|value| decode(&field, value));
            if parsed.is_none() {
                debug!("dropping push entry {field} = {:?} for {dn}", entry.value);
            }
            parsed
        })
        .collect();

    Ok(fields)
}

fn decode(field: &str, value: &Value) -> Option<PushField> {
    match field {
        "brightness" => number(value).map(PushField::Brightness),
        "colorTemperature" => number(value).map(PushField::ColorTemperature),
        "colorMode" => number(value)
            .filter(|mode| (0.0..=f64::from(u8::MAX)).contains(mode))
            .map(|mode| PushField::ColorMode(mode as u8)),
        "color" => value
            .as_str()
            .map(|hex| PushField::Color(hex.trim_start_matches('#').to_string())),
        _ => None,
    }
}

fn number(value: &Value) -> Option<f64> {
    let number: Option<f64> = match value {
        Value::Number(n) => n.as_f64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    };
    number.filter(|n| n.is_finite())
}
