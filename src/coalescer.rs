//! Pairing of hue and saturation writes into one color command.
//!
//! The host writes hue and saturation as two separate characteristics while
//! a Sengled color light only accepts one combined color. One half is held
//! until the other arrives.

use std::time::{Duration, Instant};

use log::{debug, warn};
use serde::Serialize;
use strum_macros::Display;

use crate::types::HueSaturation;

/// One half of a color write.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Display)]
pub enum ColorSlot {
    Hue,
    Saturation,
}

#[derive(Debug, Clone, Copy, PartialEq)]
enum PendingColor {
    Empty,
    Armed {
        slot: ColorSlot,
        value: f64,
        at: Instant,
    },
}

/// Two-slot buffer for color writes of one accessory.
#[derive(Debug, Clone)]
pub struct PairedWriteCoalescer {
    state: PendingColor,
    timeout: Option<Duration>,
}

impl Default for PairedWriteCoalescer {
    fn default() -> Self {
        Self::new(Some(Duration::from_secs(5)))
    }
}

impl PairedWriteCoalescer {
    /// `timeout` bounds how long an armed half waits; `None` waits forever.
    pub fn new(timeout: Option<Duration>) -> Self {
        PairedWriteCoalescer {
            state: PendingColor::Empty,
            timeout,
        }
    }

    /// Feed one half. Returns the combined color once both halves are known.
    ///
    /// # Examples
    ///
    /// ```
    /// use std::time::Instant;
    /// use sengled_bridge::coalescer::{ColorSlot, PairedWriteCoalescer};
    ///
    /// let mut pending = PairedWriteCoalescer::default();
    /// let now = Instant::now();
    /// assert!(pending.write(ColorSlot::Hue, 120.0, now).is_none());
    /// let hs = pending.write(ColorSlot::Saturation, 80.0, now).unwrap();
    /// assert_eq!((hs.hue(), hs.saturation()), (120.0, 80.0));
    /// assert!(pending.pending().is_none());
    /// ```
    pub fn write(&mut self, slot: ColorSlot, value: f64, now: Instant) -> Option<HueSaturation> {
        self.expire(now);

        match self.state {
            PendingColor::Armed {
                slot: armed,
                value: held,
                ..
            } if armed != slot => {
                self.state = PendingColor::Empty;
                let (hue, saturation) = match slot {
                    ColorSlot::Hue => (value, held),
                    ColorSlot::Saturation => (held, value),
                };
                Some(HueSaturation::clamped(hue, saturation))
            }
            _ => {
                debug!("holding {slot} = {value} until its pair arrives");
                self.state = PendingColor::Armed {
                    slot,
                    value,
                    at: now,
                };
                None
            }
        }
    }

    /// The armed half, if any.
    pub fn pending(&self) -> Option<(ColorSlot, f64)> {
        match self.state {
            PendingColor::Empty => None,
            PendingColor::Armed { slot, value, .. } => Some((slot, value)),
        }
    }

    pub fn clear(&mut self) {
        self.state = PendingColor::Empty;
    }

    fn expire(&mut self, now: Instant) {
        let (PendingColor::Armed { slot, value, at }, Some(timeout)) = (self.state, self.timeout)
        else {
            return;
        };
        if now.saturating_duration_since(at) > timeout {
            warn!("dropping unpaired {slot} = {value} after {timeout:?}");
            self.state = PendingColor::Empty;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn feed(coalescer: &mut PairedWriteCoalescer, writes: &[(ColorSlot, f64)]) -> Vec<HueSaturation> {
        let now = Instant::now();
        writes
            .iter()
            .filter_map(|(slot, value)| coalescer.write(*slot, *value, now))
            .collect()
    }

    #[test]
    fn test_pair_fires_once() {
        let mut coalescer = PairedWriteCoalescer::default();
        let fired = feed(
            &mut coalescer,
            &[(ColorSlot::Hue, 120.0), (ColorSlot::Saturation, 80.0)],
        );
        assert_eq!(fired, vec![HueSaturation::create(120.0, 80.0).unwrap()]);
    }

    #[test]
    fn test_same_slot_overwrites() {
        let mut coalescer = PairedWriteCoalescer::default();
        assert!(feed(&mut coalescer, &[(ColorSlot::Hue, 120.0), (ColorSlot::Hue, 120.0)]).is_empty());
        assert_eq!(coalescer.pending(), Some((ColorSlot::Hue, 120.0)));

        let fired = feed(
            &mut coalescer,
            &[(ColorSlot::Hue, 30.0), (ColorSlot::Saturation, 50.0)],
        );
        assert_eq!(fired, vec![HueSaturation::create(30.0, 50.0).unwrap()]);
    }

    #[test]
    fn test_two_pairs_fire_twice() {
        let mut coalescer = PairedWriteCoalescer::default();
        let fired = feed(
            &mut coalescer,
            &[
                (ColorSlot::Hue, 120.0),
                (ColorSlot::Saturation, 80.0),
                (ColorSlot::Hue, 200.0),
                (ColorSlot::Saturation, 10.0),
            ],
        );
        assert_eq!(fired.len(), 2);
        assert_eq!(fired[1], HueSaturation::create(200.0, 10.0).unwrap());
    }

    #[test]
    fn test_saturation_first() {
        let mut coalescer = PairedWriteCoalescer::default();
        let fired = feed(
            &mut coalescer,
            &[(ColorSlot::Saturation, 40.0), (ColorSlot::Hue, 300.0)],
        );
        assert_eq!(fired, vec![HueSaturation::create(300.0, 40.0).unwrap()]);
    }

    #[test]
    fn test_expired_half_is_discarded() {
        let mut coalescer = PairedWriteCoalescer::new(Some(Duration::from_secs(5)));
        let start = Instant::now();

        assert!(coalescer.write(ColorSlot::Hue, 120.0, start).is_none());
        let late = start + Duration::from_secs(6);
        assert!(coalescer.write(ColorSlot::Saturation, 80.0, late).is_none());
        assert_eq!(coalescer.pending(), Some((ColorSlot::Saturation, 80.0)));

        let hs = coalescer.write(ColorSlot::Hue, 10.0, late).unwrap();
        assert_eq!((hs.hue(), hs.saturation()), (10.0, 80.0));
    }

    #[test]
    fn test_no_timeout_waits_forever() {
        let mut coalescer = PairedWriteCoalescer::new(None);
        let start = Instant::now();
        coalescer.write(ColorSlot::Hue, 120.0, start);
        let fired = coalescer.write(ColorSlot::Saturation, 80.0, start + Duration::from_secs(3600));
        assert!(fired.is_some());
    }

    #[test]
    fn test_out_of_range_halves_clamp() {
        let mut coalescer = PairedWriteCoalescer::default();
        let fired = feed(
            &mut coalescer,
            &[(ColorSlot::Hue, 400.0), (ColorSlot::Saturation, -1.0)],
        );
        assert_eq!(fired, vec![HueSaturation::create(360.0, 0.0).unwrap()]);
    }
}
