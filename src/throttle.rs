//! Per-accessory update throttle.
//!
//! The cloud may hand back a value that was just written before the backing
//! store has converged. A snapshot is therefore only applied when its cycle
//! timestamp is more than one window past the last applied one, and never
//! while a previous apply for the same accessory is still in flight.

use std::time::Duration;

use serde::Serialize;

/// Throttle bookkeeping carried by every accessory.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SyncState {
    last_timestamp: Option<u64>,
    applying: bool,
}

impl SyncState {
    pub fn last_timestamp(&self) -> Option<u64> {
        self.last_timestamp
    }

    pub fn is_applying(&self) -> bool {
        self.applying
    }
}

/// Decides whether a snapshot may be applied to an accessory.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct UpdateThrottle {
    window: u64,
    skew_tolerance: u64,
}

impl Default for UpdateThrottle {
    fn default() -> Self {
        Self::new(Duration::from_millis(1000), Duration::from_secs(60))
    }
}

impl UpdateThrottle {
    pub fn new(window: Duration, skew_tolerance: Duration) -> Self {
        UpdateThrottle {
            window: millis(window),
            skew_tolerance: millis(skew_tolerance),
        }
    }

    /// # Examples
    ///
    /// ```
    /// use sengled_bridge::throttle::{SyncState, UpdateThrottle};
    ///
    /// let throttle = UpdateThrottle::default();
    /// let mut state = SyncState::default();
    /// assert!(throttle.should_apply(&state, 10_000));
    ///
    /// throttle.begin(&mut state);
    /// throttle.finish(&mut state, 10_000);
    /// assert!(!throttle.should_apply(&state, 10_999));
    /// assert!(throttle.should_apply(&state, 11_001));
    /// ```
    pub fn should_apply(&self, state: &SyncState, timestamp: u64) -> bool {
        if state.applying {
            return false;
        }
        let Some(last) = state.last_timestamp else {
            return true;
        };
        if last.saturating_sub(timestamp) > self.skew_tolerance {
            // backing store clock went back; start over from this cycle
            return true;
        }
        timestamp > last.saturating_add(self.window)
    }

    /// Mark an apply as in flight.
    pub fn begin(&self, state: &mut SyncState) {
        state.applying = true;
    }

    /// Drop an in-flight apply that will never finish.
    pub fn abandon(&self, state: &mut SyncState) {
        state.applying = false;
    }

    /// Close the apply and remember its timestamp.
    pub fn finish(&self, state: &mut SyncState, timestamp: u64) {
        state.applying = false;
        state.last_timestamp = Some(timestamp);
    }
}

fn millis(duration: Duration) -> u64 {
    u64::try_from(duration.as_millis()).unwrap_or(u64::MAX)
}
