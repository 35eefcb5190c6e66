//! Meter: a counter that also tracks its own rate of change
//!
//! Identical mutation surface to [`crate::Counter`], but the default
//! configuration tracks the first derivative and exponentially weighted
//! moving averages of both the value and its rate over one, five and
//! fifteen minutes.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use vitals_core::Timestamp;
use vitals_stats::RateEngine;

/// Default maximum derivative order for a meter.
pub const DEFAULT_METER_DERIVATIVES: usize = 1;

/// Default meter EWMA time constants: one, five and fifteen minutes.
pub const DEFAULT_METER_TIME_CONSTANTS: [Duration; 3] = [
    Duration::from_secs(60),
    Duration::from_secs(5 * 60),
    Duration::from_secs(15 * 60),
];

/// Point-in-time copy of a [`Meter`].
///
/// `derivatives` is indexed `[order][column]` with column 0 instantaneous
/// and columns 1..=T the EWMA channel per entry of `time_constants`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MeterSnapshot {
    /// Current value
    pub value: i64,
    /// Time of the last accepted mutation; epoch if never written
    pub last_updated: Timestamp,
    /// Configured EWMA time constants
    pub time_constants: Vec<Duration>,
    /// Derivative matrix, deep-copied
    pub derivatives: Vec<Vec<f64>>,
}

/// A rate-tracking integer metric.
#[derive(Debug)]
pub struct Meter {
    rate: RwLock<RateEngine>,
}

impl Default for Meter {
    fn default() -> Self {
        Self::new()
    }
}

impl Meter {
    /// Create a meter with the default derivative order and 1/5/15-minute
    /// EWMA channels.
    pub fn new() -> Self {
        Meter {
            rate: RwLock::new(RateEngine::new(
                DEFAULT_METER_DERIVATIVES,
                &DEFAULT_METER_TIME_CONSTANTS,
            )),
        }
    }

    /// Add `v` to the meter.
    pub fn inc(&self, v: i64) {
        self.inc_at(v, Timestamp::now());
    }

    fn inc_at(&self, v: i64, now: Timestamp) {
        let mut rate = self.rate.write();
        let next = rate.value().wrapping_add(v);
        rate.set(next, now);
    }

    /// Subtract `v` from the meter.
    pub fn dec(&self, v: i64) {
        self.inc(v.wrapping_neg());
    }

    /// Set the meter to `v`.
    pub fn set(&self, v: i64) {
        self.set_at(v, Timestamp::now());
    }

    fn set_at(&self, v: i64, now: Timestamp) {
        self.rate.write().set(v, now);
    }

    /// Set the meter to zero and clear all rate history.
    pub fn reset(&self) {
        self.rate.write().reset();
    }

    /// Replace the EWMA time constants (clears rate history).
    pub fn set_time_constants(&self, time_constants: &[Duration]) {
        self.rate.write().set_time_constants(time_constants);
    }

    /// Change the maximum derivative order (clears rate history).
    pub fn set_max_derivative_order(&self, orders: usize) {
        self.rate.write().set_max_derivative_order(orders);
    }

    /// Take a consistent copy of the meter state.
    pub fn snapshot(&self) -> MeterSnapshot {
        let rate = self.rate.read();
        MeterSnapshot {
            value: rate.value(),
            last_updated: rate.last_updated(),
            time_constants: rate.time_constants(),
            derivatives: rate.derivatives(),
        }
    }
}
