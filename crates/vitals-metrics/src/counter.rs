//! Counter: a single integer value driven through a rate engine
//!
//! A counter may be incremented, decremented or set. By default it tracks
//! no derivatives and no EWMA channels, making mutation as cheap as a
//! locked integer write; callers that want rates can raise the derivative
//! order or add time constants.

use parking_lot::RwLock;
use serde::{Deserialize, Serialize};
use std::time::Duration;
use vitals_core::Timestamp;
use vitals_stats::RateEngine;

/// Point-in-time copy of a [`Counter`].
///
/// `derivatives` is indexed `[order][column]` with column 0 instantaneous
/// and columns 1..=T the EWMA channel per entry of `time_constants`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CounterSnapshot {
    /// Current value
    pub value: i64,
    /// Time of the last accepted mutation; epoch if never written
    pub last_updated: Timestamp,
    /// Configured EWMA time constants
    pub time_constants: Vec<Duration>,
    /// Derivative matrix, deep-copied
    pub derivatives: Vec<Vec<f64>>,
}

/// A single integer value, which may be incremented, decremented or set.
///
/// Mutations take a short exclusive critical section; [`Counter::snapshot`]
/// takes a shared one. Mutations that do not advance the wall clock past
/// the previous mutation are discarded by the underlying rate engine.
#[derive(Debug)]
pub struct Counter {
    rate: RwLock<RateEngine>,
}

impl Default for Counter {
    fn default() -> Self {
        Self::new()
    }
}

impl Counter {
    /// Create a counter with no derivative tracking and no time constants.
    pub fn new() -> Self {
        Counter {
            rate: RwLock::new(RateEngine::new(0, &[])),
        }
    }

    /// Add `v` to the counter.
    pub fn inc(&self, v: i64) {
        self.inc_at(v, Timestamp::now());
    }

    fn inc_at(&self, v: i64, now: Timestamp) {
        let mut rate = self.rate.write();
        let next = rate.value().wrapping_add(v);
        rate.set(next, now);
    }

    /// Subtract `v` from the counter.
    pub fn dec(&self, v: i64) {
        self.inc(v.wrapping_neg());
    }

    /// Set the counter to `v`.
    pub fn set(&self, v: i64) {
        self.set_at(v, Timestamp::now());
    }

    fn set_at(&self, v: i64, now: Timestamp) {
        self.rate.write().set(v, now);
    }

    /// Set the counter to zero and clear all rate history.
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

    /// Take a consistent copy of the counter state.
    pub fn snapshot(&self) -> CounterSnapshot {
        let rate = self.rate.read();
        CounterSnapshot {
            value: rate.value(),
            last_updated: rate.last_updated(),
            time_constants: rate.time_constants(),
            derivatives: rate.derivatives(),
        }
    }
}
