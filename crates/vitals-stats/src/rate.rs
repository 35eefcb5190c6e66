//! RateEngine: derivative ladder with per-time-constant EWMA channels
//!
//! Driven by `set(value, timestamp)`. Row 0 of the matrix tracks the raw
//! value; each higher row holds the finite-difference quotient of the row
//! above, so row `i` is the i-th derivative of the driven value. Column 0
//! is instantaneous; column `k+1` is the exponentially weighted moving
//! average of its row under time constant `τ_k`, decayed by
//! `exp(-Δt/τ_k)` per update.
//!
//! Time only moves forward: a `set` at or before the last observed
//! timestamp is discarded without effect.

use std::time::Duration;
use vitals_core::Timestamp;

/// Derivative ladder and EWMA matrix over a driven integer value.
///
/// ## Example
///
/// ```
/// use std::time::Duration;
/// use vitals_core::Timestamp;
/// use vitals_stats::RateEngine;
///
/// let mut rate = RateEngine::new(1, &[Duration::from_secs(60)]);
/// rate.set(10, Timestamp::from_nanos(1_000_000_000));
/// rate.set(30, Timestamp::from_nanos(3_000_000_000));
///
/// assert_eq!(rate.value(), 30);
/// // first derivative: (30 - 10) / 2s
/// assert_eq!(rate.derivative(1, 0), 10.0);
/// ```
#[derive(Debug)]
pub struct RateEngine {
    value: i64,
    last_updated: Timestamp,
    time_constants: Vec<Duration>,
    /// Outer dimension is derivative order 0..=O, inner is column
    /// (0 = instantaneous, 1..=T = EWMA per time constant).
    derivatives: Vec<Vec<f64>>,
}

impl RateEngine {
    /// Create an engine tracking derivatives up to `max_derivative_order`
    /// with one EWMA channel per entry of `time_constants`.
    pub fn new(max_derivative_order: usize, time_constants: &[Duration]) -> Self {
        let mut engine = RateEngine {
            value: 0,
            last_updated: Timestamp::EPOCH,
            time_constants: time_constants.to_vec(),
            derivatives: Vec::new(),
        };
        engine.allocate(max_derivative_order);
        engine
    }

    /// Rebuild the matrix for `orders + 1` rows and the current time
    /// constants, zeroing all history.
    fn allocate(&mut self, orders: usize) {
        let columns = self.time_constants.len() + 1;
        self.derivatives = vec![vec![0.0; columns]; orders + 1];
    }

    /// Replace the EWMA time constants. Resets matrix history; the driven
    /// value and timestamp survive.
    pub fn set_time_constants(&mut self, time_constants: &[Duration]) {
        let orders = self.max_derivative_order();
        self.time_constants = time_constants.to_vec();
        self.allocate(orders);
    }

    /// Change the maximum derivative order. Resets matrix history; the
    /// driven value and timestamp survive.
    pub fn set_max_derivative_order(&mut self, orders: usize) {
        self.allocate(orders);
    }

    /// Clear the driven value, timestamp and all matrix history.
    pub fn reset(&mut self) {
        self.value = 0;
        self.last_updated = Timestamp::EPOCH;
        for row in &mut self.derivatives {
            for cell in row.iter_mut() {
                *cell = 0.0;
            }
        }
    }

    /// Drive the engine to `v` at time `t`.
    ///
    /// Discarded without effect unless `t` is strictly after the last
    /// update. The first accepted update establishes the time base; no
    /// derivative can be formed from a single observation, so rows 1..=O
    /// stay zero until the second update.
    pub fn set(&mut self, v: i64, t: Timestamp) {
        if t <= self.last_updated {
            return;
        }

        let mut old = self.derivatives[0][0];
        self.derivatives[0][0] = v as f64;

        if self.last_updated != Timestamp::EPOCH {
            let dt_nanos = t.signed_nanos_since(self.last_updated) as f64;
            let dt_secs = dt_nanos / 1e9;

            // Rolling two-scalar carry: each row needs the previous value of
            // the row above, captured before that row was overwritten.
            for order in 1..self.derivatives.len() {
                let prev = self.derivatives[order][0];
                self.derivatives[order][0] = (self.derivatives[order - 1][0] - old) / dt_secs;
                old = prev;
            }

            for (col, tc) in self.time_constants.iter().enumerate() {
                let decay = (-(dt_nanos / tc.as_nanos() as f64)).exp();
                for order in 0..self.derivatives.len() {
                    let instantaneous = self.derivatives[order][0];
                    let cell = &mut self.derivatives[order][col + 1];
                    *cell = *cell * decay + (1.0 - decay) * instantaneous;
                }
            }
        }

        self.value = v;
        self.last_updated = t;
    }

    // =========================================================================
    // Accessors
    // =========================================================================

    /// The driven value.
    #[inline]
    pub fn value(&self) -> i64 {
        self.value
    }

    /// Timestamp of the last accepted update; epoch if never driven.
    #[inline]
    pub fn last_updated(&self) -> Timestamp {
        self.last_updated
    }

    /// Highest tracked derivative order.
    #[inline]
    pub fn max_derivative_order(&self) -> usize {
        self.derivatives.len() - 1
    }

    /// Number of EWMA time constants.
    #[inline]
    pub fn num_time_constants(&self) -> usize {
        self.time_constants.len()
    }

    /// Copy of the configured time constants.
    pub fn time_constants(&self) -> Vec<Duration> {
        self.time_constants.clone()
    }

    /// One matrix entry. Column 0 is the instantaneous channel; columns
    /// 1..=T are the EWMA channels in time-constant order.
    #[inline]
    pub fn derivative(&self, order: usize, column: usize) -> f64 {
        self.derivatives[order][column]
    }

    /// Deep copy of the derivatives matrix.
    pub fn derivatives(&self) -> Vec<Vec<f64>> {
        self.derivatives.clone()
    }
}

// ============================================================================
// Tests
// ============================================================================
