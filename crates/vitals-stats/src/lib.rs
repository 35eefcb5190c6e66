//! Statistical engines for the vitals metrics library
//!
//! Two independent engines live here:
//!
//! - [`SampleMoments`]: an online accumulator of count, mean, variance,
//!   skewness and kurtosis that stays exact under both additions and
//!   removals of individual samples, plus percentile queries over the
//!   retained multiset.
//! - [`RateEngine`]: a ladder of finite-difference derivatives of a driven
//!   value, with exponentially weighted moving averages of every derivative
//!   order across a configurable set of time constants.
//!
//! `Distribution` in `vitals-metrics` composes `SampleMoments` with an
//! ordered timestamp index; `Counter` and `Meter` wrap `RateEngine`.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod moments;
pub mod rate;

pub use moments::{SampleHandle, SampleMoments};
pub use rate::RateEngine;

#[cfg(test)]
pub(crate) mod testdata;
