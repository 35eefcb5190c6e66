//! Core types for the vitals metrics library
//!
//! This crate defines the foundational types shared by every layer:
//! - Timestamp: nanosecond-precision wall-clock instant
//! - Error / Result: error type hierarchy
//!
//! The statistical engines live in `vitals-index` / `vitals-stats`, and the
//! metric kinds and registry live in `vitals-metrics`. Nothing in this crate
//! allocates beyond error messages.

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod error;
pub mod timestamp;

pub use error::{Error, Result};
pub use timestamp::Timestamp;
