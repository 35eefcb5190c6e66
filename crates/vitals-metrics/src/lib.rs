//! Metric kinds and registry for the vitals metrics library
//!
//! Four metric kinds, each protected by its own reader-writer lock:
//!
//! - **Counter**: a single integer, incremented/decremented/set
//! - **Meter**: a counter that also tracks its rate with 1/5/15-minute EWMA
//! - **Distribution**: a bounded, time-windowed, representative sample with
//!   online statistics and percentiles
//! - **Gauge**: an on-demand producer of an instantaneous value
//!
//! Mutators take the exclusive side of the lock, `snapshot` takes the
//! shared side and returns a plain value copy that is safe to hand across
//! threads. The [`Registry`] maps qualified `"<owner-type>.<name>"` strings
//! to metrics behind its own lock; a process-wide default registry backs
//! the free factory functions.
//!
//! ## Example
//!
//! ```
//! use vitals_metrics::Registry;
//!
//! struct Server;
//!
//! let registry = Registry::new("app");
//! let requests = registry.new_counter::<Server>("requests").unwrap();
//! let latency = registry.new_distribution::<Server>("latency_ns").unwrap();
//!
//! requests.inc(1);
//! latency.add(1250);
//!
//! assert_eq!(registry.list().len(), 2);
//! let snapshot = latency.snapshot();
//! assert_eq!(snapshot.count, 1);
//! ```

#![warn(missing_docs)]
#![warn(clippy::all)]

pub mod counter;
pub mod distribution;
pub mod gauge;
pub mod meter;
pub mod process;
pub mod registry;

pub use counter::{Counter, CounterSnapshot};
pub use distribution::{
    Distribution, DistributionSnapshot, SampleSeries, DEFAULT_MAX_SAMPLE_SIZE, DEFAULT_WINDOW,
    SNAPSHOT_PERCENTILES,
};
pub use gauge::{Gaugable, Gauge, GaugeSnapshot};
pub use meter::{Meter, MeterSnapshot, DEFAULT_METER_DERIVATIVES, DEFAULT_METER_TIME_CONSTANTS};
pub use process::{
    CounterOptions, DistributionOptions, GaugeOptions, MeterOptions, MetricOptions, ProcessOutput,
};
pub use registry::{
    default_registry, new_counter, new_distribution, new_gauge, new_meter, qualified_name, Metric,
    MetricKind, Registry,
};
