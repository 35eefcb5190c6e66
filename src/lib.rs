//! # Vitals
//!
//! An in-process metrics library: counters, meters, gauges, and windowed
//! distributions, collected at arbitrary rates and sampled for reporting.
//!
//! # Quick Start
//!
//! ```
//! use vitals::Registry;
//!
//! struct RequestHandler;
//!
//! let registry = Registry::new("app");
//!
//! // A plain counter.
//! let requests = registry.new_counter::<RequestHandler>("requests").unwrap();
//! requests.inc(1);
//!
//! // A windowed, bounded, representative sample of a data stream.
//! let latency = registry.new_distribution::<RequestHandler>("latency_ns").unwrap();
//! latency.add(1250);
//! latency.add(980);
//!
//! let snapshot = latency.snapshot();
//! assert_eq!(snapshot.count, 2);
//! assert_eq!(snapshot.percentiles.len(), 8);
//!
//! // Reporting collaborators walk the registry.
//! for (name, kind) in registry.list() {
//!     println!("{name}: {kind}");
//! }
//! ```
//!
//! # Metric Kinds
//!
//! | Kind | Purpose | Key methods |
//! |------|---------|-------------|
//! | **Counter** | A single integer | `inc`, `dec`, `set`, `snapshot` |
//! | **Meter** | Counter + rate with 1/5/15-minute EWMA | `inc`, `dec`, `set`, `snapshot` |
//! | **Distribution** | Bounded time-windowed sample + statistics | `add`, `snapshot`, `samples` |
//! | **Gauge** | On-demand produced value | `set_function`, `update`, `snapshot` |
//!
//! # Architecture
//!
//! The statistical engines live in their own crates and are re-exported
//! here for direct use: [`OrderedIndex`] (an order-statistic red-black
//! tree), [`SampleMoments`] (an online moments accumulator exact under
//! removal), and [`RateEngine`] (a derivative ladder with per-time-constant
//! EWMA channels).
//!
//! Every metric guards its state with one reader-writer lock: mutations
//! are short exclusive sections, snapshots are shared-side value copies
//! safe to send across threads. No metric ever blocks on I/O.

// Re-export the public metrics surface.
pub use vitals_metrics::*;

// Foundational types.
pub use vitals_core::{Error, Result, Timestamp};

// Statistical engines, for direct embedding.
pub use vitals_index::{NodeId, OrderedIndex};
pub use vitals_stats::{RateEngine, SampleHandle, SampleMoments};
