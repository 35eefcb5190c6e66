//! Typed options bags for driving a metric of known kind
//!
//! A reporting collaborator that walked [`crate::Registry::list`] knows
//! each metric's kind, so it can build the matching options bag and call
//! [`Metric::process`] to extract exactly what it needs in one pass.
//! Passing the wrong bag kind is an [`Error::InvalidConfiguration`]
//! failure, not a panic.

use vitals_core::{Error, Result, Timestamp};

use crate::counter::CounterSnapshot;
use crate::distribution::{DistributionSnapshot, SampleSeries};
use crate::gauge::GaugeSnapshot;
use crate::meter::MeterSnapshot;
use crate::registry::{Metric, MetricKind};

/// What to extract from a counter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CounterOptions {
    /// Include derivative rows beyond the value row
    pub derivatives: bool,
    /// Include the EWMA columns
    pub exp_averages: bool,
}

impl Default for CounterOptions {
    fn default() -> Self {
        CounterOptions {
            derivatives: true,
            exp_averages: true,
        }
    }
}

/// What to extract from a meter.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct MeterOptions {
    /// Include derivative rows beyond the value row
    pub derivatives: bool,
    /// Include the EWMA columns
    pub exp_averages: bool,
}

impl Default for MeterOptions {
    fn default() -> Self {
        MeterOptions {
            derivatives: true,
            exp_averages: true,
        }
    }
}

/// What to extract from a distribution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct DistributionOptions {
    /// Include the statistics snapshot
    pub stats: bool,
    /// Include raw sample values
    pub data: bool,
    /// Sample limit for the data extraction (0 = everything)
    pub limit: u64,
    /// Inclusive begin bound for the data extraction
    pub begin: Option<Timestamp>,
    /// Exclusive end bound for the data extraction
    pub end: Option<Timestamp>,
}

/// What to extract from a gauge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct GaugeOptions {}

/// Options bag tagged by metric kind.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MetricOptions {
    /// Options for a counter
    Counter(CounterOptions),
    /// Options for a distribution
    Distribution(DistributionOptions),
    /// Options for a gauge
    Gauge(GaugeOptions),
    /// Options for a meter
    Meter(MeterOptions),
}

impl MetricOptions {
    /// The metric kind this bag is meant for.
    pub fn kind(&self) -> MetricKind {
        match self {
            MetricOptions::Counter(_) => MetricKind::Counter,
            MetricOptions::Distribution(_) => MetricKind::Distribution,
            MetricOptions::Gauge(_) => MetricKind::Gauge,
            MetricOptions::Meter(_) => MetricKind::Meter,
        }
    }
}

/// Result of processing one metric.
#[derive(Debug, Clone)]
pub enum ProcessOutput {
    /// Counter snapshot, possibly trimmed per the options
    Counter(CounterSnapshot),
    /// Distribution stats and/or data per the options
    Distribution {
        /// Statistics snapshot, when requested
        stats: Option<DistributionSnapshot>,
        /// Sample extraction, when requested
        data: Option<SampleSeries>,
    },
    /// Gauge snapshot
    Gauge(GaugeSnapshot),
    /// Meter snapshot, possibly trimmed per the options
    Meter(MeterSnapshot),
}

fn trim_matrix(derivatives: &mut Vec<Vec<f64>>, keep_derivatives: bool, keep_averages: bool) {
    if !keep_derivatives {
        derivatives.truncate(1);
    }
    if !keep_averages {
        for row in derivatives.iter_mut() {
            row.truncate(1);
        }
    }
}

impl Metric {
    /// Snapshot this metric through a typed options bag.
    ///
    /// Returns [`Error::InvalidConfiguration`] when the bag kind does not
    /// match the metric kind.
    pub fn process(&self, options: &MetricOptions) -> Result<ProcessOutput> {
        match (self, options) {
            (Metric::Counter(counter), MetricOptions::Counter(options)) => {
                let mut snapshot = counter.snapshot();
                trim_matrix(
                    &mut snapshot.derivatives,
                    options.derivatives,
                    options.exp_averages,
                );
                if !options.exp_averages {
                    snapshot.time_constants.clear();
                }
                Ok(ProcessOutput::Counter(snapshot))
            }
            (Metric::Meter(meter), MetricOptions::Meter(options)) => {
                let mut snapshot = meter.snapshot();
                trim_matrix(
                    &mut snapshot.derivatives,
                    options.derivatives,
                    options.exp_averages,
                );
                if !options.exp_averages {
                    snapshot.time_constants.clear();
                }
                Ok(ProcessOutput::Meter(snapshot))
            }
            (Metric::Distribution(distribution), MetricOptions::Distribution(options)) => {
                let stats = options.stats.then(|| distribution.snapshot());
                let data = options
                    .data
                    .then(|| distribution.samples(options.limit, options.begin, options.end));
                Ok(ProcessOutput::Distribution { stats, data })
            }
            (Metric::Gauge(gauge), MetricOptions::Gauge(_)) => {
                Ok(ProcessOutput::Gauge(gauge.snapshot()))
            }
            (metric, options) => Err(Error::invalid_configuration(format!(
                "{} options passed to a {} metric",
                options.kind(),
                metric.kind()
            ))),
        }
    }
}

// ============================================================================
// Tests
// ============================================================================
