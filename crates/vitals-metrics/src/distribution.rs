//! Distribution: a bounded, time-windowed, representative sample
//!
//! Collected values land in two coupled structures: a [`SampleMoments`]
//! accumulator for the running statistics, and an [`OrderedIndex`] keyed by
//! elapsed nanoseconds since the distribution's creation, mapping to the
//! sample handles. Together they give O(log n) insertion, windowed
//! expiry, and percentile queries over exactly the retained set.
//!
//! ## Reservoir policy
//!
//! The retained set is capped at `max_sample_size`. Once full, each new
//! observation draws a uniform rank in `[0, population)`: ranks below the
//! cap replace that retained sample, ranks at or past it reject the new
//! observation. Every observation therefore survives with probability
//! `max_sample_size / population`, keeping the reservoir representative of
//! the whole stream.
//!
//! `population_size` is a floating-point estimator of the observed stream
//! size: incremented by one per observation, and multiplied by
//! `(size-1)/size` whenever a *sampled* entry is evicted (window expiry or
//! cap shrink), which keeps the estimator unbiased as samples drop.
//!
//! ## Window
//!
//! Entries older than `window` are pruned on every mutation and before
//! every snapshot. Pruning walks backward from the newest expired entry
//! (`upper_bound` of the cutoff key under its strictly-less semantics).

use parking_lot::{RwLock, RwLockWriteGuard};
use rand::Rng;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::time::Duration;
use tracing::debug;
use vitals_core::Timestamp;
use vitals_index::{NodeId, OrderedIndex};
use vitals_stats::{SampleHandle, SampleMoments};

/// Default cap on retained samples.
pub const DEFAULT_MAX_SAMPLE_SIZE: u64 = 1000;

/// Default sliding window.
pub const DEFAULT_WINDOW: Duration = Duration::from_secs(10 * 60);

/// Quantiles reported by [`Distribution::snapshot`], in order.
pub const SNAPSHOT_PERCENTILES: [f64; 8] = [0.0, 0.25, 0.5, 0.75, 0.95, 0.99, 0.999, 1.0];

/// Point-in-time copy of a [`Distribution`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionSnapshot {
    /// Number of retained samples
    pub count: u64,
    /// Mean of the retained samples
    pub mean: f64,
    /// Unbiased sample variance
    pub variance: f64,
    /// Sample standard deviation
    pub standard_deviation: f64,
    /// Sample skewness
    pub skewness: f64,
    /// Sample kurtosis
    pub kurtosis: f64,
    /// Values at [`SNAPSHOT_PERCENTILES`], aligned by position
    pub percentiles: Vec<i64>,
    /// Estimated observed stream size (see module docs)
    pub population_size: f64,
    /// Configured sliding window
    pub window: Duration,
    /// Caller-declared expected value range, if any
    pub range_hint: Option<[f64; 2]>,
    /// Timestamp of the newest retained sample; epoch if empty
    pub last_updated: Timestamp,
}

/// Extracted sample values plus the count sentinel.
///
/// `count` is the number of retained samples in the requested range, `0`
/// for an empty or out-of-range window, and `-1` for a reversed window or
/// an end bound that precedes the distribution's time base.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SampleSeries {
    /// The extracted values
    pub values: Vec<i64>,
    /// Range size, or a sentinel as described above
    pub count: i64,
}

impl SampleSeries {
    fn empty(count: i64) -> Self {
        SampleSeries {
            values: Vec::new(),
            count,
        }
    }
}

#[derive(Debug)]
struct DistributionInner {
    moments: SampleMoments,
    times: OrderedIndex<SampleHandle>,
    time_base: Timestamp,
    window: Duration,
    population_size: f64,
    max_sample_size: u64,
    range_hint: Option<[f64; 2]>,
}

impl DistributionInner {
    /// Elapsed-nanosecond key for an instant, negative before the base.
    fn key_for(&self, t: Timestamp) -> i64 {
        t.signed_nanos_since(self.time_base)
    }

    fn size(&self) -> u64 {
        // times.len() == moments.count() at rest
        self.times.len()
    }

    /// Drop one retained sample from both structures.
    fn remove_sample(&mut self, node: NodeId) {
        if let Some(&handle) = self.times.value(node) {
            self.moments.remove(handle);
        }
        self.times.remove(node);
    }

    /// Drop one retained sample and discount the population estimator.
    fn remove_from_population(&mut self, node: NodeId) {
        let size = self.moments.count() as f64;
        self.population_size *= (size - 1.0) / size;
        self.remove_sample(node);
    }

    /// Evict every entry older than the window, newest expired first.
    fn prune(&mut self, now: Timestamp) {
        if self.window == Duration::ZERO {
            return;
        }
        let cutoff = self.key_for(now) - self.window.as_nanos() as i64;
        let mut cursor = self.times.upper_bound(cutoff);
        while let Some(node) = cursor {
            let prev = self.times.prev(node);
            self.remove_from_population(node);
            cursor = prev;
        }
    }

    /// Insert one observation, applying the reservoir replacement policy.
    ///
    /// `replace_rank` is the pre-drawn uniform rank in `[0, population)`.
    fn add(&mut self, v: i64, now: Timestamp, replace_rank: u64) {
        self.population_size += 1.0;
        if self.moments.count() >= self.max_sample_size {
            if replace_rank < self.max_sample_size {
                if let Some(node) = self.times.find_by_rank(replace_rank) {
                    // Replacement: the estimator keeps its increment.
                    self.remove_sample(node);
                }
            } else {
                // Probabilistically rejected; the observation still counts
                // toward the population.
                return;
            }
        }

        let key = self.key_for(now);
        let handle = self.moments.add(v);
        self.times.insert(key, handle);
        self.prune(now);
    }
}

/// Stores collected data samples, bounded in size and in age.
///
/// Old samples are pruned whenever the distribution is written to and
/// before a snapshot is generated. Statistics are maintained incrementally
/// for fast retrieval.
#[derive(Debug)]
pub struct Distribution {
    inner: RwLock<DistributionInner>,
}

impl Default for Distribution {
    fn default() -> Self {
        Self::new()
    }
}

impl Distribution {
    /// Create a distribution with the default window and sample cap. The
    /// moment of creation becomes the key epoch for retained samples.
    pub fn new() -> Self {
        Self::with_time_base(Timestamp::now())
    }

    fn with_time_base(time_base: Timestamp) -> Self {
        Distribution {
            inner: RwLock::new(DistributionInner {
                moments: SampleMoments::new(),
                times: OrderedIndex::new(),
                time_base,
                window: DEFAULT_WINDOW,
                population_size: 0.0,
                max_sample_size: DEFAULT_MAX_SAMPLE_SIZE,
                range_hint: None,
            }),
        }
    }

    /// Insert a sample observed now.
    pub fn add(&self, v: i64) {
        let now = Timestamp::now();
        let population = self.inner.read().population_size;
        let max_rank = population as u64;
        let replace_rank = if max_rank == 0 {
            0
        } else {
            rand::thread_rng().gen_range(0..max_rank)
        };
        self.inner.write().add(v, now, replace_rank);
    }

    /// Delete all samples and statistics. Window, cap and key epoch are
    /// kept.
    pub fn reset(&self) {
        let mut inner = self.inner.write();
        inner.moments = SampleMoments::new();
        inner.times = OrderedIndex::new();
        inner.population_size = 0.0;
    }

    /// Evict samples older than the window as of now.
    pub fn prune(&self) {
        self.inner.write().prune(Timestamp::now());
    }

    /// Replace the sliding window and prune under the new one. A zero
    /// window disables expiry.
    pub fn set_window(&self, window: Duration) {
        let mut inner = self.inner.write();
        inner.window = window;
        inner.prune(Timestamp::now());
        debug!(window_secs = window.as_secs_f64(), "distribution window changed");
    }

    /// The configured sliding window.
    pub fn window(&self) -> Duration {
        self.inner.read().window
    }

    /// Lower or raise the retained-sample cap. Lowering evicts uniformly
    /// random retained samples (with the population discount) until the
    /// retained count fits.
    pub fn set_max_sample_size(&self, n: u64) {
        let mut inner = self.inner.write();
        inner.max_sample_size = n;
        let mut rng = rand::thread_rng();
        while inner.size() > n {
            let rank = rng.gen_range(0..inner.size());
            if let Some(node) = inner.times.find_by_rank(rank) {
                inner.remove_from_population(node);
            }
        }
        debug!(max_sample_size = n, "distribution sample cap changed");
    }

    /// The configured retained-sample cap.
    pub fn max_sample_size(&self) -> u64 {
        self.inner.read().max_sample_size
    }

    /// Declare the expected value range, carried through snapshots for
    /// reporting collaborators. `None` clears it.
    pub fn set_range_hint(&self, hint: Option<[f64; 2]>) {
        self.inner.write().range_hint = hint;
    }

    /// Take a consistent copy of the distribution state, pruning first.
    pub fn snapshot(&self) -> DistributionSnapshot {
        self.snapshot_at(Timestamp::now())
    }

    fn snapshot_at(&self, now: Timestamp) -> DistributionSnapshot {
        let mut guard = self.inner.write();
        guard.prune(now);
        // Pruning needed exclusive access; the copy only needs shared.
        let inner = RwLockWriteGuard::downgrade(guard);

        let last_updated = if inner.times.is_empty() {
            Timestamp::EPOCH
        } else {
            let newest = inner
                .times
                .find_by_rank(inner.times.len() - 1)
                .map(|node| inner.times.key(node))
                .unwrap_or(0);
            inner
                .time_base
                .saturating_add(Duration::from_nanos(newest.max(0) as u64))
        };

        DistributionSnapshot {
            count: inner.moments.count(),
            mean: inner.moments.mean(),
            variance: inner.moments.variance(),
            standard_deviation: inner.moments.standard_deviation(),
            skewness: inner.moments.skewness(),
            kurtosis: inner.moments.kurtosis(),
            percentiles: SNAPSHOT_PERCENTILES
                .iter()
                .map(|&p| inner.moments.percentile(p))
                .collect(),
            population_size: inner.population_size,
            window: inner.window,
            range_hint: inner.range_hint,
            last_updated,
        }
    }

    /// Extract retained sample values between `begin` (inclusive) and
    /// `end` (exclusive), both optional.
    ///
    /// With `limit == 0` or a limit covering the whole range, all values
    /// come back in ascending key order. Otherwise `limit` values are drawn
    /// without replacement, uniformly across the range, via Floyd's
    /// sampling algorithm (order unspecified). See [`SampleSeries`] for the
    /// count sentinels.
    pub fn samples(
        &self,
        limit: u64,
        begin: Option<Timestamp>,
        end: Option<Timestamp>,
    ) -> SampleSeries {
        let inner = self.inner.read();
        Self::samples_inner(&inner, limit, begin, end, &mut rand::thread_rng())
    }

    fn samples_inner(
        inner: &DistributionInner,
        limit: u64,
        begin: Option<Timestamp>,
        end: Option<Timestamp>,
        rng: &mut impl Rng,
    ) -> SampleSeries {
        if inner.times.is_empty() {
            return SampleSeries::empty(0);
        }
        if let Some(end) = end {
            if end < inner.time_base {
                return SampleSeries::empty(-1);
            }
        }

        let begin_rank = match begin {
            Some(begin) => match inner.times.lower_bound(inner.key_for(begin)) {
                Some(node) => inner.times.rank(node),
                // begin past the newest retained sample
                None => return SampleSeries::empty(0),
            },
            None => 0,
        };

        let end_rank = match end {
            Some(end) => match inner.times.upper_bound(inner.key_for(end)) {
                Some(node) => inner.times.rank(node),
                // end at or before the oldest retained sample
                None => return SampleSeries::empty(0),
            },
            None => inner.times.len() - 1,
        };

        if end_rank < begin_rank {
            return SampleSeries::empty(-1);
        }

        let ct = end_rank - begin_rank + 1;
        let mut values;
        if limit == 0 || limit >= ct {
            // Everything, in ascending key order.
            values = Vec::with_capacity(ct as usize);
            let mut cursor = inner.times.find_by_rank(begin_rank);
            while let Some(node) = cursor {
                if let Some(&handle) = inner.times.value(node) {
                    values.push(inner.moments.value(handle));
                }
                if values.len() as u64 == ct {
                    break;
                }
                cursor = inner.times.next(node);
            }
        } else {
            values = Vec::with_capacity(limit as usize);
            for rank in rand_combination(ct, limit, rng) {
                if let Some(node) = inner.times.find_by_rank(rank + begin_rank) {
                    if let Some(&handle) = inner.times.value(node) {
                        values.push(inner.moments.value(handle));
                    }
                }
            }
        }
        SampleSeries {
            values,
            count: ct as i64,
        }
    }
}

/// Robert Floyd's sampling algorithm: `num` distinct values uniformly
/// drawn from `[0, max)`, in one pass with no rejection.
fn rand_combination(max: u64, num: u64, rng: &mut impl Rng) -> HashSet<u64> {
    let mut chosen = HashSet::with_capacity(num as usize);
    for i in (max - num)..max {
        let r = rng.gen_range(0..=i);
        if !chosen.insert(r) {
            chosen.insert(i);
        }
    }
    chosen
}

// ============================================================================
// Tests
// ============================================================================
