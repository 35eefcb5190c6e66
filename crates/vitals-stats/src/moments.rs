//! SampleMoments: incremental central-moment accumulator
//!
//! Maintains count, mean and the second through fourth central-moment sums
//! of a multiset of integer samples, updated in O(log n) under both `add`
//! and `remove`. The moments are stored as "central moment times N" sums
//! (`Σ(xᵢ-μ)ᵏ`), which is the form with clean one-step update rules.
//!
//! ## Update rules
//!
//! `add` applies the Welford-style online formulas extended to the third
//! and fourth moments (see the classic "algorithms for calculating
//! variance" treatment). `remove` applies the analytic inverse; the inverse
//! must update `m2n` first (with the pre-removal mean), then `m3n`, then
//! `m4n`, then the mean, because each later aggregate consumes the
//! already-inverted earlier ones.
//!
//! ## Degenerate sizes
//!
//! Whenever the retained count is at most one, the three central-moment
//! sums are identically zero; removal re-establishes that exactly rather
//! than letting floating-point residue linger.

use vitals_index::{NodeId, OrderedIndex};

/// Handle to one retained sample inside a [`SampleMoments`].
///
/// Returned by [`SampleMoments::add`], consumed by [`SampleMoments::remove`].
/// Valid exactly as long as the sample remains in the accumulator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct SampleHandle(NodeId);

/// Online accumulator of count, mean, variance, skewness and kurtosis.
///
/// Samples are additionally kept in an ordered index keyed by value, which
/// answers percentile queries by rank and gives ties a deterministic
/// insertion order.
#[derive(Debug)]
pub struct SampleMoments {
    values: OrderedIndex<()>,

    mean: f64,
    second_cm_times_n: f64,
    third_cm_times_n: f64,
    fourth_cm_times_n: f64,
}

impl Default for SampleMoments {
    fn default() -> Self {
        Self::new()
    }
}

impl SampleMoments {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        SampleMoments {
            values: OrderedIndex::new(),
            mean: 0.0,
            second_cm_times_n: 0.0,
            third_cm_times_n: 0.0,
            fourth_cm_times_n: 0.0,
        }
    }

    /// Number of retained samples.
    #[inline]
    pub fn count(&self) -> u64 {
        self.values.len()
    }

    /// The integer value a handle refers to.
    #[inline]
    pub fn value(&self, handle: SampleHandle) -> i64 {
        self.values.key(handle.0)
    }

    /// Add a sample and fold it into the moments.
    pub fn add(&mut self, v: i64) -> SampleHandle {
        let node = self.values.insert(v, ());

        let x = v as f64;
        let n = self.count() as f64;

        let delta = x - self.mean;
        let delta_over_n = delta / n;
        let a = delta * delta_over_n * delta_over_n * (n - 1.0);
        let b = delta_over_n * self.second_cm_times_n;

        self.mean += delta_over_n;

        self.fourth_cm_times_n += delta_over_n * a * (n * n - 3.0 * n + 3.0);
        self.fourth_cm_times_n += 6.0 * delta_over_n * b;
        self.fourth_cm_times_n -= 4.0 * delta_over_n * self.third_cm_times_n;

        self.third_cm_times_n += a * (n - 2.0);
        self.third_cm_times_n -= 3.0 * b;

        self.second_cm_times_n += delta * delta_over_n * (n - 1.0);

        SampleHandle(node)
    }

    /// Remove a previously added sample, unfolding its contribution.
    ///
    /// The handle is invalidated.
    pub fn remove(&mut self, handle: SampleHandle) {
        if self.count() <= 1 {
            self.mean = 0.0;
            self.second_cm_times_n = 0.0;
            self.third_cm_times_n = 0.0;
            self.fourth_cm_times_n = 0.0;
            self.values.remove(handle.0);
            return;
        }

        let n = self.count() as f64; // n is at least 2
        let x = self.values.key(handle.0) as f64;

        let delta = n / (n - 1.0) * (x - self.mean);
        let delta_over_n = delta / n;
        let a = delta * delta_over_n * delta_over_n * (n - 1.0);

        self.second_cm_times_n -= delta * delta_over_n * (n - 1.0);

        let b = delta_over_n * self.second_cm_times_n;

        self.third_cm_times_n -= a * (n - 2.0);
        self.third_cm_times_n += 3.0 * b;

        self.fourth_cm_times_n -= delta_over_n * a * (n * n - 3.0 * n + 3.0);
        self.fourth_cm_times_n -= 6.0 * delta_over_n * b;
        self.fourth_cm_times_n += 4.0 * delta_over_n * self.third_cm_times_n;

        self.mean -= delta_over_n;

        self.values.remove(handle.0);

        if self.count() <= 1 {
            self.second_cm_times_n = 0.0;
            self.third_cm_times_n = 0.0;
            self.fourth_cm_times_n = 0.0;
        }
    }

    // =========================================================================
    // Derived statistics
    // =========================================================================

    /// Mean of the retained samples, 0 for an empty accumulator.
    pub fn mean(&self) -> f64 {
        to_finite(self.mean)
    }

    /// Unbiased sample variance, 0 when fewer than two samples.
    pub fn variance(&self) -> f64 {
        to_finite(self.second_cm_times_n / (self.count() as f64 - 1.0))
    }

    /// Sample standard deviation.
    pub fn standard_deviation(&self) -> f64 {
        to_finite(self.variance().sqrt())
    }

    /// Sample skewness, 0 when undefined.
    pub fn skewness(&self) -> f64 {
        let r = (self.count() as f64).sqrt() * self.third_cm_times_n;
        to_finite(r / self.second_cm_times_n.powf(1.5))
    }

    /// Sample kurtosis, 0 when undefined.
    pub fn kurtosis(&self) -> f64 {
        let r = self.count() as f64 * self.fourth_cm_times_n;
        to_finite(r / self.second_cm_times_n / self.second_cm_times_n)
    }

    /// Value at percentile `p` (clamped to `[0, 1]`); 0 for an empty
    /// accumulator. Ties resolve by insertion order through the value index.
    pub fn percentile(&self, p: f64) -> i64 {
        if self.count() == 0 {
            return 0;
        }
        let p = p.clamp(0.0, 1.0);
        let rank = (p * (self.count() as f64 - 1.0) + 0.5).floor() as u64;
        match self.values.find_by_rank(rank) {
            Some(node) => self.values.key(node),
            None => 0,
        }
    }
}

/// Normalize NaN and infinities (degenerate small-sample statistics) to 0.
fn to_finite(v: f64) -> f64 {
    if v.is_nan() || v.is_infinite() || v == 0.0 {
        0.0
    } else {
        v
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testdata::{assert_rel_eq, TEST_SAMPLE_SET};

    const TOLERANCE: f64 = 1e-13;

    const SAMPLE_TO_ADD: i64 = 1654918;
    const SAMPLE_TO_REMOVE: i64 = -4176556;

    fn test_init() -> SampleMoments {
        let mut s = SampleMoments::new();
        for &v in TEST_SAMPLE_SET.iter() {
            s.add(v);
        }
        s
    }

    fn handle_of(s: &SampleMoments, v: i64) -> SampleHandle {
        SampleHandle(s.values.find(v).expect("value should be retained"))
    }

    /// Evaluate a statistic on the base set, after one add, and after one
    /// remove, against the three baselines.
    fn check_with_changes(
        name: &str,
        stat: impl Fn(&SampleMoments) -> f64,
        original: f64,
        added: f64,
        removed: f64,
    ) {
        let mut s = test_init();
        assert_rel_eq(name, stat(&s), original, TOLERANCE);
        s.add(SAMPLE_TO_ADD);
        assert_rel_eq(name, stat(&s), added, TOLERANCE);
        let h = handle_of(&s, SAMPLE_TO_REMOVE);
        s.remove(h);
        assert_rel_eq(name, stat(&s), removed, TOLERANCE);
    }

    #[test]
    fn test_count() {
        let mut s = test_init();
        assert_eq!(s.count(), 50);
        s.add(SAMPLE_TO_ADD);
        assert_eq!(s.count(), 51);
        let h = handle_of(&s, SAMPLE_TO_REMOVE);
        s.remove(h);
        assert_eq!(s.count(), 50);
    }

    #[test]
    fn test_handle_value() {
        let mut s = SampleMoments::new();
        let h = s.add(42);
        assert_eq!(s.value(h), 42);
    }

    #[test]
    fn test_mean() {
        check_with_changes(
            "sample mean",
            |s| s.mean(),
            311618.12,
            337957.3333333333,
            428247.6,
        );
    }

    #[test]
    fn test_variance() {
        check_with_changes(
            "sample variance",
            |s| s.variance(),
            3.452546851438476e13,
            3.387034060620703e13,
            3.413731802164837e13,
        );
    }

    #[test]
    fn test_standard_deviation() {
        check_with_changes(
            "sample standard deviation",
            |s| s.standard_deviation(),
            5.875837686184393e6,
            5.819823073445363e6,
            5.842714952969070e6,
        );
    }

    #[test]
    fn test_skewness() {
        check_with_changes(
            "sample skewness",
            |s| s.skewness(),
            -0.004110084618925392,
            -0.01760862112253390,
            -0.05508609710752556,
        );
    }

    #[test]
    fn test_kurtosis() {
        check_with_changes(
            "sample kurtosis",
            |s| s.kurtosis(),
            1.943071395965790,
            1.978048762493122,
            1.982319611215673,
        );
    }

    #[test]
    fn test_percentile() {
        let cases: [(f64, i64, i64, i64); 6] = [
            (0.0, -9988298, -9988298, -9988298),
            (1.0, 9694132, 9694132, 9694132),
            (0.5, 647511, 647511, 745446),
            (0.75, 5006064, 5006064, 5006064),
            (0.25, -4176556, -3796327, -3796327),
            (0.99, 9694132, 9694132, 9694132),
        ];
        for (p, original, added, removed) in cases {
            check_with_changes(
                &format!("percentile {}", p),
                |s| s.percentile(p) as f64,
                original as f64,
                added as f64,
                removed as f64,
            );
        }
    }

    #[test]
    fn test_percentile_clamps_and_empty() {
        let s = SampleMoments::new();
        assert_eq!(s.percentile(0.5), 0);

        let mut s = SampleMoments::new();
        s.add(3);
        s.add(9);
        assert_eq!(s.percentile(-1.0), 3);
        assert_eq!(s.percentile(2.0), 9);
    }

    #[test]
    fn test_remove_last_two_resets_aggregates() {
        let mut s = SampleMoments::new();
        let a = s.add(1);
        let b = s.add(2);

        s.remove(a);
        assert_eq!(s.mean, 2.0);
        assert_eq!(s.second_cm_times_n, 0.0);
        assert_eq!(s.third_cm_times_n, 0.0);
        assert_eq!(s.fourth_cm_times_n, 0.0);
        assert_eq!(s.count(), 1);

        s.remove(b);
        assert_eq!(s.mean, 0.0);
        assert_eq!(s.second_cm_times_n, 0.0);
        assert_eq!(s.third_cm_times_n, 0.0);
        assert_eq!(s.fourth_cm_times_n, 0.0);
        assert_eq!(s.count(), 0);
    }

    #[test]
    fn test_small_sample_statistics_are_zero() {
        let mut s = SampleMoments::new();
        assert_eq!(s.variance(), 0.0);
        assert_eq!(s.skewness(), 0.0);
        assert_eq!(s.kurtosis(), 0.0);

        s.add(17);
        // One sample: variance and higher moments are undefined, exposed as 0.
        assert_eq!(s.mean(), 17.0);
        assert_eq!(s.variance(), 0.0);
        assert_eq!(s.standard_deviation(), 0.0);
        assert_eq!(s.skewness(), 0.0);
        assert_eq!(s.kurtosis(), 0.0);
    }

    #[test]
    fn test_tied_values_keep_distinct_handles() {
        let mut s = SampleMoments::new();
        let a = s.add(5);
        let b = s.add(5);
        let c = s.add(5);
        assert_eq!(s.count(), 3);
        assert_eq!(s.mean(), 5.0);

        s.remove(b);
        assert_eq!(s.count(), 2);
        assert_eq!(s.value(a), 5);
        assert_eq!(s.value(c), 5);
        s.remove(a);
        s.remove(c);
        assert_eq!(s.count(), 0);
    }

    // =========================================================================
    // Property-based invariants
    // =========================================================================

    mod props {
        use super::*;
        use proptest::prelude::*;

        /// Exact moment sums computed directly from a slice.
        fn direct_moments(values: &[i64]) -> (f64, f64, f64, f64) {
            if values.is_empty() {
                return (0.0, 0.0, 0.0, 0.0);
            }
            let n = values.len() as f64;
            let mean = values.iter().map(|&v| v as f64).sum::<f64>() / n;
            let mut m2 = 0.0;
            let mut m3 = 0.0;
            let mut m4 = 0.0;
            for &v in values {
                let d = v as f64 - mean;
                m2 += d * d;
                m3 += d * d * d;
                m4 += d * d * d * d;
            }
            (mean, m2, m3, m4)
        }

        fn close(got: f64, want: f64, scale: f64) -> bool {
            // Bound relative to the magnitudes that passed through the
            // accumulator, not just the (possibly cancelled-to-zero) result.
            let bound = 1e-10 * scale.max(want.abs()).max(1.0);
            (got - want).abs() <= bound
        }

        proptest! {
            #[test]
            fn moments_round_trip_add_then_remove(
                base in proptest::collection::vec(-10_000i64..10_000, 2..40),
                extra in proptest::collection::vec(-10_000i64..10_000, 1..40),
            ) {
                // Build base + extra, then remove all of extra again; the
                // surviving aggregates must match a direct build of base.
                let mut s = SampleMoments::new();
                for &v in &base {
                    s.add(v);
                }
                let handles: Vec<SampleHandle> = extra.iter().map(|&v| s.add(v)).collect();
                for h in handles {
                    s.remove(h);
                }

                let (mean, m2, m3, m4) = direct_moments(&base);
                let max_abs = base
                    .iter()
                    .chain(extra.iter())
                    .map(|&v| (v as f64).abs())
                    .fold(1.0f64, f64::max);
                let total = (base.len() + extra.len()) as f64;

                prop_assert_eq!(s.count(), base.len() as u64);
                prop_assert!(close(s.mean, mean, max_abs), "mean {} vs {}", s.mean, mean);
                prop_assert!(
                    close(s.second_cm_times_n, m2, max_abs.powi(2) * total),
                    "m2n {} vs {}", s.second_cm_times_n, m2
                );
                prop_assert!(
                    close(s.third_cm_times_n, m3, max_abs.powi(3) * total),
                    "m3n {} vs {}", s.third_cm_times_n, m3
                );
                prop_assert!(
                    close(s.fourth_cm_times_n, m4, max_abs.powi(4) * total),
                    "m4n {} vs {}", s.fourth_cm_times_n, m4
                );
            }

            #[test]
            fn percentile_matches_sorted_rank(
                mut values in proptest::collection::vec(-1000i64..1000, 1..64),
                p in 0.0f64..1.0,
            ) {
                let mut s = SampleMoments::new();
                for &v in &values {
                    s.add(v);
                }
                values.sort_unstable();
                let rank = (p * (values.len() as f64 - 1.0) + 0.5).floor() as usize;
                prop_assert_eq!(s.percentile(p), values[rank]);
            }
        }
    }
}
