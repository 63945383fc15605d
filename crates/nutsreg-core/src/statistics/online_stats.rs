//! Online (streaming) mean and variance using Welford's algorithm.
//!
//! Used for per-parameter posterior summaries and for the diagonal
//! mass-matrix estimate collected during warm-up windows.

use alloc::vec::Vec;

use crate::math;
use crate::types::Position;

/// Scalar Welford accumulator.
///
/// # Example
///
/// ```
/// use nutsreg_core::statistics::OnlineStats;
///
/// let mut stats = OnlineStats::new();
/// for x in [1.0, 2.0, 3.0, 4.0, 5.0] {
///     stats.update(x);
/// }
/// let snapshot = stats.finalize();
/// assert!((snapshot.mean - 3.0).abs() < 1e-10);
/// assert!((snapshot.variance - 2.5).abs() < 1e-10);
/// ```
#[derive(Debug, Clone, Default)]
pub struct OnlineStats {
    count: usize,
    mean: f64,
    /// Sum of squared deviations from the running mean.
    m2: f64,
}

impl OnlineStats {
    /// Create an empty accumulator.
    pub fn new() -> Self {
        Self::default()
    }

    /// Accumulate every value of a slice.
    pub fn from_slice(values: &[f64]) -> Self {
        let mut stats = Self::new();
        for &x in values {
            stats.update(x);
        }
        stats
    }

    /// Add one observation.
    pub fn update(&mut self, x: f64) {
        self.count += 1;
        let delta = x - self.mean;
        self.mean += delta / self.count as f64;
        self.m2 += delta * (x - self.mean);
    }

    /// Combine with another accumulator (Chan et al. parallel update).
    pub fn merge(&mut self, other: &OnlineStats) {
        if other.count == 0 {
            return;
        }
        if self.count == 0 {
            *self = other.clone();
            return;
        }
        let n_a = self.count as f64;
        let n_b = other.count as f64;
        let n = n_a + n_b;
        let delta = other.mean - self.mean;
        self.mean += delta * n_b / n;
        self.m2 += other.m2 + delta * delta * n_a * n_b / n;
        self.count += other.count;
    }

    /// Snapshot of the current statistics.
    ///
    /// Variance uses the n-1 denominator and is 0 with fewer than two values.
    pub fn finalize(&self) -> StatsSnapshot {
        StatsSnapshot {
            mean: self.mean,
            variance: self.variance(),
            count: self.count,
        }
    }

    /// Number of observations.
    pub fn count(&self) -> usize {
        self.count
    }

    /// Current mean.
    pub fn mean(&self) -> f64 {
        self.mean
    }

    /// Current sample variance (0 if count < 2).
    pub fn variance(&self) -> f64 {
        if self.count < 2 {
            0.0
        } else {
            self.m2 / (self.count - 1) as f64
        }
    }
}

/// Mean, variance and count at a point in time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StatsSnapshot {
    /// Sample mean.
    pub mean: f64,
    /// Sample variance (n-1 denominator).
    pub variance: f64,
    /// Number of observations.
    pub count: usize,
}

impl StatsSnapshot {
    /// Standard deviation.
    pub fn std_dev(&self) -> f64 {
        math::sqrt(self.variance)
    }
}

/// Per-coordinate Welford accumulator over sampler positions.
#[derive(Debug, Clone)]
pub struct OnlineVariance {
    stats: Vec<OnlineStats>,
}

impl OnlineVariance {
    /// Accumulator for `dim`-dimensional positions.
    pub fn new(dim: usize) -> Self {
        Self {
            stats: alloc::vec![OnlineStats::new(); dim],
        }
    }

    /// Add one position.
    pub fn update(&mut self, q: &Position) {
        for (s, &x) in self.stats.iter_mut().zip(q.iter()) {
            s.update(x);
        }
    }

    /// Number of positions seen.
    pub fn count(&self) -> usize {
        self.stats.first().map_or(0, OnlineStats::count)
    }

    /// Per-coordinate sample variances.
    pub fn variances(&self) -> Vec<f64> {
        self.stats.iter().map(OnlineStats::variance).collect()
    }

    /// Forget everything seen so far.
    pub fn reset(&mut self) {
        for s in &mut self.stats {
            *s = OnlineStats::new();
        }
    }
}
