//! Statistical building blocks shared by the sampler and diagnostics.
//!
//! - Welford accumulators for mean/variance (scalar and per-coordinate)
//! - Autocorrelation-based effective sample size and split-R̂
//! - Type 2 quantiles for credible intervals
//! - Counter-based seed derivation for independent RNG streams

mod convergence;
mod online_stats;
mod quantile;

pub use convergence::{autocorrelation, effective_sample_size, split_rhat};
pub use online_stats::{OnlineStats, OnlineVariance, StatsSnapshot};
pub use quantile::{compute_quantile, compute_quantile_sorted};

/// Derive a well-mixed seed for stream `counter` from a base seed.
///
/// Uses the SplitMix64 finalizer so adjacent counters give unrelated seeds.
/// Chains and per-draw predictive streams all derive
/// their RNG from `(seed, counter)` so results do not depend on scheduling.
pub fn counter_rng_seed(seed: u64, counter: u64) -> u64 {
    let mut z = seed.wrapping_add(counter.wrapping_add(1).wrapping_mul(0x9E37_79B9_7F4A_7C15));
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
