//! Constants and numeric defaults used throughout the crate.

/// Default deterministic seed for RNG operations.
///
/// Same seed + same data + same configuration = bit-identical draws.
/// The value `0x6E757473` is "nuts" encoded in ASCII.
pub const DEFAULT_SEED: u64 = 0x6E757473;

/// Natural log of 2*pi, used in normal log-pdf computation.
pub const LOG_2PI: f64 = 1.8378770664093453;

/// Default prior scale σ_prior for w0 and every component of w.
pub const DEFAULT_PRIOR_SCALE: f64 = 10.0;

/// Default observation noise σ_obs.
pub const DEFAULT_NOISE_SCALE: f64 = 0.3;

/// Default target acceptance probability for step-size adaptation.
pub const DEFAULT_TARGET_ACCEPT: f64 = 0.8;

/// Default number of warm-up iterations per chain.
pub const DEFAULT_WARMUP: usize = 1_000;

/// Default number of retained draws per chain.
pub const DEFAULT_SAMPLES: usize = 1_000;

/// Default maximum tree depth (at most 2^10 leapfrog steps per transition).
pub const DEFAULT_MAX_TREE_DEPTH: usize = 10;

/// Energy error beyond which a trajectory is declared divergent.
pub const DIVERGENCE_THRESHOLD: f64 = 1000.0;

/// Default fraction of divergent draws above which a chain is flagged unreliable.
pub const DEFAULT_MAX_DIVERGENCE_FRACTION: f64 = 0.01;
