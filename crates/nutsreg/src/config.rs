//! Configuration for a multi-chain inference run.

use nutsreg_core::constants::{
    DEFAULT_MAX_DIVERGENCE_FRACTION, DEFAULT_MAX_TREE_DEPTH, DEFAULT_NOISE_SCALE,
    DEFAULT_PRIOR_SCALE, DEFAULT_SAMPLES, DEFAULT_SEED, DEFAULT_TARGET_ACCEPT, DEFAULT_WARMUP,
};
use nutsreg_core::{Error, NutsSettings, QualityThresholds, Result};
use serde::{Deserialize, Serialize};

/// Configuration options for [`Inference`](crate::Inference).
///
/// Fields are public; builder methods panic on obviously invalid values,
/// and [`validate`](Config::validate) checks values set directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    // =========================================================================
    // Sampler
    // =========================================================================

    /// Warm-up (adaptation) iterations per chain, discarded. Default: 1,000.
    pub warmup: usize,

    /// Retained draws per chain. Default: 1,000.
    pub samples: usize,

    /// Number of independent chains. Default: 4.
    ///
    /// Two or more chains enable a between-chain R̂ check.
    pub chains: usize,

    /// Base seed; chain `c` derives its stream from `(seed, c)`.
    pub seed: u64,

    /// Target acceptance probability for step-size adaptation. Default: 0.8.
    ///
    /// Higher values give smaller steps and fewer divergences.
    pub target_accept: f64,

    /// Maximum trajectory doublings per transition. Default: 10.
    pub max_tree_depth: usize,

    /// Half-width of the uniform box initial positions are drawn from. Default: 0.5.
    pub init_jitter: f64,

    // =========================================================================
    // Model hyperparameters
    // =========================================================================

    /// Prior standard deviation σ_prior of `w0` and every weight. Default: 10.
    pub prior_scale: f64,

    /// Known observation noise σ_obs. Default: 0.3.
    pub noise_scale: f64,

    // =========================================================================
    // Quality thresholds
    // =========================================================================

    /// Divergent fraction per chain above which the run is flagged. Default: 0.01.
    pub max_divergence_fraction: f64,

    /// How far acceptance may fall below target before it is flagged. Default: 0.15.
    pub accept_tolerance: f64,

    /// Split-R̂ above which the run is flagged. Default: 1.05.
    pub max_rhat: f64,

    /// Total ESS per parameter below which the run is flagged. Default: 100.
    pub min_ess: f64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            // Sampler
            warmup: DEFAULT_WARMUP,
            samples: DEFAULT_SAMPLES,
            chains: 4,
            seed: DEFAULT_SEED,
            target_accept: DEFAULT_TARGET_ACCEPT,
            max_tree_depth: DEFAULT_MAX_TREE_DEPTH,
            init_jitter: 0.5,

            // Model hyperparameters
            prior_scale: DEFAULT_PRIOR_SCALE,
            noise_scale: DEFAULT_NOISE_SCALE,

            // Quality thresholds
            max_divergence_fraction: DEFAULT_MAX_DIVERGENCE_FRACTION,
            accept_tolerance: 0.15,
            max_rhat: 1.05,
            min_ess: 100.0,
        }
    }
}

impl Config {
    /// Create a new configuration with default settings.
    pub fn new() -> Self {
        Self::default()
    }

    /// Balanced settings: the defaults (4 chains × 1,000 warm-up + 1,000 draws).
    pub fn balanced() -> Self {
        Self::default()
    }

    /// Quick settings for development and tests.
    ///
    /// - 2 chains
    /// - 300 warm-up iterations
    /// - 500 draws per chain
    pub fn quick() -> Self {
        Self {
            chains: 2,
            warmup: 300,
            samples: 500,
            min_ess: 50.0,
            ..Default::default()
        }
    }

    /// Thorough settings for publication-quality summaries.
    ///
    /// - 4 chains
    /// - 2,000 warm-up iterations
    /// - 2,000 draws per chain
    /// - target acceptance 0.9
    pub fn thorough() -> Self {
        Self {
            warmup: 2_000,
            samples: 2_000,
            target_accept: 0.9,
            min_ess: 400.0,
            max_rhat: 1.01,
            ..Default::default()
        }
    }

    // =========================================================================
    // Builder methods
    // =========================================================================

    /// Set warm-up iterations per chain.
    pub fn warmup(mut self, iterations: usize) -> Self {
        self.warmup = iterations;
        self
    }

    /// Set retained draws per chain.
    pub fn samples(mut self, samples: usize) -> Self {
        assert!(samples > 0, "samples must be positive");
        self.samples = samples;
        self
    }

    /// Set the number of chains.
    pub fn chains(mut self, chains: usize) -> Self {
        assert!(chains > 0, "chains must be positive");
        self.chains = chains;
        self
    }

    /// Set the base seed.
    pub fn seed(mut self, seed: u64) -> Self {
        self.seed = seed;
        self
    }

    /// Set the target acceptance probability.
    pub fn target_accept(mut self, target: f64) -> Self {
        assert!(target > 0.0 && target < 1.0, "target_accept must be in (0, 1)");
        self.target_accept = target;
        self
    }

    /// Set the maximum tree depth.
    pub fn max_tree_depth(mut self, depth: usize) -> Self {
        assert!(depth > 0, "max_tree_depth must be positive");
        self.max_tree_depth = depth;
        self
    }

    /// Set the initial-position jitter.
    pub fn init_jitter(mut self, jitter: f64) -> Self {
        assert!(jitter >= 0.0 && jitter.is_finite(), "init_jitter must be non-negative");
        self.init_jitter = jitter;
        self
    }

    /// Set the prior scale σ_prior.
    pub fn prior_scale(mut self, scale: f64) -> Self {
        assert!(scale > 0.0 && scale.is_finite(), "prior_scale must be positive");
        self.prior_scale = scale;
        self
    }

    /// Set the observation noise σ_obs.
    pub fn noise_scale(mut self, scale: f64) -> Self {
        assert!(scale > 0.0 && scale.is_finite(), "noise_scale must be positive");
        self.noise_scale = scale;
        self
    }

    /// Set the divergent-fraction limit.
    pub fn max_divergence_fraction(mut self, fraction: f64) -> Self {
        assert!(
            (0.0..=1.0).contains(&fraction),
            "max_divergence_fraction must be in [0, 1]"
        );
        self.max_divergence_fraction = fraction;
        self
    }

    /// Set the R̂ limit.
    pub fn max_rhat(mut self, rhat: f64) -> Self {
        assert!(rhat >= 1.0, "max_rhat must be >= 1");
        self.max_rhat = rhat;
        self
    }

    /// Set the minimum total ESS per parameter.
    pub fn min_ess(mut self, ess: f64) -> Self {
        assert!(ess >= 0.0, "min_ess must be non-negative");
        self.min_ess = ess;
        self
    }

    // =========================================================================
    // Resolution methods
    // =========================================================================

    /// Per-chain sampler settings.
    pub fn nuts_settings(&self) -> NutsSettings {
        NutsSettings {
            warmup: self.warmup,
            samples: self.samples,
            target_accept: self.target_accept,
            max_tree_depth: self.max_tree_depth,
            ..NutsSettings::default()
        }
    }

    /// Thresholds used to flag the finished run.
    pub fn quality_thresholds(&self) -> QualityThresholds {
        QualityThresholds {
            target_accept: self.target_accept,
            accept_tolerance: self.accept_tolerance,
            max_divergence_fraction: self.max_divergence_fraction,
            max_rhat: self.max_rhat,
            min_ess: self.min_ess,
            max_tree_depth: self.max_tree_depth,
            ..QualityThresholds::default()
        }
    }

    /// Check if the configuration is valid.
    pub fn validate(&self) -> Result<()> {
        let invalid = |param: &'static str, reason: &str| {
            Err(Error::InvalidConfig {
                param,
                reason: reason.to_string(),
            })
        };

        if self.chains == 0 {
            return invalid("chains", "must be positive");
        }
        if !(self.prior_scale > 0.0 && self.prior_scale.is_finite()) {
            return Err(Error::NonPositiveScale {
                param: "prior_scale",
                value: self.prior_scale,
            });
        }
        if !(self.noise_scale > 0.0 && self.noise_scale.is_finite()) {
            return Err(Error::NonPositiveScale {
                param: "noise_scale",
                value: self.noise_scale,
            });
        }
        if !(self.init_jitter >= 0.0 && self.init_jitter.is_finite()) {
            return invalid("init_jitter", "must be non-negative and finite");
        }
        if !(0.0..=1.0).contains(&self.max_divergence_fraction) {
            return invalid("max_divergence_fraction", "must be in [0, 1]");
        }
        if !(self.accept_tolerance >= 0.0) {
            return invalid("accept_tolerance", "must be non-negative");
        }
        if !(self.max_rhat >= 1.0) {
            return invalid("max_rhat", "must be >= 1");
        }
        if !(self.min_ess >= 0.0) {
            return invalid("min_ess", "must be non-negative");
        }
        self.nuts_settings().validate()
    }
}
