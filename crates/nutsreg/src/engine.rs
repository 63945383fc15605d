//! Multi-chain inference orchestration.
//!
//! Chains are shared-nothing: each owns its RNG stream (derived from the
//! base seed and its index), adaptation state and draw buffer. The only
//! shared inputs are the immutable model and a cancellation flag. Results
//! are merged by the calling thread after every chain has returned.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use nutsreg_core::statistics::counter_rng_seed;
use nutsreg_core::{
    assess, credible_band, expand, mean_function, predict, predict_seeded, run_chain,
    summarize, summarize_chains, BasisFamily, ChainResult, CredibleBand, Dataset, ModelSpec,
    ParameterSummary, PosteriorSampleSet, PredictiveSampleSet, PredictiveSummary, QualityIssue,
    Result, RunQuality,
};
use rand::Rng;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::config::Config;

/// Stream index for predictive draws, kept clear of chain indices.
const PREDICTIVE_STREAM: u64 = u64::MAX;

/// Shared flag for cooperative cancellation of a running fit.
///
/// Cancelling stops each chain before its next iteration; draws completed so
/// far are kept and the report carries a `Cancelled` issue.
#[derive(Debug, Clone, Default)]
pub struct CancelToken(Arc<AtomicBool>);

impl CancelToken {
    /// A token that has not been cancelled.
    pub fn new() -> Self {
        Self::default()
    }

    /// Request cancellation.
    pub fn cancel(&self) {
        self.0.store(true, Ordering::Relaxed);
    }

    /// Whether cancellation has been requested.
    pub fn is_cancelled(&self) -> bool {
        self.0.load(Ordering::Relaxed)
    }

    fn flag(&self) -> &AtomicBool {
        &self.0
    }
}

/// Everything a run produced, ready for serialization or display.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InferenceReport {
    /// Basis family the model was expanded with.
    pub family: BasisFamily,

    /// Number of observations.
    pub num_observations: usize,

    /// Base seed of the run.
    pub seed: u64,

    /// Per-chain results in chain order.
    pub chains: Vec<ChainResult>,

    /// Pooled per-parameter summaries (`w0`, `w1`, ...).
    pub parameters: Vec<ParameterSummary>,

    /// Convergence warnings; never fatal.
    pub issues: Vec<QualityIssue>,

    /// Overall verdict derived from `issues`.
    pub quality: RunQuality,
}

impl InferenceReport {
    /// Divergent retained draws over all chains.
    pub fn total_divergences(&self) -> usize {
        self.chains.iter().map(|c| c.divergences).sum()
    }

    /// Mean acceptance over all retained draws of all chains.
    pub fn accept_rate(&self) -> f64 {
        let draws: usize = self.chains.iter().map(|c| c.stats.len()).sum();
        if draws == 0 {
            return 0.0;
        }
        self.chains
            .iter()
            .map(|c| c.accept_rate * c.stats.len() as f64)
            .sum::<f64>()
            / draws as f64
    }

    /// True if no result-undermining issue was raised.
    pub fn is_reliable(&self) -> bool {
        self.quality == RunQuality::Reliable
    }
}

/// A fitted posterior that can be queried at new inputs.
#[derive(Debug, Clone)]
pub struct FittedModel {
    posterior: PosteriorSampleSet,
    family: BasisFamily,
    noise_scale: f64,
    seed: u64,
    report: InferenceReport,
}

impl FittedModel {
    /// Draws of all chains, concatenated in chain order.
    pub fn posterior(&self) -> &PosteriorSampleSet {
        &self.posterior
    }

    /// Run report (per-chain stats, summaries, issues).
    pub fn report(&self) -> &InferenceReport {
        &self.report
    }

    /// Consume into the report.
    pub fn into_report(self) -> InferenceReport {
        self.report
    }

    /// Basis family used for expansion.
    pub fn family(&self) -> &BasisFamily {
        &self.family
    }

    /// Predictive draws at `x_new`, reproducible from the run seed.
    pub fn predict(&self, x_new: &[f64]) -> Result<PredictiveSampleSet> {
        let design = expand(x_new, &self.family)?;
        predict_seeded(
            &self.posterior,
            &design,
            self.noise_scale,
            counter_rng_seed(self.seed, PREDICTIVE_STREAM),
        )
    }

    /// Predictive draws at `x_new` from a caller-supplied random source.
    pub fn predict_with_rng<R: Rng + ?Sized>(
        &self,
        x_new: &[f64],
        rng: &mut R,
    ) -> Result<PredictiveSampleSet> {
        let design = expand(x_new, &self.family)?;
        predict(&self.posterior, &design, self.noise_scale, rng)
    }

    /// Predictive mean and standard deviation at `x_new`.
    pub fn predictive_summary(&self, x_new: &[f64]) -> Result<PredictiveSummary> {
        Ok(summarize(&self.predict(x_new)?))
    }

    /// Central predictive credible band at `x_new`.
    pub fn predictive_band(&self, x_new: &[f64], level: f64) -> Result<CredibleBand> {
        credible_band(&self.predict(x_new)?, level)
    }

    /// Noise-free posterior mean curve at `x_new`.
    pub fn mean_function(&self, x_new: &[f64]) -> Result<Vec<f64>> {
        let design = expand(x_new, &self.family)?;
        mean_function(&self.posterior, &design)
    }
}

/// Multi-chain Bayesian regression runner.
///
/// # Example
///
/// ```ignore
/// use nutsreg::{BasisFamily, Config, Dataset, Inference};
///
/// let dataset = Dataset::new(x, t)?;
/// let fitted = Inference::new(Config::quick()).fit(&dataset, &BasisFamily::polynomial(3))?;
/// let summary = fitted.predictive_summary(&[0.0, 0.5, 1.0])?;
/// ```
#[derive(Debug, Clone, Default)]
pub struct Inference {
    config: Config,
    cancel: CancelToken,
}

impl Inference {
    /// Runner with the given configuration.
    pub fn new(config: Config) -> Self {
        Self {
            config,
            cancel: CancelToken::new(),
        }
    }

    /// Use an existing cancellation token.
    pub fn with_cancel_token(mut self, token: CancelToken) -> Self {
        self.cancel = token;
        self
    }

    /// Token that cancels fits run by this runner.
    pub fn cancel_token(&self) -> CancelToken {
        self.cancel.clone()
    }

    /// Configuration in use.
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Expand, build the model and sample the posterior.
    ///
    /// # Errors
    ///
    /// Only invalid arguments fail (bad basis parameters, scales, or settings).
    /// Numerical trouble and poor convergence are reported as issues instead.
    pub fn fit(&self, dataset: &Dataset, family: &BasisFamily) -> Result<FittedModel> {
        self.config.validate()?;
        let design = expand(dataset.inputs(), family)?;
        let model = ModelSpec::new(
            design,
            dataset.targets(),
            self.config.prior_scale,
            self.config.noise_scale,
        )?;

        tracing::info!(
            observations = dataset.len(),
            basis_functions = model.num_weights(),
            chains = self.config.chains,
            warmup = self.config.warmup,
            samples = self.config.samples,
            "Starting NUTS inference"
        );

        let chains = self.run_chains(&model)?;
        if self.cancel.is_cancelled() {
            tracing::warn!(
                completed = chains.iter().map(|c| c.samples.len()).sum::<usize>(),
                "Inference cancelled; summaries use completed draws only"
            );
        }
        for chain in &chains {
            tracing::debug!(
                chain = chain.chain,
                step_size = chain.step_size,
                accept_rate = chain.accept_rate,
                divergences = chain.divergences,
                warmup_divergences = chain.warmup_divergences,
                mean_leapfrog = chain.mean_leapfrog_steps(),
                "Chain finished"
            );
        }

        let sets: Vec<&PosteriorSampleSet> = chains.iter().map(|c| &c.samples).collect();
        let parameters = summarize_chains(&sets);
        let posterior = PosteriorSampleSet::concat(&sets)?;

        let issues = assess(&chains, &parameters, &self.config.quality_thresholds());
        for issue in &issues {
            tracing::warn!("{}: {}", issue.code, issue.message);
        }
        let quality = RunQuality::from_issues(&issues);

        let report = InferenceReport {
            family: family.clone(),
            num_observations: dataset.len(),
            seed: self.config.seed,
            chains,
            parameters,
            issues,
            quality,
        };

        tracing::info!(
            draws = posterior.len(),
            divergences = report.total_divergences(),
            accept_rate = report.accept_rate(),
            quality = %report.quality,
            "Inference complete"
        );

        Ok(FittedModel {
            posterior,
            family: family.clone(),
            noise_scale: self.config.noise_scale,
            seed: self.config.seed,
            report,
        })
    }

    fn run_chains(&self, model: &ModelSpec) -> Result<Vec<ChainResult>> {
        let settings = self.config.nuts_settings();
        let seed = self.config.seed;
        let jitter = self.config.init_jitter;
        let flag = self.cancel.flag();

        #[cfg(feature = "parallel")]
        let chains: Result<Vec<ChainResult>> = (0..self.config.chains)
            .into_par_iter()
            .map(|c| run_chain(model, &settings, seed, c, jitter, Some(flag)))
            .collect();

        #[cfg(not(feature = "parallel"))]
        let chains: Result<Vec<ChainResult>> = (0..self.config.chains)
            .map(|c| run_chain(model, &settings, seed, c, jitter, Some(flag)))
            .collect();

        chains
    }
}
