//! Predictive and posterior summaries.
//!
//! Predictive bands use selection per query row. Parameter intervals sort the
//! pooled trace once. Pooled moments are merged from per-chain accumulators.

use alloc::format;
use alloc::string::String;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};
use crate::predictive::PredictiveSampleSet;
use crate::statistics::{
    compute_quantile, compute_quantile_sorted, effective_sample_size, split_rhat, OnlineStats,
};
use crate::types::PosteriorSampleSet;

/// Credible level used for parameter intervals.
const PARAMETER_INTERVAL_LEVEL: f64 = 0.95;

/// Per-query mean and standard deviation of predictive draws.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictiveSummary {
    /// Mean over draws, one per query point.
    pub mean: Vec<f64>,
    /// Sample standard deviation (n-1) over draws, one per query point.
    pub stddev: Vec<f64>,
}

/// Central credible band per query point.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CredibleBand {
    /// Probability mass inside the band.
    pub level: f64,
    /// Lower quantile `(1 - level) / 2` per query point.
    pub lower: Vec<f64>,
    /// Upper quantile `(1 + level) / 2` per query point.
    pub upper: Vec<f64>,
}

/// Posterior summary of one parameter.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ParameterSummary {
    /// `w0`, `w1`, ..., `wM`.
    pub name: String,
    /// Posterior mean.
    pub mean: f64,
    /// Posterior standard deviation.
    pub stddev: f64,
    /// 2.5% quantile.
    pub lower: f64,
    /// 97.5% quantile.
    pub upper: f64,
    /// Effective sample size summed over chains.
    pub ess: f64,
    /// Split-R̂; `None` when chains are too short.
    pub rhat: Option<f64>,
}

/// Mean and standard deviation of the draws at every query point.
///
/// With a single draw the standard deviation is 0.
pub fn summarize(samples: &PredictiveSampleSet) -> PredictiveSummary {
    let (mean, stddev) = samples
        .rows()
        .map(|row| {
            let s = OnlineStats::from_slice(row).finalize();
            (s.mean, s.std_dev())
        })
        .unzip();
    PredictiveSummary { mean, stddev }
}

fn validate_level(level: f64) -> Result<()> {
    if level > 0.0 && level < 1.0 {
        Ok(())
    } else {
        Err(Error::InvalidConfig {
            param: "credible level",
            reason: format!("must be in (0, 1), got {}", level),
        })
    }
}

/// Central `level` credible band of the predictive draws per query point.
///
/// # Errors
///
/// Fails if `level` is outside (0, 1) or the set holds no draws.
pub fn credible_band(samples: &PredictiveSampleSet, level: f64) -> Result<CredibleBand> {
    validate_level(level)?;
    if samples.num_draws() == 0 {
        return Err(Error::InvalidConfig {
            param: "predictive samples",
            reason: "no draws to summarize".into(),
        });
    }
    let p_lo = (1.0 - level) / 2.0;
    let p_hi = (1.0 + level) / 2.0;
    let mut scratch = Vec::with_capacity(samples.num_draws());
    let (lower, upper) = samples
        .rows()
        .map(|row| {
            scratch.clear();
            scratch.extend_from_slice(row);
            let lo = compute_quantile(&mut scratch, p_lo);
            let hi = compute_quantile(&mut scratch, p_hi);
            (lo, hi)
        })
        .unzip();
    Ok(CredibleBand {
        level,
        lower,
        upper,
    })
}

fn parameter_name(index: usize) -> String {
    format!("w{}", index)
}

/// Summaries for one set of draws (R̂ from its two halves).
pub fn summarize_posterior(samples: &PosteriorSampleSet) -> Vec<ParameterSummary> {
    summarize_chains(&[samples])
}

/// Pooled summaries across chains of the same model.
///
/// ESS is the sum of per-chain ESS; R̂ compares split halves of every chain.
/// Parameters of an empty pool summarize to zeros.
pub fn summarize_chains(chains: &[&PosteriorSampleSet]) -> Vec<ParameterSummary> {
    let num_params = chains.first().map_or(0, |c| c.num_weights() + 1);
    let p_lo = (1.0 - PARAMETER_INTERVAL_LEVEL) / 2.0;
    let p_hi = (1.0 + PARAMETER_INTERVAL_LEVEL) / 2.0;

    (0..num_params)
        .map(|index| {
            let traces: Vec<Vec<f64>> = chains.iter().map(|c| c.trace(index)).collect();

            let mut moments = OnlineStats::new();
            for trace in &traces {
                moments.merge(&OnlineStats::from_slice(trace));
            }
            let stats = moments.finalize();

            let mut pooled: Vec<f64> = traces.iter().flatten().copied().collect();
            pooled.sort_unstable_by(f64::total_cmp);
            let ess = traces.iter().map(|t| effective_sample_size(t)).sum();
            let slices: Vec<&[f64]> = traces.iter().map(Vec::as_slice).collect();
            let rhat = split_rhat(&slices);
            let (lower, upper) = if pooled.is_empty() {
                (0.0, 0.0)
            } else {
                (
                    compute_quantile_sorted(&pooled, p_lo),
                    compute_quantile_sorted(&pooled, p_hi),
                )
            };

            ParameterSummary {
                name: parameter_name(index),
                mean: stats.mean,
                stddev: stats.std_dev(),
                lower,
                upper,
                ess,
                rhat,
            }
        })
        .collect()
}
