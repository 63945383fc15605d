//! Post-run convergence checks that produce non-fatal [`QualityIssue`]s.

use alloc::format;
use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use super::ParameterSummary;
use crate::constants::{DEFAULT_MAX_DIVERGENCE_FRACTION, DEFAULT_MAX_TREE_DEPTH, DEFAULT_TARGET_ACCEPT};
use crate::result::{ChainResult, IssueCode, QualityIssue};

/// Limits beyond which a run is flagged.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QualityThresholds {
    /// Acceptance rate the step size was tuned toward.
    pub target_accept: f64,
    /// How far a chain's acceptance rate may fall below target.
    ///
    /// Acceptance above target is not flagged: adapted step sizes routinely
    /// settle slightly small.
    pub accept_tolerance: f64,
    /// Largest tolerated divergent fraction per chain.
    pub max_divergence_fraction: f64,
    /// Largest tolerated split-R̂.
    pub max_rhat: f64,
    /// Smallest tolerated total ESS per parameter.
    pub min_ess: f64,
    /// Tree depth limit used by the sampler.
    pub max_tree_depth: usize,
    /// Fraction of draws at the depth limit above which saturation is flagged.
    pub max_depth_saturation: f64,
}

impl Default for QualityThresholds {
    fn default() -> Self {
        Self {
            target_accept: DEFAULT_TARGET_ACCEPT,
            accept_tolerance: 0.15,
            max_divergence_fraction: DEFAULT_MAX_DIVERGENCE_FRACTION,
            max_rhat: 1.05,
            min_ess: 100.0,
            max_tree_depth: DEFAULT_MAX_TREE_DEPTH,
            max_depth_saturation: 0.1,
        }
    }
}

/// Check chains and parameter summaries against `thresholds`.
///
/// Issues are ordered: cancellation, divergences, acceptance, tree depth,
/// then R̂ and ESS. Each code appears at most once.
pub fn assess(
    chains: &[ChainResult],
    summaries: &[ParameterSummary],
    thresholds: &QualityThresholds,
) -> Vec<QualityIssue> {
    let mut issues = Vec::new();

    let cancelled: Vec<usize> = chains.iter().filter(|c| c.cancelled).map(|c| c.chain).collect();
    if !cancelled.is_empty() {
        issues.push(QualityIssue {
            code: IssueCode::Cancelled,
            message: format!("Chains {:?} were cancelled before completing", cancelled),
            guidance: "Summaries use only the draws completed before cancellation".into(),
        });
    }

    if let Some(worst) = chains
        .iter()
        .filter(|c| c.divergence_fraction() > thresholds.max_divergence_fraction)
        .max_by(|a, b| a.divergence_fraction().total_cmp(&b.divergence_fraction()))
    {
        issues.push(QualityIssue {
            code: IssueCode::ExcessiveDivergences,
            message: format!(
                "Chain {} had {} divergent transitions ({:.1}% of draws, limit {:.1}%)",
                worst.chain,
                worst.divergences,
                worst.divergence_fraction() * 100.0,
                thresholds.max_divergence_fraction * 100.0
            ),
            guidance: "Raise target_accept to shrink the step size, or rescale inputs".into(),
        });
    }

    if let Some(off) = chains
        .iter()
        .filter(|c| !c.stats.is_empty())
        .find(|c| c.accept_rate < thresholds.target_accept - thresholds.accept_tolerance)
    {
        issues.push(QualityIssue {
            code: IssueCode::AcceptanceOffTarget,
            message: format!(
                "Chain {} mean acceptance {:.2} is well below target {:.2}",
                off.chain, off.accept_rate, thresholds.target_accept
            ),
            guidance: "Increase warm-up iterations so step-size adaptation can settle".into(),
        });
    }

    if let Some(saturated) = chains.iter().find(|c| {
        !c.stats.is_empty()
            && c.depth_saturations(thresholds.max_tree_depth) as f64 / c.stats.len() as f64
                > thresholds.max_depth_saturation
    }) {
        issues.push(QualityIssue {
            code: IssueCode::MaxTreeDepthSaturated,
            message: format!(
                "Chain {}: {} of {} trajectories hit max tree depth {}",
                saturated.chain,
                saturated.depth_saturations(thresholds.max_tree_depth),
                saturated.stats.len(),
                thresholds.max_tree_depth
            ),
            guidance: "Posterior may be poorly scaled; increase warm-up or max_tree_depth".into(),
        });
    }

    if let Some(worst) = summaries
        .iter()
        .filter_map(|s| s.rhat.map(|r| (s, r)))
        .filter(|&(_, r)| r > thresholds.max_rhat)
        .max_by(|a, b| a.1.total_cmp(&b.1))
    {
        issues.push(QualityIssue {
            code: IssueCode::HighRhat,
            message: format!(
                "{} has split R-hat {:.3} (limit {:.2})",
                worst.0.name, worst.1, thresholds.max_rhat
            ),
            guidance: "Chains have not mixed; run longer warm-up and sampling".into(),
        });
    }

    if let Some(worst) = summaries
        .iter()
        .filter(|s| s.ess < thresholds.min_ess)
        .min_by(|a, b| a.ess.total_cmp(&b.ess))
    {
        issues.push(QualityIssue {
            code: IssueCode::LowEffectiveSamples,
            message: format!(
                "{} has effective sample size {:.0} (minimum {:.0})",
                worst.name, worst.ess, thresholds.min_ess
            ),
            guidance: "Draw more samples or use more chains".into(),
        });
    }

    issues
}
