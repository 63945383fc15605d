//! Result types for posterior sampling runs.

use alloc::string::String;
use alloc::vec::Vec;
use core::fmt;

use serde::{Deserialize, Serialize};

use crate::types::PosteriorSampleSet;

// ============================================================================
// DrawStats - Per-transition sampler statistics
// ============================================================================

/// Statistics of the transition that produced one retained draw.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DrawStats {
    /// Mean Metropolis acceptance probability over the trajectory.
    pub accept_prob: f64,

    /// Number of trajectory doublings.
    pub tree_depth: usize,

    /// Number of leapfrog steps (gradient evaluations).
    pub n_leapfrog: usize,

    /// Whether the trajectory diverged (the draw repeats the previous one).
    pub divergent: bool,

    /// Hamiltonian at the start of the trajectory.
    pub energy: f64,
}

// ============================================================================
// ChainResult - Output of one chain
// ============================================================================

/// Everything one chain produced.
///
/// `samples` and `stats` are parallel sequences of equal length. A cancelled
/// chain holds only the draws completed before cancellation was observed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChainResult {
    /// Chain index within the run.
    pub chain: usize,

    /// Retained post-warm-up draws.
    pub samples: PosteriorSampleSet,

    /// Per-draw sampler statistics.
    pub stats: Vec<DrawStats>,

    /// Divergent transitions among retained draws.
    pub divergences: usize,

    /// Divergent transitions during warm-up (not retained).
    pub warmup_divergences: usize,

    /// Step size frozen at the end of warm-up.
    pub step_size: f64,

    /// Diagonal inverse mass frozen at the end of warm-up.
    pub inv_mass: Vec<f64>,

    /// Mean acceptance probability over retained draws.
    pub accept_rate: f64,

    /// True if cancellation stopped the chain early.
    pub cancelled: bool,
}

impl ChainResult {
    /// Fraction of retained draws that were divergent (0 if none were kept).
    pub fn divergence_fraction(&self) -> f64 {
        if self.stats.is_empty() {
            0.0
        } else {
            self.divergences as f64 / self.stats.len() as f64
        }
    }

    /// Number of draws whose trajectory hit `max_tree_depth`.
    pub fn depth_saturations(&self, max_tree_depth: usize) -> usize {
        self.stats
            .iter()
            .filter(|s| s.tree_depth >= max_tree_depth)
            .count()
    }

    /// Mean number of leapfrog steps per retained draw.
    pub fn mean_leapfrog_steps(&self) -> f64 {
        if self.stats.is_empty() {
            0.0
        } else {
            self.stats.iter().map(|s| s.n_leapfrog).sum::<usize>() as f64 / self.stats.len() as f64
        }
    }
}

// ============================================================================
// QualityIssue - Non-fatal convergence warnings
// ============================================================================

/// Whether an issue only costs efficiency or undermines the posterior.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum IssueSeverity {
    /// Draws are still valid; more iterations or tuning would help.
    Informational,

    /// Draws may not represent the posterior.
    ResultUndermining,
}

/// Issue codes for programmatic handling of quality problems.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum IssueCode {
    /// Divergent fraction exceeded the configured limit.
    ExcessiveDivergences,

    /// Mean acceptance fell well below the adaptation target.
    AcceptanceOffTarget,

    /// Split-R̂ above threshold: chains disagree.
    HighRhat,

    /// Effective sample size is too low for reliable summaries.
    LowEffectiveSamples,

    /// Many trajectories stopped at the maximum tree depth.
    MaxTreeDepthSaturated,

    /// The run was cancelled before all draws were produced.
    Cancelled,
}

impl IssueCode {
    /// Severity class of this code.
    pub fn severity(self) -> IssueSeverity {
        match self {
            IssueCode::ExcessiveDivergences | IssueCode::HighRhat | IssueCode::Cancelled => {
                IssueSeverity::ResultUndermining
            }
            IssueCode::AcceptanceOffTarget
            | IssueCode::LowEffectiveSamples
            | IssueCode::MaxTreeDepthSaturated => IssueSeverity::Informational,
        }
    }
}

impl fmt::Display for IssueCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IssueCode::ExcessiveDivergences => "excessive divergences",
            IssueCode::AcceptanceOffTarget => "acceptance off target",
            IssueCode::HighRhat => "high R-hat",
            IssueCode::LowEffectiveSamples => "low effective samples",
            IssueCode::MaxTreeDepthSaturated => "max tree depth saturated",
            IssueCode::Cancelled => "cancelled",
        };
        write!(f, "{}", s)
    }
}

/// A specific quality issue detected after sampling.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct QualityIssue {
    /// Issue code for programmatic handling.
    pub code: IssueCode,

    /// Human-readable description of the issue.
    pub message: String,

    /// Suggested actions to address the issue.
    pub guidance: String,
}

/// Overall reliability verdict for a run.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum RunQuality {
    /// No issues, or only informational ones.
    Reliable,

    /// At least one result-undermining issue.
    Unreliable,
}

impl RunQuality {
    /// Classify a set of issues.
    pub fn from_issues(issues: &[QualityIssue]) -> Self {
        if issues
            .iter()
            .any(|i| i.code.severity() == IssueSeverity::ResultUndermining)
        {
            RunQuality::Unreliable
        } else {
            RunQuality::Reliable
        }
    }
}

impl fmt::Display for RunQuality {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RunQuality::Reliable => write!(f, "reliable"),
            RunQuality::Unreliable => write!(f, "unreliable"),
        }
    }
}
