//! Summaries of posterior and predictive draws, and run quality checks.

mod quality;
mod summary;

pub use quality::{assess, QualityThresholds};
pub use summary::{
    credible_band, summarize, summarize_chains, summarize_posterior, CredibleBand,
    ParameterSummary, PredictiveSummary,
};
