//! # nutsreg
//!
//! Bayesian linear-in-parameters regression over basis-expanded inputs,
//! sampled with the No-U-Turn sampler.
//!
//! Given noisy observations `(x, t)` and a basis family, this crate produces:
//! - A posterior over the intercept `w0` and basis weights `w`
//! - Posterior predictive draws, means, standard deviations and credible
//!   bands at arbitrary new inputs
//! - Convergence diagnostics (acceptance, divergences, ESS, split-R̂) with
//!   non-fatal quality flags
//!
//! ## Quick Start
//!
//! ```ignore
//! use nutsreg::{BasisFamily, Config, Dataset, Inference};
//!
//! let dataset = Dataset::new(x, t)?;
//! let family = BasisFamily::gaussian_grid(0.0, 1.0, 9, 0.1);
//! let fitted = Inference::new(Config::quick().noise_scale(0.3)).fit(&dataset, &family)?;
//!
//! println!("{}", nutsreg::output::format_report(fitted.report()));
//! let summary = fitted.predictive_summary(&[0.0, 0.5, 1.0])?;
//! ```
//!
//! Logging goes through `tracing`; install any subscriber to see chain
//! progress and quality warnings.

#![warn(missing_docs)]
#![warn(clippy::all)]

// Core modules
mod config;
mod engine;

// Functional modules
pub mod data;
pub mod output;

// Re-exports for public API
pub use config::Config;
pub use engine::{CancelToken, FittedModel, Inference, InferenceReport};
pub use nutsreg_core::{
    BasisFamily, ChainResult, CredibleBand, Dataset, DrawStats, Error, IssueCode, IssueSeverity,
    ModelParameters, ParameterSummary, PosteriorSampleSet, PredictiveSampleSet,
    PredictiveSummary, QualityIssue, Result, RunQuality,
};

/// Panic unless a fit is reliable.
///
/// Evaluates to the [`FittedModel`] when no result-undermining issue was
/// raised; otherwise panics with the formatted report.
///
/// # Example
/// ```ignore
/// use nutsreg::{require_reliable, Inference};
///
/// let fitted = require_reliable!(Inference::new(config).fit(&dataset, &family)?);
/// ```
#[macro_export]
macro_rules! require_reliable {
    ($fitted:expr) => {
        match $fitted {
            fitted if fitted.report().is_reliable() => fitted,
            fitted => panic!(
                "[UNRELIABLE] {}",
                $crate::output::format_report(fitted.report())
            ),
        }
    };
}
