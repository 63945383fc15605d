//! Bayesian basis-function regression with No-U-Turn Hamiltonian Monte Carlo.
//!
//! This crate holds the inference engine: basis expansion, the Gaussian
//! prior/likelihood model with its analytic gradient, the NUTS sampler,
//! posterior predictive sampling and diagnostics. It works in `no_std`
//! environments with an allocator.
//!
//! # Features
//!
//! - `std` (default): standard library support and `std::error::Error` impls
//! - `parallel`: per-draw parallel predictive sampling using rayon (requires `std`)
//!
//! # Usage
//!
//! Most callers go through the `nutsreg` crate, which adds multi-chain
//! orchestration, configuration, dataset loading and reporting. The core can
//! be driven directly:
//!
//! ```
//! use nutsreg_core::{expand, run_chain, predict_seeded, summarize, BasisFamily, ModelSpec, NutsSettings};
//!
//! let x = [0.0, 0.25, 0.5, 0.75, 1.0];
//! let t = [1.0, 1.5, 2.0, 2.5, 3.0];
//! let family = BasisFamily::polynomial(1);
//!
//! let model = ModelSpec::new(expand(&x, &family).unwrap(), &t, 10.0, 0.1).unwrap();
//! let settings = NutsSettings { warmup: 100, samples: 100, ..NutsSettings::default() };
//! let chain = run_chain(&model, &settings, 42, 0, 0.5, None).unwrap();
//!
//! let queries = expand(&[0.5], &family).unwrap();
//! let predictive = predict_seeded(&chain.samples, &queries, 0.1, 7).unwrap();
//! let summary = summarize(&predictive);
//! assert_eq!(summary.mean.len(), 1);
//! ```

#![cfg_attr(not(feature = "std"), no_std)]

extern crate alloc;

pub mod basis;
pub mod constants;
pub mod diagnostics;
pub mod error;
pub mod math;
pub mod model;
pub mod predictive;
pub mod result;
pub mod sampler;
pub mod statistics;
pub mod types;

// Re-export commonly used items at crate root
pub use basis::{expand, BasisFamily};
pub use diagnostics::{
    assess, credible_band, summarize, summarize_chains, summarize_posterior, CredibleBand,
    ParameterSummary, PredictiveSummary, QualityThresholds,
};
pub use error::{Error, Result};
pub use model::{LogDensity, ModelSpec};
pub use predictive::{mean_function, predict, predict_seeded, PredictiveSampleSet};
pub use result::{ChainResult, DrawStats, IssueCode, IssueSeverity, QualityIssue, RunQuality};
pub use sampler::{run_chain, sample_chain, NutsSettings};
pub use types::{Dataset, DesignMatrix, ModelParameters, Position, PosteriorSampleSet};
