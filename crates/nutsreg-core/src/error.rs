//! Error types for argument validation.
//!
//! Every error in this crate is raised before sampling starts. Numerical
//! trouble during a trajectory is handled locally (counted as a divergence),
//! and convergence problems are reported as [`QualityIssue`](crate::result::QualityIssue)s.

use alloc::string::String;
use core::fmt;

/// Invalid input detected before any sampling work is done.
#[derive(Debug, Clone, PartialEq)]
pub enum Error {
    /// Polynomial basis requested with degree < 1.
    PolynomialDegree {
        /// The requested degree.
        degree: usize,
    },

    /// Gaussian basis requested without any centers.
    EmptyCenters,

    /// Gaussian basis bandwidth is not a positive finite number.
    Bandwidth {
        /// The rejected bandwidth.
        value: f64,
    },

    /// A scale hyperparameter (prior scale, noise scale) is not positive and finite.
    NonPositiveScale {
        /// Name of the parameter.
        param: &'static str,
        /// The rejected value.
        value: f64,
    },

    /// Two sequences that must agree in length do not.
    LengthMismatch {
        /// What was being compared.
        what: &'static str,
        /// Expected length.
        expected: usize,
        /// Actual length.
        actual: usize,
    },

    /// The dataset has no observations.
    EmptyDataset,

    /// An input contains NaN or infinity.
    NonFiniteInput {
        /// Which input contained the value.
        what: &'static str,
        /// Position of the first offending value.
        index: usize,
    },

    /// A sampler or inference setting is out of range.
    InvalidConfig {
        /// Name of the setting.
        param: &'static str,
        /// Constraint that was violated.
        reason: String,
    },
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::PolynomialDegree { degree } => {
                write!(f, "polynomial degree must be >= 1, got {}", degree)
            }
            Error::EmptyCenters => write!(f, "gaussian basis needs at least one center"),
            Error::Bandwidth { value } => {
                write!(f, "gaussian bandwidth must be positive and finite, got {}", value)
            }
            Error::NonPositiveScale { param, value } => {
                write!(f, "{} must be positive and finite, got {}", param, value)
            }
            Error::LengthMismatch {
                what,
                expected,
                actual,
            } => write!(f, "{}: expected length {}, got {}", what, expected, actual),
            Error::EmptyDataset => write!(f, "dataset must contain at least one observation"),
            Error::NonFiniteInput { what, index } => {
                write!(f, "{} contains a non-finite value at index {}", what, index)
            }
            Error::InvalidConfig { param, reason } => write!(f, "invalid {}: {}", param, reason),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for Error {}

/// Result alias for fallible operations in this crate.
pub type Result<T> = core::result::Result<T, Error>;

/// Reject the first non-finite value in `values`.
pub(crate) fn ensure_finite(what: &'static str, values: &[f64]) -> Result<()> {
    match values.iter().position(|v| !v.is_finite()) {
        Some(index) => Err(Error::NonFiniteInput { what, index }),
        None => Ok(()),
    }
}

/// Reject scales that are zero, negative, or non-finite.
pub(crate) fn ensure_positive(param: &'static str, value: f64) -> Result<()> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(Error::NonPositiveScale { param, value })
    }
}
