//! Basis-function expansion of scalar inputs into a design matrix.
//!
//! Two families are supported:
//!
//! ```text
//! Polynomial(d):      φ_j(x) = x^j                          j = 1..d
//! Gaussian(c, s):     φ_j(x) = exp(-(x - c_j)² / (2 s²))     j = 1..|c|
//! ```
//!
//! The degree-0 term is never produced; the intercept lives in `w0`. Gaussian
//! bumps are not normalized since the weight prior absorbs any constant factor.

use alloc::vec::Vec;

use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, Error, Result};
use crate::math;
use crate::types::DesignMatrix;

/// Family of basis functions applied to every input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum BasisFamily {
    /// Powers `x^1 .. x^degree`.
    Polynomial {
        /// Highest power, at least 1.
        degree: usize,
    },

    /// Unnormalized Gaussian bumps.
    Gaussian {
        /// Bump centers, in column order.
        centers: Vec<f64>,
        /// Common bandwidth, strictly positive.
        bandwidth: f64,
    },

    /// No basis columns at all: the model reduces to the intercept `w0`.
    InterceptOnly,
}

impl BasisFamily {
    /// Polynomial family of the given degree.
    pub fn polynomial(degree: usize) -> Self {
        Self::Polynomial { degree }
    }

    /// Gaussian family with explicit centers.
    pub fn gaussian(centers: Vec<f64>, bandwidth: f64) -> Self {
        Self::Gaussian { centers, bandwidth }
    }

    /// Gaussian family with `count` centers evenly spaced over `[lo, hi]`.
    pub fn gaussian_grid(lo: f64, hi: f64, count: usize, bandwidth: f64) -> Self {
        let centers = match count {
            0 => Vec::new(),
            1 => alloc::vec![0.5 * (lo + hi)],
            _ => {
                let step = (hi - lo) / (count - 1) as f64;
                (0..count).map(|j| lo + step * j as f64).collect()
            }
        };
        Self::Gaussian { centers, bandwidth }
    }

    /// Check the family's parameters.
    pub fn validate(&self) -> Result<()> {
        match self {
            Self::Polynomial { degree } => {
                if *degree < 1 {
                    return Err(Error::PolynomialDegree { degree: *degree });
                }
            }
            Self::Gaussian { centers, bandwidth } => {
                if centers.is_empty() {
                    return Err(Error::EmptyCenters);
                }
                ensure_finite("gaussian centers", centers)?;
                if !(bandwidth.is_finite() && *bandwidth > 0.0) {
                    return Err(Error::Bandwidth { value: *bandwidth });
                }
            }
            Self::InterceptOnly => {}
        }
        Ok(())
    }

    /// Number of basis functions M (design-matrix columns).
    pub fn num_functions(&self) -> usize {
        match self {
            Self::Polynomial { degree } => *degree,
            Self::Gaussian { centers, .. } => centers.len(),
            Self::InterceptOnly => 0,
        }
    }

    /// Evaluate every basis function at `x`, writing into `row`.
    ///
    /// `row` must have length [`num_functions`](Self::num_functions).
    pub fn evaluate_into(&self, x: f64, row: &mut [f64]) {
        match self {
            Self::Polynomial { .. } => {
                // Repeated multiplication keeps integer inputs exact.
                let mut power = 1.0;
                for value in row.iter_mut() {
                    power *= x;
                    *value = power;
                }
            }
            Self::Gaussian { centers, bandwidth } => {
                let denom = 2.0 * bandwidth * bandwidth;
                for (value, &c) in row.iter_mut().zip(centers) {
                    *value = math::exp(-math::sq(x - c) / denom);
                }
            }
            Self::InterceptOnly => {}
        }
    }
}

/// Expand `inputs` into an N × M design matrix.
///
/// Pure and deterministic; safe to call concurrently.
///
/// # Errors
///
/// Fails if the family's parameters are invalid or an input is non-finite.
pub fn expand(inputs: &[f64], family: &BasisFamily) -> Result<DesignMatrix> {
    family.validate()?;
    ensure_finite("inputs", inputs)?;

    let n = inputs.len();
    let m = family.num_functions();
    let mut design = DesignMatrix::zeros(n, m);
    let mut row = alloc::vec![0.0; m];
    for (i, &x) in inputs.iter().enumerate() {
        family.evaluate_into(x, &mut row);
        for (j, &value) in row.iter().enumerate() {
            design[(i, j)] = value;
        }
    }
    Ok(design)
}
