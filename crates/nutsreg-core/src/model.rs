//! Joint log-density of the Bayesian basis-function regression model.
//!
//! ```text
//! w0  ~ N(0, σ_p²)
//! w_j ~ N(0, σ_p²)                      j = 1..M
//! t_i ~ N(w0 + Φ_i · w, σ_o²)           i = 1..N
//! ```
//!
//! The gradient is derived analytically:
//!
//! ```text
//! r      = t - (w0·1 + Φ w)
//! ∂/∂w0  = -w0/σ_p² + Σ r_i / σ_o²
//! ∂/∂w   = -w /σ_p² + Φᵀ r / σ_o²
//! ```

use alloc::vec::Vec;

use nalgebra::DVector;

use crate::constants::LOG_2PI;
use crate::error::{ensure_finite, ensure_positive, Error, Result};
use crate::math;
use crate::types::{DesignMatrix, Position};

/// A differentiable log-density over a flat parameter vector.
///
/// The sampler only sees this interface. Implementations must be
/// side-effect free so that independent chains can share one instance.
pub trait LogDensity {
    /// Number of parameters.
    fn dim(&self) -> usize;

    /// Log-density at `q` (up to an additive constant is fine for sampling).
    fn log_density(&self, q: &Position) -> f64;

    /// Log-density and its gradient at `q`.
    fn log_density_and_grad(&self, q: &Position) -> (f64, Position);
}

/// Immutable model: design matrix, targets and the two scale hyperparameters.
///
/// Rebuild it whenever the design matrix or targets change.
#[derive(Debug, Clone)]
pub struct ModelSpec {
    design: DesignMatrix,
    targets: DVector<f64>,
    prior_scale: f64,
    noise_scale: f64,
}

impl ModelSpec {
    /// Create a model, validating shapes and scales.
    ///
    /// # Arguments
    /// * `design` - N × M design matrix (M may be 0)
    /// * `targets` - Observed targets, length N
    /// * `prior_scale` - σ_p for `w0` and every `w_j`
    /// * `noise_scale` - Known observation noise σ_o
    pub fn new(
        design: DesignMatrix,
        targets: &[f64],
        prior_scale: f64,
        noise_scale: f64,
    ) -> Result<Self> {
        if targets.is_empty() {
            return Err(Error::EmptyDataset);
        }
        if design.nrows() != targets.len() {
            return Err(Error::LengthMismatch {
                what: "design matrix rows",
                expected: targets.len(),
                actual: design.nrows(),
            });
        }
        ensure_finite("targets", targets)?;
        ensure_finite("design matrix", design.as_slice())?;
        ensure_positive("prior_scale", prior_scale)?;
        ensure_positive("noise_scale", noise_scale)?;

        Ok(Self {
            design,
            targets: DVector::from_column_slice(targets),
            prior_scale,
            noise_scale,
        })
    }

    /// Number of basis weights M.
    pub fn num_weights(&self) -> usize {
        self.design.ncols()
    }

    /// Number of observations N.
    pub fn num_observations(&self) -> usize {
        self.design.nrows()
    }

    /// Design matrix Φ.
    pub fn design(&self) -> &DesignMatrix {
        &self.design
    }

    /// Prior scale σ_p.
    pub fn prior_scale(&self) -> f64 {
        self.prior_scale
    }

    /// Observation noise σ_o.
    pub fn noise_scale(&self) -> f64 {
        self.noise_scale
    }

    fn check_weights(&self, w: &[f64]) {
        assert!(
            w.len() == self.num_weights(),
            "expected {} basis weights, got {}",
            self.num_weights(),
            w.len()
        );
    }

    /// Residuals `t - (w0 + Φ w)`.
    fn residuals(&self, w0: f64, w: &DVector<f64>) -> DVector<f64> {
        let mut mean = &self.design * w;
        mean.add_scalar_mut(w0);
        &self.targets - mean
    }

    /// Log joint density of `(w0, w)`.
    ///
    /// Constant terms are accumulated once per block rather than per
    /// observation, and residuals are formed before squaring.
    ///
    /// # Panics
    ///
    /// Panics if `w.len()` differs from [`num_weights`](Self::num_weights).
    pub fn log_joint(&self, w0: f64, w: &[f64]) -> f64 {
        self.check_weights(w);
        let w = DVector::from_column_slice(w);
        self.log_joint_vec(w0, &w)
    }

    fn log_joint_vec(&self, w0: f64, w: &DVector<f64>) -> f64 {
        self.log_joint_from_residuals(w0, w, &self.residuals(w0, w))
    }

    fn log_joint_from_residuals(&self, w0: f64, w: &DVector<f64>, residuals: &DVector<f64>) -> f64 {
        let m = w.len() as f64;
        let n = self.num_observations() as f64;

        let prior_norm = -0.5 * LOG_2PI - math::ln(self.prior_scale);
        let noise_norm = -0.5 * LOG_2PI - math::ln(self.noise_scale);

        let prior_sq = (math::sq(w0) + w.norm_squared()) / math::sq(self.prior_scale);
        let residual_sq = residuals.norm_squared() / math::sq(self.noise_scale);

        (m + 1.0) * prior_norm - 0.5 * prior_sq + n * noise_norm - 0.5 * residual_sq
    }

    /// Analytic gradient of [`log_joint`](Self::log_joint) with respect to `w0` and `w`.
    ///
    /// # Panics
    ///
    /// Panics if `w.len()` differs from [`num_weights`](Self::num_weights).
    pub fn grad_log_joint(&self, w0: f64, w: &[f64]) -> (f64, Vec<f64>) {
        self.check_weights(w);
        let w = DVector::from_column_slice(w);
        let (g0, gw) = self.grad_vec(w0, &w, &self.residuals(w0, &w));
        (g0, gw.iter().copied().collect())
    }

    fn grad_vec(&self, w0: f64, w: &DVector<f64>, residuals: &DVector<f64>) -> (f64, DVector<f64>) {
        let prior_prec = 1.0 / math::sq(self.prior_scale);
        let noise_prec = 1.0 / math::sq(self.noise_scale);

        let g0 = -w0 * prior_prec + residuals.sum() * noise_prec;
        let gw = self.design.tr_mul(residuals) * noise_prec - w * prior_prec;
        (g0, gw)
    }

    fn split(q: &Position) -> (f64, DVector<f64>) {
        (q[0], q.rows(1, q.len() - 1).into_owned())
    }
}

impl LogDensity for ModelSpec {
    fn dim(&self) -> usize {
        self.num_weights() + 1
    }

    fn log_density(&self, q: &Position) -> f64 {
        let (w0, w) = Self::split(q);
        self.log_joint_vec(w0, &w)
    }

    fn log_density_and_grad(&self, q: &Position) -> (f64, Position) {
        let (w0, w) = Self::split(q);
        let residuals = self.residuals(w0, &w);
        let logp = self.log_joint_from_residuals(w0, &w, &residuals);

        let (g0, gw) = self.grad_vec(w0, &w, &residuals);
        let mut grad = Position::zeros(q.len());
        grad[0] = g0;
        grad.rows_mut(1, gw.len()).copy_from(&gw);
        (logp, grad)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::{expand, BasisFamily};
    use rand::{Rng, SeedableRng};
    use rand_xoshiro::Xoshiro256PlusPlus;

    fn sample_model(family: &BasisFamily) -> ModelSpec {
        let x: Vec<f64> = (0..12).map(|i| i as f64 / 11.0).collect();
        let t: Vec<f64> = x.iter().map(|&xi| (6.0 * xi).sin() + 0.1 * xi).collect();
        ModelSpec::new(expand(&x, family).unwrap(), &t, 10.0, 0.3).unwrap()
    }

    /// Reference implementation summing per-term log-pdfs.
    fn naive_log_joint(model: &ModelSpec, w0: f64, w: &[f64]) -> f64 {
        let mut total = math::normal_log_pdf(w0, 0.0, model.prior_scale);
        for &wj in w {
            total += math::normal_log_pdf(wj, 0.0, model.prior_scale);
        }
        for i in 0..model.num_observations() {
            let mut mean = w0;
            for j in 0..w.len() {
                mean += model.design[(i, j)] * w[j];
            }
            total += math::normal_log_pdf(model.targets[i], mean, model.noise_scale);
        }
        total
    }

    #[test]
    #[should_panic(expected = "expected 3 basis weights, got 2")]
    fn test_log_joint_rejects_wrong_weight_count() {
        let model = sample_model(&BasisFamily::polynomial(3));
        model.log_joint(0.0, &[1.0, 2.0]);
    }

    #[test]
    #[should_panic(expected = "expected 0 basis weights, got 1")]
    fn test_grad_rejects_wrong_weight_count() {
        let model = sample_model(&BasisFamily::InterceptOnly);
        model.grad_log_joint(0.0, &[1.0]);
    }

    #[test]
    fn test_log_joint_matches_term_sum() {
        let model = sample_model(&BasisFamily::polynomial(3));
        let w = [0.4, -1.2, 0.7];
        let got = model.log_joint(0.3, &w);
        let expected = naive_log_joint(&model, 0.3, &w);
        assert!((got - expected).abs() < 1e-9 * expected.abs().max(1.0));
    }

    #[test]
    fn test_gradient_matches_finite_differences() {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(7);
        for family in [
            BasisFamily::polynomial(3),
            BasisFamily::gaussian_grid(0.0, 1.0, 5, 0.2),
            BasisFamily::InterceptOnly,
        ] {
            let model = sample_model(&family);
            for _ in 0..10 {
                let w0: f64 = rng.random_range(-2.0..2.0);
                let w: Vec<f64> = (0..model.num_weights())
                    .map(|_| rng.random_range(-2.0..2.0))
                    .collect();
                let (g0, gw) = model.grad_log_joint(w0, &w);

                let h = 1e-5;
                let fd0 = (model.log_joint(w0 + h, &w) - model.log_joint(w0 - h, &w)) / (2.0 * h);
                assert!((fd0 - g0).abs() <= 1e-4 * g0.abs().max(1.0), "w0: fd={} analytic={}", fd0, g0);

                for j in 0..w.len() {
                    let mut plus = w.clone();
                    let mut minus = w.clone();
                    plus[j] += h;
                    minus[j] -= h;
                    let fd = (model.log_joint(w0, &plus) - model.log_joint(w0, &minus)) / (2.0 * h);
                    assert!(
                        (fd - gw[j]).abs() <= 1e-4 * gw[j].abs().max(1.0),
                        "w{}: fd={} analytic={}",
                        j + 1,
                        fd,
                        gw[j]
                    );
                }
            }
        }
    }

    #[test]
    fn test_log_density_trait_agrees_with_log_joint() {
        let model = sample_model(&BasisFamily::polynomial(2));
        let q = Position::from_column_slice(&[0.5, 1.0, -0.25]);
        let (logp, grad) = model.log_density_and_grad(&q);
        assert!((logp - model.log_joint(0.5, &[1.0, -0.25])).abs() < 1e-10);
        assert!((logp - model.log_density(&q)).abs() < 1e-10);

        let (g0, gw) = model.grad_log_joint(0.5, &[1.0, -0.25]);
        assert!((grad[0] - g0).abs() < 1e-10);
        assert!((grad[1] - gw[0]).abs() < 1e-10);
        assert!((grad[2] - gw[1]).abs() < 1e-10);
    }

    #[test]
    fn test_intercept_only_model() {
        let model = ModelSpec::new(DesignMatrix::zeros(3, 0), &[1.0, 2.0, 3.0], 10.0, 0.5).unwrap();
        assert_eq!(model.dim(), 1);
        let (logp, grad) = model.log_density_and_grad(&Position::from_column_slice(&[2.0]));
        assert!(logp.is_finite());
        // At the sample mean the likelihood gradient vanishes; only the prior pulls.
        assert!((grad[0] + 2.0 / 100.0).abs() < 1e-12);
    }

    #[test]
    fn test_invalid_construction() {
        let design = DesignMatrix::zeros(2, 1);
        assert_eq!(
            ModelSpec::new(design.clone(), &[1.0], 10.0, 0.3).unwrap_err(),
            Error::LengthMismatch {
                what: "design matrix rows",
                expected: 1,
                actual: 2
            }
        );
        assert!(ModelSpec::new(design.clone(), &[1.0, 2.0], 0.0, 0.3).is_err());
        assert!(ModelSpec::new(design.clone(), &[1.0, 2.0], 10.0, -1.0).is_err());
        assert!(ModelSpec::new(DesignMatrix::zeros(0, 1), &[], 10.0, 0.3).is_err());
        assert!(ModelSpec::new(design, &[1.0, f64::NAN], 10.0, 0.3).is_err());
    }
}
