//! Phase-space points, the diagonal Euclidean metric and leapfrog integration.

use rand::Rng;
use rand_distr::{Distribution, StandardNormal};

use crate::math;
use crate::model::LogDensity;
use crate::types::Position;

/// A point in phase space with its cached log density and gradient.
#[derive(Debug, Clone)]
pub(crate) struct PhasePoint {
    pub q: Position,
    pub p: Position,
    pub logp: f64,
    pub grad: Position,
}

impl PhasePoint {
    /// Evaluate the model at `q` with zero momentum.
    pub fn at<M: LogDensity + ?Sized>(model: &M, q: Position) -> Self {
        let (logp, grad) = model.log_density_and_grad(&q);
        let p = Position::zeros(q.len());
        Self { q, p, logp, grad }
    }

    /// Kinetic energy `½ pᵀ M⁻¹ p` for a diagonal inverse mass.
    pub fn kinetic(&self, inv_mass: &Position) -> f64 {
        0.5 * self
            .p
            .iter()
            .zip(inv_mass.iter())
            .map(|(&p, &m)| p * p * m)
            .sum::<f64>()
    }

    /// Total energy `H = -log p(q) + K(p)`.
    pub fn hamiltonian(&self, inv_mass: &Position) -> f64 {
        -self.logp + self.kinetic(inv_mass)
    }

    /// True when log density and every gradient component are finite.
    pub fn is_finite(&self) -> bool {
        self.logp.is_finite() && self.grad.iter().all(|g| g.is_finite())
    }

    /// Velocity `M⁻¹ p`.
    pub fn velocity(&self, inv_mass: &Position) -> Position {
        self.p.component_mul(inv_mass)
    }
}

/// One leapfrog step of signed size `eps` (negative integrates backwards).
pub(crate) fn leapfrog<M: LogDensity + ?Sized>(
    model: &M,
    z: &PhasePoint,
    eps: f64,
    inv_mass: &Position,
) -> PhasePoint {
    let mut p = &z.p + &z.grad * (0.5 * eps);
    let q = &z.q + p.component_mul(inv_mass) * eps;
    let (logp, grad) = model.log_density_and_grad(&q);
    p += &grad * (0.5 * eps);
    PhasePoint { q, p, logp, grad }
}

/// Draw momentum `p ~ N(0, M)` with `M = diag(1 / inv_mass)`.
pub(crate) fn sample_momentum<R: Rng + ?Sized>(rng: &mut R, inv_mass: &Position) -> Position {
    inv_mass.map(|m| {
        let z: f64 = StandardNormal.sample(rng);
        z / math::sqrt(m)
    })
}
