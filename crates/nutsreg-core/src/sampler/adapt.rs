//! Warm-up adaptation: dual-averaging step size and windowed diagonal mass matrix.
//!
//! Step size follows Hoffman & Gelman (2014), Algorithm 5, with Stan's
//! constants. The mass schedule uses Stan's buffers: an initial fast window
//! where only the step size adapts, a series of doubling slow windows that
//! estimate the posterior variance, and a terminal fast window.

use alloc::vec::Vec;

use rand::Rng;

use super::hamiltonian::{leapfrog, sample_momentum, PhasePoint};
use crate::math;
use crate::model::LogDensity;
use crate::statistics::OnlineVariance;
use crate::types::Position;

const GAMMA: f64 = 0.05;
const T0: f64 = 10.0;
const KAPPA: f64 = 0.75;

const INIT_BUFFER: usize = 75;
const TERM_BUFFER: usize = 50;
const BASE_WINDOW: usize = 25;

/// Below this many warm-up iterations the mass matrix stays at the identity.
const MIN_MASS_WARMUP: usize = 20;

/// Step sizes are kept inside this range by the initial heuristic.
const MIN_STEP_SIZE: f64 = 1e-10;
const MAX_STEP_SIZE: f64 = 1e7;

/// Nesterov dual averaging of log step size toward a target acceptance rate.
#[derive(Debug, Clone)]
pub(crate) struct DualAveraging {
    target: f64,
    mu: f64,
    log_eps: f64,
    log_eps_bar: f64,
    h_bar: f64,
    t: f64,
}

impl DualAveraging {
    pub fn new(initial_step_size: f64, target: f64) -> Self {
        let mut da = Self {
            target,
            mu: 0.0,
            log_eps: 0.0,
            log_eps_bar: 0.0,
            h_bar: 0.0,
            t: 0.0,
        };
        da.restart(initial_step_size);
        da
    }

    /// Forget history and shrink toward `10 · step_size`.
    pub fn restart(&mut self, step_size: f64) {
        self.mu = math::ln(10.0 * step_size);
        self.log_eps = math::ln(step_size);
        self.log_eps_bar = 0.0;
        self.h_bar = 0.0;
        self.t = 0.0;
    }

    /// Feed the mean acceptance statistic of the last transition.
    pub fn update(&mut self, accept_prob: f64) {
        let accept = if accept_prob.is_finite() {
            accept_prob.clamp(0.0, 1.0)
        } else {
            0.0
        };
        self.t += 1.0;
        let eta = 1.0 / (self.t + T0);
        self.h_bar = (1.0 - eta) * self.h_bar + eta * (self.target - accept);
        self.log_eps = self.mu - math::sqrt(self.t) / GAMMA * self.h_bar;
        let x_eta = math::pow(self.t, -KAPPA);
        self.log_eps_bar = x_eta * self.log_eps + (1.0 - x_eta) * self.log_eps_bar;
    }

    /// Step size to use for the next warm-up transition.
    pub fn current_step_size(&self) -> f64 {
        math::exp(self.log_eps)
    }

    /// Averaged step size to freeze at the end of warm-up.
    pub fn final_step_size(&self) -> f64 {
        if self.t == 0.0 {
            self.current_step_size()
        } else {
            math::exp(self.log_eps_bar)
        }
    }
}

/// Iteration layout of diagonal mass-matrix adaptation.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct MassSchedule {
    start: usize,
    end: usize,
    window_ends: Vec<usize>,
}

impl MassSchedule {
    pub fn new(warmup: usize) -> Self {
        if warmup < MIN_MASS_WARMUP {
            return Self {
                start: 0,
                end: 0,
                window_ends: Vec::new(),
            };
        }

        let (init, term, base) = if INIT_BUFFER + TERM_BUFFER + BASE_WINDOW > warmup {
            let init = (0.15 * warmup as f64) as usize;
            let term = (0.1 * warmup as f64) as usize;
            (init, term, warmup - init - term)
        } else {
            (INIT_BUFFER, TERM_BUFFER, BASE_WINDOW)
        };

        let end = warmup - term;
        let mut window_ends = Vec::new();
        let mut window_start = init;
        let mut size = base;
        while window_start < end {
            let mut window_end = window_start + size;
            // Stretch the last window rather than leave a short one behind.
            if window_end + 2 * size > end {
                window_end = end;
            }
            window_ends.push(window_end);
            window_start = window_end;
            size *= 2;
        }

        Self {
            start: init,
            end,
            window_ends,
        }
    }

    /// True if the draw of warm-up iteration `i` feeds the variance estimate.
    pub fn collects(&self, i: usize) -> bool {
        i >= self.start && i < self.end
    }

    /// True if a slow window closes after warm-up iteration `i`.
    pub fn closes_window(&self, i: usize) -> bool {
        self.window_ends.contains(&(i + 1))
    }

    #[cfg(test)]
    pub fn window_ends(&self) -> &[usize] {
        &self.window_ends
    }
}

/// Regularized inverse-mass diagonal from a window of draws.
///
/// Shrinks toward `1e-3` with weight `5 / (n + 5)`.
pub(crate) fn regularized_inv_mass(acc: &OnlineVariance) -> Position {
    let n = acc.count() as f64;
    let shrink = 5.0 / (n + 5.0);
    let vars = acc.variances();
    Position::from_iterator(
        vars.len(),
        vars.iter().map(|&v| (1.0 - shrink) * v + shrink * 1e-3),
    )
}

/// Double or halve a unit step size until one leapfrog step's acceptance
/// crosses one half (Hoffman & Gelman, Algorithm 4).
pub(crate) fn find_reasonable_step_size<M, R>(
    model: &M,
    point: &PhasePoint,
    inv_mass: &Position,
    initial: f64,
    rng: &mut R,
) -> f64
where
    M: LogDensity + ?Sized,
    R: Rng + ?Sized,
{
    let log_half = math::ln(0.5);
    let mut start = point.clone();
    start.p = sample_momentum(rng, inv_mass);
    let h0 = start.hamiltonian(inv_mass);

    let log_accept = |eps: f64| {
        let next = leapfrog(model, &start, eps, inv_mass);
        let delta = h0 - next.hamiltonian(inv_mass);
        if next.is_finite() && delta.is_finite() {
            delta
        } else {
            f64::NEG_INFINITY
        }
    };

    let mut eps = initial;
    let grow = log_accept(eps) > log_half;
    for _ in 0..100 {
        let next_eps = if grow { 2.0 * eps } else { 0.5 * eps };
        if !(MIN_STEP_SIZE..=MAX_STEP_SIZE).contains(&next_eps) {
            break;
        }
        eps = next_eps;
        let above = log_accept(eps) > log_half;
        if above != grow {
            // Overshot while growing; step back to the last acceptable size.
            if grow {
                eps *= 0.5;
            }
            break;
        }
    }
    eps
}
