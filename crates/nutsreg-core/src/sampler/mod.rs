//! No-U-Turn Hamiltonian Monte Carlo for any [`LogDensity`].
//!
//! A chain runs `warmup` adaptation iterations (dual-averaging step size and
//! windowed diagonal mass matrix), freezes both, then keeps `samples` draws.
//! Numerical breakdown inside a trajectory is never an error: it is recorded
//! as a divergence and the chain stays at its current position.
//!
//! Cancellation is cooperative: the flag is read between iterations, never
//! inside a trajectory, so every retained draw is a complete transition.

mod adapt;
mod hamiltonian;
mod nuts;

use alloc::format;
use alloc::vec::Vec;
use core::sync::atomic::{AtomicBool, Ordering};

use rand::{Rng, SeedableRng};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

use self::adapt::{find_reasonable_step_size, regularized_inv_mass, DualAveraging, MassSchedule};
use self::hamiltonian::PhasePoint;
use crate::constants::{DEFAULT_MAX_TREE_DEPTH, DEFAULT_SAMPLES, DEFAULT_TARGET_ACCEPT, DEFAULT_WARMUP};
use crate::error::{ensure_finite, Error, Result};
use crate::model::LogDensity;
use crate::result::{ChainResult, DrawStats};
use crate::statistics::{counter_rng_seed, OnlineVariance};
use crate::types::{ModelParameters, Position, PosteriorSampleSet};

/// Largest accepted maximum tree depth (2^30 leapfrog steps per draw).
const MAX_TREE_DEPTH_LIMIT: usize = 30;

/// Per-chain sampler settings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutsSettings {
    /// Adaptation iterations, discarded.
    pub warmup: usize,

    /// Retained draws.
    pub samples: usize,

    /// Target mean acceptance probability for step-size adaptation, in (0, 1).
    pub target_accept: f64,

    /// Maximum number of trajectory doublings.
    pub max_tree_depth: usize,

    /// Whether to adapt a diagonal mass matrix during warm-up.
    pub adapt_mass: bool,

    /// Starting step size; `None` runs the step-size search heuristic.
    pub initial_step_size: Option<f64>,
}

impl Default for NutsSettings {
    fn default() -> Self {
        Self {
            warmup: DEFAULT_WARMUP,
            samples: DEFAULT_SAMPLES,
            target_accept: DEFAULT_TARGET_ACCEPT,
            max_tree_depth: DEFAULT_MAX_TREE_DEPTH,
            adapt_mass: true,
            initial_step_size: None,
        }
    }
}

impl NutsSettings {
    /// Check every field is in range.
    pub fn validate(&self) -> Result<()> {
        if self.samples == 0 {
            return Err(Error::InvalidConfig {
                param: "samples",
                reason: "must be at least 1".into(),
            });
        }
        if !(self.target_accept > 0.0 && self.target_accept < 1.0) {
            return Err(Error::InvalidConfig {
                param: "target_accept",
                reason: format!("must be in (0, 1), got {}", self.target_accept),
            });
        }
        if self.max_tree_depth == 0 || self.max_tree_depth > MAX_TREE_DEPTH_LIMIT {
            return Err(Error::InvalidConfig {
                param: "max_tree_depth",
                reason: format!(
                    "must be in 1..={}, got {}",
                    MAX_TREE_DEPTH_LIMIT, self.max_tree_depth
                ),
            });
        }
        if let Some(eps) = self.initial_step_size {
            if !(eps.is_finite() && eps > 0.0) {
                return Err(Error::InvalidConfig {
                    param: "initial_step_size",
                    reason: format!("must be positive and finite, got {}", eps),
                });
            }
        }
        Ok(())
    }
}

fn is_cancelled(cancel: Option<&AtomicBool>) -> bool {
    cancel.is_some_and(|flag| flag.load(Ordering::Relaxed))
}

/// Run one chain from `init`.
///
/// Returns an error only for invalid settings or an initial position of the
/// wrong length or with non-finite values. The position layout is
/// `[w0, w_1, ..., w_M]`, so the model dimension must be at least 1.
pub fn sample_chain<M, R>(
    model: &M,
    init: &Position,
    settings: &NutsSettings,
    rng: &mut R,
    cancel: Option<&AtomicBool>,
) -> Result<ChainResult>
where
    M: LogDensity + ?Sized,
    R: Rng + ?Sized,
{
    settings.validate()?;
    let dim = model.dim();
    if dim == 0 {
        return Err(Error::InvalidConfig {
            param: "model dimension",
            reason: "position must include the intercept".into(),
        });
    }
    if init.len() != dim {
        return Err(Error::LengthMismatch {
            what: "initial position",
            expected: dim,
            actual: init.len(),
        });
    }
    ensure_finite("initial position", init.as_slice())?;

    let mut inv_mass = Position::from_element(dim, 1.0);
    let mut point = PhasePoint::at(model, init.clone());

    let mut step_size = match settings.initial_step_size {
        Some(eps) => eps,
        None => find_reasonable_step_size(model, &point, &inv_mass, 1.0, rng),
    };
    let mut dual = DualAveraging::new(step_size, settings.target_accept);
    let schedule = MassSchedule::new(if settings.adapt_mass { settings.warmup } else { 0 });
    let mut window = OnlineVariance::new(dim);
    let mut warmup_divergences = 0;
    let mut cancelled = false;

    for i in 0..settings.warmup {
        if is_cancelled(cancel) {
            cancelled = true;
            break;
        }

        let t = nuts::transition(model, &point, step_size, &inv_mass, settings.max_tree_depth, rng);
        point = t.point;
        if t.stats.divergent {
            warmup_divergences += 1;
        }
        dual.update(t.stats.accept_prob);
        step_size = dual.current_step_size();

        if schedule.collects(i) {
            window.update(&point.q);
        }
        if schedule.closes_window(i) {
            inv_mass = regularized_inv_mass(&window);
            window.reset();
            step_size = find_reasonable_step_size(model, &point, &inv_mass, step_size, rng);
            dual.restart(step_size);
        }
    }

    if settings.warmup > 0 && !cancelled {
        step_size = dual.final_step_size();
    }

    let mut samples = PosteriorSampleSet::new(dim - 1);
    let mut stats: Vec<DrawStats> = Vec::with_capacity(settings.samples);
    let mut divergences = 0;

    if !cancelled {
        for _ in 0..settings.samples {
            if is_cancelled(cancel) {
                cancelled = true;
                break;
            }

            let t = nuts::transition(model, &point, step_size, &inv_mass, settings.max_tree_depth, rng);
            point = t.point;
            if t.stats.divergent {
                divergences += 1;
            }
            samples.push(ModelParameters::from_position(&point.q));
            stats.push(t.stats);
        }
    }

    let accept_rate = if stats.is_empty() {
        0.0
    } else {
        stats.iter().map(|s| s.accept_prob).sum::<f64>() / stats.len() as f64
    };

    Ok(ChainResult {
        chain: 0,
        samples,
        stats,
        divergences,
        warmup_divergences,
        step_size,
        inv_mass: inv_mass.iter().copied().collect(),
        accept_rate,
        cancelled,
    })
}

/// Run chain `chain` of a multi-chain run with its own derived RNG stream.
///
/// The stream is seeded from `(seed, chain)`; the initial position is drawn
/// uniformly from `[-init_jitter, init_jitter]` in every coordinate. The
/// result depends only on the arguments, never on which thread runs it.
pub fn run_chain<M>(
    model: &M,
    settings: &NutsSettings,
    seed: u64,
    chain: usize,
    init_jitter: f64,
    cancel: Option<&AtomicBool>,
) -> Result<ChainResult>
where
    M: LogDensity + ?Sized,
{
    if !(init_jitter.is_finite() && init_jitter >= 0.0) {
        return Err(Error::InvalidConfig {
            param: "init_jitter",
            reason: format!("must be non-negative and finite, got {}", init_jitter),
        });
    }

    let mut rng = Xoshiro256PlusPlus::seed_from_u64(counter_rng_seed(seed, chain as u64));
    let init = Position::from_fn(model.dim(), |_, _| {
        if init_jitter > 0.0 {
            rng.random_range(-init_jitter..=init_jitter)
        } else {
            0.0
        }
    });

    let mut result = sample_chain(model, &init, settings, &mut rng, cancel)?;
    result.chain = chain;
    Ok(result)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::basis::{expand, BasisFamily};
    use crate::model::ModelSpec;
    use crate::statistics::OnlineStats;
    use alloc::vec;

    fn quick_settings() -> NutsSettings {
        NutsSettings {
            warmup: 300,
            samples: 500,
            ..NutsSettings::default()
        }
    }

    fn linear_model() -> ModelSpec {
        // t = 1 + 2x, noiseless
        let x: Vec<f64> = (0..10).map(|i| i as f64 / 9.0).collect();
        let t: Vec<f64> = x.iter().map(|&x| 1.0 + 2.0 * x).collect();
        let design = expand(&x, &BasisFamily::polynomial(1)).unwrap();
        ModelSpec::new(design, &t, 10.0, 0.1).unwrap()
    }

    #[test]
    fn test_settings_validation() {
        assert!(NutsSettings::default().validate().is_ok());
        let bad = [
            NutsSettings { samples: 0, ..NutsSettings::default() },
            NutsSettings { target_accept: 1.0, ..NutsSettings::default() },
            NutsSettings { target_accept: f64::NAN, ..NutsSettings::default() },
            NutsSettings { max_tree_depth: 0, ..NutsSettings::default() },
            NutsSettings { initial_step_size: Some(-1.0), ..NutsSettings::default() },
        ];
        for settings in bad {
            assert!(matches!(settings.validate(), Err(Error::InvalidConfig { .. })));
        }
    }

    #[test]
    fn test_recovers_linear_weights() {
        let model = linear_model();
        let result = run_chain(&model, &quick_settings(), 7, 0, 0.5, None).unwrap();

        assert_eq!(result.samples.len(), 500);
        assert_eq!(result.stats.len(), 500);
        assert!(!result.cancelled);

        let w0 = OnlineStats::from_slice(&result.samples.trace(0));
        let w1 = OnlineStats::from_slice(&result.samples.trace(1));
        assert!((w0.mean() - 1.0).abs() < 0.15, "w0 = {}", w0.mean());
        assert!((w1.mean() - 2.0).abs() < 0.25, "w1 = {}", w1.mean());
        assert!(result.step_size > 0.0 && result.step_size.is_finite());
    }

    #[test]
    fn test_intercept_only_tracks_target_mean() {
        let x = vec![0.0, 1.0, 2.0, 3.0];
        let t = vec![1.0, 2.0, 4.0, 5.0];
        let design = expand(&x, &BasisFamily::InterceptOnly).unwrap();
        let model = ModelSpec::new(design, &t, 100.0, 0.5).unwrap();

        let result = run_chain(&model, &quick_settings(), 3, 0, 0.5, None).unwrap();
        assert_eq!(result.samples.num_weights(), 0);
        assert!(result.samples.draws().iter().all(|d| d.w.is_empty()));
        let w0 = OnlineStats::from_slice(&result.samples.trace(0));
        assert!((w0.mean() - 3.0).abs() < 0.1, "w0 = {}", w0.mean());
    }

    #[test]
    fn test_same_seed_same_draws() {
        let model = linear_model();
        let settings = NutsSettings {
            warmup: 50,
            samples: 50,
            ..NutsSettings::default()
        };
        let a = run_chain(&model, &settings, 99, 1, 0.5, None).unwrap();
        let b = run_chain(&model, &settings, 99, 1, 0.5, None).unwrap();
        let c = run_chain(&model, &settings, 99, 2, 0.5, None).unwrap();
        assert_eq!(a, b);
        assert_ne!(a.samples, c.samples);
        assert_eq!(c.chain, 2);
    }

    #[test]
    fn test_cancelled_before_start_returns_empty() {
        let model = linear_model();
        let flag = AtomicBool::new(true);
        let result = run_chain(&model, &quick_settings(), 1, 0, 0.5, Some(&flag)).unwrap();
        assert!(result.cancelled);
        assert!(result.samples.is_empty());
        assert!(result.stats.is_empty());
        assert_eq!(result.accept_rate, 0.0);
    }

    #[test]
    fn test_rejects_bad_initial_position() {
        let model = linear_model();
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(0);
        let short = Position::zeros(1);
        assert!(matches!(
            sample_chain(&model, &short, &quick_settings(), &mut rng, None),
            Err(Error::LengthMismatch { .. })
        ));
        let nan = Position::from_element(2, f64::NAN);
        assert!(matches!(
            sample_chain(&model, &nan, &quick_settings(), &mut rng, None),
            Err(Error::NonFiniteInput { .. })
        ));
        assert!(run_chain(&model, &quick_settings(), 0, 0, -1.0, None).is_err());
    }

    #[test]
    fn test_no_warmup_keeps_initial_step_size() {
        let model = linear_model();
        let settings = NutsSettings {
            warmup: 0,
            samples: 10,
            initial_step_size: Some(0.05),
            ..NutsSettings::default()
        };
        let result = run_chain(&model, &settings, 4, 0, 0.0, None).unwrap();
        assert_eq!(result.step_size, 0.05);
        assert_eq!(result.inv_mass, vec![1.0, 1.0]);
        assert_eq!(result.samples.len(), 10);
    }
}
