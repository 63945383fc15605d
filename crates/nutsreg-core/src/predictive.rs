//! Posterior predictive sampling at new inputs.
//!
//! Each posterior draw `(w0, w)` is pushed through the query design matrix
//! and observation noise is added independently per query point:
//! `y_ks = w0_s + w_s·φ_k + σ_obs · z_ks`, `z_ks ~ N(0, 1)`.

use alloc::format;
use alloc::vec::Vec;

use nalgebra::DMatrix;
use rand::{Rng, SeedableRng};
use rand_distr::{Distribution, StandardNormal};
use rand_xoshiro::Xoshiro256PlusPlus;
use serde::{Deserialize, Serialize};

#[cfg(feature = "parallel")]
use rayon::prelude::*;

use crate::error::{ensure_finite, Error, Result};
use crate::statistics::counter_rng_seed;
use crate::types::{DesignMatrix, ModelParameters, PosteriorSampleSet};

/// K × S matrix of predictive draws (query point × posterior draw).
///
/// Stored row-major so each query point's draws are contiguous.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PredictiveSampleSet {
    num_queries: usize,
    num_draws: usize,
    values: Vec<f64>,
}

impl PredictiveSampleSet {
    /// Build from per-query rows of equal length.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let num_queries = rows.len();
        let num_draws = rows.first().map_or(0, Vec::len);
        let mut values = Vec::with_capacity(num_queries * num_draws);
        for row in rows {
            if row.len() != num_draws {
                return Err(Error::LengthMismatch {
                    what: "predictive row",
                    expected: num_draws,
                    actual: row.len(),
                });
            }
            values.extend(row);
        }
        Ok(Self {
            num_queries,
            num_draws,
            values,
        })
    }

    /// Number of query points K.
    pub fn num_queries(&self) -> usize {
        self.num_queries
    }

    /// Number of draws S per query point.
    pub fn num_draws(&self) -> usize {
        self.num_draws
    }

    /// Draws for query point `k`.
    pub fn row(&self, k: usize) -> &[f64] {
        &self.values[k * self.num_draws..(k + 1) * self.num_draws]
    }

    /// Iterate over query rows in order.
    pub fn rows(&self) -> impl Iterator<Item = &[f64]> + '_ {
        (0..self.num_queries).map(move |k| self.row(k))
    }

    /// Draw `s` at query point `k`.
    pub fn get(&self, k: usize, s: usize) -> f64 {
        self.values[k * self.num_draws + s]
    }

    /// Dense K × S matrix copy.
    pub fn to_matrix(&self) -> DMatrix<f64> {
        DMatrix::from_row_slice(self.num_queries, self.num_draws, &self.values)
    }

    fn from_columns(num_queries: usize, columns: &[Vec<f64>]) -> Self {
        let num_draws = columns.len();
        let mut values = alloc::vec![0.0; num_queries * num_draws];
        for (s, column) in columns.iter().enumerate() {
            for (k, &v) in column.iter().enumerate() {
                values[k * num_draws + s] = v;
            }
        }
        Self {
            num_queries,
            num_draws,
            values,
        }
    }
}

fn validate_inputs(
    posterior: &PosteriorSampleSet,
    design_new: &DesignMatrix,
    noise_scale: f64,
) -> Result<()> {
    if design_new.ncols() != posterior.num_weights() {
        return Err(Error::LengthMismatch {
            what: "query design columns",
            expected: posterior.num_weights(),
            actual: design_new.ncols(),
        });
    }
    ensure_finite("query design", design_new.as_slice())?;
    if !(noise_scale.is_finite() && noise_scale >= 0.0) {
        return Err(Error::InvalidConfig {
            param: "noise_scale",
            reason: format!("must be non-negative and finite, got {}", noise_scale),
        });
    }
    Ok(())
}

/// Noise-free model means, one per query row, for one draw.
fn draw_means(draw: &ModelParameters, design_new: &DesignMatrix) -> Vec<f64> {
    let mut row = alloc::vec![0.0; design_new.ncols()];
    (0..design_new.nrows())
        .map(|k| {
            for (j, slot) in row.iter_mut().enumerate() {
                *slot = design_new[(k, j)];
            }
            draw.mean_at(&row)
        })
        .collect()
}

fn noisy_column<R: Rng + ?Sized>(
    draw: &ModelParameters,
    design_new: &DesignMatrix,
    noise_scale: f64,
    rng: &mut R,
) -> Vec<f64> {
    let mut column = draw_means(draw, design_new);
    for y in &mut column {
        let z: f64 = StandardNormal.sample(rng);
        *y += noise_scale * z;
    }
    column
}

/// Draw one predictive value per (posterior draw, query point).
///
/// Random numbers are consumed draw-major: for each posterior draw in order,
/// one standard normal per query row in order. With `noise_scale == 0` every
/// value equals the model mean exactly.
///
/// # Errors
///
/// Fails if the query design's column count differs from the posterior's
/// weight count, the design is non-finite, or `noise_scale` is negative.
pub fn predict<R: Rng + ?Sized>(
    posterior: &PosteriorSampleSet,
    design_new: &DesignMatrix,
    noise_scale: f64,
    rng: &mut R,
) -> Result<PredictiveSampleSet> {
    validate_inputs(posterior, design_new, noise_scale)?;
    let columns: Vec<Vec<f64>> = posterior
        .draws()
        .iter()
        .map(|draw| noisy_column(draw, design_new, noise_scale, &mut *rng))
        .collect();
    Ok(PredictiveSampleSet::from_columns(design_new.nrows(), &columns))
}

/// Like [`predict`], with an independent stream per posterior draw.
///
/// Draw `s` uses a generator seeded from `(seed, s)`, so the result is the
/// same whether or not the `parallel` feature spreads draws across threads.
pub fn predict_seeded(
    posterior: &PosteriorSampleSet,
    design_new: &DesignMatrix,
    noise_scale: f64,
    seed: u64,
) -> Result<PredictiveSampleSet> {
    validate_inputs(posterior, design_new, noise_scale)?;
    let draws = posterior.draws();

    #[cfg(feature = "parallel")]
    let columns: Vec<Vec<f64>> = draws
        .par_iter()
        .enumerate()
        .map(|(s, draw)| {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(counter_rng_seed(seed, s as u64));
            noisy_column(draw, design_new, noise_scale, &mut rng)
        })
        .collect();

    #[cfg(not(feature = "parallel"))]
    let columns: Vec<Vec<f64>> = draws
        .iter()
        .enumerate()
        .map(|(s, draw)| {
            let mut rng = Xoshiro256PlusPlus::seed_from_u64(counter_rng_seed(seed, s as u64));
            noisy_column(draw, design_new, noise_scale, &mut rng)
        })
        .collect();

    Ok(PredictiveSampleSet::from_columns(design_new.nrows(), &columns))
}

/// Noise-free posterior mean function `E[w0 + w·φ_k]` at each query row.
pub fn mean_function(
    posterior: &PosteriorSampleSet,
    design_new: &DesignMatrix,
) -> Result<Vec<f64>> {
    validate_inputs(posterior, design_new, 0.0)?;
    let mut sums = alloc::vec![0.0; design_new.nrows()];
    for draw in posterior.draws() {
        for (acc, m) in sums.iter_mut().zip(draw_means(draw, design_new)) {
            *acc += m;
        }
    }
    let n = posterior.len().max(1) as f64;
    Ok(sums.into_iter().map(|s| s / n).collect())
}
