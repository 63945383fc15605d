//! Type aliases and common types.

use alloc::vec::Vec;

use nalgebra::{DMatrix, DVector};
use serde::{Deserialize, Serialize};

use crate::error::{ensure_finite, Error, Result};

/// N × M matrix of basis functions evaluated at each input.
///
/// Never contains a bias column; the intercept is modelled separately as `w0`.
pub type DesignMatrix = DMatrix<f64>;

/// Flat sampler position `[w0, w_1, ..., w_M]`.
pub type Position = DVector<f64>;

/// Ordered observations `(x_i, t_i)`.
///
/// Immutable once constructed; both sequences are finite and equally long.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dataset {
    x: Vec<f64>,
    t: Vec<f64>,
}

impl Dataset {
    /// Build a dataset from equal-length input and target sequences.
    pub fn new(x: Vec<f64>, t: Vec<f64>) -> Result<Self> {
        if x.is_empty() {
            return Err(Error::EmptyDataset);
        }
        if x.len() != t.len() {
            return Err(Error::LengthMismatch {
                what: "targets",
                expected: x.len(),
                actual: t.len(),
            });
        }
        ensure_finite("inputs", &x)?;
        ensure_finite("targets", &t)?;
        Ok(Self { x, t })
    }

    /// Inputs `x_i`.
    pub fn inputs(&self) -> &[f64] {
        &self.x
    }

    /// Targets `t_i`.
    pub fn targets(&self) -> &[f64] {
        &self.t
    }

    /// Number of observations.
    pub fn len(&self) -> usize {
        self.x.len()
    }

    /// Always false; a dataset holds at least one observation.
    pub fn is_empty(&self) -> bool {
        self.x.is_empty()
    }
}

/// One draw of the regression weights.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ModelParameters {
    /// Intercept.
    pub w0: f64,
    /// Basis weights, one per design-matrix column.
    pub w: Vec<f64>,
}

impl ModelParameters {
    /// Unpack a flat sampler position.
    pub fn from_position(q: &Position) -> Self {
        Self {
            w0: q[0],
            w: q.iter().skip(1).copied().collect(),
        }
    }

    /// Pack into a flat sampler position.
    pub fn to_position(&self) -> Position {
        let mut q = Position::zeros(self.w.len() + 1);
        q[0] = self.w0;
        for (j, &wj) in self.w.iter().enumerate() {
            q[j + 1] = wj;
        }
        q
    }

    /// Model mean `w0 + w·φ` for one design row.
    pub fn mean_at(&self, row: &[f64]) -> f64 {
        self.w0 + self.w.iter().zip(row).map(|(w, phi)| w * phi).sum::<f64>()
    }
}

/// Retained posterior draws from one chain (or several merged chains).
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PosteriorSampleSet {
    num_weights: usize,
    draws: Vec<ModelParameters>,
}

impl PosteriorSampleSet {
    /// Empty set for a model with `num_weights` basis weights.
    pub fn new(num_weights: usize) -> Self {
        Self {
            num_weights,
            draws: Vec::new(),
        }
    }

    /// Build from existing draws, checking every draw has `num_weights` weights.
    pub fn from_draws(num_weights: usize, draws: Vec<ModelParameters>) -> Result<Self> {
        if let Some(bad) = draws.iter().find(|d| d.w.len() != num_weights) {
            return Err(Error::LengthMismatch {
                what: "posterior draw weights",
                expected: num_weights,
                actual: bad.w.len(),
            });
        }
        Ok(Self { num_weights, draws })
    }

    pub(crate) fn push(&mut self, draw: ModelParameters) {
        debug_assert_eq!(draw.w.len(), self.num_weights);
        self.draws.push(draw);
    }

    /// Number of basis weights M.
    pub fn num_weights(&self) -> usize {
        self.num_weights
    }

    /// Number of draws S.
    pub fn len(&self) -> usize {
        self.draws.len()
    }

    /// True if no draws were retained.
    pub fn is_empty(&self) -> bool {
        self.draws.is_empty()
    }

    /// Draws in iteration order.
    pub fn draws(&self) -> &[ModelParameters] {
        &self.draws
    }

    /// Trace of parameter `index` where 0 is `w0` and `j` is `w_j`.
    ///
    /// # Panics
    ///
    /// Panics if `index` exceeds [`num_weights`](Self::num_weights).
    pub fn trace(&self, index: usize) -> Vec<f64> {
        assert!(
            index <= self.num_weights,
            "parameter index {} out of range for {} basis weights",
            index,
            self.num_weights
        );
        self.draws
            .iter()
            .map(|d| if index == 0 { d.w0 } else { d.w[index - 1] })
            .collect()
    }

    /// Table view: one row per iteration, columns `w0, w_1..w_M`.
    pub fn to_table(&self) -> Vec<Vec<f64>> {
        self.draws
            .iter()
            .map(|d| {
                let mut row = Vec::with_capacity(self.num_weights + 1);
                row.push(d.w0);
                row.extend_from_slice(&d.w);
                row
            })
            .collect()
    }

    /// Concatenate sets in order. All sets must share the weight count.
    pub fn concat(sets: &[&PosteriorSampleSet]) -> Result<Self> {
        let num_weights = sets.first().map_or(0, |s| s.num_weights);
        let mut draws = Vec::with_capacity(sets.iter().map(|s| s.len()).sum());
        for set in sets {
            if set.num_weights != num_weights {
                return Err(Error::LengthMismatch {
                    what: "posterior weight count",
                    expected: num_weights,
                    actual: set.num_weights,
                });
            }
            draws.extend_from_slice(&set.draws);
        }
        Ok(Self { num_weights, draws })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloc::vec;

    #[test]
    fn test_dataset_validation() {
        assert!(Dataset::new(vec![0.0, 1.0], vec![1.0, 2.0]).is_ok());
        assert_eq!(Dataset::new(vec![], vec![]), Err(Error::EmptyDataset));
        assert_eq!(
            Dataset::new(vec![0.0, 1.0], vec![1.0]),
            Err(Error::LengthMismatch {
                what: "targets",
                expected: 2,
                actual: 1
            })
        );
        assert!(matches!(
            Dataset::new(vec![0.0, f64::NAN], vec![1.0, 2.0]),
            Err(Error::NonFiniteInput { what: "inputs", index: 1 })
        ));
    }

    #[test]
    fn test_position_roundtrip_without_weights() {
        let params = ModelParameters { w0: 1.5, w: vec![] };
        let q = params.to_position();
        assert_eq!(q.len(), 1);
        assert_eq!(ModelParameters::from_position(&q), params);
        assert_eq!(params.mean_at(&[]), 1.5);
    }

    #[test]
    fn test_sample_set_table_and_trace() {
        let mut set = PosteriorSampleSet::new(2);
        set.push(ModelParameters { w0: 1.0, w: vec![2.0, 3.0] });
        set.push(ModelParameters { w0: 4.0, w: vec![5.0, 6.0] });

        assert_eq!(set.to_table(), vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]]);
        assert_eq!(set.trace(0), vec![1.0, 4.0]);
        assert_eq!(set.trace(2), vec![3.0, 6.0]);
    }

    #[test]
    #[should_panic(expected = "parameter index 3 out of range")]
    fn test_trace_past_last_weight_panics() {
        PosteriorSampleSet::new(2).trace(3);
    }

    #[test]
    fn test_from_draws_rejects_ragged_weights() {
        let draws = vec![
            ModelParameters { w0: 0.0, w: vec![1.0] },
            ModelParameters { w0: 0.0, w: vec![1.0, 2.0] },
        ];
        assert!(PosteriorSampleSet::from_draws(1, draws).is_err());
    }

    #[test]
    fn test_concat_preserves_order() {
        let a = PosteriorSampleSet::from_draws(0, vec![ModelParameters { w0: 1.0, w: vec![] }])
            .unwrap();
        let b = PosteriorSampleSet::from_draws(0, vec![ModelParameters { w0: 2.0, w: vec![] }])
            .unwrap();
        let merged = PosteriorSampleSet::concat(&[&a, &b]).unwrap();
        assert_eq!(merged.trace(0), vec![1.0, 2.0]);
    }
}
