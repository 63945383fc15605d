//! Type 2 quantiles (inverse empirical CDF with averaging at discontinuities).
//!
//! For a sorted sample x of size n at probability p:
//! ```text
//! h = n * p + 0.5
//! q = (x[floor(h)] + x[ceil(h)]) / 2
//! ```
//!
//! Used for credible intervals of posterior parameters and predictive bands.
//! Input must be finite; this is checked with debug assertions only.
//!
//! Hyndman, R. J. & Fan, Y. (1996). "Sample quantiles in statistical packages."

use crate::math;

#[inline]
fn type2_indices(n: usize, p: f64) -> (usize, usize) {
    let h = n as f64 * p + 0.5;
    let floor_idx = (math::floor(h) as usize).saturating_sub(1).min(n - 1);
    let ceil_idx = (math::ceil(h) as usize).saturating_sub(1).min(n - 1);
    (floor_idx, ceil_idx)
}

/// Quantile of an unsorted slice.
///
/// Uses `select_nth_unstable_by` for O(n) expected time; the slice is
/// partially reordered as a side effect.
///
/// # Panics
///
/// Panics if `data` is empty or `p` is outside [0, 1].
pub fn compute_quantile(data: &mut [f64], p: f64) -> f64 {
    assert!(!data.is_empty(), "Cannot compute quantile of empty slice");
    assert!(
        (0.0..=1.0).contains(&p),
        "Quantile probability must be in [0, 1]"
    );
    debug_assert!(data.iter().all(|x| x.is_finite()));

    let n = data.len();
    if n == 1 {
        return data[0];
    }

    let (floor_idx, ceil_idx) = type2_indices(n, p);
    let cmp = |a: &f64, b: &f64| a.total_cmp(b);

    if floor_idx == ceil_idx {
        let (_, mid, _) = data.select_nth_unstable_by(floor_idx, cmp);
        return *mid;
    }

    let (_, mid, _) = data.select_nth_unstable_by(ceil_idx, cmp);
    let ceil_val = *mid;
    let (_, mid, _) = data[..ceil_idx].select_nth_unstable_by(floor_idx, cmp);
    (*mid + ceil_val) / 2.0
}

/// Quantile of an already sorted slice.
///
/// # Panics
///
/// Panics if `sorted` is empty or `p` is outside [0, 1].
pub fn compute_quantile_sorted(sorted: &[f64], p: f64) -> f64 {
    assert!(!sorted.is_empty(), "Cannot compute quantile of empty slice");
    assert!(
        (0.0..=1.0).contains(&p),
        "Quantile probability must be in [0, 1]"
    );
    let (floor_idx, ceil_idx) = type2_indices(sorted.len(), p);
    (sorted[floor_idx] + sorted[ceil_idx]) / 2.0
}
