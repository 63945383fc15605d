//! Effective sample size and split-R̂ for MCMC traces.

use alloc::vec::Vec;

use super::OnlineStats;
use crate::math;

/// Lag after which autocorrelation terms are no longer summed.
const MAX_ESS_LAG: usize = 50;

/// Autocorrelation cutoff below which the sum stops.
const ESS_RHO_CUTOFF: f64 = 0.05;

/// Lag-k autocorrelation of a trace given its mean and (biased) variance.
pub fn autocorrelation(chain: &[f64], k: usize, mean: f64, var: f64) -> f64 {
    let n = chain.len();
    if k >= n || var <= 0.0 {
        return 0.0;
    }

    let cov: f64 = (0..(n - k))
        .map(|i| (chain[i] - mean) * (chain[i + k] - mean))
        .sum::<f64>()
        / (n - k) as f64;

    cov / var
}

/// Effective sample size of a single trace.
///
/// `n / (1 + 2 Σ ρ_k)`, summing autocorrelations until one drops below 0.05
/// or the lag reaches `min(50, n/2)`. A constant trace counts as independent.
/// Negative lag-1 correlation (antithetic draws) can push the estimate above `n`.
pub fn effective_sample_size(chain: &[f64]) -> f64 {
    let n = chain.len();
    if n < 2 {
        return n as f64;
    }

    let mean: f64 = chain.iter().sum::<f64>() / n as f64;
    let var: f64 = chain.iter().map(|&x| math::sq(x - mean)).sum::<f64>() / n as f64;

    if var < 1e-12 {
        return n as f64;
    }

    let mut sum_rho = 0.0;
    for k in 1..=MAX_ESS_LAG.min(n / 2) {
        let rho_k = autocorrelation(chain, k, mean, var);
        if rho_k < ESS_RHO_CUTOFF {
            break;
        }
        sum_rho += rho_k;
    }

    n as f64 / (1.0 + 2.0 * sum_rho)
}

/// Split-R̂ (Gelman et al.) across chains for one parameter.
///
/// Each chain is cut into halves and the between/within variance ratio of
/// the resulting 2·C half-chains is returned. Returns `None` if fewer than
/// four draws per chain are available, and `Some(1.0)` when every half-chain
/// is constant.
pub fn split_rhat(chains: &[&[f64]]) -> Option<f64> {
    let min_len = chains.iter().map(|c| c.len()).min()?;
    let half = min_len / 2;
    if half < 2 {
        return None;
    }

    let halves: Vec<OnlineStats> = chains
        .iter()
        .flat_map(|c| [&c[..half], &c[half..2 * half]])
        .map(OnlineStats::from_slice)
        .collect();

    let m = halves.len() as f64;
    let n = half as f64;

    let w = halves.iter().map(OnlineStats::variance).sum::<f64>() / m;
    let grand = halves.iter().map(OnlineStats::mean).sum::<f64>() / m;
    let b = n / (m - 1.0)
        * halves
            .iter()
            .map(|s| math::sq(s.mean() - grand))
            .sum::<f64>();

    if w <= 0.0 {
        return Some(if b <= 0.0 { 1.0 } else { f64::INFINITY });
    }

    let var_plus = (n - 1.0) / n * w + b / n;
    Some(math::sqrt(var_plus / w))
}
