//! Recovery of known weights from synthetic data.

use nutsreg::{BasisFamily, Config, Dataset, Inference, IssueCode};
use rand::SeedableRng;
use rand_distr::{Distribution, Normal};
use rand_xoshiro::Xoshiro256PlusPlus;

// ============================================================================
// Test helpers
// ============================================================================

const NOISE: f64 = 0.1;

/// `t = w0 + Σ w_j x^j + ε` on an even grid over [-1, 1].
fn polynomial_data(w0: f64, w: &[f64], n: usize, seed: u64) -> Dataset {
    let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
    let noise = Normal::new(0.0, NOISE).unwrap();
    let x: Vec<f64> = (0..n).map(|i| -1.0 + 2.0 * i as f64 / (n - 1) as f64).collect();
    let t = x
        .iter()
        .map(|&x| {
            let mean = w0
                + w.iter()
                    .enumerate()
                    .map(|(j, wj)| wj * x.powi(j as i32 + 1))
                    .sum::<f64>();
            mean + noise.sample(&mut rng)
        })
        .collect();
    Dataset::new(x, t).unwrap()
}

fn recovery_config(seed: u64) -> Config {
    Config::quick().seed(seed).noise_scale(NOISE)
}

// ============================================================================
// Tests
// ============================================================================

#[test]
fn polynomial_weights_within_two_posterior_sd() {
    let w0_true = 0.5;
    let w_true = [-1.0, 2.0];
    let mut checks = 0;
    let mut hits = 0;

    for trial in 0..30u64 {
        let dataset = polynomial_data(w0_true, &w_true, 60, 100 + trial);
        let fitted = Inference::new(recovery_config(trial))
            .fit(&dataset, &BasisFamily::polynomial(2))
            .unwrap();

        let params = &fitted.report().parameters;
        assert_eq!(params.len(), 3);
        let truth = [w0_true, w_true[0], w_true[1]];
        for (p, &target) in params.iter().zip(&truth) {
            checks += 1;
            if (p.mean - target).abs() <= 2.0 * p.stddev {
                hits += 1;
            }
        }
    }

    assert!(
        hits * 10 >= checks * 9,
        "only {hits} of {checks} parameters within 2 sd"
    );
}

#[test]
fn gaussian_basis_fits_sinusoid() {
    let n = 50;
    let x: Vec<f64> = (0..n).map(|i| i as f64 / (n - 1) as f64).collect();
    let t: Vec<f64> = x
        .iter()
        .map(|&x| (2.0 * std::f64::consts::PI * x).sin())
        .collect();
    let dataset = Dataset::new(x, t).unwrap();
    let family = BasisFamily::gaussian_grid(0.0, 1.0, 7, 0.15);

    let fitted = Inference::new(recovery_config(11))
        .fit(&dataset, &family)
        .unwrap();

    let grid = [0.25, 0.5, 0.75];
    let mean = fitted.mean_function(&grid).unwrap();
    assert!((mean[0] - 1.0).abs() < 0.15, "mean at 0.25 = {}", mean[0]);
    assert!(mean[1].abs() < 0.15, "mean at 0.5 = {}", mean[1]);
    assert!((mean[2] + 1.0).abs() < 0.15, "mean at 0.75 = {}", mean[2]);

    let summary = fitted.predictive_summary(&grid).unwrap();
    for sd in &summary.stddev {
        // Predictive spread is at least the observation noise.
        assert!(*sd > 0.8 * NOISE && *sd < 0.5, "predictive sd = {sd}");
    }
}

#[test]
fn well_posed_fit_is_reliable() {
    let dataset = polynomial_data(1.0, &[0.5], 40, 3);
    let fitted = nutsreg::require_reliable!(Inference::new(recovery_config(5))
        .fit(&dataset, &BasisFamily::polynomial(1))
        .unwrap());
    let report = fitted.report();

    assert!(report
        .issues
        .iter()
        .all(|i| i.code != IssueCode::ExcessiveDivergences && i.code != IssueCode::HighRhat));
    assert!(report.accept_rate() > 0.5);
    for chain in &report.chains {
        assert!(chain.step_size > 0.0);
        assert_eq!(chain.samples.len(), 500);
    }
}

#[test]
fn default_config_healthy_fit_raises_no_acceptance_issue() {
    let x: Vec<f64> = (0..10).map(|i| i as f64 / 9.0).collect();
    let t: Vec<f64> = x
        .iter()
        .map(|&x| (2.0 * std::f64::consts::PI * x).sin())
        .collect();
    let dataset = Dataset::new(x, t).unwrap();
    let families = [
        BasisFamily::InterceptOnly,
        BasisFamily::polynomial(1),
        BasisFamily::polynomial(3),
    ];

    for family in &families {
        for seed in 0..3u64 {
            let fitted = Inference::new(Config::default().seed(seed))
                .fit(&dataset, family)
                .unwrap();
            let report = fitted.report();
            assert_eq!(report.total_divergences(), 0, "{family:?} seed {seed}");
            assert!(
                report
                    .issues
                    .iter()
                    .all(|i| i.code != IssueCode::AcceptanceOffTarget),
                "{family:?} seed {seed}: {:?}",
                report.issues
            );
        }
    }
}
