//! Intercept-only models and noiseless predictive checks.

use nutsreg::{BasisFamily, Config, Dataset, Inference, ModelParameters, PosteriorSampleSet};
use nutsreg_core::{expand, mean_function, predict, DesignMatrix};
use proptest::prelude::*;
use rand::SeedableRng;
use rand_xoshiro::Xoshiro256PlusPlus;

#[test]
fn intercept_only_posterior_mean_is_target_mean() {
    let t = vec![2.0, 2.5, 3.1, 1.9, 2.6, 2.2, 2.9, 2.4];
    let x: Vec<f64> = (0..t.len()).map(|i| i as f64).collect();
    let target_mean = t.iter().sum::<f64>() / t.len() as f64;
    let dataset = Dataset::new(x, t).unwrap();

    let config = Config::quick().prior_scale(1_000.0).noise_scale(0.3);
    let fitted = Inference::new(config)
        .fit(&dataset, &BasisFamily::InterceptOnly)
        .unwrap();

    assert_eq!(fitted.posterior().num_weights(), 0);
    assert!(fitted.posterior().draws().iter().all(|d| d.w.is_empty()));
    let w0 = &fitted.report().parameters[0];
    assert_eq!(w0.name, "w0");
    assert!(
        (w0.mean - target_mean).abs() < 0.05,
        "w0 mean {} vs target mean {}",
        w0.mean,
        target_mean
    );
    // Posterior sd of the mean: σ / √N
    assert!((w0.stddev - 0.3 / 8f64.sqrt()).abs() < 0.03);

    let predictive = fitted.predict(&[0.0, 100.0]).unwrap();
    assert_eq!(predictive.num_queries(), 2);
}

#[test]
fn noiseless_prediction_from_single_draw_is_exact() {
    let posterior =
        PosteriorSampleSet::from_draws(1, vec![ModelParameters { w0: 1.0, w: vec![2.0] }])
            .unwrap();
    let design = DesignMatrix::from_row_slice(2, 1, &[0.0, 1.0]);

    for seed in 0..5 {
        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let set = predict(&posterior, &design, 0.0, &mut rng).unwrap();
        assert_eq!(set.row(0), &[1.0]);
        assert_eq!(set.row(1), &[3.0]);
    }
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn noiseless_prediction_equals_mean_function(
        w0 in -5.0f64..5.0,
        w in prop::collection::vec(-3.0f64..3.0, 1..4),
        x in prop::collection::vec(-2.0f64..2.0, 1..6),
        seed in any::<u64>(),
    ) {
        let family = BasisFamily::polynomial(w.len());
        let design = expand(&x, &family).unwrap();
        let posterior = PosteriorSampleSet::from_draws(w.len(), vec![ModelParameters { w0, w }]).unwrap();

        let mut rng = Xoshiro256PlusPlus::seed_from_u64(seed);
        let set = predict(&posterior, &design, 0.0, &mut rng).unwrap();
        let means = mean_function(&posterior, &design).unwrap();

        for (k, m) in means.iter().enumerate() {
            prop_assert_eq!(set.get(k, 0), *m);
        }
    }
}
