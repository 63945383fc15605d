//! Cooperative cancellation between iterations.

use std::thread;
use std::time::{Duration, Instant};

use nutsreg::{BasisFamily, CancelToken, Config, Dataset, Inference, IssueCode};

fn dataset() -> Dataset {
    let x: Vec<f64> = (0..30).map(|i| i as f64 / 29.0).collect();
    let t = x.iter().map(|&x| 2.0 * x - 1.0).collect();
    Dataset::new(x, t).unwrap()
}

#[test]
fn cancel_during_run_returns_partial_result() {
    // Far more iterations than could finish before the cancel lands.
    let config = Config::quick().warmup(10).samples(1_000_000).chains(2);
    let inference = Inference::new(config);
    let token = inference.cancel_token();

    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(200));
        token.cancel();
    });

    let start = Instant::now();
    let fitted = inference
        .fit(&dataset(), &BasisFamily::polynomial(1))
        .unwrap();
    canceller.join().unwrap();

    assert!(start.elapsed() < Duration::from_secs(60));
    let report = fitted.report();
    assert!(report.chains.iter().all(|c| c.cancelled));
    assert!(report.chains.iter().all(|c| c.samples.len() < 1_000_000));
    assert!(report.chains.iter().all(|c| c.samples.len() == c.stats.len()));
    assert_eq!(report.issues[0].code, IssueCode::Cancelled);
    assert!(!report.is_reliable());
}

#[test]
fn cancelled_before_start_keeps_no_draws() {
    let inference = Inference::new(Config::quick());
    inference.cancel_token().cancel();
    let fitted = inference
        .fit(&dataset(), &BasisFamily::polynomial(1))
        .unwrap();

    assert!(fitted.posterior().is_empty());
    assert_eq!(fitted.report().chains.len(), 2);
}

#[test]
fn caller_token_cancels_from_another_thread() {
    let token = CancelToken::new();
    let inference = Inference::new(Config::quick().warmup(10).samples(1_000_000).chains(2))
        .with_cancel_token(token.clone());

    let canceller = thread::spawn(move || {
        thread::sleep(Duration::from_millis(100));
        token.cancel();
        token
    });
    let fitted = inference
        .fit(&dataset(), &BasisFamily::polynomial(1))
        .unwrap();
    let token = canceller.join().unwrap();

    assert!(token.is_cancelled());
    assert!(fitted.report().chains.iter().all(|c| c.cancelled));
}
