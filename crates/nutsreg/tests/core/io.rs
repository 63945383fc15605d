//! CSV input and report output.

use std::io::Write;

use nutsreg::data::{load_csv, DataError};
use nutsreg::output::{format_predictive_table, format_report, to_json, to_json_pretty};
use nutsreg::{BasisFamily, Config, Inference, InferenceReport};

#[test]
fn csv_to_report_pipeline() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "x,t").unwrap();
    for i in 0..12 {
        let x = i as f64 / 11.0;
        writeln!(file, "{},{}", x, 1.0 + 0.5 * x).unwrap();
    }

    let dataset = load_csv(file.path()).unwrap();
    assert_eq!(dataset.len(), 12);

    let fitted = Inference::new(Config::quick().noise_scale(0.05))
        .fit(&dataset, &BasisFamily::polynomial(1))
        .unwrap();

    let json = to_json(fitted.report()).unwrap();
    let back: InferenceReport = serde_json::from_str(&json).unwrap();
    assert_eq!(back.family, fitted.report().family);
    assert_eq!(back.parameters.len(), 2);
    assert_eq!(back.quality, fitted.report().quality);
    assert!(to_json_pretty(fitted.report()).unwrap().contains("\"parameters\""));

    colored::control::set_override(false);
    let text = format_report(fitted.report());
    assert!(text.contains("polynomial, degree 1"));
    assert!(text.contains("12 observations"));

    let grid = [0.0, 0.5, 1.0];
    let summary = fitted.predictive_summary(&grid).unwrap();
    let band = fitted.predictive_band(&grid, 0.9).unwrap();
    for k in 0..grid.len() {
        assert!(band.lower[k] < summary.mean[k] && summary.mean[k] < band.upper[k]);
    }
    let table = format_predictive_table(&grid, &summary, Some(&band));
    assert_eq!(table.lines().count(), 4);
}

#[test]
fn malformed_csv_reports_line() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    writeln!(file, "0.0,1.0").unwrap();
    writeln!(file, "0.5,not-a-number").unwrap();

    match load_csv(file.path()) {
        Err(DataError::InvalidValue { line, .. }) => assert_eq!(line, 2),
        other => panic!("unexpected result: {other:?}"),
    }
}
