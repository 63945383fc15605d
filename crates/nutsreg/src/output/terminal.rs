//! Terminal output formatting with colors.

use colored::Colorize;

use nutsreg_core::{
    BasisFamily, CredibleBand, IssueSeverity, ParameterSummary, PredictiveSummary, RunQuality,
};

use crate::engine::InferenceReport;

fn describe_family(family: &BasisFamily) -> String {
    match family {
        BasisFamily::Polynomial { degree } => format!("polynomial, degree {}", degree),
        BasisFamily::Gaussian { centers, bandwidth } => {
            format!("gaussian, {} centers, bandwidth {}", centers.len(), bandwidth)
        }
        BasisFamily::InterceptOnly => "intercept only".to_string(),
    }
}

/// Format a report for human-readable terminal output.
///
/// ```text
/// ──────────────────────────────────────────────────────────────
///   nutsreg: polynomial, degree 3 (10 observations, seed 1853191283)
///
///   Chains:       4 × 1000 draws
///   Acceptance:   0.81
///   Divergences:  0
///   Quality:      reliable
///
///     param        mean      stddev       2.5%      97.5%     ess   r-hat
///     w0         0.0213      0.1034    -0.1801     0.2267    2890   1.001
///     ...
/// ──────────────────────────────────────────────────────────────
/// ```
pub fn format_report(report: &InferenceReport) -> String {
    let mut out = String::new();
    let sep = "\u{2500}".repeat(62);

    out.push_str(&sep);
    out.push('\n');
    out.push_str(&format!(
        "  {}: {} ({} observations, seed {})\n\n",
        "nutsreg".bold(),
        describe_family(&report.family),
        report.num_observations,
        report.seed
    ));

    let draws: Vec<usize> = report.chains.iter().map(|c| c.samples.len()).collect();
    let draws_text = match (draws.iter().min(), draws.iter().max()) {
        (Some(lo), Some(hi)) if lo == hi => format!("{} \u{00D7} {} draws", draws.len(), lo),
        _ => format!("{} chains, draws {:?}", draws.len(), draws),
    };
    out.push_str(&format!("  Chains:       {}\n", draws_text));
    out.push_str(&format!("  Acceptance:   {:.2}\n", report.accept_rate()));

    let divergences = report.total_divergences();
    let divergence_text = if divergences == 0 {
        "0".green().to_string()
    } else {
        divergences.to_string().yellow().to_string()
    };
    out.push_str(&format!("  Divergences:  {}\n", divergence_text));

    let quality_text = match report.quality {
        RunQuality::Reliable => report.quality.to_string().green(),
        RunQuality::Unreliable => report.quality.to_string().red().bold(),
    };
    out.push_str(&format!("  Quality:      {}\n", quality_text));

    if !report.parameters.is_empty() {
        out.push('\n');
        out.push_str(&format_parameter_table(&report.parameters));
    }

    if !report.issues.is_empty() {
        out.push_str(&format!("\n  {} Quality Issues\n", "\u{26A0}".yellow()));
        for issue in &report.issues {
            let code_str = format!("{}: ", issue.code);
            let code_str = match issue.code.severity() {
                IssueSeverity::ResultUndermining => code_str.red().bold(),
                IssueSeverity::Informational => code_str.bold(),
            };
            out.push_str(&format!("    \u{2022} {}{}\n", code_str, issue.message));
            out.push_str(&format!("      \u{2192} {}\n", issue.guidance.dimmed()));
        }
    }

    out.push_str(&sep);
    out.push('\n');
    out
}

/// Format per-parameter posterior summaries as an aligned table.
pub fn format_parameter_table(parameters: &[ParameterSummary]) -> String {
    let mut out = format!(
        "    {:<6} {:>10} {:>10} {:>10} {:>10} {:>7} {:>7}\n",
        "param", "mean", "stddev", "2.5%", "97.5%", "ess", "r-hat"
    );
    for p in parameters {
        let rhat = p.rhat.map_or_else(|| "-".to_string(), |r| format!("{:.3}", r));
        out.push_str(&format!(
            "    {:<6} {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>7.0} {:>7}\n",
            p.name, p.mean, p.stddev, p.lower, p.upper, p.ess, rhat
        ));
    }
    out
}

/// Format predictive mean, stddev and an optional band per query input.
///
/// Rows beyond the shortest of `x`, `summary` and `band` are dropped.
pub fn format_predictive_table(
    x: &[f64],
    summary: &PredictiveSummary,
    band: Option<&CredibleBand>,
) -> String {
    let mut out = match band {
        Some(b) => format!(
            "    {:>10} {:>10} {:>10} {:>10} {:>10}  ({:.0}% band)\n",
            "x",
            "mean",
            "stddev",
            "lower",
            "upper",
            b.level * 100.0
        ),
        None => format!("    {:>10} {:>10} {:>10}\n", "x", "mean", "stddev"),
    };
    for (k, ((&xk, &mean), &sd)) in x
        .iter()
        .zip(&summary.mean)
        .zip(&summary.stddev)
        .enumerate()
    {
        match band {
            Some(b) if k < b.lower.len() => out.push_str(&format!(
                "    {:>10.4} {:>10.4} {:>10.4} {:>10.4} {:>10.4}\n",
                xk, mean, sd, b.lower[k], b.upper[k]
            )),
            Some(_) => break,
            None => out.push_str(&format!("    {:>10.4} {:>10.4} {:>10.4}\n", xk, mean, sd)),
        }
    }
    out
}
