//! Human-readable summaries of an estimator.
//!
//! Formatting lives here so the fitting code stays free of presentation
//! concerns and output changes stay localized.

use crate::estimator::SplineEstimator;

/// Values printed in full before a vector is abbreviated.
const MAX_LISTED: usize = 8;

/// Multi-line summary: configuration, then knots, coefficients and residual
/// when fitted.
pub fn format_summary(estimator: &SplineEstimator) -> String {
    let params = crate::estimator::Regressor::params(estimator);
    let mut out = String::new();

    out.push_str(&format!("=== {params} ===\n"));
    let Ok(curve) = estimator.curve() else {
        out.push_str("Status: not fitted\n");
        return out;
    };

    let (lo, hi) = curve.bounds();
    out.push_str("Status: fitted\n");
    out.push_str(&format!("Interval: [{lo:.6}, {hi:.6}]\n"));
    out.push_str(&format!(
        "Knots (n={}): {}\n",
        curve.knots().len(),
        fmt_vec(curve.knots())
    ));
    out.push_str(&format!(
        "Coefficients (n={}): {}\n",
        curve.coefficients().len(),
        fmt_vec(curve.coefficients())
    ));
    out.push_str(&format!("Residual fp: {:.6e}\n", curve.residual()));
    out
}

fn fmt_vec(v: &[f64]) -> String {
    let mut parts: Vec<String> = v.iter().take(MAX_LISTED).map(|x| format!("{x:.6}")).collect();
    if v.len() > MAX_LISTED {
        parts.push(format!("... ({} more)", v.len() - MAX_LISTED));
    }
    format!("[{}]", parts.join(", "))
}
