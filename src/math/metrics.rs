//! Regression scoring.

use crate::error::{Result, SplineError};

/// Coefficient of determination `R² = 1 - SS_res / SS_tot`.
///
/// `sample_weight`, when given, weights both sums (and the mean of `y_true`).
///
/// When `y_true` has zero variance R² is undefined; the score is forced to a
/// finite value: `1.0` if the predictions are exact, `0.0` otherwise.
///
/// # Errors
/// `InvalidInput` on length mismatch, fewer than two samples, or negative /
/// non-finite weights.
pub fn r2_score(y_true: &[f64], y_pred: &[f64], sample_weight: Option<&[f64]>) -> Result<f64> {
    if y_true.len() != y_pred.len() {
        return Err(SplineError::invalid(format!(
            "y_true and y_pred must have the same length (got {} and {})",
            y_true.len(),
            y_pred.len()
        )));
    }
    if y_true.len() < 2 {
        return Err(SplineError::invalid(
            "R² score is not well-defined with fewer than two samples",
        ));
    }
    if let Some(w) = sample_weight {
        if w.len() != y_true.len() {
            return Err(SplineError::invalid(format!(
                "sample_weight must have the same length as y_true (got {} and {})",
                w.len(),
                y_true.len()
            )));
        }
        if w.iter().any(|v| !v.is_finite() || *v < 0.0) {
            return Err(SplineError::invalid("sample_weight must be finite and non-negative"));
        }
    }

    let weight = |i: usize| sample_weight.map_or(1.0, |w| w[i]);

    let w_sum: f64 = (0..y_true.len()).map(weight).sum();
    if w_sum <= 0.0 {
        return Err(SplineError::invalid("sample_weight must not be all zero"));
    }
    let mean = y_true.iter().enumerate().map(|(i, y)| weight(i) * y).sum::<f64>() / w_sum;

    let mut ss_res = 0.0;
    let mut ss_tot = 0.0;
    for (i, (&yt, &yp)) in y_true.iter().zip(y_pred).enumerate() {
        let wi = weight(i);
        ss_res += wi * (yt - yp) * (yt - yp);
        ss_tot += wi * (yt - mean) * (yt - mean);
    }

    if ss_tot == 0.0 {
        return Ok(if ss_res == 0.0 { 1.0 } else { 0.0 });
    }
    Ok(1.0 - ss_res / ss_tot)
}
