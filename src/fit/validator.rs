//! Input validation for the spline solver.
//!
//! Checks run before any numerical work and stop at the first violation.
//! They are ordered from cheap (lengths, parameters) to linear scans over the
//! data.

use crate::domain::{MAX_DEGREE, MIN_DEGREE};
use crate::error::{Result, SplineError};

/// Validate degree, smoothing factor and training data for one fit.
pub fn validate_fit_inputs(
    x: &[f64],
    y: &[f64],
    w: Option<&[f64]>,
    degree: usize,
    smoothing: Option<f64>,
) -> Result<()> {
    if !(MIN_DEGREE..=MAX_DEGREE).contains(&degree) {
        return Err(SplineError::invalid(format!(
            "degree must satisfy {MIN_DEGREE} <= k <= {MAX_DEGREE}, got {degree}"
        )));
    }
    if let Some(s) = smoothing {
        if !(s.is_finite() && s >= 0.0) {
            return Err(SplineError::invalid(format!(
                "smoothing factor must be finite and non-negative, got {s}"
            )));
        }
    }

    if x.len() != y.len() {
        return Err(SplineError::invalid(format!(
            "x and y must have the same length (got {} and {})",
            x.len(),
            y.len()
        )));
    }
    if x.len() <= degree {
        return Err(SplineError::invalid(format!(
            "a degree {degree} spline needs at least {} points, got {}",
            degree + 1,
            x.len()
        )));
    }

    if let Some(w) = w {
        if w.len() != x.len() {
            return Err(SplineError::invalid(format!(
                "sample_weight must have the same length as x (got {} and {})",
                w.len(),
                x.len()
            )));
        }
        if let Some(i) = w.iter().position(|v| !v.is_finite() || *v < 0.0) {
            return Err(SplineError::invalid(format!(
                "sample_weight must be finite and non-negative (index {i} is {})",
                w[i]
            )));
        }
        if w.iter().all(|v| *v == 0.0) {
            return Err(SplineError::invalid("sample_weight must not be all zero"));
        }
    }

    if let Some(i) = x.iter().position(|v| !v.is_finite()) {
        return Err(SplineError::invalid(format!("x[{i}] is not finite")));
    }
    if let Some(i) = y.iter().position(|v| !v.is_finite()) {
        return Err(SplineError::invalid(format!("y[{i}] is not finite")));
    }
    if let Some(i) = x.windows(2).position(|pair| pair[1] <= pair[0]) {
        return Err(SplineError::invalid(format!(
            "x must be strictly increasing (x[{}] = {} is followed by x[{}] = {})",
            i,
            x[i],
            i + 1,
            x[i + 1]
        )));
    }

    Ok(())
}
