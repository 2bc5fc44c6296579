//! Synthetic training samples.
//!
//! Deterministic (seeded) noisy observations of a known function, used to
//! exercise the estimator in tests and demonstrations.

use rand::prelude::*;
use rand::rngs::StdRng;
use rand_distr::Normal;

use crate::error::{Result, SplineError};

/// A set of one-dimensional observations.
#[derive(Debug, Clone, PartialEq)]
pub struct Sample {
    pub x: Vec<f64>,
    pub y: Vec<f64>,
}

/// `steps` evenly spaced points between `min` and `max` (inclusive).
pub fn linspace(min: f64, max: f64, steps: usize) -> Result<Vec<f64>> {
    if !(min.is_finite() && max.is_finite() && max > min) {
        return Err(SplineError::invalid(format!(
            "invalid range: min={min}, max={max} (must be finite and max>min)"
        )));
    }
    if steps < 2 {
        return Err(SplineError::invalid("linspace needs at least 2 steps"));
    }

    let step = (max - min) / (steps as f64 - 1.0);
    let mut out: Vec<f64> = (0..steps).map(|i| min + step * i as f64).collect();
    // Pin the endpoint so it does not drift by rounding.
    out[steps - 1] = max;
    Ok(out)
}

/// Observe `f` at `x` with additive Gaussian noise of standard deviation `sigma`.
///
/// The same `seed` always yields the same sample.
pub fn noisy_samples(x: &[f64], f: impl Fn(f64) -> f64, sigma: f64, seed: u64) -> Result<Sample> {
    let normal = Normal::new(0.0, sigma)
        .map_err(|e| SplineError::invalid(format!("noise distribution error: {e}")))?;
    let mut rng = StdRng::seed_from_u64(seed);

    let y = x.iter().map(|&xi| f(xi) + normal.sample(&mut rng)).collect();
    Ok(Sample { x: x.to_vec(), y })
}
