//! Estimator configuration.
//!
//! `SplineParams` is the only configuration surface of the crate. It is kept
//! serializable so pipeline tooling can carry it inside its own config files
//! (a grid-search definition, a saved experiment, ...).

use std::fmt;

use serde::{Deserialize, Serialize};

/// Smallest spline degree the solver accepts.
pub const MIN_DEGREE: usize = 1;

/// Largest spline degree the solver accepts.
pub const MAX_DEGREE: usize = 5;

/// Default spline degree (cubic).
pub const DEFAULT_DEGREE: usize = 3;

/// Hyperparameters of a smoothing spline.
///
/// Values are stored as given; range checks happen when the estimator is
/// fitted.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct SplineParams {
    /// Polynomial degree `k` of each spline segment.
    pub degree: usize,

    /// Smoothing factor `s`.
    ///
    /// The number of knots is increased until
    /// `Σ (w_i (y_i - spl(x_i)))² <= s`.
    ///
    /// - `None`: use the number of samples, which is a good value when `1/w_i`
    ///   estimates the standard deviation of `y_i`.
    /// - `Some(0.0)`: interpolate through every point.
    pub smoothing: Option<f64>,
}

impl SplineParams {
    pub fn new(degree: usize, smoothing: Option<f64>) -> Self {
        Self { degree, smoothing }
    }

    /// Smoothing target actually used for `n_samples` observations.
    pub fn smoothing_target(&self, n_samples: usize) -> f64 {
        self.smoothing.unwrap_or(n_samples as f64)
    }

    /// Whether the fit should pass through every data point.
    pub fn interpolates(&self) -> bool {
        self.smoothing == Some(0.0)
    }
}

impl Default for SplineParams {
    fn default() -> Self {
        Self {
            degree: DEFAULT_DEGREE,
            smoothing: None,
        }
    }
}

impl fmt::Display for SplineParams {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.smoothing {
            Some(s) => write!(f, "Spline(k={}, s={s})", self.degree),
            None => write!(f, "Spline(k={}, s=None)", self.degree),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_is_cubic_with_sample_count_smoothing() {
        let p = SplineParams::default();
        assert_eq!(p.degree, 3);
        assert_eq!(p.smoothing, None);
        assert_eq!(p.smoothing_target(42), 42.0);
        assert!(!p.interpolates());
    }

    #[test]
    fn display_mirrors_constructor_arguments() {
        assert_eq!(SplineParams::new(2, Some(0.5)).to_string(), "Spline(k=2, s=0.5)");
        assert_eq!(SplineParams::default().to_string(), "Spline(k=3, s=None)");
    }
}
