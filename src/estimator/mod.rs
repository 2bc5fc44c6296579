//! Regression-estimator interface.
//!
//! Generic tooling (cross-validation loops, hyperparameter searches,
//! pipelines) only needs four things from a regressor: its configuration,
//! `fit`, `predict` and `score`. `Regressor` captures that contract so the
//! spline can be swapped for any other implementation.

use crate::error::Result;
use crate::math::r2_score;

pub mod spline;

pub use spline::*;

/// The fit / predict / score contract shared by one-dimensional regressors.
pub trait Regressor {
    /// Hyperparameters that fully describe an unfitted estimator.
    type Params: Clone;

    /// Current configuration.
    fn params(&self) -> Self::Params;

    /// Fit to training data and return `self` for chaining.
    fn fit(&mut self, x: &[f64], y: &[f64], sample_weight: Option<&[f64]>) -> Result<&mut Self>;

    /// Predicted values at `x`, one per input.
    fn predict(&self, x: &[f64]) -> Result<Vec<f64>>;

    /// Coefficient of determination of `predict(x)` against `y`.
    fn score(&self, x: &[f64], y: &[f64]) -> Result<f64> {
        let y_pred = self.predict(x)?;
        r2_score(y, &y_pred, None)
    }
}
