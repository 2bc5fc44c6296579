//! Smoothing spline behind the `Regressor` interface.

use crate::curve::FittedCurve;
use crate::domain::SplineParams;
use crate::error::{Result, SplineError};
use crate::estimator::Regressor;
use crate::fit::fit_spline;

/// One-dimensional smoothing spline estimator.
///
/// Fits `y = spl(x)` of degree `k`; the smoothing factor `s` sets the number
/// of knots through the condition `Σ (w_i (y_i - spl(x_i)))² <= s`.
///
/// The estimator is either unfitted or owns exactly one `FittedCurve`.
/// A successful `fit` replaces the curve wholesale. A failed `fit` returns the
/// error and leaves the previous curve (if any) in place.
///
/// ```
/// use skspline::{Regressor, SplineEstimator};
///
/// let x = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
/// let y = [0.0, 1.0, 4.0, 9.0, 16.0, 25.0];
///
/// let mut spline = SplineEstimator::new(2, Some(0.0));
/// let score = spline.fit(&x, &y, None)?.score(&x, &y)?;
/// assert!((score - 1.0).abs() < 1e-9);
/// # Ok::<(), skspline::SplineError>(())
/// ```
#[derive(Debug, Clone, Default)]
pub struct SplineEstimator {
    params: SplineParams,
    curve: Option<FittedCurve>,
}

impl SplineEstimator {
    /// Store the configuration; nothing is validated until `fit`.
    pub fn new(degree: usize, smoothing: Option<f64>) -> Self {
        Self::from_params(SplineParams::new(degree, smoothing))
    }

    pub fn from_params(params: SplineParams) -> Self {
        Self { params, curve: None }
    }

    /// A fresh, unfitted estimator with the same configuration.
    pub fn clone_unfitted(&self) -> Self {
        Self::from_params(self.params)
    }

    pub fn degree(&self) -> usize {
        self.params.degree
    }

    pub fn smoothing_factor(&self) -> Option<f64> {
        self.params.smoothing
    }

    pub fn is_fitted(&self) -> bool {
        self.curve.is_some()
    }

    /// The fitted curve.
    pub fn curve(&self) -> Result<&FittedCurve> {
        self.curve.as_ref().ok_or(SplineError::NotFitted)
    }

    /// Spline coefficients of the current fit.
    pub fn coefficients(&self) -> Result<&[f64]> {
        Ok(self.curve()?.coefficients())
    }

    /// Knot positions of the current fit (boundaries included, no repeats).
    pub fn knot_positions(&self) -> Result<&[f64]> {
        Ok(self.curve()?.knots())
    }

    /// Weighted sum of squared residuals reached by the current fit.
    pub fn residual(&self) -> Result<f64> {
        Ok(self.curve()?.residual())
    }
}

impl Regressor for SplineEstimator {
    type Params = SplineParams;

    fn params(&self) -> SplineParams {
        self.params
    }

    fn fit(&mut self, x: &[f64], y: &[f64], sample_weight: Option<&[f64]>) -> Result<&mut Self> {
        let curve = fit_spline(x, y, sample_weight, &self.params)?;
        self.curve = Some(curve);
        Ok(self)
    }

    fn predict(&self, x: &[f64]) -> Result<Vec<f64>> {
        Ok(self.curve()?.evaluate_many(x))
    }
}
