//! The fitted B-spline curve.
//!
//! A `FittedCurve` is the only artifact a fit produces: the full knot vector,
//! the coefficients, the degree and the weighted residual `fp` reached by the
//! solver. Everything else (predictions, derivatives, integrals) is derived
//! from those.

use crate::domain::{MAX_DEGREE, MIN_DEGREE};
use crate::error::{Result, SplineError};
use crate::math::{antiderivative_coefficients, coefficient_count, derivative_coefficients, evaluate};

/// A spline `s(x) = Σ c_j B_{j,k}(x)` on a clamped knot vector.
#[derive(Debug, Clone, PartialEq)]
pub struct FittedCurve {
    knots: Vec<f64>,
    coefs: Vec<f64>,
    degree: usize,
    residual: f64,
}

impl FittedCurve {
    /// Build a curve from its raw representation.
    ///
    /// # Errors
    /// `InvalidInput` if the knot vector cannot carry `coefs` at `degree`.
    pub fn new(knots: Vec<f64>, coefs: Vec<f64>, degree: usize, residual: f64) -> Result<Self> {
        if !(MIN_DEGREE..=MAX_DEGREE).contains(&degree) {
            return Err(SplineError::invalid(format!(
                "degree must be in {MIN_DEGREE}..={MAX_DEGREE}, got {degree}"
            )));
        }
        if knots.len() < 2 * degree + 2 {
            return Err(SplineError::invalid(format!(
                "a degree {degree} spline needs at least {} knots, got {}",
                2 * degree + 2,
                knots.len()
            )));
        }
        if coefficient_count(&knots, degree) != coefs.len() {
            return Err(SplineError::invalid(format!(
                "expected {} coefficients for {} knots of degree {degree}, got {}",
                coefficient_count(&knots, degree),
                knots.len(),
                coefs.len()
            )));
        }
        if knots.windows(2).any(|w| w[1] < w[0]) {
            return Err(SplineError::invalid("knots must be non-decreasing"));
        }
        Ok(Self {
            knots,
            coefs,
            degree,
            residual,
        })
    }

    pub fn degree(&self) -> usize {
        self.degree
    }

    /// Spline coefficients (`n - k - 1` values).
    pub fn coefficients(&self) -> &[f64] {
        &self.coefs
    }

    /// Knot positions without the repeated boundary knots: `t[k ..= n - k - 1]`.
    pub fn knots(&self) -> &[f64] {
        let n = self.knots.len();
        &self.knots[self.degree..n - self.degree]
    }

    /// The complete knot vector including boundary multiplicities.
    pub fn full_knots(&self) -> &[f64] {
        &self.knots
    }

    /// Weighted sum of squared residuals `Σ (w_i (y_i - s(x_i)))²` of the fit.
    pub fn residual(&self) -> f64 {
        self.residual
    }

    /// Base interval `[xb, xe]` the curve was fitted on.
    pub fn bounds(&self) -> (f64, f64) {
        let knots = self.knots();
        (knots[0], knots[knots.len() - 1])
    }

    /// Value at `x`; outside the base interval the boundary piece is extended.
    pub fn evaluate(&self, x: f64) -> f64 {
        evaluate(&self.knots, &self.coefs, self.degree, x)
    }

    pub fn evaluate_many(&self, xs: &[f64]) -> Vec<f64> {
        xs.iter().map(|&x| self.evaluate(x)).collect()
    }

    /// The `nu`-th derivative as a new curve of degree `k - nu`.
    ///
    /// The residual of the derived curve is meaningless and set to `NaN`.
    ///
    /// # Errors
    /// `InvalidInput` if `nu` exceeds the degree.
    pub fn derivative(&self, nu: usize) -> Result<FittedCurve> {
        if nu > self.degree {
            return Err(SplineError::invalid(format!(
                "derivative order {nu} exceeds spline degree {}",
                self.degree
            )));
        }
        let mut knots = self.knots.clone();
        let mut coefs = self.coefs.clone();
        for degree in ((self.degree - nu + 1)..=self.degree).rev() {
            (knots, coefs) = derivative_coefficients(&knots, &coefs, degree);
        }
        let residual = if nu == 0 { self.residual } else { f64::NAN };
        Ok(FittedCurve {
            knots,
            coefs,
            degree: self.degree - nu,
            residual,
        })
    }

    /// Definite integral over `[a, b]`.
    ///
    /// The spline is taken to be zero outside its base interval, so the limits
    /// are clamped to it; `a > b` flips the sign.
    pub fn integral(&self, a: f64, b: f64) -> f64 {
        let (lo, hi) = self.bounds();
        let a = a.clamp(lo, hi);
        let b = b.clamp(lo, hi);
        let (knots, coefs) = antiderivative_coefficients(&self.knots, &self.coefs, self.degree);
        let k = self.degree + 1;
        evaluate(&knots, &coefs, k, b) - evaluate(&knots, &coefs, k, a)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Quadratic Bézier-style curve on [0, 2] representing y = x².
    fn parabola() -> FittedCurve {
        // Degree 2, knots [0,0,0,2,2,2]; control points of x² on [0,2] are 0, 0, 4.
        FittedCurve::new(vec![0.0, 0.0, 0.0, 2.0, 2.0, 2.0], vec![0.0, 0.0, 4.0], 2, 0.0).unwrap()
    }

    #[test]
    fn evaluates_and_extrapolates_polynomial_piece() {
        let c = parabola();
        for &x in &[0.0, 0.5, 1.0, 2.0, 3.0, -1.0] {
            assert!((c.evaluate(x) - x * x).abs() < 1e-12, "x={x}");
        }
    }

    #[test]
    fn knots_strip_boundary_multiplicity() {
        let c = parabola();
        assert_eq!(c.knots(), &[0.0, 2.0]);
        assert_eq!(c.full_knots().len(), 6);
        assert_eq!(c.bounds(), (0.0, 2.0));
    }

    #[test]
    fn derivative_and_integral() {
        let c = parabola();
        let d = c.derivative(1).unwrap();
        assert_eq!(d.degree(), 1);
        assert!((d.evaluate(1.5) - 3.0).abs() < 1e-12);
        let dd = c.derivative(2).unwrap();
        assert!((dd.evaluate(0.7) - 2.0).abs() < 1e-12);
        assert!(c.derivative(3).is_err());

        // ∫_0^2 x² dx = 8/3, limits beyond the base interval are clamped.
        assert!((c.integral(0.0, 2.0) - 8.0 / 3.0).abs() < 1e-12);
        assert!((c.integral(-5.0, 5.0) - 8.0 / 3.0).abs() < 1e-12);
        assert!((c.integral(2.0, 0.0) + 8.0 / 3.0).abs() < 1e-12);
    }

    #[test]
    fn rejects_inconsistent_representation() {
        assert!(FittedCurve::new(vec![0.0, 0.0, 1.0, 1.0], vec![1.0], 1, 0.0).is_err());
        assert!(FittedCurve::new(vec![0.0, 1.0], vec![], 1, 0.0).is_err());

        // Degrees outside the supported range are rejected before evaluation
        // or integration can reach them.
        for degree in [0, 6, 7, 8] {
            let mut knots = vec![0.0; degree + 1];
            knots.extend(std::iter::repeat_n(1.0, degree + 1));
            let err = FittedCurve::new(knots, vec![1.0; degree + 1], degree, 0.0).unwrap_err();
            assert!(matches!(err, SplineError::InvalidInput(_)), "degree {degree}: {err}");
        }
    }
}
