//! Smoothing spline solver.
//!
//! Given data `(x_i, y_i)`, weights `w_i`, a degree `k` and a smoothing factor
//! `s`, find a spline `spl` whose weighted residual
//!
//! ```text
//! fp = Σ (w_i (y_i - spl(x_i)))²
//! ```
//!
//! does not exceed `s`, using as few knots as practical:
//!
//! 1. `s = 0`: interpolate (one coefficient per data point).
//! 2. Otherwise grow the knot set from the bare polynomial, refitting a plain
//!    least-squares spline after each round, until `fp <= s`.
//! 3. With the final knots, trade fit for smoothness: minimize
//!    `fp + (1/p)² ‖jumps of spl^(k) at the interior knots‖²` and search `p`
//!    so that `fp(p) = s` (within `0.001 s`).

use log::{debug, warn};
use nalgebra::DVector;

use crate::curve::FittedCurve;
use crate::domain::SplineParams;
use crate::error::{Result, SplineError};
use crate::fit::knots::{KnotIntervals, boundary_knots, interpolation_knots};
use crate::fit::validator::validate_fit_inputs;
use crate::math::{
    BandedLeastSquares, basis_funs, coefficient_count, evaluate, find_span, kth_derivative_jumps,
};

/// Relative tolerance on `|fp - s|`.
const TOLERANCE: f64 = 1e-3;

/// Upper bound on smoothing-parameter iterations.
const MAX_SMOOTHING_ITERATIONS: usize = 20;

/// Step factors of the smoothing-parameter search.
const CON1: f64 = 0.1;
const CON9: f64 = 0.9;
const CON4: f64 = 0.04;

/// Fit a smoothing spline to `(x, y)` with optional per-sample weights.
///
/// `w[i]` scales the residual of sample `i`; `1/w[i]` is best read as the
/// standard deviation of the noise on `y[i]`.
///
/// # Errors
/// `InvalidInput` for malformed data or parameters, `Numerical` if a
/// least-squares solve breaks down.
pub fn fit_spline(x: &[f64], y: &[f64], w: Option<&[f64]>, params: &SplineParams) -> Result<FittedCurve> {
    validate_fit_inputs(x, y, w, params.degree, params.smoothing)?;

    let weights: Vec<f64> = match w {
        Some(w) => w.to_vec(),
        None => vec![1.0; x.len()],
    };
    let problem = Problem {
        x,
        y,
        w: &weights,
        k: params.degree,
        max_iterations: MAX_SMOOTHING_ITERATIONS,
    };

    if params.interpolates() {
        problem.interpolate()
    } else {
        problem.smooth(params.smoothing_target(x.len()))
    }
}

/// A least-squares solution for a fixed knot vector.
#[derive(Debug, Clone)]
struct Solution {
    coefs: Vec<f64>,
    fp: f64,
}

/// Validated training data for a single fit.
struct Problem<'a> {
    x: &'a [f64],
    y: &'a [f64],
    w: &'a [f64],
    k: usize,
    max_iterations: usize,
}

impl Problem<'_> {
    fn m(&self) -> usize {
        self.x.len()
    }

    fn interpolate(&self) -> Result<FittedCurve> {
        let t = interpolation_knots(self.x, self.k);
        let sol = self.least_squares(&t)?;
        debug!("interpolating spline: {} knots, fp={:.3e}", t.len(), sol.fp);
        self.finish(t, sol)
    }

    fn smooth(&self, s: f64) -> Result<FittedCurve> {
        let k = self.k;
        let m = self.m();
        let acc = TOLERANCE * s;
        let nmin = 2 * k + 2;
        let nmax = m + k + 1;

        let mut t = boundary_knots(self.x[0], self.x[m - 1], k);
        let mut fp0 = f64::NAN;
        let mut fpold = 0.0;
        let mut nplus = 0usize;

        // Every round adds at least one knot or jumps to `nmax`, so `m` rounds
        // always reach one of the exits below.
        for round in 0..m {
            let n = t.len();
            let sol = self.least_squares(&t)?;
            if n == nmin {
                fp0 = sol.fp;
            }
            let fpms = sol.fp - s;
            debug!("knot round {round}: n={n}, fp={:.6e}, s={s:.6e}", sol.fp);

            if fpms.abs() < acc {
                return self.finish(t, sol);
            }
            if fpms < 0.0 {
                if n == nmin {
                    // The least-squares polynomial already satisfies fp <= s.
                    return self.finish(t, sol);
                }
                return self.smoothing_phase(t, fp0, sol.fp, s);
            }
            if n == nmax {
                return self.finish(t, sol);
            }

            nplus = if n == nmin {
                1
            } else {
                let mut npl1 = nplus * 2;
                if fpold - sol.fp > acc {
                    npl1 = (nplus as f64 * fpms / (fpold - sol.fp)) as usize;
                }
                (nplus * 2).min(npl1.max(nplus / 2).max(1))
            };
            fpold = sol.fp;

            let residuals = self.residuals(&t, &sol.coefs);
            let mut intervals = KnotIntervals::new(self.x, &t, k, &residuals);
            self.add_knots(&mut t, &mut intervals, nplus);
        }

        Err(SplineError::Numerical(
            "knot placement did not terminate".to_string(),
        ))
    }

    /// Insert up to `nplus` knots into `t`.
    ///
    /// Switches to the interpolation knots once the knot count reaches `nmax`
    /// or no interval with interior data is left to split.
    fn add_knots(&self, t: &mut Vec<f64>, intervals: &mut KnotIntervals, nplus: usize) {
        let k = self.k;
        let nmax = self.m() + k + 1;
        for _ in 0..nplus {
            if intervals.insert_knot(self.x, t, k).is_none() {
                warn!("no knot interval left to split; falling back to interpolation knots");
                *t = interpolation_knots(self.x, k);
                return;
            }
            if t.len() == nmax {
                *t = interpolation_knots(self.x, k);
                return;
            }
        }
    }

    fn smoothing_phase(&self, t: Vec<f64>, fp0: f64, fpinf: f64, s: f64) -> Result<FittedCurve> {
        let data = self.triangularize(&t, self.k + 2);
        let penalty = kth_derivative_jumps(&t, self.k);

        // Start where the penalty rows are on the scale of the data rows.
        let pivots = data.pivot_sum();
        let mut p = if pivots > 0.0 {
            data.ncols() as f64 / pivots
        } else {
            1.0
        };

        let mut search = SmoothingSearch::new(fp0 - s, fpinf - s, TOLERANCE * s);
        let mut iter = 0;

        loop {
            iter += 1;
            let sol = self.penalized(&t, &data, &penalty, p)?;
            let fpms = sol.fp - s;
            debug!("smoothing iteration {iter}: p={p:.6e}, fp={:.6e}", sol.fp);

            if fpms.abs() < search.acc {
                return self.finish(t, sol);
            }
            if iter >= self.max_iterations {
                warn!(
                    "smoothing factor s={s} not reached after {iter} iterations (fp={}); \
                     s is probably too small",
                    sol.fp
                );
                return self.finish(t, sol);
            }

            match search.next(p, fpms) {
                Some(next) => p = next,
                None => {
                    warn!(
                        "residual is not monotone in the smoothing parameter (fp={}, s={s}); \
                         s is probably too small",
                        sol.fp
                    );
                    return self.finish(t, sol);
                }
            }
        }
    }

    /// Fold the weighted observation rows `w_i B_i c ≈ w_i y_i` into a banded factor.
    fn triangularize(&self, t: &[f64], bandwidth: usize) -> BandedLeastSquares {
        let k = self.k;
        let mut system = BandedLeastSquares::new(coefficient_count(t, k), bandwidth);
        let mut row = vec![0.0; k + 1];

        for i in 0..self.m() {
            let span = find_span(t, k, self.x[i]);
            basis_funs(t, k, span, self.x[i], &mut row);
            let wi = self.w[i];
            for value in row.iter_mut() {
                *value *= wi;
            }
            system.add_row(span - k, &row, self.y[i] * wi);
        }
        system
    }

    fn least_squares(&self, t: &[f64]) -> Result<Solution> {
        let system = self.triangularize(t, self.k + 1);
        let beta = system.solve().ok_or_else(|| {
            SplineError::Numerical(format!(
                "least-squares spline with {} knots is too ill-conditioned to solve",
                t.len()
            ))
        })?;
        Ok(self.solution(t, beta))
    }

    /// Add the penalty rows `D/p` to a copy of the data factor and solve.
    fn penalized(
        &self,
        t: &[f64],
        data: &BandedLeastSquares,
        penalty: &[(usize, Vec<f64>)],
        p: f64,
    ) -> Result<Solution> {
        let mut system = data.clone();
        let mut scaled = Vec::with_capacity(self.k + 2);
        for (start, row) in penalty {
            scaled.clear();
            scaled.extend(row.iter().map(|v| v / p));
            system.add_row(*start, &scaled, 0.0);
        }
        let beta = system.solve().ok_or_else(|| {
            SplineError::Numerical(format!(
                "penalized spline solve failed for smoothing parameter p={p}"
            ))
        })?;
        Ok(self.solution(t, beta))
    }

    fn solution(&self, t: &[f64], beta: DVector<f64>) -> Solution {
        let coefs: Vec<f64> = beta.iter().copied().collect();
        let fp = self.residuals(t, &coefs).iter().sum();
        Solution { coefs, fp }
    }

    /// Per-sample weighted squared residuals `(w_i (y_i - spl(x_i)))²`.
    fn residuals(&self, t: &[f64], coefs: &[f64]) -> Vec<f64> {
        (0..self.m())
            .map(|i| {
                let r = self.w[i] * (self.y[i] - evaluate(t, coefs, self.k, self.x[i]));
                r * r
            })
            .collect()
    }

    fn finish(&self, t: Vec<f64>, sol: Solution) -> Result<FittedCurve> {
        FittedCurve::new(t, sol.coefs, self.k, sol.fp)
    }
}

/// Bracketing state of the smoothing-parameter search over `f(p) = fp(p) - s`.
///
/// Invariant once the search is under way: `f1 > 0` at `p1`, `f3 < 0` at `p3`
/// (`p3 < 0` stands for `p = ∞`).
#[derive(Debug, Clone, Copy)]
struct SmoothingSearch {
    p1: f64,
    f1: f64,
    p3: f64,
    f3: f64,
    /// `f1` has moved away from `f(0)`.
    ich1: bool,
    /// `f3` has moved away from `f(∞)`.
    ich3: bool,
    acc: f64,
}

impl SmoothingSearch {
    /// Start from `f(0) = f0` (the polynomial) and `f(∞) = finf` (the plain
    /// least-squares spline).
    fn new(f0: f64, finf: f64, acc: f64) -> Self {
        Self {
            p1: 0.0,
            f1: f0,
            p3: -1.0,
            f3: finf,
            ich1: false,
            ich3: false,
            acc,
        }
    }

    /// Next `p` after observing `f2 = f(p2)`, or `None` when `f` is not
    /// monotone in `p`.
    fn next(&mut self, p2: f64, f2: f64) -> Option<f64> {
        let acc = self.acc;
        if !self.ich3 {
            if f2 - self.f3 <= acc {
                // p is still too large: fp has not moved away from fp(∞).
                self.p3 = p2;
                self.f3 = f2;
                let mut p = p2 * CON4;
                if p <= self.p1 {
                    p = self.p1 * CON9 + p2 * CON1;
                }
                return Some(p);
            }
            if f2 < 0.0 {
                self.ich3 = true;
            }
        }
        if !self.ich1 {
            if self.f1 - f2 <= acc {
                // p is still too small: fp has not moved away from fp(0).
                self.p1 = p2;
                self.f1 = f2;
                let mut p = p2 / CON4;
                if self.p3 >= 0.0 && p >= self.p3 {
                    p = p2 * CON1 + self.p3 * CON9;
                }
                return Some(p);
            }
            if f2 > 0.0 {
                self.ich1 = true;
            }
        }

        if f2 >= self.f1 || f2 <= self.f3 {
            return None;
        }
        Some(self.rational_step(p2, f2))
    }

    /// Next `p` from the rational interpolant `f(p) = (u p + v) / (p + w)`
    /// through the three points, then shrink the bracket around `(p2, f2)`.
    fn rational_step(&mut self, p2: f64, f2: f64) -> f64 {
        let (p1, f1, p3, f3) = (self.p1, self.f1, self.p3, self.f3);
        let p = if p3 > 0.0 {
            let h1 = f1 * (f2 - f3);
            let h2 = f2 * (f3 - f1);
            let h3 = f3 * (f1 - f2);
            -(p1 * p2 * h3 + p2 * p3 * h1 + p3 * p1 * h2) / (p1 * h1 + p2 * h2 + p3 * h3)
        } else {
            (p1 * (f1 - f3) * f2 - p2 * (f2 - f3) * f1) / ((f1 - f2) * f3)
        };

        if f2 < 0.0 {
            self.p3 = p2;
            self.f3 = f2;
        } else {
            self.p1 = p2;
            self.f1 = f2;
        }
        p
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use crate::data::noisy_samples;

    fn params(degree: usize, smoothing: Option<f64>) -> SplineParams {
        SplineParams::new(degree, smoothing)
    }

    fn problem<'a>(x: &'a [f64], y: &'a [f64], w: &'a [f64], k: usize) -> Problem<'a> {
        Problem {
            x,
            y,
            w,
            k,
            max_iterations: MAX_SMOOTHING_ITERATIONS,
        }
    }

    #[test]
    fn interpolates_parabola_exactly() {
        let x = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
        let y: Vec<f64> = x.iter().map(|v| v * v).collect();
        let curve = fit_spline(&x, &y, None, &params(2, Some(0.0))).unwrap();
        for (xi, yi) in x.iter().zip(&y) {
            assert!((curve.evaluate(*xi) - yi).abs() < 1e-9);
        }
        assert!(curve.residual() < 1e-18);
        assert_eq!(curve.coefficients().len(), x.len());
    }

    #[test]
    fn interpolates_arbitrary_data_for_every_degree() {
        let x: Vec<f64> = (0..12).map(|i| i as f64 * 0.7 + (i as f64).sin() * 0.1).collect();
        let y: Vec<f64> = x.iter().map(|v| (v * 1.3).cos() + 0.2 * v).collect();
        for k in 1..=5 {
            let curve = fit_spline(&x, &y, None, &params(k, Some(0.0))).unwrap();
            for (xi, yi) in x.iter().zip(&y) {
                assert!((curve.evaluate(*xi) - yi).abs() < 1e-8, "k={k} x={xi}");
            }
        }
    }

    #[test]
    fn huge_smoothing_returns_least_squares_polynomial() {
        let x: Vec<f64> = (0..10).map(f64::from).collect();
        let y: Vec<f64> = x.iter().map(|v| 1.0 + 2.0 * v).collect();
        let curve = fit_spline(&x, &y, None, &params(1, Some(1e6))).unwrap();
        assert_eq!(curve.knots(), &[0.0, 9.0]);
        assert!((curve.evaluate(4.5) - 10.0).abs() < 1e-9);
    }

    #[test]
    fn smoothing_hits_target_residual() {
        // A sine is far from a cubic polynomial, so knots and smoothing are needed.
        let x: Vec<f64> = (0..50).map(|i| i as f64 * 0.2).collect();
        let y: Vec<f64> = x.iter().map(|v| v.sin()).collect();
        let s = 0.05;
        let curve = fit_spline(&x, &y, None, &params(3, Some(s))).unwrap();
        assert!(curve.knots().len() > 2);
        assert!(
            (curve.residual() - s).abs() <= 1e-3 * s || curve.residual() <= s,
            "fp={} s={s}",
            curve.residual()
        );
    }

    #[test]
    fn smaller_smoothing_uses_at_least_as_many_knots() {
        let x: Vec<f64> = (0..60).map(|i| i as f64 * 0.1).collect();
        let y: Vec<f64> = x.iter().map(|v| (2.0 * v).sin() + 0.1 * v).collect();
        let loose = fit_spline(&x, &y, None, &params(3, Some(1.0))).unwrap();
        let tight = fit_spline(&x, &y, None, &params(3, Some(0.001))).unwrap();
        assert!(tight.knots().len() >= loose.knots().len());
        assert!(tight.residual() < loose.residual());
    }

    #[test]
    fn weights_scale_the_residual() {
        let x: Vec<f64> = (0..8).map(f64::from).collect();
        let y = [0.0, 1.0, 0.0, 1.0, 0.0, 1.0, 0.0, 1.0];
        let w = vec![2.0; 8];
        let plain = fit_spline(&x, &y, None, &params(1, Some(1e9))).unwrap();
        let weighted = fit_spline(&x, &y, Some(w.as_slice()), &params(1, Some(1e9))).unwrap();
        assert!((weighted.residual() - 4.0 * plain.residual()).abs() < 1e-9);
    }

    #[test]
    fn interpolates_thousands_of_points() {
        let x: Vec<f64> = (0..3000).map(|i| i as f64 * 0.01).collect();
        let y: Vec<f64> = x.iter().map(|v| (3.0 * v).sin() + 0.1 * v).collect();
        let curve = fit_spline(&x, &y, None, &params(3, Some(0.0))).unwrap();
        assert_eq!(curve.coefficients().len(), x.len());
        for (xi, yi) in x.iter().zip(&y) {
            assert!((curve.evaluate(*xi) - yi).abs() < 1e-8, "x={xi}");
        }
    }

    #[test]
    fn tiny_smoothing_falls_back_to_interpolation_knots() {
        let x: Vec<f64> = (0..30).map(f64::from).collect();
        let sample = noisy_samples(&x, |v| (0.3 * v).sin(), 0.2, 5).unwrap();
        let s = 1e-6;
        let curve = fit_spline(&x, &sample.y, None, &params(3, Some(s))).unwrap();
        assert_eq!(curve.full_knots(), interpolation_knots(&x, 3).as_slice());
        assert!(curve.residual() <= s * (1.0 + TOLERANCE), "fp={}", curve.residual());
    }

    #[test]
    fn unreachable_smoothing_still_returns_finite_curve() {
        let x: Vec<f64> = (0..30).map(f64::from).collect();
        let sample = noisy_samples(&x, |v| (0.3 * v).sin(), 0.2, 5).unwrap();
        let curve = fit_spline(&x, &sample.y, None, &params(3, Some(1e-300))).unwrap();
        assert!(curve.coefficients().iter().all(|c| c.is_finite()));
        assert!(curve.residual().is_finite());
        assert_eq!(curve.full_knots(), interpolation_knots(&x, 3).as_slice());
    }

    #[test]
    fn iteration_limit_keeps_current_solution() {
        let x: Vec<f64> = (0..50).map(|i| i as f64 * 0.2).collect();
        let y: Vec<f64> = x.iter().map(|v| v.sin()).collect();
        let w = vec![1.0; x.len()];
        let s = 0.05;

        let full = fit_spline(&x, &y, None, &params(3, Some(s))).unwrap();
        let capped = Problem {
            max_iterations: 1,
            ..problem(&x, &y, &w, 3)
        }
        .smooth(s)
        .unwrap();

        assert_eq!(capped.full_knots(), full.full_knots());
        assert!(capped.residual().is_finite());
        assert!(capped.coefficients().iter().all(|c| c.is_finite()));
    }

    #[test]
    fn knot_insertion_switches_to_interpolation_knots_at_nmax() {
        let x: Vec<f64> = (0..6).map(f64::from).collect();
        let zeros = vec![0.0; x.len()];
        let w = vec![1.0; x.len()];
        let k = 1;
        let mut t = boundary_knots(0.0, 5.0, k);
        let mut intervals = KnotIntervals::new(&x, &t, k, &[1.0; 6]);

        problem(&x, &zeros, &w, k).add_knots(&mut t, &mut intervals, 10);
        assert_eq!(t, interpolation_knots(&x, k));
    }

    #[test]
    fn knot_insertion_without_residual_falls_back_to_interpolation_knots() {
        let x: Vec<f64> = (0..8).map(f64::from).collect();
        let zeros = vec![0.0; x.len()];
        let w = vec![1.0; x.len()];
        let k = 3;
        let mut t = boundary_knots(0.0, 7.0, k);
        let mut intervals = KnotIntervals::new(&x, &t, k, &zeros);

        problem(&x, &zeros, &w, k).add_knots(&mut t, &mut intervals, 2);
        assert_eq!(t, interpolation_knots(&x, k));
    }

    #[test]
    fn rational_step_with_infinite_upper_bound() {
        // f(p) = (1 - p) / (1 + p) has its root at p = 1 and is exactly rational.
        let f = |p: f64| (1.0 - p) / (1.0 + p);
        let mut search = SmoothingSearch::new(f(0.0), -1.0, 1e-3);
        let p = search.rational_step(0.5, f(0.5));
        assert!((p - 1.0).abs() < 1e-12, "p={p}");
        assert_eq!(search.p1, 0.5);
    }

    #[test]
    fn search_shrinks_p_while_residual_sticks_to_least_squares() {
        let mut search = SmoothingSearch::new(1.0, -0.5, 1e-3);
        let p = search.next(10.0, -0.5).unwrap();
        assert!((p - 10.0 * CON4).abs() < 1e-12);
        assert_eq!(search.p3, 10.0);
    }

    #[test]
    fn search_stops_when_residual_is_not_monotone() {
        let mut search = SmoothingSearch::new(1.0, -0.5, 1e-3);
        assert!(search.next(1.0, 0.5).is_some());
        assert!(search.next(2.0, -0.2).is_some());
        assert_eq!((search.p1, search.p3), (1.0, 2.0));
        // fp(1.5) - s above fp(1) - s although p grew.
        assert_eq!(search.next(1.5, 0.8), None);
    }
}
