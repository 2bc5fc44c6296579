//! Least-squares solvers for the spline coefficient problems.
//!
//! Both problems the spline solver poses are linear in the coefficients `c`:
//!
//! ```text
//! plain:      minimize Σ (w_i (y_i - B_i c))²
//! penalized:  minimize Σ (w_i (y_i - B_i c))² + (1/p)² ‖D c‖²
//! ```
//!
//! where `B` is the B-spline design matrix and `D` the matrix of `k`-th
//! derivative jumps. A row of `B` has at most `k + 1` non-zeros in consecutive
//! columns and a row of `D` at most `k + 2`, so rows are folded one at a time
//! into a banded upper-triangular factor with Givens rotations. Work and memory
//! grow linearly with the number of rows; no `m × nc` matrix is ever formed.
//! Rows are scaled by `w_i` (the weights multiply residuals, not squared
//! residuals) before they are added.

use nalgebra::{DMatrix, DVector};

/// Pivots below this fraction of the largest pivot count as zero.
const RANK_TOLERANCE: f64 = 1e-12;

/// Banded QR factorization `R c = z` of a least-squares problem, built row by row.
#[derive(Debug, Clone)]
pub struct BandedLeastSquares {
    /// `r[(i, j)]` holds `R[i, i + j]`.
    r: DMatrix<f64>,
    z: DVector<f64>,
}

impl BandedLeastSquares {
    /// An empty system in `ncols` unknowns whose rows span at most `bandwidth` columns.
    pub fn new(ncols: usize, bandwidth: usize) -> Self {
        Self {
            r: DMatrix::zeros(ncols, bandwidth),
            z: DVector::zeros(ncols),
        }
    }

    pub fn ncols(&self) -> usize {
        self.r.nrows()
    }

    pub fn bandwidth(&self) -> usize {
        self.r.ncols()
    }

    /// Add the observation `values · c[start..start + values.len()] ≈ rhs`.
    pub fn add_row(&mut self, start: usize, values: &[f64], rhs: f64) {
        debug_assert!(values.len() <= self.bandwidth());
        debug_assert!(start + values.len() <= self.ncols());

        let mut h = values.to_vec();
        let mut rhs = rhs;
        for i in 0..h.len() {
            let piv = h[i];
            if piv == 0.0 {
                continue;
            }
            let row = start + i;
            let (cos, sin) = givens(piv, &mut self.r[(row, 0)]);
            rotate(cos, sin, &mut rhs, &mut self.z[row]);
            for j in i + 1..h.len() {
                rotate(cos, sin, &mut h[j], &mut self.r[(row, j - i)]);
            }
        }
    }

    /// Sum of the absolute diagonal entries of `R`.
    pub fn pivot_sum(&self) -> f64 {
        self.r.column(0).iter().map(|v| v.abs()).sum()
    }

    /// Back-substitute for the coefficients.
    ///
    /// Unknowns whose pivot is negligible are set to zero. Returns `None` if
    /// the system is empty or the solution is not finite.
    pub fn solve(&self) -> Option<DVector<f64>> {
        let nc = self.ncols();
        let bandwidth = self.bandwidth();
        let pivot_max = self
            .r
            .column(0)
            .iter()
            .fold(0.0_f64, |acc, v| acc.max(v.abs()));
        if !(pivot_max.is_finite() && pivot_max > 0.0) {
            return None;
        }
        let cutoff = RANK_TOLERANCE * pivot_max;

        let mut c = DVector::<f64>::zeros(nc);
        for i in (0..nc).rev() {
            let pivot = self.r[(i, 0)];
            if pivot.abs() <= cutoff {
                continue;
            }
            let mut sum = self.z[i];
            for j in 1..bandwidth.min(nc - i) {
                sum -= self.r[(i, j)] * c[i + j];
            }
            c[i] = sum / pivot;
        }

        c.iter().all(|v| v.is_finite()).then_some(c)
    }
}

/// Rotation that annihilates `piv` against `diag`; `diag` becomes the new pivot.
fn givens(piv: f64, diag: &mut f64) -> (f64, f64) {
    let dd = piv.hypot(*diag);
    let cos = *diag / dd;
    let sin = piv / dd;
    *diag = dd;
    (cos, sin)
}

/// Apply the rotation to the pair (`a` from the incoming row, `b` from `R`).
fn rotate(cos: f64, sin: f64, a: &mut f64, b: &mut f64) {
    let (old_a, old_b) = (*a, *b);
    *b = cos * old_b + sin * old_a;
    *a = cos * old_a - sin * old_b;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn least_squares_solves_simple_system() {
        // Fit y = 2 + 3x on x = [0,1,2]
        let mut system = BandedLeastSquares::new(2, 2);
        for (x, y) in [(0.0, 2.0), (1.0, 5.0), (2.0, 8.0)] {
            system.add_row(0, &[1.0, x], y);
        }

        let beta = system.solve().unwrap();
        assert!((beta[0] - 2.0).abs() < 1e-10);
        assert!((beta[1] - 3.0).abs() < 1e-10);
    }

    #[test]
    fn overdetermined_fit_matches_the_mean() {
        let mut system = BandedLeastSquares::new(1, 1);
        for y in [1.0, 2.0, 6.0] {
            system.add_row(0, &[1.0], y);
        }
        let beta = system.solve().unwrap();
        assert!((beta[0] - 3.0).abs() < 1e-12);
        // R is the norm of the column of ones.
        assert!((system.pivot_sum() - 3.0_f64.sqrt()).abs() < 1e-12);
    }

    #[test]
    fn banded_rows_solve_a_tridiagonal_system() {
        // [2 1 0; 1 2 1; 0 1 2] c = [3, 4, 3] has c = [1, 1, 1].
        let mut system = BandedLeastSquares::new(3, 3);
        system.add_row(0, &[2.0, 1.0], 3.0);
        system.add_row(0, &[1.0, 2.0, 1.0], 4.0);
        system.add_row(1, &[1.0, 2.0], 3.0);
        let beta = system.solve().unwrap();
        for v in beta.iter() {
            assert!((v - 1.0).abs() < 1e-12, "{beta}");
        }
    }

    #[test]
    fn empty_system_is_rejected() {
        let mut system = BandedLeastSquares::new(2, 2);
        system.add_row(0, &[0.0, 0.0], 1.0);
        assert!(system.solve().is_none());
    }

    #[test]
    fn unconstrained_unknown_is_set_to_zero() {
        let mut system = BandedLeastSquares::new(2, 2);
        system.add_row(0, &[1.0], 4.0);
        system.add_row(0, &[2.0], 8.0);
        let beta = system.solve().unwrap();
        assert!((beta[0] - 4.0).abs() < 1e-12);
        assert_eq!(beta[1], 0.0);
    }

    #[test]
    fn strong_penalty_pulls_towards_penalty_null_space() {
        // Two free values with a penalty on their difference: a huge penalty
        // forces them together at the mean of the observations.
        let penalized = |p: f64| {
            let mut system = BandedLeastSquares::new(2, 2);
            system.add_row(0, &[1.0], 0.0);
            system.add_row(1, &[1.0], 2.0);
            system.add_row(0, &[1.0 / p, -1.0 / p], 0.0);
            system.solve().unwrap()
        };

        let loose = penalized(1e8);
        assert!((loose[0] - 0.0).abs() < 1e-6);
        assert!((loose[1] - 2.0).abs() < 1e-6);

        let tight = penalized(1e-6);
        assert!((tight[0] - 1.0).abs() < 1e-6);
        assert!((tight[1] - 1.0).abs() < 1e-6);
    }
}
