//! B-spline primitives on a full knot vector.
//!
//! Conventions used across the crate:
//!
//! - `t` is the full knot vector of length `n`, with `k + 1` copies of each
//!   boundary knot and strictly increasing interior knots.
//! - `c` holds the `n - k - 1` B-spline coefficients.
//! - The base interval is `[t[k], t[n - k - 1]]`; evaluation outside it extends
//!   the first/last polynomial piece.

/// Scratch size for the Cox–de Boor recursion (supports degree <= 7).
const MAX_ORDER: usize = 8;

/// Number of coefficients carried by a knot vector of degree `k`.
pub fn coefficient_count(t: &[f64], k: usize) -> usize {
    t.len().saturating_sub(k + 1)
}

/// Index `l` of the knot span `t[l] <= x < t[l + 1]` used to evaluate at `x`.
///
/// The result is clamped to `k ..= n - k - 2`, so points left of the base
/// interval use the first piece and points right of it (including the right
/// endpoint) use the last piece.
pub fn find_span(t: &[f64], k: usize, x: f64) -> usize {
    let last = coefficient_count(t, k) - 1;
    let starts = &t[k + 1..=last];
    k + starts.partition_point(|&knot| knot <= x)
}

/// Evaluate the `k + 1` B-splines that are non-zero on span `span` at `x`.
///
/// `out[r]` receives `B_{span - k + r, k}(x)`.
///
/// Requires `out.len() == k + 1` and `k < 8`.
pub fn basis_funs(t: &[f64], k: usize, span: usize, x: f64, out: &mut [f64]) {
    debug_assert!(k < MAX_ORDER && out.len() == k + 1);
    let mut left = [0.0; MAX_ORDER];
    let mut right = [0.0; MAX_ORDER];

    out[0] = 1.0;
    for j in 1..=k {
        left[j] = x - t[span + 1 - j];
        right[j] = t[span + j] - x;
        let mut saved = 0.0;
        for r in 0..j {
            let temp = out[r] / (right[r + 1] + left[j - r]);
            out[r] = saved + right[r + 1] * temp;
            saved = left[j - r] * temp;
        }
        out[j] = saved;
    }
}

/// Value of the spline `(t, c, k)` at `x`.
pub fn evaluate(t: &[f64], c: &[f64], k: usize, x: f64) -> f64 {
    let span = find_span(t, k, x);
    let mut n = [0.0; MAX_ORDER];
    basis_funs(t, k, span, x, &mut n[..=k]);
    n[..=k]
        .iter()
        .enumerate()
        .map(|(r, b)| c[span - k + r] * b)
        .sum()
}

/// Knots and coefficients of the first derivative (degree `k - 1`). Requires `k > 0`.
pub fn derivative_coefficients(t: &[f64], c: &[f64], k: usize) -> (Vec<f64>, Vec<f64>) {
    debug_assert!(k > 0, "cannot differentiate a piecewise constant spline");
    let kf = k as f64;
    let coefs = (0..c.len().saturating_sub(1))
        .map(|i| {
            let span = t[i + k + 1] - t[i + 1];
            if span > 0.0 { kf * (c[i + 1] - c[i]) / span } else { 0.0 }
        })
        .collect();
    (t[1..t.len() - 1].to_vec(), coefs)
}

/// Knots and coefficients of the antiderivative (degree `k + 1`) that is zero
/// at the left boundary.
pub fn antiderivative_coefficients(t: &[f64], c: &[f64], k: usize) -> (Vec<f64>, Vec<f64>) {
    let mut knots = Vec::with_capacity(t.len() + 2);
    knots.push(t[0]);
    knots.extend_from_slice(t);
    knots.push(t[t.len() - 1]);

    let order = (k + 1) as f64;
    let mut coefs = Vec::with_capacity(c.len() + 1);
    let mut acc = 0.0;
    coefs.push(acc);
    for (i, ci) in c.iter().enumerate() {
        acc += ci * (t[i + k + 1] - t[i]) / order;
        coefs.push(acc);
    }
    (knots, coefs)
}

/// Jumps of the `k`-th derivative of the B-splines at each interior knot.
///
/// Entry `q` is `(start, row)` for interior knot `t[k + 1 + q]`: `row[r]` is the
/// jump of `B_{start + r, k}`, with `start = q` and `row.len() = k + 2`; every
/// other B-spline is continuous there. Rows are scaled by `h^k` with `h` the
/// mean knot spacing so the entries stay dimensionless.
pub fn kth_derivative_jumps(t: &[f64], k: usize) -> Vec<(usize, Vec<f64>)> {
    let nc = coefficient_count(t, k);
    let nrint = nc - k;
    if nrint < 2 {
        return Vec::new();
    }

    let h = (t[nc] - t[k]) / nrint as f64;
    let scale = h.powi(k as i32);

    // pieces[i][r] is the weight of c[i + r] in coefficient i of the current
    // derivative. After k differentiations the spline is piecewise constant
    // and coefficient q is its value on [t[k + q], t[k + q + 1]].
    let mut pieces: Vec<Vec<f64>> = vec![vec![1.0]; nc];
    for degree in (1..=k).rev() {
        let shift = k - degree;
        pieces = pieces
            .windows(2)
            .enumerate()
            .map(|(i, pair)| {
                let span = t[i + k + 1] - t[i + shift + 1];
                let alpha = if span > 0.0 { degree as f64 / span } else { 0.0 };
                let mut row = vec![0.0; pair[0].len() + 1];
                for (r, v) in pair[0].iter().enumerate() {
                    row[r] -= alpha * v;
                }
                for (r, v) in pair[1].iter().enumerate() {
                    row[r + 1] += alpha * v;
                }
                row
            })
            .collect();
    }

    pieces
        .windows(2)
        .enumerate()
        .map(|(q, pair)| {
            let mut row = vec![0.0; k + 2];
            for (r, v) in pair[0].iter().enumerate() {
                row[r] -= v * scale;
            }
            for (r, v) in pair[1].iter().enumerate() {
                row[r + 1] += v * scale;
            }
            (q, row)
        })
        .collect()
}
