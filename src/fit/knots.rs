//! Knot placement.
//!
//! Knots are never optimized continuously. They are either laid out
//! deterministically from the data (interpolation, polynomial start) or
//! inserted one at a time at data points inside the knot interval that
//! carries the largest share of the residual.

/// Knot vector without interior knots: `k + 1` copies of each boundary.
pub fn boundary_knots(xb: f64, xe: f64, k: usize) -> Vec<f64> {
    let mut t = vec![xb; k + 1];
    t.extend(std::iter::repeat_n(xe, k + 1));
    t
}

/// Knot vector of the interpolating spline through all of `x`.
///
/// There are `m - k - 1` interior knots: the data points `x[k/2 + 1 ..]` for odd
/// `k`, and midpoints between consecutive data points for even `k`, which keeps
/// the collocation system square and well posed.
pub fn interpolation_knots(x: &[f64], k: usize) -> Vec<f64> {
    let m = x.len();
    let xb = x[0];
    let xe = x[m - 1];
    let n_interior = m.saturating_sub(k + 1);
    let offset = k / 2 + 1;

    let mut t = Vec::with_capacity(m + k + 1);
    t.extend(std::iter::repeat_n(xb, k + 1));
    for l in 0..n_interior {
        let j = offset + l;
        if k % 2 == 1 {
            t.push(x[j]);
        } else {
            t.push(0.5 * (x[j] + x[j - 1]));
        }
    }
    t.extend(std::iter::repeat_n(xe, k + 1));
    t
}

/// One knot interval `[t[k + q], t[k + q + 1]]` and the data it holds.
#[derive(Debug, Clone, PartialEq)]
struct Interval {
    /// Index of the first data point strictly inside the interval.
    first: usize,
    /// Number of data points strictly inside the interval.
    count: usize,
    /// Share of the weighted squared residual attributed to the interval.
    fpint: f64,
}

/// Residual bookkeeping per knot interval, used to decide where knots go.
#[derive(Debug, Clone)]
pub struct KnotIntervals {
    intervals: Vec<Interval>,
}

impl KnotIntervals {
    /// Attribute `residuals[i] = (w_i (y_i - s(x_i)))²` to the knot intervals of `t`.
    ///
    /// A data point sitting on an interior knot contributes half of its
    /// residual to each neighbouring interval.
    pub fn new(x: &[f64], t: &[f64], k: usize, residuals: &[f64]) -> Self {
        let nc = t.len() - k - 1;
        let nrint = nc - k;

        let mut fpint = vec![0.0; nrint];
        let mut fpart = 0.0;
        let mut next_knot = k + 1;
        let mut q = 0;
        for (&xi, &term) in x.iter().zip(residuals) {
            fpart += term;
            if next_knot < nc && xi >= t[next_knot] {
                let store = 0.5 * term;
                fpint[q] = fpart - store;
                fpart = store;
                q += 1;
                next_knot += 1;
            }
        }
        fpint[nrint - 1] = fpart;

        let intervals = fpint
            .into_iter()
            .enumerate()
            .map(|(q, fpint)| {
                let lo = t[k + q];
                let hi = t[k + q + 1];
                let first = x.partition_point(|&v| v <= lo);
                let end = x.partition_point(|&v| v < hi);
                Interval {
                    first,
                    count: end.saturating_sub(first),
                    fpint,
                }
            })
            .collect();

        Self { intervals }
    }

    /// Insert one knot into `t` and return its position.
    ///
    /// The knot is placed on the middle data point of the interval with the
    /// largest residual share among those that still hold interior data. The
    /// residual share is split between both halves in proportion to their
    /// data counts, so several knots can be added before the next refit.
    /// Returns `None` when no interval can be split.
    pub fn insert_knot(&mut self, x: &[f64], t: &mut Vec<f64>, k: usize) -> Option<f64> {
        let mut best: Option<usize> = None;
        let mut fpmax = 0.0;
        for (q, iv) in self.intervals.iter().enumerate() {
            if iv.count > 0 && iv.fpint > fpmax {
                fpmax = iv.fpint;
                best = Some(q);
            }
        }
        let q = best?;

        let Interval { first, count, .. } = self.intervals[q];
        let ihalf = count / 2 + 1;
        let knot = x[first + ihalf - 1];

        let left_count = ihalf - 1;
        let right_count = count - ihalf;
        let total = count as f64;
        self.intervals[q] = Interval {
            first,
            count: left_count,
            fpint: fpmax * left_count as f64 / total,
        };
        self.intervals.insert(
            q + 1,
            Interval {
                first: first + ihalf,
                count: right_count,
                fpint: fpmax * right_count as f64 / total,
            },
        );
        t.insert(k + q + 1, knot);

        Some(knot)
    }
}
