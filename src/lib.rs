//! `skspline` library crate.
//!
//! One-dimensional smoothing splines exposed as a regression estimator
//! (`fit` / `predict` / `score`), so a spline can sit wherever generic
//! tooling expects a regressor: cross-validation loops, pipelines,
//! hyperparameter searches.
//!
//! ```
//! use skspline::{Regressor, SplineEstimator};
//!
//! let x = [0.0, 1.0, 2.0, 3.0, 4.0, 5.0];
//! let y = [0.1, 0.9, 2.2, 2.8, 4.1, 5.0];
//!
//! // Cubic spline, smoothing factor chosen from the sample count.
//! let mut spline = SplineEstimator::default();
//! spline.fit(&x, &y, None)?;
//! let fitted = spline.predict(&[2.5])?;
//! assert_eq!(fitted.len(), 1);
//! # Ok::<(), skspline::SplineError>(())
//! ```
//!
//! Layout:
//!
//! - `estimator`: the `Regressor` contract and `SplineEstimator`
//! - `fit`: validation, knot placement and the smoothing solver
//! - `curve`: the fitted B-spline (evaluation, derivatives, integrals)
//! - `math`: basis functions, least squares, R²
//! - `domain`: configuration (`SplineParams`)
//! - `data`, `report`: synthetic samples and text summaries

pub mod curve;
pub mod data;
pub mod domain;
pub mod error;
pub mod estimator;
pub mod fit;
pub mod math;
pub mod report;

pub use curve::FittedCurve;
pub use domain::SplineParams;
pub use error::{Result, SplineError};
pub use estimator::{Regressor, SplineEstimator};
pub use math::r2_score;
