//! Mathematical utilities: B-spline basis, least squares and scoring.

pub mod basis;
pub mod metrics;
pub mod ols;

pub use basis::*;
pub use metrics::*;
pub use ols::*;
