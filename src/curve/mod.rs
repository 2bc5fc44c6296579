//! Fitted spline representation and evaluation.

pub mod spline;

pub use spline::*;
