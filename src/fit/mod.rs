//! Smoothing spline fitting.
//!
//! Responsibilities:
//!
//! - validate training data and parameters
//! - place knots (interpolation layout, residual-driven insertion)
//! - solve the least-squares and penalized problems until `fp ≈ s`

pub mod fitter;
pub mod knots;
pub mod validator;

pub use fitter::*;
pub use knots::*;
pub use validator::*;
