//! Domain types used throughout the crate.
//!
//! This module defines the estimator configuration (`SplineParams`) and the
//! degree bounds the solver enforces.

pub mod types;

pub use types::*;
