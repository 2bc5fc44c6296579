//! Error type shared by the solver, the fitted curve and the estimator.

/// Errors raised while fitting, evaluating or scoring a spline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum SplineError {
    /// Malformed training data or configuration.
    ///
    /// Raised synchronously from `fit` (and from scoring helpers) before any
    /// state is touched.
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A read operation was invoked before a successful `fit`.
    #[error("estimator is not fitted yet; call `fit` before using it")]
    NotFitted,

    /// The least-squares solve did not produce a finite solution.
    #[error("numerical failure: {0}")]
    Numerical(String),
}

impl SplineError {
    pub fn invalid(message: impl Into<String>) -> Self {
        Self::InvalidInput(message.into())
    }
}

/// Crate-wide result alias.
pub type Result<T> = std::result::Result<T, SplineError>;
