//! Unified error handling for inference routines.
//!
//! This module defines `InferenceError`, the error type reported by the
//! trajectory-based covariance estimator. A covariance failure never
//! invalidates a point estimate; it is carried inside
//! [`Covariance::Failed`](super::covariance::Covariance::Failed) instead of
//! aborting the solve. An alias `InferenceResult<T>` standardizes the return
//! type across inference code.

/// Unified error type for inference routines.
#[derive(Debug, Clone, PartialEq)]
pub enum InferenceError {
    // ---- Trajectory ----
    /// No usable (finite) score vectors were recorded.
    EmptyTrajectory,

    /// A recorded score vector has the wrong length.
    ScoreDimMismatch {
        expected: usize,
        found: usize,
    },

    // ---- Linear algebra ----
    /// The accumulated outer-product matrix cannot be inverted.
    SingularInformation {
        dim: usize,
    },
}

pub type InferenceResult<T> = Result<T, InferenceError>;

impl std::error::Error for InferenceError {}

impl std::fmt::Display for InferenceError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Trajectory ----
            InferenceError::EmptyTrajectory => {
                write!(f, "Inference Error: no finite score vectors were recorded")
            }
            InferenceError::ScoreDimMismatch { expected, found } => write!(
                f,
                "Inference Error: score dimension mismatch (expected {}, found {})",
                expected, found
            ),

            // ---- Linear algebra ----
            InferenceError::SingularInformation { dim } => {
                write!(f, "Inference Error: {}x{} score outer-product matrix is singular", dim, dim)
            }
        }
    }
}
