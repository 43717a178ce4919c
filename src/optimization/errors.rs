use argmin::core::{ArgminError, Error};

/// Crate-wide result alias for optimizer operations.
pub type OptResult<T> = Result<T, OptError>;

#[derive(Debug, Clone, PartialEq)]
pub enum OptError {
    // ---- Model capabilities ----
    /// Default body of `Model::log_likelihood` / `Model::density`.
    LikelihoodNotImplemented,

    /// The model exposes neither a log-likelihood nor a density.
    MissingLikelihood {
        model: String,
    },

    /// Model-side evaluation failure (domain violation, bad data, ...).
    ModelError {
        text: String,
    },

    // ---- Gradient ----
    /// Implies that FD should be used
    GradientNotImplemented,

    /// Gradient dimensions do not match parameter dimensions.
    GradientDimMismatch {
        expected: usize,
        found: usize,
    },

    /// Gradient elements need to be finite
    InvalidGradient {
        index: usize,
        value: f64,
        reason: &'static str,
    },

    // ---- MLEOptions ----
    /// Step size needs to be positive and finite.
    InvalidStepSize {
        value: f64,
        reason: &'static str,
    },
    /// Tolerance needs to be positive and finite.
    InvalidTolerance {
        tol: f64,
        reason: &'static str,
    },
    /// One of the annealing schedule fields is out of range.
    InvalidSchedule {
        field: &'static str,
        value: f64,
        reason: &'static str,
    },
    /// Unknown method name.
    InvalidMethod {
        name: String,
        reason: &'static str,
    },
    /// The starting point does not match the model's parameter shape.
    StartDimMismatch {
        expected: usize,
        found: usize,
    },

    // ---- Restart ----
    /// Restart scale needs to be positive and finite.
    InvalidScale {
        value: f64,
        reason: &'static str,
    },

    // ---- Trace ----
    /// A trace sink failed to record a row.
    TraceWrite {
        text: String,
    },

    // ---- Missing data ----
    /// Imputation was requested on a dataset without NaN cells.
    NoMissingData,
    /// Mean, covariance and data columns disagree in dimension.
    ImputationDimMismatch {
        columns: usize,
        mean: usize,
        cov: (usize, usize),
    },
    /// The imputation covariance has no Cholesky factor.
    CovarianceNotPositiveDefinite,

    // ---- Argmin ---
    /// Wrapper for argmin::InvalidParameter
    InvalidParameter {
        text: String,
    },
    /// Wrapper for argmin::NotImplemented
    NotImplemented {
        text: String,
    },
    /// Wrapper for argmin::NotInitialized
    NotInitialized {
        text: String,
    },
    /// Wrapper for argmin::ConditionViolated
    ConditionViolated {
        text: String,
    },
    /// Wrapper for argmin::CheckPointNotFound
    CheckPointNotFound {
        text: String,
    },
    /// Wrapper for argmin::PotentialBug
    PotentialBug {
        text: String,
    },
    /// Wrapper for argmin::ImpossibleError
    ImpossibleError {
        text: String,
    },
    /// Wrapper for other argmin::Error types
    BackendError {
        text: String,
    },

    // ---- Fallback ----
    UnknownError,
}

impl std::error::Error for OptError {}

impl std::fmt::Display for OptError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            // ---- Model capabilities ----
            OptError::LikelihoodNotImplemented => {
                write!(f, "Likelihood evaluation not implemented")
            }
            OptError::MissingLikelihood { model } => {
                write!(f, "Model '{model}' provides neither a log-likelihood nor a density")
            }
            OptError::ModelError { text } => {
                write!(f, "Model evaluation failed: {text}")
            }

            // ---- Gradient ----
            OptError::GradientNotImplemented => {
                write!(f, "Gradient optimization not implemented")
            }
            OptError::GradientDimMismatch { expected, found } => {
                write!(f, "Gradient dimension mismatch: expected {expected}, found {found}")
            }
            OptError::InvalidGradient { index, value, reason } => {
                write!(f, "Invalid gradient at index {index}: {value}: {reason}")
            }

            // ---- MLEOptions ----
            OptError::InvalidStepSize { value, reason } => {
                write!(f, "Invalid step size {value}: {reason}")
            }
            OptError::InvalidTolerance { tol, reason } => {
                write!(f, "Invalid tolerance {tol}: {reason}")
            }
            OptError::InvalidSchedule { field, value, reason } => {
                write!(f, "Invalid annealing schedule field '{field}' = {value}: {reason}")
            }
            OptError::InvalidMethod { name, reason } => {
                write!(f, "Invalid method '{name}': {reason}")
            }
            OptError::StartDimMismatch { expected, found } => {
                write!(f, "Starting point dimension mismatch: expected {expected}, found {found}")
            }

            // ---- Restart ----
            OptError::InvalidScale { value, reason } => {
                write!(f, "Invalid restart scale {value}: {reason}")
            }

            // ---- Trace ----
            OptError::TraceWrite { text } => {
                write!(f, "Trace write failed: {text}")
            }

            // ---- Missing data ----
            OptError::NoMissingData => {
                write!(f, "Dataset has no missing cells to impute")
            }
            OptError::ImputationDimMismatch { columns, mean, cov } => {
                write!(
                    f,
                    "Imputation dimension mismatch: {columns} data columns, mean of length {mean}, covariance {cov:?}"
                )
            }
            OptError::CovarianceNotPositiveDefinite => {
                write!(f, "Imputation covariance is not positive definite")
            }

            // ---- Argmin ----
            OptError::InvalidParameter { text } => {
                write!(f, "Invalid parameter: {text}")
            }
            OptError::NotImplemented { text } => {
                write!(f, "Not implemented: {text}")
            }
            OptError::NotInitialized { text } => {
                write!(f, "Not initialized: {text}")
            }
            OptError::ConditionViolated { text } => {
                write!(f, "Condition violated: {text}")
            }
            OptError::CheckPointNotFound { text } => {
                write!(f, "Checkpoint not found: {text}")
            }
            OptError::PotentialBug { text } => {
                write!(f, "Potential bug: {text}")
            }
            OptError::ImpossibleError { text } => {
                write!(f, "Impossible error: {text}")
            }
            OptError::BackendError { text } => {
                write!(f, "Backend error: {text}")
            }

            // ---- Fallback ----
            OptError::UnknownError => {
                write!(f, "Unknown error")
            }
        }
    }
}

impl From<Error> for OptError {
    fn from(original_err: Error) -> Self {
        // Our own errors travel through argmin boxed in its anyhow-based `Error`.
        let original_err = match original_err.downcast::<OptError>() {
            Ok(opt_err) => return opt_err,
            Err(err) => err,
        };
        match original_err.downcast() {
            Ok(opt_err) => match opt_err {
                ArgminError::InvalidParameter { text } => OptError::InvalidParameter { text },
                ArgminError::NotImplemented { text } => OptError::NotImplemented { text },
                ArgminError::NotInitialized { text } => OptError::NotInitialized { text },
                ArgminError::ConditionViolated { text } => OptError::ConditionViolated { text },
                ArgminError::CheckpointNotFound { text } => OptError::CheckPointNotFound { text },
                ArgminError::PotentialBug { text } => OptError::PotentialBug { text },
                ArgminError::ImpossibleError { text } => OptError::ImpossibleError { text },
                _ => OptError::UnknownError,
            },
            Err(err) => OptError::BackendError { text: err.to_string() },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Recovery of `OptError` values that travelled through argmin's `Error`.
    // - Mapping of `ArgminError` variants and foreign errors.
    //
    // They intentionally DO NOT cover:
    // - Display strings beyond a smoke check.
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // An `OptError` boxed into argmin's `Error` comes back unchanged.
    //
    // Given
    // -----
    // - `OptError::StartDimMismatch` converted into `argmin::core::Error`.
    //
    // Expect
    // ------
    // - `OptError::from` yields the identical variant.
    fn from_error_recovers_boxed_opterror() {
        // Arrange
        let original = OptError::StartDimMismatch { expected: 3, found: 2 };
        let boxed: Error = original.clone().into();

        // Act
        let recovered = OptError::from(boxed);

        // Assert
        assert_eq!(recovered, original);
    }

    #[test]
    // Purpose
    // -------
    // Argmin's own error kinds map onto the named wrapper variants.
    //
    // Given
    // -----
    // - `ArgminError::ConditionViolated` and a plain string error.
    //
    // Expect
    // ------
    // - The first maps to `OptError::ConditionViolated`.
    // - The second falls back to `OptError::BackendError`.
    fn from_error_maps_argmin_and_foreign_errors() {
        // Arrange
        let argmin_err: Error = ArgminError::ConditionViolated { text: "ls".to_string() }.into();
        let foreign: Error = Error::msg("boom");

        // Act
        let mapped = OptError::from(argmin_err);
        let wrapped = OptError::from(foreign);

        // Assert
        assert_eq!(mapped, OptError::ConditionViolated { text: "ls".to_string() });
        assert_eq!(wrapped, OptError::BackendError { text: "boom".to_string() });
        assert!(format!("{}", OptError::NoMissingData).contains("missing"));
    }
}
