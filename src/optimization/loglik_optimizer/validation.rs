//! Validation helpers for likelihood optimization.
//!
//! This module centralizes common consistency checks used across the
//! optimizer interface:
//!
//! - **Configuration checks**: [`verify_step_size`], [`verify_tolerance`],
//!   [`verify_positive`] (annealing schedule fields) and [`verify_scale`]
//!   (restart) ensure numeric settings are finite and strictly positive.
//! - **Starting points**: [`validate_start`] enforces the model's flat
//!   parameter length.
//! - **Gradient validation**: [`validate_grad`] enforces correct dimension
//!   and finite entries.
//!
//! These helpers standardize error reporting by returning domain-specific
//! [`OptError`] variants, making higher-level code more uniform and easier
//! to debug.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::types::{Grad, Theta},
};

/// Validate the step size (simplex edge, line-search step, annealing budget).
///
/// # Errors
/// Returns [`OptError::InvalidStepSize`] if the value is non-finite or ≤ 0.0.
pub fn verify_step_size(value: f64) -> OptResult<()> {
    if !value.is_finite() {
        return Err(OptError::InvalidStepSize { value, reason: "Step size must be finite." });
    }
    if value <= 0.0 {
        return Err(OptError::InvalidStepSize { value, reason: "Step size must be positive." });
    }
    Ok(())
}

/// Validate the convergence tolerance.
///
/// # Errors
/// Returns [`OptError::InvalidTolerance`] if the value is non-finite or ≤ 0.0.
pub fn verify_tolerance(tol: f64) -> OptResult<()> {
    if !tol.is_finite() {
        return Err(OptError::InvalidTolerance { tol, reason: "Tolerance must be finite." });
    }
    if tol <= 0.0 {
        return Err(OptError::InvalidTolerance { tol, reason: "Tolerance must be positive." });
    }
    Ok(())
}

/// Validate a strictly positive, finite annealing schedule field.
///
/// # Errors
/// Returns [`OptError::InvalidSchedule`] carrying `field`.
pub fn verify_positive(field: &'static str, value: f64) -> OptResult<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(OptError::InvalidSchedule {
            field,
            value,
            reason: "Value must be finite and positive.",
        });
    }
    Ok(())
}

/// Validate the restart scale factor.
///
/// # Errors
/// Returns [`OptError::InvalidScale`] if the value is non-finite or ≤ 0.0.
pub fn verify_scale(value: f64) -> OptResult<()> {
    if !(value.is_finite() && value > 0.0) {
        return Err(OptError::InvalidScale { value, reason: "Scale must be finite and positive." });
    }
    Ok(())
}

/// Validate a starting point against the model's flat parameter length.
///
/// # Errors
/// Returns [`OptError::StartDimMismatch`] when the lengths differ.
pub fn validate_start(start: &Theta, expected: usize) -> OptResult<()> {
    if start.len() != expected {
        return Err(OptError::StartDimMismatch { expected, found: start.len() });
    }
    Ok(())
}

/// Validate a gradient vector against dimension and finiteness.
///
/// Checks:
/// - `grad.len() == dim`
/// - every element is finite (`NaN` or `±∞` are rejected)
///
/// # Errors
/// - [`OptError::GradientDimMismatch`] if length does not match `dim`.
/// - [`OptError::InvalidGradient`] with the index/value/reason of the first
///   offending element.
pub fn validate_grad(grad: &Grad, dim: usize) -> OptResult<()> {
    if grad.len() != dim {
        return Err(OptError::GradientDimMismatch { expected: dim, found: grad.len() });
    }
    for (index, &value) in grad.iter().enumerate() {
        if !value.is_finite() {
            return Err(OptError::InvalidGradient {
                index,
                value,
                reason: "Gradient elements must be finite.",
            });
        }
    }
    Ok(())
}
