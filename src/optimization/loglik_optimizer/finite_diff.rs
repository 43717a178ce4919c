//! loglik_optimizer::finite_diff — numerical gradients with error capture.
//!
//! Purpose
//! -------
//! Provide the numerical branch of the derivative provider: a per-dimension
//! central-difference gradient of a scalar objective over the flat parameter
//! vector, so that the rest of the optimizer can request derivatives without
//! depending directly on the `finitediff` API.
//!
//! Key behaviors
//! -------------
//! - [`central_gradient`] perturbs one coordinate at a time in both
//!   directions using `finitediff`'s fixed step (not user-tunable).
//! - When the central result cannot be trusted (an evaluation failed or an
//!   entry is non-finite) it retries once with forward differences via
//!   [`run_fd_diff`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Any error raised by the objective during finite differencing is routed
//!   into the shared `closure_err` cell; the closure itself returns `NaN`.
//! - Gradients returned from this module satisfy [`validate_grad`].
//!
//! Conventions
//! -----------
//! - The differentiated function is the *unnegated* objective (`ℓ` or `p`);
//!   the adapter flips the sign for argmin.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the exact central result on a quadratic, the forward
//!   fallback, error propagation and the invalid-gradient path.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        types::{Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::core::Error;
use finitediff::FiniteDiff;
use std::cell::RefCell;

/// central_gradient — central-difference gradient with forward fallback.
///
/// Parameters
/// ----------
/// - `theta`: `&Theta`
///   Point at which the gradient is approximated.
/// - `func`: `&G`
///   Objective `θ ↦ f(θ)`; assumed to write evaluation errors into
///   `closure_err` and return `NaN` in that case.
/// - `closure_err`: `&RefCell<Option<Error>>`
///   Error side channel shared with `func`. Cleared on entry.
///
/// Returns
/// -------
/// `OptResult<Grad>`
///   The central-difference gradient if it is clean, otherwise the result of
///   [`run_fd_diff`].
///
/// Errors
/// ------
/// - Whatever [`run_fd_diff`] reports when the fallback also fails.
///
/// Notes
/// -----
/// - Central differences use `(f(θ + h eᵢ) − f(θ − h eᵢ)) / 2h` with no
///   higher-order correction.
pub fn central_gradient<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.central_diff(func);
    if closure_err.borrow().is_none() && validate_grad(&fd_grad, theta.len()).is_ok() {
        return Ok(fd_grad);
    }
    run_fd_diff(theta, func, closure_err)
}

/// run_fd_diff — forward-difference gradient with error capture and validation.
///
/// Purpose
/// -------
/// Compute a forward-difference approximation to the gradient of a scalar
/// objective at `theta`, while capturing any error raised inside the
/// evaluation closure and enforcing basic shape/finiteness invariants on
/// the resulting gradient.
///
/// Returns
/// -------
/// `OptResult<Grad>`
///   - `Ok(grad)` when finite differencing succeeds, no error was
///     captured in `closure_err`, and the resulting gradient passes
///     [`validate_grad`].
///   - `Err(e)` when either `func` signaled an error via `closure_err`
///     or the gradient fails validation.
///
/// Errors
/// ------
/// - `OptError` (via `impl From<Error> for OptError`)
///   Returned when `closure_err` contains an error captured from `func`.
/// - `OptError::InvalidGradient`
///   Returned by [`validate_grad`] when any gradient element is NaN or
///   infinite.
pub fn run_fd_diff<G: Fn(&Theta) -> f64>(
    theta: &Theta, func: &G, closure_err: &RefCell<Option<Error>>,
) -> OptResult<Grad> {
    closure_err.replace(None);
    let fd_grad = theta.forward_diff(func);
    let dim = theta.len();
    if let Some(err) = closure_err.take() {
        return Err(err.into());
    }
    validate_grad(&fd_grad, dim)?;
    Ok(fd_grad)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::errors::OptError;
    use approx::assert_relative_eq;
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Central-difference accuracy and the forward-difference fallback.
    // - Propagation of errors captured inside the objective closure.
    // - Validation failures for non-finite gradients.
    //
    // They intentionally DO NOT cover:
    // - Constraint projection before differencing (see adapter tests).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Central differences are exact (to rounding) on a quadratic.
    //
    // Given
    // -----
    // - f(x) = -(x₀ − 3)² − 2 x₁² at θ = (0.1, 1).
    //
    // Expect
    // ------
    // - ∇f = (5.8, −4).
    fn central_gradient_matches_analytic_quadratic() {
        // Arrange
        let theta: Theta = array![0.1, 1.0];
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let f = |x: &Theta| -(x[0] - 3.0).powi(2) - 2.0 * x[1] * x[1];

        // Act
        let grad = central_gradient(&theta, &f, &closure_err).unwrap();

        // Assert
        assert_relative_eq!(grad[0], 5.8, epsilon = 1e-6);
        assert_relative_eq!(grad[1], -4.0, epsilon = 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // A one-sided singularity poisons the central stencil but not the
    // forward one, so the fallback recovers a finite gradient.
    //
    // Given
    // -----
    // - f(x) = x for x ≥ 0, NaN otherwise, evaluated at θ = 0.
    //
    // Expect
    // ------
    // - `Ok(grad)` with grad ≈ 1.
    fn central_gradient_falls_back_to_forward() {
        // Arrange
        let theta: Theta = array![0.0];
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let f = |x: &Theta| if x[0] >= 0.0 { x[0] } else { f64::NAN };

        // Act
        let grad = central_gradient(&theta, &f, &closure_err).unwrap();

        // Assert
        assert_relative_eq!(grad[0], 1.0, epsilon = 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // An error written by the objective closure surfaces as an `OptError`.
    //
    // Given
    // -----
    // - A closure that stores `OptError::ModelError` and returns NaN.
    //
    // Expect
    // ------
    // - The same `ModelError` comes back.
    fn closure_error_is_propagated() {
        // Arrange
        let theta: Theta = array![1.0];
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let f = |_: &Theta| {
            closure_err.replace(Some(OptError::ModelError { text: "fd test".into() }.into()));
            f64::NAN
        };

        // Act
        let err = central_gradient(&theta, &f, &closure_err).unwrap_err();

        // Assert
        assert_eq!(err, OptError::ModelError { text: "fd test".into() });
    }

    #[test]
    // Purpose
    // -------
    // A gradient that is non-finite on both stencils is rejected.
    //
    // Given
    // -----
    // - An objective that always returns NaN.
    //
    // Expect
    // ------
    // - `Err(OptError::InvalidGradient { .. })`.
    fn non_finite_gradient_yields_invalid_gradient_error() {
        let theta: Theta = array![0.0, 1.0];
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let f = |_x: &Theta| f64::NAN;

        match central_gradient(&theta, &f, &closure_err) {
            Err(OptError::InvalidGradient { .. }) => {}
            other => panic!("Expected InvalidGradient, got {other:?}"),
        }
    }
}
