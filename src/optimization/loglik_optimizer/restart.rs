//! loglik_optimizer::restart — re-run a solve from a previous estimate.
//!
//! Purpose
//! -------
//! Give a finished estimate a second chance: rerun the pipeline from its
//! point with a (possibly different) driver and a rescaled step/tolerance,
//! and keep whichever result is better and numerically sound.
//!
//! Key behaviors
//! -------------
//! - The new run starts from the previous estimate when every coordinate is
//!   finite and below [`RESTART_BOUND`] in absolute value, otherwise from
//!   the previous configuration's start (or the new driver's default).
//! - `step_size` and `tolerance` are both multiplied by `scale`.
//! - The new estimate replaces the old one only if it is bounded and its
//!   log-likelihood is strictly higher; ties keep the original.
//! - A rerun that fails to start (for instance `Model::check` rejecting the
//!   new starting point) is logged and the original is returned.
//!
//! Testing notes
//! -------------
//! - Unit tests cover the keep/replace decision and scale validation; the
//!   never-worse property is also exercised end to end in the integration
//!   tests.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        api::maximize,
        traits::{Estimate, Method, Model},
        types::RESTART_BOUND,
        validation::{verify_scale, verify_step_size, verify_tolerance},
    },
};

/// restart — rerun `maximize` seeded by `previous` and keep the better result.
///
/// Parameters
/// ----------
/// - `model`, `data`: the same model and data that produced `previous`.
/// - `previous`: `Estimate`
///   The estimate to improve on; returned unchanged if the rerun loses.
/// - `new_method`: `Option<Method>`
///   Driver for the rerun; `None` keeps `previous.options.method`.
/// - `scale`: `f64`
///   Factor applied to both step size and tolerance.
///
/// Returns
/// -------
/// `OptResult<Estimate>`
///   The rerun when it is bounded and strictly better, else `previous`.
///   A rerun that `maximize` rejects (for instance when `model.check`
///   refuses the new start) also yields `previous`.
///
/// Errors
/// ------
/// - `OptError::InvalidScale` for a non-finite or non-positive `scale`.
/// - `InvalidStepSize` / `InvalidTolerance` if scaling overflows or
///   underflows the configuration.
pub fn restart<M: Model>(
    model: &M, data: &M::Data, previous: Estimate, new_method: Option<Method>, scale: f64,
) -> OptResult<Estimate> {
    verify_scale(scale)?;
    let mut opts = previous.options.clone();
    if let Some(method) = new_method {
        opts.method = method;
    }
    if previous.is_bounded(RESTART_BOUND) {
        opts.start = Some(previous.theta_hat.clone());
    }
    opts.step_size *= scale;
    opts.tolerance *= scale;
    verify_step_size(opts.step_size)?;
    verify_tolerance(opts.tolerance)?;

    let candidate = match maximize(model, data, &opts) {
        Ok(candidate) => candidate,
        Err(err) => {
            log::warn!(
                "restart: {} rerun rejected ({err}); keeping ll = {:.6}",
                opts.method,
                previous.log_likelihood
            );
            return Ok(previous);
        }
    };
    if keeps_candidate(&previous, &candidate) {
        log::info!(
            "restart: {} improved ll from {:.6} to {:.6}",
            opts.method,
            previous.log_likelihood,
            candidate.log_likelihood
        );
        Ok(candidate)
    } else {
        log::info!("restart: {} did not improve on ll = {:.6}", opts.method, previous.log_likelihood);
        Ok(previous)
    }
}

fn keeps_candidate(previous: &Estimate, candidate: &Estimate) -> bool {
    candidate.is_bounded(RESTART_BOUND) && candidate.log_likelihood > previous.log_likelihood
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        inference::covariance::Covariance,
        optimization::{
            errors::OptError,
            loglik_optimizer::{
                params::{ParamShape, Parameters},
                traits::{MLEOptions, Status},
                types::Theta,
            },
        },
    };
    use ndarray::array;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The keep/replace rule (bounded and strictly better).
    // - Scale validation and the improvement path on a simple model.
    //
    // They intentionally DO NOT cover:
    // - Every driver combination (see integration tests).
    // -------------------------------------------------------------------------

    struct Peak;

    impl Model for Peak {
        type Data = ();

        fn name(&self) -> &str {
            "peak"
        }

        fn shape(&self, _: &()) -> ParamShape {
            ParamShape::vector(1)
        }

        fn log_likelihood(&self, p: &Parameters, _: &()) -> OptResult<f64> {
            let x = p.vector.as_ref().map_or(0.0, |v| v[0]);
            Ok(-(x - 3.0).powi(2))
        }
    }

    /// Feasible only for x ≤ 2; `check` rejects anything beyond.
    struct Fenced;

    impl Model for Fenced {
        type Data = ();

        fn name(&self) -> &str {
            "fenced"
        }

        fn shape(&self, _: &()) -> ParamShape {
            ParamShape::vector(1)
        }

        fn log_likelihood(&self, p: &Parameters, _: &()) -> OptResult<f64> {
            let x = p.vector.as_ref().map_or(0.0, |v| v[0]);
            Ok(-(x - 3.0).powi(2))
        }

        fn check(&self, p: &Parameters, _: &()) -> OptResult<()> {
            match p.vector.as_ref() {
                Some(v) if v[0] > 2.0 => {
                    Err(OptError::ModelError { text: format!("x = {} is out of range", v[0]) })
                }
                _ => Ok(()),
            }
        }
    }

    fn estimate(theta: Theta, ll: f64, opts: MLEOptions) -> Estimate {
        Estimate {
            params: Parameters::from_vector(theta.clone()),
            theta_hat: theta,
            log_likelihood: ll,
            status: Status::MaxIterationsReached,
            covariance: Covariance::NotRequested,
            iterations: 0,
            fn_evals: Default::default(),
            options: opts,
        }
    }

    #[test]
    // Purpose
    // -------
    // Only bounded, strictly better candidates replace the original.
    //
    // Given
    // -----
    // - An original with ll −1 and candidates with ll −1, −0.5 and an
    //   unbounded one with ll 0.
    //
    // Expect
    // ------
    // - Tie kept, improvement taken, unbounded rejected.
    fn keep_rule_requires_bounded_and_strictly_better() {
        let opts = MLEOptions::default();
        let original = estimate(array![1.0], -1.0, opts.clone());

        assert!(!keeps_candidate(&original, &estimate(array![2.0], -1.0, opts.clone())));
        assert!(keeps_candidate(&original, &estimate(array![2.0], -0.5, opts.clone())));
        assert!(!keeps_candidate(&original, &estimate(array![2e4], 0.0, opts)));
    }

    #[test]
    // Purpose
    // -------
    // A poor estimate is improved and a bad scale is rejected.
    //
    // Given
    // -----
    // - An estimate at x = 1 (ll = −4) for ℓ(x) = −(x − 3)².
    //
    // Expect
    // ------
    // - Restarting with the simplex returns x̂ ≈ 3 with a higher ll.
    // - scale = 0 is `InvalidScale`.
    fn restart_improves_poor_estimate_and_validates_scale() {
        // Arrange
        let opts = MLEOptions::new(Method::FletcherReeves, 1.0, 1e-3).unwrap();
        let previous = estimate(array![1.0], -4.0, opts);

        // Act
        let improved = restart(&Peak, &(), previous.clone(), Some(Method::Simplex), 1.0).unwrap();
        let err = restart(&Peak, &(), previous, None, 0.0).unwrap_err();

        // Assert
        assert!((improved.theta_hat[0] - 3.0).abs() < 1e-2);
        assert!(improved.log_likelihood > -4.0);
        assert_eq!(improved.options.method, Method::Simplex);
        assert!(matches!(err, OptError::InvalidScale { .. }));
    }

    #[test]
    // Purpose
    // -------
    // A rerun that cannot even start leaves the previous estimate intact.
    //
    // Given
    // -----
    // - A previous estimate at x = 2.5 whose model rejects x > 2 in `check`.
    //
    // Expect
    // ------
    // - `Ok` with the previous estimate unchanged.
    fn restart_keeps_previous_when_rerun_is_rejected() {
        // Arrange
        let opts = MLEOptions::new(Method::Simplex, 1.0, 1e-3).unwrap();
        let previous = estimate(array![2.5], -0.25, opts);

        // Act
        let kept = restart(&Fenced, &(), previous.clone(), None, 1.0).unwrap();

        // Assert
        assert_eq!(kept.theta_hat, previous.theta_hat);
        assert_eq!(kept.log_likelihood, previous.log_likelihood);
        assert_eq!(kept.options.method, Method::Simplex);
    }
}
