//! High-level entry point for maximizing a user-provided [`Model`].
//!
//! [`maximize`] validates the configuration, wraps the model in an
//! [`ArgMinAdapter`] (which *minimizes* `−ℓ(θ)`), dispatches to the driver
//! selected by `MLEOptions::method`, and normalizes the run into an
//! [`Estimate`] with an optional trajectory-based covariance.
use crate::{
    inference::covariance::Covariance,
    optimization::{
        errors::OptResult,
        loglik_optimizer::{
            adapter::ArgMinAdapter,
            annealing::default_rng,
            builders::{
                build_annealer, build_bfgs, build_fletcher_reeves, build_polak_ribiere,
                build_simplex, default_start,
            },
            params::Parameters,
            run::{run_solver, RunOutcome},
            supervisor::TrajectoryRecorder,
            traits::{AnnealSchedule, Dataset, Estimate, MLEOptions, Method, Model},
            types::{
                CovMatrix, Grad, Theta, MAX_ANNEALING_LEVELS, MAX_ITERATIONS_GRADIENT,
                MAX_ITERATIONS_SIMPLEX,
            },
            validation::{validate_start, verify_step_size, verify_tolerance},
        },
    },
};

/// Maximize a model's likelihood with the configured driver.
///
/// # Behavior
/// - Re-validates step size, tolerance and annealing schedule (the option
///   fields are public and may have been edited after construction).
/// - Resolves the starting point: `opts.start`, or the driver default from
///   [`default_start`]. Its length must match `model.shape(data)`.
/// - Calls `model.check` on the unpacked starting point.
/// - Detects whether the model supplies a log-likelihood or a density.
/// - Runs the driver:
///   - simplex: Nelder–Mead with constraint penalties, capped at
///     [`MAX_ITERATIONS_SIMPLEX`];
///   - Fletcher–Reeves / Polak–Ribière / BFGS: supervised gradient drivers
///     with constraint penalties, capped at [`MAX_ITERATIONS_GRADIENT`];
///   - annealing: projected proposals without penalties, capped at
///     [`MAX_ANNEALING_LEVELS`] temperature levels.
/// - Projects the best point through the constraint, evaluates the
///   log-likelihood there (`ln p` for density models) and, when requested,
///   estimates the covariance from the recorded score trajectory.
///
/// # Errors
/// - Configuration errors (`InvalidStepSize`, `InvalidTolerance`,
///   `InvalidSchedule`, `StartDimMismatch`, `MissingLikelihood`) and
///   anything `model.check` reports, all before the first iteration.
/// - Backend errors the driver could not capture itself.
///
/// Numerical non-convergence is **not** an error: inspect
/// [`Estimate::status`].
///
/// # Example
/// ```
/// use ndarray::array;
/// use rust_mle::optimization::{errors::OptResult, loglik_optimizer::prelude::*};
///
/// struct Peak;
///
/// impl Model for Peak {
///     type Data = ();
///     fn name(&self) -> &str { "peak" }
///     fn shape(&self, _: &()) -> ParamShape { ParamShape::vector(1) }
///     fn log_likelihood(&self, p: &Parameters, _: &()) -> OptResult<f64> {
///         let x = p.vector.as_ref().map_or(0.0, |v| v[0]);
///         Ok(-(x - 3.0).powi(2))
///     }
/// }
///
/// let opts = MLEOptions::new(Method::FletcherReeves, 1.0, 1e-3)?.with_start(array![0.1]);
/// let est = maximize(&Peak, &(), &opts)?;
/// assert!(est.converged());
/// assert!((est.theta_hat[0] - 3.0).abs() < 1e-3);
/// assert!(est.log_likelihood.abs() < 1e-6);
/// # Ok::<(), rust_mle::optimization::errors::OptError>(())
/// ```
pub fn maximize<M: Model>(model: &M, data: &M::Data, opts: &MLEOptions) -> OptResult<Estimate> {
    verify_step_size(opts.step_size)?;
    verify_tolerance(opts.tolerance)?;
    let s = opts.anneal;
    AnnealSchedule::new(s.tries_per_step, s.iters_per_temp, s.k, s.t_initial, s.mu_t, s.t_min)?;

    let shape = model.shape(data);
    let theta0 = opts.start.clone().unwrap_or_else(|| default_start(opts.method, shape.len()));
    validate_start(&theta0, shape.len())?;
    model.check(&Parameters::unpack(&theta0, &shape), data)?;

    let use_constraint = opts.method != Method::Annealing;
    let problem = ArgMinAdapter::new(model, data, opts, &theta0, use_constraint)?;
    let recorder = opts.want_cov.then(|| TrajectoryRecorder::new(problem.kind));
    let finisher = problem.clone();
    log::debug!("maximize: model = {}, method = {}", model.name(), opts.method);

    let outcome = drive(theta0, opts, problem, recorder.clone())?;

    let theta_hat = finisher.project(&outcome.theta_hat);
    let log_likelihood =
        finisher.log_likelihood_at(&theta_hat).unwrap_or(f64::NEG_INFINITY);
    let covariance = match &recorder {
        Some(recorder) => Covariance::estimate(&recorder.take(), theta_hat.len(), data.n_obs()),
        None => Covariance::NotRequested,
    };
    Ok(Estimate {
        params: Parameters::unpack(&theta_hat, &shape),
        theta_hat,
        log_likelihood,
        status: outcome.status,
        covariance,
        iterations: outcome.iterations,
        fn_evals: outcome.fn_evals,
        options: opts.clone(),
    })
}

/// Dispatch to the configured driver.
fn drive<M: Model>(
    theta0: Theta, opts: &MLEOptions, problem: ArgMinAdapter<'_, M>,
    recorder: Option<TrajectoryRecorder>,
) -> OptResult<RunOutcome> {
    match opts.method {
        Method::Simplex => {
            let solver = build_simplex(opts);
            run_solver(theta0, opts, problem, solver, None::<()>, MAX_ITERATIONS_SIMPLEX)
        }
        Method::FletcherReeves => {
            let solver = build_fletcher_reeves(opts, recorder)?;
            run_solver(theta0, opts, problem, solver, None::<()>, MAX_ITERATIONS_GRADIENT)
        }
        Method::PolakRibiere => {
            let solver = build_polak_ribiere(opts, recorder)?;
            run_solver(theta0, opts, problem, solver, None::<()>, MAX_ITERATIONS_GRADIENT)
        }
        Method::Bfgs => {
            let solver = build_bfgs(opts, recorder)?;
            let inv_hessian = CovMatrix::eye(theta0.len());
            run_solver(theta0, opts, problem, solver, Some(inv_hessian), MAX_ITERATIONS_GRADIENT)
        }
        Method::Annealing => {
            // One handle for proposals and acceptance draws.
            let rng = opts.rng.clone().unwrap_or_else(default_rng);
            let problem = problem.with_rng(rng.clone());
            let solver = build_annealer(opts, rng, recorder);
            run_solver(theta0, opts, problem, solver, None::<()>, MAX_ANNEALING_LEVELS)
        }
    }
}

/// Numerical score of a model's objective at `params`.
///
/// Central differences over the packed parameter vector (forward differences
/// where the central stencil is non-finite), evaluated at the constraint
/// projection of `params`. Any analytic score the model supplies is ignored.
/// The objective is the log-likelihood, or the density for density-only
/// models.
///
/// # Errors
/// - `StartDimMismatch` when `params` does not match `model.shape(data)`.
/// - `MissingLikelihood` for models with neither objective.
/// - Errors raised by the model while differencing, or `InvalidGradient`.
pub fn numerical_gradient<M: Model>(
    model: &M, params: &Parameters, data: &M::Data,
) -> OptResult<Grad> {
    let theta = params.pack();
    validate_start(&theta, model.shape(data).len())?;
    let problem = ArgMinAdapter::new(model, data, &MLEOptions::default(), &theta, false)?;
    problem.numerical_score(&problem.project(&theta))
}
