//! Execution helper that runs an `argmin` solver on an adapted model and
//! returns a crate-friendly [`RunOutcome`].
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        adapter::ArgMinAdapter,
        observers::ProgressLogger,
        traits::{MLEOptions, Model, Status},
        types::{Cost, FnEvalMap, SolverState, Theta},
    },
};
use argmin::core::{observers::ObserverMode, CostFunction, Executor, Solver, State};

/// Raw result of one driver run, before conversion to an `Estimate`.
///
/// - `theta_hat`: best flat parameters seen (the start if nothing improved).
/// - `cost`: the adapter cost at `theta_hat`.
#[derive(Debug, Clone, PartialEq)]
pub struct RunOutcome {
    pub theta_hat: Theta,
    pub cost: Cost,
    pub status: Status,
    pub iterations: u64,
    pub fn_evals: FnEvalMap,
}

/// Run an `argmin` solver on a model problem.
///
/// This is the shared runner used by every driver. It wires up:
/// - the user model via [`ArgMinAdapter`],
/// - the chosen `Solver` (simplex, supervised conjugate gradient or BFGS,
///   annealing),
/// - initial parameter `theta0` and, for BFGS, an initial inverse Hessian,
/// - the per-driver iteration cap,
/// - a [`ProgressLogger`] when `opts.verbose` is set, plus argmin's terminal
///   slog observer behind the `obs_slog` feature,
///
/// then executes the solver and converts the result into [`RunOutcome`].
///
/// # Type Parameters
/// - `M`: the user model.
/// - `S`: any solver running on [`SolverState<H>`] for this problem.
/// - `H`: the state's Hessian slot; `()` for every driver except BFGS.
///
/// # Errors
/// Propagates any `argmin` runtime error that the solver did not capture
/// itself, via the crate's `From<argmin::core::Error>` conversion.
pub fn run_solver<'a, M, S, H>(
    theta0: Theta, opts: &MLEOptions, problem: ArgMinAdapter<'a, M>, solver: S,
    inv_hessian: Option<H>, max_iters: u64,
) -> OptResult<RunOutcome>
where
    M: Model,
    S: Solver<ArgMinAdapter<'a, M>, SolverState<H>>,
    H: Clone + 'static,
{
    log_initial_state(&theta0, &problem);
    let kind = problem.kind;
    let fallback = theta0.clone();
    let mut optimizer = Executor::new(problem, solver).configure(|state| {
        let state = state.param(theta0).max_iters(max_iters);
        match inv_hessian {
            Some(h) => state.inv_hessian(h),
            None => state,
        }
    });
    if opts.verbose {
        optimizer = optimizer.add_observer(ProgressLogger::new(kind), ObserverMode::Always);
        #[cfg(feature = "obs_slog")]
        {
            let observer = argmin_observer_slog::SlogLogger::term_noblock();
            optimizer = optimizer.add_observer(observer, ObserverMode::Always);
        }
    }

    let mut result = optimizer.run()?.state().clone();
    let status = Status::from_termination(result.get_termination_status());
    let iterations = result.get_iter();
    let fn_evals = result.get_func_counts().clone();
    let cost = result.get_best_cost();
    let theta_hat = result.take_best_param().unwrap_or(fallback);
    log::debug!("run finished: {status} after {iterations} iterations, cost = {cost:.6}");
    Ok(RunOutcome { theta_hat, cost, status, iterations, fn_evals })
}

// ---- Helper Methods ----

fn log_initial_state<M: Model>(theta0: &Theta, problem: &ArgMinAdapter<'_, M>) {
    if !log::log_enabled!(log::Level::Debug) {
        return;
    }
    if let Ok(c0) = problem.cost(theta0) {
        log::debug!(
            "init: model = {}, ll(theta0) = {:.6}",
            problem.model.name(),
            problem.kind.log_likelihood(c0)
        );
    }
}
