//! loglik_optimizer::supervisor — shared stopping, failure and recording rules.
//!
//! Purpose
//! -------
//! Wrap a stock argmin solver so that every driver family ends the same way:
//! a gradient-norm convergence test, a numerical failure that still reports
//! the best point seen, and score recording for the covariance estimator.
//!
//! Key behaviors
//! -------------
//! - [`Supervised`] forwards `init` / `next_iter` to the inner solver. When
//!   the inner solver errors (line-search breakdown, failed gradient), the
//!   last good state is returned terminated with `SolverExit`, which the
//!   caller reports as `Status::Failed`.
//! - Convergence is declared once `‖∇c(θ)‖₂ < tol_grad`.
//! - [`TrajectoryRecorder`] is a cloneable handle to one run's
//!   [`Trajectory`]; it converts costs and cost gradients back to
//!   log-likelihood space before recording.
//!
//! Invariants & assumptions
//! ------------------------
//! - The wrapped solver runs on [`SolverState`]; a backup copy of the state
//!   is taken before each inner call.
//!
//! Testing notes
//! -------------
//! - Unit tests cover cost/score conversion for both objective kinds and the
//!   failure path with a solver that always errors.
use crate::{
    inference::trajectory::Trajectory,
    optimization::loglik_optimizer::{
        adapter::ObjectiveKind,
        types::{Cost, Grad, SolverState},
    },
};
use argmin::core::{
    Error, Problem, Solver, State, TerminationReason, TerminationStatus, KV,
};
use argmin_math::ArgminL2Norm;
use std::sync::{Arc, Mutex, PoisonError};

/// Cloneable recorder feeding one run's score trajectory.
#[derive(Debug, Clone)]
pub struct TrajectoryRecorder {
    kind: ObjectiveKind,
    trajectory: Arc<Mutex<Trajectory>>,
}

impl TrajectoryRecorder {
    pub fn new(kind: ObjectiveKind) -> Self {
        Self { kind, trajectory: Arc::new(Mutex::new(Trajectory::new())) }
    }

    /// Record a point given its cost and cost gradient.
    ///
    /// Non-finite inputs are dropped.
    pub fn record(&self, cost: Cost, cost_grad: &Grad) {
        if !cost.is_finite() || cost_grad.iter().any(|g| !g.is_finite()) {
            return;
        }
        let score = self.kind.score(cost, cost_grad);
        let ll = self.kind.log_likelihood(cost);
        self.trajectory.lock().unwrap_or_else(PoisonError::into_inner).record(score, ll);
    }

    /// Move the recorded trajectory out, leaving an empty one behind.
    pub fn take(&self) -> Trajectory {
        std::mem::take(&mut *self.trajectory.lock().unwrap_or_else(PoisonError::into_inner))
    }
}

/// A solver wrapped with gradient-norm convergence and failure capture.
pub struct Supervised<S> {
    inner: S,
    tol_grad: Option<f64>,
    recorder: Option<TrajectoryRecorder>,
}

impl<S> Supervised<S> {
    pub fn new(inner: S) -> Self {
        Self { inner, tol_grad: None, recorder: None }
    }

    /// Declare convergence once the cost gradient norm drops below `tol`.
    pub fn with_tolerance_grad(mut self, tol: f64) -> Self {
        self.tol_grad = Some(tol);
        self
    }

    pub fn with_recorder(mut self, recorder: TrajectoryRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    fn record<H>(&self, state: &SolverState<H>) {
        if let (Some(recorder), Some(grad)) = (&self.recorder, state.get_gradient()) {
            recorder.record(state.get_cost(), grad);
        }
    }
}

fn failed<H>(backup: SolverState<H>, err: Error) -> SolverState<H> {
    log::warn!("optimizer stopped early: {err}");
    backup.terminate_with(TerminationReason::SolverExit(err.to_string()))
}

impl<O, S, H> Solver<O, SolverState<H>> for Supervised<S>
where
    S: Solver<O, SolverState<H>>,
    H: Clone,
{
    const NAME: &'static str = S::NAME;

    fn init(
        &mut self, problem: &mut Problem<O>, state: SolverState<H>,
    ) -> Result<(SolverState<H>, Option<KV>), Error> {
        let backup = state.clone();
        match self.inner.init(problem, state) {
            Ok((state, kv)) => {
                self.record(&state);
                Ok((state, kv))
            }
            Err(err) => Ok((failed(backup, err), None)),
        }
    }

    fn next_iter(
        &mut self, problem: &mut Problem<O>, state: SolverState<H>,
    ) -> Result<(SolverState<H>, Option<KV>), Error> {
        let backup = state.clone();
        match self.inner.next_iter(problem, state) {
            Ok((state, kv)) => {
                self.record(&state);
                Ok((state, kv))
            }
            Err(err) => Ok((failed(backup, err), None)),
        }
    }

    fn terminate(&mut self, state: &SolverState<H>) -> TerminationStatus {
        let status = self.inner.terminate(state);
        if status.terminated() {
            return status;
        }
        match (self.tol_grad, state.get_gradient()) {
            (Some(tol), Some(grad)) if grad.l2_norm() < tol => {
                TerminationStatus::Terminated(TerminationReason::SolverConverged)
            }
            _ => TerminationStatus::NotTerminated,
        }
    }
}
