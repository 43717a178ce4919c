//! loglik_optimizer::annealing — simulated annealing as an argmin solver.
//!
//! Purpose
//! -------
//! Provide a derivative-free global driver whose cooling schedule is fully
//! described by [`AnnealSchedule`]. One argmin iteration is one temperature
//! level; the run stops once the temperature falls below `t_min`.
//!
//! Key behaviors
//! -------------
//! - Proposals come from the problem's `Anneal` impl (random per-dimension
//!   moves within the step budget, followed by constraint projection).
//! - A proposal is redrawn up to `tries_per_step` times while its cost is
//!   non-finite; if none is usable the proposal is skipped.
//! - Metropolis acceptance: always accept an improvement, otherwise accept
//!   with probability `exp(−ΔE / (k·T))`.
//! - The best point ever visited is what the state reports, not the final
//!   walker position.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every random draw in a run comes from one [`SharedRng`], so a seeded
//!   source makes the whole run reproducible.
//! - The rng mutex is never held across a call into the problem.
//!
//! Conventions
//! -----------
//! - Energies are argmin costs (`−ℓ`, or `−p` for density models).
//! - When a [`TrajectoryRecorder`] is attached, accepted moves contribute a
//!   score to the covariance trajectory; score failures are ignored.
//!
//! Testing notes
//! -------------
//! - Unit tests run the solver on a one-dimensional bowl, check that two
//!   runs with the same seed agree exactly, and check the level count.
use crate::optimization::loglik_optimizer::{
    supervisor::TrajectoryRecorder,
    traits::AnnealSchedule,
    types::{Cost, Grad, SolverState, Theta},
};
use argmin::{
    core::{
        ArgminError, CostFunction, Error, Gradient, Problem, Solver, State, TerminationReason,
        TerminationStatus, KV,
    },
    solver::simulatedannealing::Anneal,
};
use once_cell::sync::Lazy;
use rand::{rngs::StdRng, Rng, SeedableRng};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Random source shared between a run's proposal and acceptance draws.
pub type SharedRng = Arc<Mutex<StdRng>>;

static DEFAULT_RNG: Lazy<SharedRng> =
    Lazy::new(|| Arc::new(Mutex::new(StdRng::from_entropy())));

/// Process-wide random source used when a run supplies none.
///
/// Seeded once from OS entropy on first use. Concurrent runs that fall back
/// to it serialize on its mutex and interleave draws.
pub fn default_rng() -> SharedRng {
    Arc::clone(&DEFAULT_RNG)
}

/// Lock a shared rng, recovering the generator from a poisoned mutex.
pub(crate) fn lock_rng(rng: &SharedRng) -> MutexGuard<'_, StdRng> {
    rng.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Simulated annealing over the flat parameter vector.
pub struct Annealer {
    schedule: AnnealSchedule,
    step_size: f64,
    rng: SharedRng,
    temperature: f64,
    position: Theta,
    energy: Cost,
    best_position: Theta,
    best_energy: Cost,
    recorder: Option<TrajectoryRecorder>,
}

impl Annealer {
    /// Construct an annealer.
    ///
    /// Parameters
    /// ----------
    /// - `schedule`: validated cooling schedule.
    /// - `step_size`: total move budget per proposal, forwarded to `anneal`.
    /// - `rng`: the run's random source; must be the same handle the
    ///   problem draws its proposals from for a seed to pin the whole run.
    pub fn new(schedule: AnnealSchedule, step_size: f64, rng: SharedRng) -> Self {
        Self {
            schedule,
            step_size,
            rng,
            temperature: schedule.t_initial,
            position: Theta::zeros(0),
            energy: f64::INFINITY,
            best_position: Theta::zeros(0),
            best_energy: f64::INFINITY,
            recorder: None,
        }
    }

    /// Record scores of accepted moves into `recorder`.
    pub fn with_recorder(mut self, recorder: TrajectoryRecorder) -> Self {
        self.recorder = Some(recorder);
        self
    }

    pub fn temperature(&self) -> f64 {
        self.temperature
    }

    /// Draw a proposal with finite energy, or `None` once tries run out.
    fn propose<O>(&self, problem: &mut Problem<O>) -> Result<Option<(Theta, Cost)>, Error>
    where
        O: CostFunction<Param = Theta, Output = Cost>
            + Anneal<Param = Theta, Output = Theta, Float = f64>,
    {
        for _ in 0..self.schedule.tries_per_step {
            let candidate = problem.anneal(&self.position, self.step_size)?;
            let energy = problem.cost(&candidate)?;
            if energy.is_finite() {
                return Ok(Some((candidate, energy)));
            }
        }
        Ok(None)
    }

    fn accepts(&self, new_energy: Cost) -> bool {
        if new_energy < self.energy {
            return true;
        }
        let u: f64 = lock_rng(&self.rng).gen_range(0.0..1.0);
        (-(new_energy - self.energy) / (self.schedule.k * self.temperature)).exp() > u
    }

    fn record<O>(&self, problem: &mut Problem<O>)
    where
        O: Gradient<Param = Theta, Gradient = Grad>,
    {
        if let Some(recorder) = &self.recorder {
            if let Ok(grad) = problem.gradient(&self.position) {
                recorder.record(self.energy, &grad);
            }
        }
    }
}

impl<O> Solver<O, SolverState<()>> for Annealer
where
    O: CostFunction<Param = Theta, Output = Cost>
        + Gradient<Param = Theta, Gradient = Grad>
        + Anneal<Param = Theta, Output = Theta, Float = f64>,
{
    const NAME: &'static str = "Simulated annealing";

    fn init(
        &mut self, problem: &mut Problem<O>, mut state: SolverState<()>,
    ) -> Result<(SolverState<()>, Option<KV>), Error> {
        let start = state.take_param().ok_or_else(|| ArgminError::NotInitialized {
            text: "Annealing requires a starting point.".to_string(),
        })?;
        let energy = problem.cost(&start)?;
        self.temperature = self.schedule.t_initial;
        self.position = start.clone();
        self.energy = energy;
        self.best_position = start.clone();
        self.best_energy = energy;
        self.record(problem);
        Ok((state.param(start).cost(energy), None))
    }

    fn next_iter(
        &mut self, problem: &mut Problem<O>, state: SolverState<()>,
    ) -> Result<(SolverState<()>, Option<KV>), Error> {
        for _ in 0..self.schedule.iters_per_temp {
            let Some((candidate, new_energy)) = self.propose(problem)? else {
                continue;
            };
            if new_energy <= self.best_energy {
                self.best_position = candidate.clone();
                self.best_energy = new_energy;
            }
            if self.accepts(new_energy) {
                self.position = candidate;
                self.energy = new_energy;
                self.record(problem);
            }
        }
        self.temperature /= self.schedule.mu_t;
        Ok((state.param(self.best_position.clone()).cost(self.best_energy), None))
    }

    fn terminate(&mut self, _state: &SolverState<()>) -> TerminationStatus {
        if self.temperature < self.schedule.t_min {
            return TerminationStatus::Terminated(TerminationReason::SolverConverged);
        }
        TerminationStatus::NotTerminated
    }
}
