//! Per-iteration progress reporting through the `log` facade.
//!
//! [`ProgressLogger`] is attached by the runner when `MLEOptions::verbose` is
//! set. It reports the iteration number, the current log-likelihood and the
//! current parameter vector at `info` level; the embedding application picks
//! the logger backend.
use crate::optimization::loglik_optimizer::{adapter::ObjectiveKind, types::SolverState};
use argmin::core::{observers::Observe, Error, State, KV};

#[derive(Debug, Clone, Copy)]
pub struct ProgressLogger {
    kind: ObjectiveKind,
}

impl ProgressLogger {
    pub fn new(kind: ObjectiveKind) -> Self {
        Self { kind }
    }
}

impl<H> Observe<SolverState<H>> for ProgressLogger {
    fn observe_iter(&mut self, state: &SolverState<H>, _kv: &KV) -> Result<(), Error> {
        let ll = self.kind.log_likelihood(state.get_cost());
        match state.get_param() {
            Some(theta) => log::info!("iter {:>5}: ll = {ll:.6}, theta = {theta}", state.get_iter()),
            None => log::info!("iter {:>5}: ll = {ll:.6}", state.get_iter()),
        }
        Ok(())
    }
}
