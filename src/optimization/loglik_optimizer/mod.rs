//! loglik_optimizer — argmin-powered maximum-likelihood engine.
//!
//! Purpose
//! -------
//! Provide a high-level, Argmin-backed optimization layer for **maximizing
//! likelihoods** of user models. Callers implement a single capability
//! trait, [`Model`], pick a driver through [`MLEOptions`], and invoke
//! [`maximize`] to obtain an [`Estimate`] with an optional covariance.
//!
//! Key behaviors
//! -------------
//! - Map structured parameters to the flat vector every driver works on
//!   ([`params`]).
//! - Convert the model objective into an Argmin-compatible cost
//!   `c(θ) = −ℓ(θ) (+ penalty)` via [`adapter::ArgMinAdapter`], which also
//!   provides analytic or finite-difference gradients and annealing
//!   proposals.
//! - Offer three driver families behind one entry point:
//!   - derivative-free Nelder–Mead ([`simplex`]),
//!   - conjugate gradient (Fletcher–Reeves, Polak–Ribière) and BFGS from
//!     Argmin, wrapped by [`supervisor`] for a shared stopping rule,
//!   - simulated annealing ([`annealing`]).
//! - Record score vectors along the way for the trajectory covariance
//!   estimator in `crate::inference`.
//! - Rerun a finished estimate with a rescaled configuration ([`restart`]).
//! - Mirror evaluated points into an optional [`trace::TraceSink`].
//!
//! Invariants & assumptions
//! ------------------------
//! - The optimizer **always maximizes** the model objective by minimizing
//!   its negation; models implement `ℓ(θ)` (or `p(θ)`) and `∇ℓ(θ)`,
//!   **never** the cost directly.
//! - The flat parameter length is fixed by `Model::shape` for the whole run.
//! - Configuration types ([`AnnealSchedule`], [`MLEOptions`]) are validated
//!   on construction and again on entry to [`maximize`].
//!
//! Conventions
//! -----------
//! - Numerical trouble inside an iteration never aborts a solve: failed
//!   objective evaluations count as `+∞`, failed steps end the run with
//!   [`Status::Failed`] and the best point so far.
//! - Configuration mistakes are reported as [`OptError`] before the first
//!   iteration.
//!
//! Downstream usage
//! ----------------
//! - Model code implements [`Model`] and calls [`maximize`], then inspects
//!   [`Estimate::status`] before trusting the parameters.
//! - `crate::missing_data` builds an imputation model on top of this layer.
//!
//! Testing notes
//! -------------
//! - Unit tests in submodules cover the codec, adapter sign conventions,
//!   each driver on toy problems, the supervisor's failure capture, trace
//!   sinks and the restart rule.
//! - Integration tests exercise [`maximize`] and [`restart`] end to end on
//!   normal, constrained, density-only and matrix-parameter models.
//!
//! [`OptError`]: crate::optimization::errors::OptError

pub mod adapter;
pub mod annealing;
pub mod api;
pub mod builders;
pub mod finite_diff;
pub mod observers;
pub mod params;
pub mod restart;
pub mod run;
pub mod simplex;
pub mod supervisor;
pub mod trace;
pub mod traits;
pub mod types;
pub mod validation;

// ---- Re-exports (primary public surface) ----------------------------------

pub use self::annealing::{default_rng, SharedRng};
pub use self::api::{maximize, numerical_gradient};
pub use self::params::{ParamShape, Parameters};
pub use self::restart::restart;
pub use self::trace::{DelimitedTrace, MemoryTrace, TracePath, TraceSink};
pub use self::traits::{
    AnnealSchedule, ConstraintCheck, Dataset, Estimate, MLEOptions, Method, Model, Status,
};
pub use self::types::{Cost, CovMatrix, FnEvalMap, Grad, Theta};

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_mle::optimization::loglik_optimizer::prelude::*;
//
// to import the main optimizer surface in a single line.

pub mod prelude {
    pub use super::api::{maximize, numerical_gradient};
    pub use super::params::{ParamShape, Parameters};
    pub use super::restart::restart;
    pub use super::traits::{
        AnnealSchedule, ConstraintCheck, Dataset, Estimate, MLEOptions, Method, Model, Status,
    };
    pub use super::types::{Grad, Theta};
}
