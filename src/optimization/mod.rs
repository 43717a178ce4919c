//! optimization — maximum-likelihood engine and unified error surface.
//!
//! Purpose
//! -------
//! Provide a cohesive optimization layer for model fitting: an Argmin-backed
//! likelihood maximizer with several interchangeable drivers, and a single
//! error/result surface. Callers implement a model, choose a driver and
//! obtain fitted parameters, a status and a covariance without touching
//! backend solver details.
//!
//! Key behaviors
//! -------------
//! - Expose a high-level API for **maximizing likelihoods**
//!   (`loglik_optimizer`), including driver selection, annealing schedules,
//!   restarts and optional path tracing.
//! - Normalize configuration issues, model failures and backend solver
//!   errors into a single enum (`errors::OptError`) with a common result
//!   alias (`OptResult<T>`).
//!
//! Invariants & assumptions
//! ------------------------
//! - Drivers operate on a flat parameter vector and assume configuration has
//!   been validated; invalid configuration is reported as `OptError`, not
//!   panics.
//! - Model callbacks report domain violations as recoverable `OptError`
//!   values; the engine treats such points as infinitely costly.
//!
//! Conventions
//! -----------
//! - All drivers conceptually maximize `ℓ(θ)` by minimizing `c(θ) = −ℓ(θ)`;
//!   user-facing results are expressed in terms of `ℓ`.
//! - Public entry points that can fail return `OptResult<T>`; callers never
//!   see raw Argmin errors.
//! - Diagnostics go through the `log` facade; the embedding application
//!   chooses the backend.
//!
//! Downstream usage
//! ----------------
//! - Front-ends typically import the curated surface via
//!   `optimization::prelude::*`, which forwards the optimizer prelude and
//!   the core error types.
//!
//! Testing notes
//! -------------
//! - Unit tests in the submodules focus on local concerns; integration tests
//!   under `tests/` run full solves.

pub mod errors;
pub mod loglik_optimizer;

// ---- Optional convenience prelude for downstream crates -------------------
//
// Downstream crates can write
//
//     use rust_mle::optimization::prelude::*;
//
// to import the main optimization surface in a single line.

pub mod prelude {
    pub use super::errors::{OptError, OptResult};
    pub use super::loglik_optimizer::prelude::*;
}
