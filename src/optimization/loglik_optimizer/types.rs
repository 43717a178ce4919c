//! loglik_optimizer::types — shared numeric aliases, iteration caps and solver wiring.
//!
//! Purpose
//! -------
//! Centralize the core numeric types and solver aliases used by the
//! likelihood engine. By defining these in one place, the rest of the
//! optimization code can stay agnostic to `ndarray` and Argmin generics.
//!
//! Key behaviors
//! -------------
//! - Define canonical aliases for flat parameter vectors, gradients,
//!   covariance matrices, and scalar costs (`Theta`, `Grad`, `CovMatrix`,
//!   `Cost`).
//! - Provide the Argmin iteration-state alias shared by every driver
//!   ([`SolverState`]), the function-evaluation counter map
//!   ([`FnEvalMap`]) and the concrete gradient-driver types.
//! - Fix the per-driver-family iteration caps and the restart sanity bound.
//!
//! Invariants & assumptions
//! ------------------------
//! - All optimizer vectors and matrices are `ndarray` containers over `f64`.
//! - `Cost` is always the minimized quantity `c(θ) = -ℓ(θ) (+ penalty)`;
//!   higher layers handle the sign flip back to log-likelihood space.
//!
//! Conventions
//! -----------
//! - Every driver runs on `SolverState<H>`; only BFGS uses a non-unit `H`
//!   (its inverse Hessian approximation).
//!
//! Testing notes
//! -------------
//! - This module only defines type aliases and constants; there are no
//!   dedicated unit tests.
use argmin::{
    core::IterState,
    solver::{
        conjugategradient::{
            beta::{FletcherReeves, PolakRibiere},
            NonlinearConjugateGradient,
        },
        linesearch::MoreThuenteLineSearch,
        quasinewton::BFGS,
    },
};
use ndarray::{Array1, Array2};
use std::collections::HashMap;

/// Flat parameter vector `θ` seen by every driver.
///
/// Alias for `ndarray::Array1<f64>`; see [`super::params`] for the mapping
/// to and from a model's structured parameters.
pub type Theta = Array1<f64>;

/// Gradient vector `∇ℓ(θ)` or `∇c(θ)`, matching the shape of `Theta`.
pub type Grad = Array1<f64>;

/// Dense `n × n` parameter covariance matrix.
pub type CovMatrix = Array2<f64>;

/// Scalar objective value used by the optimizer.
///
/// In this crate, this is the cost `c(θ) = -ℓ(θ)` plus any constraint penalty.
pub type Cost = f64;

/// Function-evaluation counters as reported by the solver.
///
/// Maps human-readable counter names (e.g., `"cost_count"`) to counts.
pub type FnEvalMap = HashMap<String, u64>;

/// Argmin iteration state shared by all drivers.
pub type SolverState<H> = IterState<Theta, Grad, (), H, (), Cost>;

/// More–Thuente line search specialized to this crate’s numeric types.
pub type MoreThuenteLS = MoreThuenteLineSearch<Theta, Grad, Cost>;

/// Nonlinear conjugate gradient with the Fletcher–Reeves update.
pub type CgFletcherReeves = NonlinearConjugateGradient<Theta, MoreThuenteLS, FletcherReeves, Cost>;

/// Nonlinear conjugate gradient with the Polak–Ribière update.
pub type CgPolakRibiere = NonlinearConjugateGradient<Theta, MoreThuenteLS, PolakRibiere, Cost>;

/// BFGS with More–Thuente line search; its state carries `H = CovMatrix`.
pub type BfgsMoreThuente = BFGS<MoreThuenteLS, Cost>;

/// Iteration cap for the simplex driver.
pub const MAX_ITERATIONS_SIMPLEX: u64 = 5_000;

/// Iteration cap for the gradient drivers.
pub const MAX_ITERATIONS_GRADIENT: u64 = 5_000;

/// Cap on annealing temperature levels (one level = one argmin iteration).
pub const MAX_ANNEALING_LEVELS: u64 = 100_000;

/// Componentwise bound a restart candidate must respect to be trusted.
pub const RESTART_BOUND: f64 = 1e4;
