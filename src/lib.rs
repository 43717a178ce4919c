//! rust_mle — a generic maximum-likelihood engine.
//!
//! Purpose
//! -------
//! Serve as the crate root for Rust callers that want to fit arbitrary
//! parametric models by maximum likelihood. A model supplies its
//! log-likelihood (or density), optionally a score and a parameter
//! constraint; the engine picks the driver, tracks the run, and returns
//! fitted parameters with an optional covariance estimate.
//!
//! Key behaviors
//! -------------
//! - `optimization` holds the engine: parameter packing, the objective
//!   adapter, derivative fallback, the simplex / conjugate gradient / BFGS /
//!   annealing drivers, restarts and trace sinks.
//! - `inference` turns the score trajectory recorded during a run into a
//!   parameter covariance matrix.
//! - `missing_data` removes or imputes NaN observations.
//!
//! Invariants & assumptions
//! ------------------------
//! - Every driver minimizes `−ℓ(θ)` over a flat `Array1<f64>`; results are
//!   reported in terms of `ℓ`.
//! - Failures are reported as `OptError` values; non-convergence is a
//!   status on the estimate, not an error.
//!
//! Conventions
//! -----------
//! - Diagnostics go through the `log` facade. With the `obs_slog` feature
//!   enabled, verbose runs also stream Argmin's own iteration log to `slog`.
//!
//! Downstream usage
//! ----------------
//! - Most callers only need `optimization::prelude::*`.
//!
//! Testing notes
//! -------------
//! - Unit tests live next to each module; `tests/integration_mle_pipeline.rs`
//!   fits complete models through the public surface.

pub mod inference;
pub mod missing_data;
pub mod optimization;
