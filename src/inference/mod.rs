//! inference — covariance of a maximum-likelihood estimate from its score path.
//!
//! Purpose
//! -------
//! Provide post-estimation uncertainty quantification for the likelihood
//! engine. Instead of differentiating twice at the optimum, the estimator
//! reuses the score vectors that a driver already evaluated along its way
//! and combines them into a weighted outer-product matrix.
//!
//! Key behaviors
//! -------------
//! - Collect `(score, log-likelihood)` pairs per run in a [`Trajectory`].
//! - Convert a trajectory into a covariance matrix via
//!   [`score_covariance`], or into a [`Covariance`] outcome that never
//!   fails the surrounding solve.
//! - Report estimator failures through [`InferenceError`] /
//!   [`InferenceResult`].
//!
//! Invariants & assumptions
//! ------------------------
//! - Scores are gradients of the log-likelihood in flat parameter space
//!   (see `optimization::loglik_optimizer::params`).
//! - Every solve owns its trajectory; there is no shared accumulation state.
//!
//! Conventions
//! -----------
//! - The weighting and observation-count scaling reproduce a heuristic
//!   estimator; it is not claimed to equal a textbook OPG or sandwich
//!   variance, although sampled scores with known Fisher information do
//!   recover its inverse (see the tests in [`covariance`]).
//!
//! Downstream usage
//! ----------------
//! - Drivers record into a [`Trajectory`] through the optimizer's recorder;
//!   `maximize` attaches the resulting [`Covariance`] to the `Estimate`.

pub mod covariance;
pub mod errors;
pub mod trajectory;

// ---- Re-exports (primary surface) -----------------------------------------

pub use self::covariance::{score_covariance, Covariance};
pub use self::errors::{InferenceError, InferenceResult};
pub use self::trajectory::{Trajectory, TrajectoryEntry};

// ---- Optional convenience prelude for downstream crates ------------------
//
// Downstream crates can `use rust_mle::inference::prelude::*;` to
// import the primary inference surface in a single line.

pub mod prelude {
    pub use super::covariance::{score_covariance, Covariance};
    pub use super::errors::{InferenceError, InferenceResult};
    pub use super::trajectory::Trajectory;
}
