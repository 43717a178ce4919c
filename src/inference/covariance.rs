//! inference::covariance — parameter covariance from a score trajectory.
//!
//! Purpose
//! -------
//! Turn the `(score, log-likelihood)` pairs gathered while a driver ran into
//! an approximate covariance matrix for the estimate, without ever forming a
//! Hessian.
//!
//! Key behaviors
//! -------------
//! - Weight each entry `j` by `w_j = 1 / (1 + Σ_{k≠j} exp(ℓ_k − ℓ_j))`,
//!   which is the softmax of the recorded log-likelihoods. It is evaluated
//!   through a log-sum-exp so raw likelihood ratios never overflow.
//! - Accumulate `P = Σ_j w_j g_j g_jᵀ`, scale by the observation count when
//!   the dataset reports one, and return `P⁻¹`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Scores are gradients of the log-likelihood (not the cost).
//! - Entries with a non-finite score or weight are skipped.
//! - All accumulation buffers are owned by the call; nothing is cached.
//!
//! Conventions
//! -----------
//! - Inversion happens in `nalgebra` (`DMatrix::try_inverse`); results are
//!   copied back to `ndarray`.
//! - Failures are reported as [`InferenceError`] and wrapped into
//!   [`Covariance::Failed`] by [`Covariance::estimate`]; the point estimate
//!   is unaffected.
//!
//! Downstream usage
//! ----------------
//! - `loglik_optimizer::api` calls [`Covariance::estimate`] after a run when
//!   covariance was requested.
//!
//! Testing notes
//! -------------
//! - Unit tests pin the weighting formula on hand-computed trajectories,
//!   exercise the singular and empty paths, and check that sampled scores
//!   with a known Fisher information give back its inverse.
use crate::{
    inference::{
        errors::{InferenceError, InferenceResult},
        trajectory::Trajectory,
    },
    optimization::loglik_optimizer::types::CovMatrix,
};
use nalgebra::DMatrix;
use ndarray::Array2;

/// Covariance outcome attached to every estimate.
#[derive(Debug, Clone, PartialEq)]
pub enum Covariance {
    /// Covariance was not requested for this run.
    NotRequested,
    /// Approximate covariance of the flat parameter vector.
    Estimated(CovMatrix),
    /// The estimator could not produce a matrix.
    Failed(InferenceError),
}

impl Covariance {
    /// Run [`score_covariance`] and fold failures into [`Covariance::Failed`].
    pub fn estimate(trajectory: &Trajectory, dim: usize, n_obs: Option<usize>) -> Self {
        match score_covariance(trajectory, dim, n_obs) {
            Ok(cov) => Covariance::Estimated(cov),
            Err(err) => Covariance::Failed(err),
        }
    }

    pub fn matrix(&self) -> Option<&CovMatrix> {
        match self {
            Covariance::Estimated(cov) => Some(cov),
            _ => None,
        }
    }

    pub fn is_estimated(&self) -> bool {
        matches!(self, Covariance::Estimated(_))
    }
}

/// score_covariance — weighted outer-product-of-scores covariance.
///
/// Parameters
/// ----------
/// - `trajectory`: `&Trajectory`
///   Scores and log-likelihoods recorded during one run.
/// - `dim`: `usize`
///   Flat parameter dimension; every usable score must have this length.
/// - `n_obs`: `Option<usize>`
///   Observation count of the dataset, when it has one. `P` is multiplied
///   by it before inversion.
///
/// Returns
/// -------
/// `InferenceResult<CovMatrix>`
///   The `dim × dim` matrix `(n · Σ_j w_j g_j g_jᵀ)⁻¹`.
///
/// Errors
/// ------
/// - `InferenceError::EmptyTrajectory` when no entry has a finite score.
/// - `InferenceError::ScoreDimMismatch` when a score has the wrong length.
/// - `InferenceError::SingularInformation` when `P` cannot be inverted or
///   its inverse is not finite.
///
/// Notes
/// -----
/// - `1 / (1 + Σ_{k≠j} exp(ℓ_k − ℓ_j)) = exp(ℓ_j − LSE(ℓ))`, so the weights
///   sum to one over the usable entries.
pub fn score_covariance(
    trajectory: &Trajectory, dim: usize, n_obs: Option<usize>,
) -> InferenceResult<CovMatrix> {
    let mut usable = Vec::with_capacity(trajectory.len());
    for entry in trajectory.entries() {
        if entry.score.len() != dim {
            return Err(InferenceError::ScoreDimMismatch { expected: dim, found: entry.score.len() });
        }
        if entry.score.iter().all(|v| v.is_finite()) {
            usable.push(entry);
        }
    }
    if usable.is_empty() {
        return Err(InferenceError::EmptyTrajectory);
    }

    let max_ll = usable.iter().map(|e| e.log_likelihood).fold(f64::NEG_INFINITY, f64::max);
    let log_total =
        max_ll + usable.iter().map(|e| (e.log_likelihood - max_ll).exp()).sum::<f64>().ln();

    let mut preinv = DMatrix::<f64>::zeros(dim, dim);
    for entry in usable {
        let weight = (entry.log_likelihood - log_total).exp();
        if !weight.is_finite() {
            continue;
        }
        let g = &entry.score;
        for j in 0..dim {
            for i in 0..dim {
                preinv[(i, j)] += weight * g[i] * g[j];
            }
        }
    }
    if let Some(n) = n_obs {
        preinv *= n as f64;
    }

    let inverse = preinv
        .try_inverse()
        .filter(|m| m.iter().all(|v| v.is_finite()))
        .ok_or(InferenceError::SingularInformation { dim })?;
    Ok(Array2::from_shape_fn((dim, dim), |(i, j)| inverse[(i, j)]))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use ndarray::{array, Array1};
    use rand::{distributions::Distribution, rngs::StdRng, SeedableRng};
    use statrs::distribution::Normal;

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - The softmax weighting and observation-count scaling.
    // - Skipping of non-finite scores, empty and singular failure paths.
    // - Recovery of the inverse Fisher information from sampled scores.
    //
    // They intentionally DO NOT cover:
    // - How drivers populate trajectories (see driver and integration tests).
    // -------------------------------------------------------------------------

    #[test]
    // Purpose
    // -------
    // Equal log-likelihoods give equal weights, and `n_obs` scales `P`.
    //
    // Given
    // -----
    // - Scores [1, 0] and [0, 2] with identical log-likelihoods.
    // - `n_obs = 2`.
    //
    // Expect
    // ------
    // - P = 2 · diag(0.5, 2) = diag(1, 4) and the covariance is diag(1, 0.25).
    fn equal_weights_and_observation_scaling() {
        // Arrange
        let mut traj = Trajectory::new();
        traj.record(array![1.0, 0.0], -3.0);
        traj.record(array![0.0, 2.0], -3.0);

        // Act
        let cov = score_covariance(&traj, 2, Some(2)).unwrap();

        // Assert
        assert_relative_eq!(cov[[0, 0]], 1.0, epsilon = 1e-12);
        assert_relative_eq!(cov[[1, 1]], 0.25, epsilon = 1e-12);
        assert_relative_eq!(cov[[0, 1]], 0.0, epsilon = 1e-12);

        let outcome = Covariance::estimate(&traj, 2, Some(2));
        assert!(outcome.is_estimated());
        assert_eq!(outcome.matrix(), Some(&cov));
    }

    #[test]
    // Purpose
    // -------
    // Weights follow `1 / (1 + Σ exp(ℓ_other − ℓ_self))`.
    //
    // Given
    // -----
    // - Entry A: score [2], ℓ = 0. Entry B: score [1], ℓ = ln 3.
    // - Direct formula: w_A = 1/(1+3) = 0.25, w_B = 1/(1+1/3) = 0.75.
    //
    // Expect
    // ------
    // - P = 0.25·4 + 0.75·1 = 1.75; covariance = 1/1.75.
    fn weights_match_pairwise_formula() {
        // Arrange
        let mut traj = Trajectory::new();
        traj.record(array![2.0], 0.0);
        traj.record(array![1.0], 3.0_f64.ln());

        // Act
        let cov = score_covariance(&traj, 1, None).unwrap();

        // Assert
        assert_relative_eq!(cov[[0, 0]], 1.0 / 1.75, epsilon = 1e-12);
    }

    #[test]
    // Purpose
    // -------
    // Huge log-likelihood gaps neither overflow nor poison the result.
    //
    // Given
    // -----
    // - ℓ values 0 and 2000 (exp(2000) overflows f64).
    //
    // Expect
    // ------
    // - All weight lands on the higher entry; the result is finite.
    fn log_sum_exp_handles_large_gaps() {
        // Arrange
        let mut traj = Trajectory::new();
        traj.record(array![10.0], 0.0);
        traj.record(array![0.5], 2000.0);

        // Act
        let cov = score_covariance(&traj, 1, None).unwrap();

        // Assert
        assert_relative_eq!(cov[[0, 0]], 4.0, epsilon = 1e-9);
    }

    #[test]
    // Purpose
    // -------
    // Failure paths: all-zero scores are singular, non-finite scores are
    // skipped, and nothing usable means an empty trajectory.
    //
    // Given
    // -----
    // - A trajectory of zero scores.
    // - A trajectory holding only a NaN score.
    // - A trajectory whose score has the wrong length.
    //
    // Expect
    // ------
    // - `SingularInformation`, `EmptyTrajectory` and `ScoreDimMismatch`.
    fn failure_paths_are_reported() {
        // Arrange
        let mut zeros = Trajectory::new();
        zeros.record(array![0.0, 0.0], -1.0);
        zeros.record(array![0.0, 0.0], -2.0);
        let mut nan_only = Trajectory::new();
        nan_only.record(array![f64::NAN, 1.0], -1.0);
        let mut wrong_len = Trajectory::new();
        wrong_len.record(array![1.0], -1.0);

        // Act / Assert
        assert_eq!(
            score_covariance(&zeros, 2, Some(10)),
            Err(InferenceError::SingularInformation { dim: 2 })
        );
        assert_eq!(score_covariance(&nan_only, 2, None), Err(InferenceError::EmptyTrajectory));
        assert_eq!(
            score_covariance(&wrong_len, 2, None),
            Err(InferenceError::ScoreDimMismatch { expected: 2, found: 1 })
        );
        assert!(matches!(Covariance::estimate(&zeros, 2, None), Covariance::Failed(_)));
        assert!(!Covariance::estimate(&zeros, 2, None).is_estimated());
        assert!(Covariance::NotRequested.matrix().is_none());
    }

    #[test]
    // Purpose
    // -------
    // Scores drawn with a known Fisher information reproduce its inverse.
    //
    // Given
    // -----
    // - Per-observation scores s = A z with z ~ N(0, I₂), so the per-observation
    //   Fisher information is I₁ = A Aᵀ = [[1, 0.5], [0.5, 4.25]].
    // - 50 000 draws with equal log-likelihoods and `n_obs = 10`.
    //
    // Expect
    // ------
    // - Covariance ≈ (10 · I₁)⁻¹ = [[0.10625, -0.0125], [-0.0125, 0.025]]
    //   within an absolute tolerance of 5e-3 (a few percent of the diagonal).
    fn sampled_scores_recover_inverse_fisher_information() {
        // Arrange
        let mut rng = StdRng::seed_from_u64(20_240_601);
        let normal = Normal::new(0.0, 1.0).unwrap();
        let mut traj = Trajectory::new();
        for _ in 0..50_000 {
            let z1 = normal.sample(&mut rng);
            let z2 = normal.sample(&mut rng);
            let score: Array1<f64> = array![z1, 0.5 * z1 + 2.0 * z2];
            traj.record(score, 0.0);
        }

        // Act
        let cov = score_covariance(&traj, 2, Some(10)).unwrap();

        // Assert
        let expected = array![[0.10625, -0.0125], [-0.0125, 0.025]];
        for (got, want) in cov.iter().zip(expected.iter()) {
            assert!((got - want).abs() < 5e-3, "got {got}, want {want}");
        }
    }
}
