//! inference::trajectory — score vectors collected along one optimization run.
//!
//! A [`Trajectory`] is append-only and lives for a single solve call. Drivers
//! push `(score, log-likelihood)` pairs into it; the covariance estimator
//! consumes it once the run is over. Entries whose log-likelihood is not
//! finite are dropped at the door, so every stored value can serve as a
//! log-relative weight.
use crate::optimization::loglik_optimizer::types::Grad;

/// One recorded point: the score `∇ℓ(θ)` and the log-likelihood `ℓ(θ)`.
#[derive(Debug, Clone, PartialEq)]
pub struct TrajectoryEntry {
    pub score: Grad,
    pub log_likelihood: f64,
}

#[derive(Debug, Clone, PartialEq, Default)]
pub struct Trajectory {
    entries: Vec<TrajectoryEntry>,
}

impl Trajectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a point, skipping non-finite log-likelihoods.
    pub fn record(&mut self, score: Grad, log_likelihood: f64) {
        if log_likelihood.is_finite() {
            self.entries.push(TrajectoryEntry { score, log_likelihood });
        }
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn entries(&self) -> &[TrajectoryEntry] {
        &self.entries
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    // Purpose
    // -------
    // Non-finite objective values never enter the trajectory.
    //
    // Given
    // -----
    // - One finite record and two records with NaN / -∞ log-likelihood.
    //
    // Expect
    // ------
    // - Only the finite record is stored.
    fn record_skips_non_finite_values() {
        // Arrange
        let mut traj = Trajectory::new();

        // Act
        traj.record(array![1.0], -0.5);
        traj.record(array![2.0], f64::NAN);
        traj.record(array![3.0], f64::NEG_INFINITY);

        // Assert
        assert_eq!(traj.len(), 1);
        assert_eq!(traj.entries()[0].score, array![1.0]);
    }
}
