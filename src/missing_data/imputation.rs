//! missing_data::imputation — fill NaN cells with their most likely values.
//!
//! Purpose
//! -------
//! Impute missing cells of a data matrix under a multivariate normal model
//! with known mean and covariance, by handing the likelihood engine a model
//! whose parameters are exactly the missing cells.
//!
//! Key behaviors
//! -------------
//! - [`MvnImputation`] collects the NaN cells in row-major order; its flat
//!   parameter vector holds one value per cell in that order.
//! - Its log-likelihood is `Σ_rows log N(x_r; μ, Σ)` with the cells filled
//!   in; the covariance is factored once (Cholesky) at construction.
//! - An analytic score `−(Σ⁻¹(x_r − μ))_j` per missing cell `(r, j)` is
//!   supplied, so annealing runs can record scores cheaply.
//! - [`ml_impute`] runs the annealing driver and writes the optimum back into
//!   the caller's matrix.
//!
//! Invariants & assumptions
//! ------------------------
//! - `mean.len() == cov.nrows() == cov.ncols() == data.ncols()`.
//! - `cov` must be symmetric positive definite.
//!
//! Testing notes
//! -------------
//! - Unit tests check the log-likelihood against `statrs` normal densities,
//!   the analytic score against finite differences, and the error paths.
use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        api::maximize,
        params::{ParamShape, Parameters},
        traits::{Estimate, MLEOptions, Method, Model},
        types::{Grad, Theta},
    },
};
use nalgebra::DMatrix;
use ndarray::{Array1, Array2};
use std::f64::consts::PI;

/// Default annealing move budget for imputation runs.
pub const IMPUTATION_STEP_SIZE: f64 = 2.0;

/// Default tolerance for imputation runs.
pub const IMPUTATION_TOLERANCE: f64 = 0.2;

/// Multivariate normal likelihood over the missing cells of a matrix.
#[derive(Debug, Clone)]
pub struct MvnImputation {
    cells: Vec<(usize, usize)>,
    mean: Array1<f64>,
    precision: Array2<f64>,
    log_norm: f64,
}

impl MvnImputation {
    /// Locate the NaN cells of `data` and factor `cov`.
    ///
    /// # Errors
    /// - [`OptError::ImputationDimMismatch`] when shapes disagree.
    /// - [`OptError::NoMissingData`] when `data` has no NaN cell.
    /// - [`OptError::CovarianceNotPositiveDefinite`] when Cholesky fails.
    pub fn new(data: &Array2<f64>, mean: &Array1<f64>, cov: &Array2<f64>) -> OptResult<Self> {
        let k = data.ncols();
        if mean.len() != k || cov.dim() != (k, k) {
            return Err(OptError::ImputationDimMismatch {
                columns: k,
                mean: mean.len(),
                cov: cov.dim(),
            });
        }
        let cells: Vec<(usize, usize)> =
            data.indexed_iter().filter(|(_, x)| x.is_nan()).map(|(idx, _)| idx).collect();
        if cells.is_empty() {
            return Err(OptError::NoMissingData);
        }
        let chol = DMatrix::from_fn(k, k, |i, j| cov[[i, j]])
            .cholesky()
            .ok_or(OptError::CovarianceNotPositiveDefinite)?;
        let log_det = 2.0 * chol.l().diagonal().iter().map(|d| d.ln()).sum::<f64>();
        let inverse = chol.inverse();
        let precision = Array2::from_shape_fn((k, k), |(i, j)| inverse[(i, j)]);
        let log_norm = -0.5 * (k as f64 * (2.0 * PI).ln() + log_det);
        Ok(Self { cells, mean: mean.clone(), precision, log_norm })
    }

    /// Missing cells as `(row, column)`, in parameter order.
    pub fn cells(&self) -> &[(usize, usize)] {
        &self.cells
    }

    /// Starting point that puts every missing cell at its column mean.
    pub fn mean_start(&self) -> Theta {
        self.cells.iter().map(|&(_, j)| self.mean[j]).collect()
    }

    /// Copy of `data` with the missing cells set from `values`.
    pub fn fill(&self, data: &Array2<f64>, values: &Theta) -> Array2<f64> {
        let mut filled = data.clone();
        for (&(i, j), &v) in self.cells.iter().zip(values.iter()) {
            filled[[i, j]] = v;
        }
        filled
    }

    fn values(params: &Parameters) -> Theta {
        params.vector.clone().unwrap_or_else(|| Theta::zeros(0))
    }
}

impl Model for MvnImputation {
    type Data = Array2<f64>;

    fn name(&self) -> &str {
        "ml_imputation"
    }

    fn shape(&self, _data: &Self::Data) -> ParamShape {
        ParamShape::vector(self.cells.len())
    }

    fn log_likelihood(&self, params: &Parameters, data: &Self::Data) -> OptResult<f64> {
        let filled = self.fill(data, &Self::values(params));
        let ll = filled
            .outer_iter()
            .map(|row| {
                let centered = &row - &self.mean;
                self.log_norm - 0.5 * centered.dot(&self.precision.dot(&centered))
            })
            .sum();
        Ok(ll)
    }

    fn score(&self, params: &Parameters, data: &Self::Data) -> OptResult<Grad> {
        let filled = self.fill(data, &Self::values(params));
        let score = self
            .cells
            .iter()
            .map(|&(i, j)| {
                let centered = &filled.row(i) - &self.mean;
                -self.precision.row(j).dot(&centered)
            })
            .collect();
        Ok(score)
    }
}

/// ml_impute — replace NaN cells of `data` by their maximum-likelihood values.
///
/// Parameters
/// ----------
/// - `data`: `&mut Array2<f64>`
///   Observations in rows; NaN marks a missing cell. Overwritten in place.
/// - `mean`, `cov`: column mean vector and covariance matrix.
/// - `opts`: `Option<MLEOptions>`
///   Run configuration. `None` uses step size 2 and tolerance 0.2. The
///   method is always annealing; a missing start places each cell at its
///   column mean.
///
/// Returns
/// -------
/// `OptResult<Estimate>`
///   The estimate whose flat parameters are the imputed cells in row-major
///   order; the same values are written into `data`.
///
/// Errors
/// ------
/// - Shape, missing-cell and covariance errors from [`MvnImputation::new`].
/// - Any configuration error `maximize` reports.
pub fn ml_impute(
    data: &mut Array2<f64>, mean: &Array1<f64>, cov: &Array2<f64>, opts: Option<MLEOptions>,
) -> OptResult<Estimate> {
    let model = MvnImputation::new(data, mean, cov)?;
    let mut opts = match opts {
        Some(opts) => opts,
        None => MLEOptions::new(Method::Annealing, IMPUTATION_STEP_SIZE, IMPUTATION_TOLERANCE)?,
    };
    opts.method = Method::Annealing;
    if opts.start.is_none() {
        opts.start = Some(model.mean_start());
    }

    let estimate = maximize(&model, data, &opts)?;
    let filled = model.fill(data, &estimate.theta_hat);
    *data = filled;
    log::debug!("imputed {} cells, ll = {:.6}", model.cells().len(), estimate.log_likelihood);
    Ok(estimate)
}
