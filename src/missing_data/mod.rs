//! missing_data — handling NaN cells before or through estimation.
//!
//! Purpose
//! -------
//! Offer the two treatments of missing observations the engine supports:
//! dropping incomplete rows, or imputing the missing cells by maximum
//! likelihood under a multivariate normal model.
//!
//! Key behaviors
//! -------------
//! - [`listwise_delete`] keeps only fully observed rows.
//! - [`ml_impute`] treats each missing cell as a free parameter, maximizes
//!   the joint normal log-likelihood with the annealing driver, and writes
//!   the optimum back into the matrix.
//!
//! Conventions
//! -----------
//! - Rows are observations, columns are variables; a NaN marks a missing
//!   cell. Other non-finite values are treated as observed.
//!
//! Downstream usage
//! ----------------
//! - Callers clean a design matrix here and then fit their own model with
//!   `optimization::loglik_optimizer::maximize`.

pub mod imputation;
pub mod listwise;

pub use self::imputation::{ml_impute, MvnImputation};
pub use self::listwise::listwise_delete;

pub mod prelude {
    pub use super::imputation::ml_impute;
    pub use super::listwise::listwise_delete;
}
