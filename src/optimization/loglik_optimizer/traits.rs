//! Public API surface for maximum-likelihood estimation.
//!
//! - [`Model`]: capability set users implement (likelihood or density, plus
//!   optional score, constraint and validation hooks).
//! - [`Dataset`]: opaque data handle that may report an observation count.
//! - [`Method`], [`AnnealSchedule`] and [`MLEOptions`]: run configuration.
//! - [`Estimate`] and [`Status`]: the normalized result of a solve.
//!
//! Convention: we *maximize* the model objective by minimizing the cost
//! `c(θ) = -ℓ(θ)` (plus a constraint penalty where one binds). Scores are
//! gradients of the objective (`∇ℓ(θ)`); the adapter flips the sign.
use crate::{
    inference::covariance::Covariance,
    optimization::{
        errors::{OptError, OptResult},
        loglik_optimizer::{
            annealing::SharedRng,
            params::{ParamShape, Parameters},
            trace::TracePath,
            types::{FnEvalMap, Grad, Theta},
            validation::{verify_positive, verify_step_size, verify_tolerance},
        },
    },
};
use argmin::core::{TerminationReason, TerminationStatus};
use ndarray::{Array1, Array2};
use rand::{rngs::StdRng, SeedableRng};
use std::{
    fmt,
    str::FromStr,
    sync::{Arc, Mutex},
};

/// Data handle passed untouched to every model callback.
///
/// The only thing the engine asks of it is an optional observation count,
/// which scales the trajectory covariance estimator.
pub trait Dataset {
    fn n_obs(&self) -> Option<usize> {
        None
    }
}

impl Dataset for () {}

impl Dataset for Vec<f64> {
    fn n_obs(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl Dataset for Array1<f64> {
    fn n_obs(&self) -> Option<usize> {
        Some(self.len())
    }
}

impl Dataset for Array2<f64> {
    fn n_obs(&self) -> Option<usize> {
        Some(self.nrows())
    }
}

/// Result of checking parameters against a model's constraint.
///
/// `penalty > 0` means the parameters were infeasible; `corrected` is then
/// the projected point the engine evaluates instead.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintCheck {
    pub penalty: f64,
    pub corrected: Parameters,
}

/// User-implemented statistical model.
///
/// Required:
/// - `name`: display name used in diagnostics and errors.
/// - `shape(&Data)`: structured parameter shape for this dataset.
///
/// At least one of:
/// - `log_likelihood(&Parameters, &Data)`: evaluate `ℓ(θ)`.
/// - `density(&Parameters, &Data)`: evaluate `p(θ)`; the engine maximizes
///   `p` directly and reports `ln p` as the log-likelihood.
///
/// Optional:
/// - `score`: analytic gradient of the optimized objective as a flat vector.
///   If not implemented, central finite differences are used.
/// - `constraint`: `None` when parameters are feasible (or the model has no
///   constraint), otherwise a penalty and a corrected point. Never fails.
/// - `check`: validation hook called once on the starting point.
pub trait Model {
    type Data: Dataset;

    // Required methods
    fn name(&self) -> &str;
    fn shape(&self, data: &Self::Data) -> ParamShape;

    // Optional methods
    fn log_likelihood(&self, _params: &Parameters, _data: &Self::Data) -> OptResult<f64> {
        Err(OptError::LikelihoodNotImplemented)
    }

    fn density(&self, _params: &Parameters, _data: &Self::Data) -> OptResult<f64> {
        Err(OptError::LikelihoodNotImplemented)
    }

    fn score(&self, _params: &Parameters, _data: &Self::Data) -> OptResult<Grad> {
        Err(OptError::GradientNotImplemented)
    }

    fn constraint(&self, _params: &Parameters, _data: &Self::Data) -> Option<ConstraintCheck> {
        None
    }

    fn check(&self, _params: &Parameters, _data: &Self::Data) -> OptResult<()> {
        Ok(())
    }
}

/// Optimization strategy.
///
/// Parsing:
/// This enum implements `FromStr` and accepts case-insensitive names
/// (`"simplex"`, `"fletcher-reeves"`, `"polak-ribiere"`, `"bfgs"`,
/// `"annealing"`) plus the short aliases listed in `from_str`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Method {
    /// Derivative-free Nelder–Mead simplex.
    Simplex,
    /// Conjugate gradient with the Fletcher–Reeves update.
    #[default]
    FletcherReeves,
    /// Conjugate gradient with the Polak–Ribière update.
    PolakRibiere,
    /// Quasi-Newton BFGS secant update.
    Bfgs,
    /// Simulated annealing.
    Annealing,
}

impl Method {
    /// `true` for the line-search driven methods.
    pub fn uses_gradient(&self) -> bool {
        matches!(self, Method::FletcherReeves | Method::PolakRibiere | Method::Bfgs)
    }
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Method::Simplex => "simplex",
            Method::FletcherReeves => "fletcher-reeves",
            Method::PolakRibiere => "polak-ribiere",
            Method::Bfgs => "bfgs",
            Method::Annealing => "annealing",
        };
        write!(f, "{name}")
    }
}

impl FromStr for Method {
    type Err = OptError;

    /// Parse a method from a string (case-insensitive).
    ///
    /// Accepts `simplex` / `nelder-mead`, `fletcher-reeves` / `fr`,
    /// `polak-ribiere` / `pr`, `bfgs`, and `annealing` / `siman`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "simplex" | "nelder-mead" | "neldermead" => Ok(Method::Simplex),
            "fletcher-reeves" | "fletcherreeves" | "fr" => Ok(Method::FletcherReeves),
            "polak-ribiere" | "polakribiere" | "pr" => Ok(Method::PolakRibiere),
            "bfgs" => Ok(Method::Bfgs),
            "annealing" | "simulated-annealing" | "siman" => Ok(Method::Annealing),
            _ => Err(OptError::InvalidMethod {
                name: s.to_string(),
                reason: "Valid options are 'simplex', 'fletcher-reeves', 'polak-ribiere', 'bfgs' or 'annealing'.",
            }),
        }
    }
}

/// Cooling schedule for the annealing driver.
///
/// - `tries_per_step`: proposals drawn per step while the objective at the
///   proposal is non-finite.
/// - `iters_per_temp`: accepted-or-rejected proposals per temperature level.
/// - `k`: Boltzmann constant in `exp(-ΔE / (k·T))`.
/// - `t_initial`, `t_min`: start and stop temperatures.
/// - `mu_t`: decay factor, `T ← T / mu_t` after every level.
///
/// Default: `{200, 200, 1.0, 50.0, 1.002, 0.5}`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AnnealSchedule {
    pub tries_per_step: usize,
    pub iters_per_temp: usize,
    pub k: f64,
    pub t_initial: f64,
    pub mu_t: f64,
    pub t_min: f64,
}

impl AnnealSchedule {
    /// Construct a validated schedule.
    ///
    /// # Rules
    /// - `tries_per_step` and `iters_per_temp` must be at least 1.
    /// - `k`, `t_initial` and `t_min` must be finite and strictly positive.
    /// - `mu_t` must be finite and greater than one so the temperature falls.
    ///
    /// # Errors
    /// - [`OptError::InvalidSchedule`] naming the offending field.
    pub fn new(
        tries_per_step: usize, iters_per_temp: usize, k: f64, t_initial: f64, mu_t: f64,
        t_min: f64,
    ) -> OptResult<Self> {
        verify_positive("tries_per_step", tries_per_step as f64)?;
        verify_positive("iters_per_temp", iters_per_temp as f64)?;
        verify_positive("k", k)?;
        verify_positive("t_initial", t_initial)?;
        verify_positive("t_min", t_min)?;
        if !(mu_t.is_finite() && mu_t > 1.0) {
            return Err(OptError::InvalidSchedule {
                field: "mu_t",
                value: mu_t,
                reason: "Decay factor must be finite and greater than one.",
            });
        }
        Ok(Self { tries_per_step, iters_per_temp, k, t_initial, mu_t, t_min })
    }
}

impl Default for AnnealSchedule {
    fn default() -> Self {
        Self { tries_per_step: 200, iters_per_temp: 200, k: 1.0, t_initial: 50.0, mu_t: 1.002, t_min: 0.5 }
    }
}

/// Run configuration.
///
/// Fields:
/// - `method`: driver to use.
/// - `start`: flat starting point; `None` uses the driver default
///   (0.1 per coordinate for gradient methods, 0 for simplex, 1 for annealing).
/// - `step_size`: initial simplex edge, line-search initial step, or
///   annealing move budget.
/// - `tolerance`: simplex size, gradient norm; unused by annealing, whose
///   stopping rule is the schedule.
/// - `verbose`: stream per-iteration diagnostics through `log`.
/// - `want_cov`: record scores and estimate a covariance matrix.
/// - `anneal`: cooling schedule.
/// - `rng`: random source for annealing; `None` uses the process-wide default.
/// - `trace`: optional sink receiving every evaluated point.
///
/// Default: Fletcher–Reeves, step 1, tolerance 1e-3, covariance on.
#[derive(Debug, Clone)]
pub struct MLEOptions {
    pub method: Method,
    pub start: Option<Theta>,
    pub step_size: f64,
    pub tolerance: f64,
    pub verbose: bool,
    pub want_cov: bool,
    pub anneal: AnnealSchedule,
    pub rng: Option<SharedRng>,
    pub trace: Option<TracePath>,
}

impl MLEOptions {
    /// Create validated options with every optional knob at its default.
    ///
    /// # Errors
    /// - [`OptError::InvalidStepSize`] / [`OptError::InvalidTolerance`] for
    ///   non-finite or non-positive values.
    pub fn new(method: Method, step_size: f64, tolerance: f64) -> OptResult<Self> {
        verify_step_size(step_size)?;
        verify_tolerance(tolerance)?;
        Ok(Self { method, step_size, tolerance, ..Self::default() })
    }

    pub fn with_start(mut self, start: Theta) -> Self {
        self.start = Some(start);
        self
    }

    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_covariance(mut self, want_cov: bool) -> Self {
        self.want_cov = want_cov;
        self
    }

    pub fn with_schedule(mut self, anneal: AnnealSchedule) -> Self {
        self.anneal = anneal;
        self
    }

    /// Use a caller-owned random source (shared, not copied).
    pub fn with_rng(mut self, rng: SharedRng) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Use a fresh random source seeded with `seed`.
    pub fn with_seed(self, seed: u64) -> Self {
        self.with_rng(Arc::new(Mutex::new(StdRng::seed_from_u64(seed))))
    }

    pub fn with_trace(mut self, trace: TracePath) -> Self {
        self.trace = Some(trace);
        self
    }
}

impl Default for MLEOptions {
    fn default() -> Self {
        Self {
            method: Method::default(),
            start: None,
            step_size: 1.0,
            tolerance: 1e-3,
            verbose: false,
            want_cov: true,
            anneal: AnnealSchedule::default(),
            rng: None,
            trace: None,
        }
    }
}

/// How a run ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// The driver's stopping criterion was met.
    Converged,
    /// The per-driver iteration cap was hit first.
    MaxIterationsReached,
    /// An iteration failed numerically; the best point so far is reported.
    Failed,
}

impl Status {
    /// Map argmin's termination status onto the three engine outcomes.
    pub fn from_termination(status: &TerminationStatus) -> Self {
        match status {
            TerminationStatus::Terminated(reason) => match reason {
                TerminationReason::SolverConverged | TerminationReason::TargetCostReached => {
                    Status::Converged
                }
                TerminationReason::MaxItersReached => Status::MaxIterationsReached,
                _ => Status::Failed,
            },
            TerminationStatus::NotTerminated => Status::Failed,
        }
    }
}

impl fmt::Display for Status {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Status::Converged => write!(f, "converged"),
            Status::MaxIterationsReached => write!(f, "maximum iterations reached"),
            Status::Failed => write!(f, "failed"),
        }
    }
}

/// Canonical result returned by `maximize` and `restart`.
///
/// - `params`: estimate in the model's structured layout.
/// - `theta_hat`: the same estimate as a flat vector.
/// - `log_likelihood`: `ℓ(θ̂)` (or `ln p(θ̂)` for density models).
/// - `status`: see [`Status`]; callers must inspect it before trusting `params`.
/// - `covariance`: see [`Covariance`].
/// - `iterations`: argmin iterations (temperature levels for annealing).
/// - `fn_evals`: argmin's counters, e.g. `cost_count`, `gradient_count`.
/// - `options`: the configuration this run used.
#[derive(Debug, Clone)]
pub struct Estimate {
    pub params: Parameters,
    pub theta_hat: Theta,
    pub log_likelihood: f64,
    pub status: Status,
    pub covariance: Covariance,
    pub iterations: u64,
    pub fn_evals: FnEvalMap,
    pub options: MLEOptions,
}

impl Estimate {
    /// `true` when every flat coordinate is finite and `|θ_i| < bound`.
    pub fn is_bounded(&self, bound: f64) -> bool {
        self.theta_hat.iter().all(|x| x.is_finite() && x.abs() < bound)
    }

    pub fn converged(&self) -> bool {
        self.status == Status::Converged
    }
}
