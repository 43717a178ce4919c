//! loglik_optimizer::builders — driver construction helpers.
//!
//! Purpose
//! -------
//! Provide small, focused builders for every driver the engine can run.
//! These helpers hide Argmin's generic wiring and apply crate-level options
//! (step size, tolerance, schedule) so that `maximize` can request a
//! configured solver without touching Argmin-specific types.
//!
//! Key behaviors
//! -------------
//! - Gradient drivers share one More–Thuente line search whose initial step
//!   is `opts.step_size`. Conjugate-gradient variants use the looser
//!   curvature constant `c₂ = 0.1` and restart when successive gradients
//!   lose orthogonality.
//! - Gradient drivers are wrapped in [`Supervised`] so that they stop on the
//!   gradient norm and capture line-search failures.
//! - [`default_start`] picks the per-driver starting point used when the
//!   caller supplies none.
//!
//! Invariants & assumptions
//! ------------------------
//! - Options were validated on construction; builders only surface errors
//!   Argmin itself raises while configuring the line search.
//! - The builders do **not** set an initial parameter vector or
//!   `max_iters`; these are applied by the runner.
//!
//! Testing notes
//! -------------
//! - Unit tests check default starting points and that each builder accepts
//!   the default options.
use crate::optimization::{
    errors::OptResult,
    loglik_optimizer::{
        annealing::{Annealer, SharedRng},
        simplex::Simplex,
        supervisor::{Supervised, TrajectoryRecorder},
        traits::{MLEOptions, Method},
        types::{BfgsMoreThuente, CgFletcherReeves, CgPolakRibiere, MoreThuenteLS, Theta},
    },
};
use argmin::{
    core::LineSearch,
    solver::conjugategradient::beta::{FletcherReeves, PolakRibiere},
};

/// Sufficient-decrease constant shared by all gradient drivers.
const ARMIJO_C1: f64 = 1e-4;

/// Curvature constant for conjugate-gradient line searches.
const CG_CURVATURE_C2: f64 = 0.1;

/// Restart conjugate gradient when `|gₖ·gₖ₋₁| / ‖gₖ‖² ≥` this value.
const CG_RESTART_ORTHOGONALITY: f64 = 0.1;

/// build_line_search — More–Thuente line search with the configured step.
///
/// Parameters
/// ----------
/// - `opts`: `&MLEOptions`
///   Supplies `step_size`, used as the initial step length of every search.
/// - `conjugate`: `bool`
///   `true` tightens the curvature condition for conjugate gradients.
///
/// Errors
/// ------
/// - `OptError` (via `From<argmin::core::Error>`) when Argmin rejects the
///   constants or the step length.
pub fn build_line_search(opts: &MLEOptions, conjugate: bool) -> OptResult<MoreThuenteLS> {
    let mut line_search = MoreThuenteLS::new();
    if conjugate {
        line_search = line_search.with_c(ARMIJO_C1, CG_CURVATURE_C2)?;
    }
    line_search.initial_step_length(opts.step_size)?;
    Ok(line_search)
}

/// build_fletcher_reeves — supervised Fletcher–Reeves conjugate gradient.
pub fn build_fletcher_reeves(
    opts: &MLEOptions, recorder: Option<TrajectoryRecorder>,
) -> OptResult<Supervised<CgFletcherReeves>> {
    let cg = CgFletcherReeves::new(build_line_search(opts, true)?, FletcherReeves::new())
        .restart_orthogonality(CG_RESTART_ORTHOGONALITY);
    Ok(supervise(cg, opts, recorder))
}

/// build_polak_ribiere — supervised Polak–Ribière conjugate gradient.
pub fn build_polak_ribiere(
    opts: &MLEOptions, recorder: Option<TrajectoryRecorder>,
) -> OptResult<Supervised<CgPolakRibiere>> {
    let cg = CgPolakRibiere::new(build_line_search(opts, true)?, PolakRibiere::new())
        .restart_orthogonality(CG_RESTART_ORTHOGONALITY);
    Ok(supervise(cg, opts, recorder))
}

/// build_bfgs — supervised BFGS.
///
/// Notes
/// -----
/// - The runner must seed the state with an initial inverse Hessian.
pub fn build_bfgs(
    opts: &MLEOptions, recorder: Option<TrajectoryRecorder>,
) -> OptResult<Supervised<BfgsMoreThuente>> {
    let bfgs = BfgsMoreThuente::new(build_line_search(opts, false)?);
    Ok(supervise(bfgs, opts, recorder))
}

fn supervise<S>(
    solver: S, opts: &MLEOptions, recorder: Option<TrajectoryRecorder>,
) -> Supervised<S> {
    let supervised = Supervised::new(solver).with_tolerance_grad(opts.tolerance);
    match recorder {
        Some(recorder) => supervised.with_recorder(recorder),
        None => supervised,
    }
}

/// build_simplex — Nelder–Mead with the configured edge length and size tolerance.
pub fn build_simplex(opts: &MLEOptions) -> Simplex {
    Simplex::new(opts.step_size, opts.tolerance)
}

/// build_annealer — annealing driver drawing from `rng`.
pub fn build_annealer(
    opts: &MLEOptions, rng: SharedRng, recorder: Option<TrajectoryRecorder>,
) -> Annealer {
    let annealer = Annealer::new(opts.anneal, opts.step_size, rng);
    match recorder {
        Some(recorder) => annealer.with_recorder(recorder),
        None => annealer,
    }
}

/// default_start — starting point used when the caller supplies none.
///
/// Gradient methods start at 0.1 in every coordinate, the simplex at the
/// origin and annealing at 1.
pub fn default_start(method: Method, dim: usize) -> Theta {
    let value = match method {
        Method::FletcherReeves | Method::PolakRibiere | Method::Bfgs => 0.1,
        Method::Simplex => 0.0,
        Method::Annealing => 1.0,
    };
    Theta::from_elem(dim, value)
}
