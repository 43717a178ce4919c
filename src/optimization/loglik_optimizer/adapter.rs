//! Adapter that exposes a user [`Model`] as an `argmin` problem.
//!
//! We convert a *maximization* of the model objective (a log-likelihood `ℓ`
//! or a density `p`) into a *minimization* by defining the cost as
//! `c(θ) = −ℓ(θ)` (resp. `−p(θ)`). Where the model's constraint binds, the
//! objective is evaluated at the corrected point and the penalty is added
//! to the cost. Analytic scores are negated; missing scores are replaced by
//! central differences of the *objective*, so the sign flip is shared.
//!
//! The adapter also implements `Anneal`, producing random proposals for the
//! annealing driver.
use std::cell::RefCell;

use crate::optimization::{
    errors::{OptError, OptResult},
    loglik_optimizer::{
        annealing::{default_rng, lock_rng, SharedRng},
        finite_diff::central_gradient,
        params::{ParamShape, Parameters},
        trace::TracePath,
        traits::{MLEOptions, Model},
        types::{Cost, Grad, Theta},
        validation::validate_grad,
    },
};
use argmin::{
    core::{CostFunction, Error, Gradient},
    solver::simulatedannealing::Anneal,
};
use rand::Rng;

/// Which model method supplies the objective.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ObjectiveKind {
    LogLikelihood,
    Density,
}

impl ObjectiveKind {
    /// Log-likelihood of a point given its cost.
    pub fn log_likelihood(self, cost: Cost) -> f64 {
        match self {
            ObjectiveKind::LogLikelihood => -cost,
            ObjectiveKind::Density => (-cost).ln(),
        }
    }

    /// Score `∇ℓ` given the cost and its gradient (`∇p / p` for densities).
    pub fn score(self, cost: Cost, cost_grad: &Grad) -> Grad {
        match self {
            ObjectiveKind::LogLikelihood => -cost_grad,
            ObjectiveKind::Density => cost_grad / cost,
        }
    }
}

/// Bridges a user [`Model`] to `argmin`'s `CostFunction`, `Gradient` and
/// `Anneal`.
///
/// - `CostFunction::cost` returns `−objective(θ*) + penalty`, where `θ*` is
///   the corrected point if the constraint binds and penalties are enabled.
///   Model errors and non-finite objectives map to `+∞` so drivers can step
///   back instead of aborting.
/// - `Gradient::gradient` returns `−score(θ*)`, with `θ*` always projected.
/// - `Anneal::anneal` moves a random subset of coordinates and projects.
#[derive(Debug)]
pub struct ArgMinAdapter<'a, M: Model> {
    pub model: &'a M,
    pub data: &'a M::Data,
    pub shape: ParamShape,
    pub kind: ObjectiveKind,
    use_constraint: bool,
    trace: Option<TracePath>,
    rng: Option<SharedRng>,
}

// Not derived: the derive would demand `M: Clone`.
impl<'a, M: Model> Clone for ArgMinAdapter<'a, M> {
    fn clone(&self) -> Self {
        Self {
            model: self.model,
            data: self.data,
            shape: self.shape,
            kind: self.kind,
            use_constraint: self.use_constraint,
            trace: self.trace.clone(),
            rng: self.rng.clone(),
        }
    }
}

impl<'a, M: Model> ArgMinAdapter<'a, M> {
    /// Construct a new adapter and detect the objective kind.
    ///
    /// The objective is probed once at `start`: a model whose
    /// `log_likelihood` reports `LikelihoodNotImplemented` is driven through
    /// `density` instead.
    ///
    /// # Errors
    /// - [`OptError::MissingLikelihood`] when neither method is implemented.
    pub fn new(
        model: &'a M, data: &'a M::Data, opts: &MLEOptions, start: &Theta, use_constraint: bool,
    ) -> OptResult<Self> {
        let shape = model.shape(data);
        let params = Parameters::unpack(start, &shape);
        let kind = match model.log_likelihood(&params, data) {
            Err(OptError::LikelihoodNotImplemented) => match model.density(&params, data) {
                Err(OptError::LikelihoodNotImplemented) => {
                    return Err(OptError::MissingLikelihood { model: model.name().to_string() });
                }
                _ => ObjectiveKind::Density,
            },
            _ => ObjectiveKind::LogLikelihood,
        };
        Ok(Self {
            model,
            data,
            shape,
            kind,
            use_constraint,
            trace: opts.trace.clone(),
            rng: opts.rng.clone(),
        })
    }

    /// Use `rng` for annealing proposals.
    pub fn with_rng(mut self, rng: SharedRng) -> Self {
        self.rng = Some(rng);
        self
    }

    /// Raw objective (`ℓ` or `p`) at structured parameters.
    pub fn objective(&self, params: &Parameters) -> OptResult<f64> {
        match self.kind {
            ObjectiveKind::LogLikelihood => self.model.log_likelihood(params, self.data),
            ObjectiveKind::Density => self.model.density(params, self.data),
        }
    }

    /// Log-likelihood at a flat point, projected if the constraint binds.
    pub fn log_likelihood_at(&self, theta: &Theta) -> OptResult<f64> {
        let value = self.objective(&Parameters::unpack(&self.project(theta), &self.shape))?;
        Ok(self.kind.log_likelihood(-value))
    }

    /// Map an infeasible point onto the model's corrected point.
    pub fn project(&self, theta: &Theta) -> Theta {
        let params = Parameters::unpack(theta, &self.shape);
        match self.model.constraint(&params, self.data) {
            Some(check) if check.penalty > 0.0 => check.corrected.pack(),
            _ => theta.clone(),
        }
    }

    /// Score `∇(objective)` at `theta`, analytic when available.
    ///
    /// # Errors
    /// - Validation errors for malformed analytic scores.
    /// - Errors raised by the model inside finite differencing.
    /// - Any model score error other than `GradientNotImplemented`.
    pub fn score_at(&self, theta: &Theta) -> OptResult<Grad> {
        let point = self.project(theta);
        match self.model.score(&Parameters::unpack(&point, &self.shape), self.data) {
            Ok(g) => {
                validate_grad(&g, point.len())?;
                Ok(g)
            }
            Err(OptError::GradientNotImplemented) => self.numerical_score(&point),
            Err(e) => Err(e),
        }
    }

    /// Finite-difference score of the raw objective at `point`.
    ///
    /// The point is differenced as given; callers project first.
    pub fn numerical_score(&self, point: &Theta) -> OptResult<Grad> {
        let closure_err: RefCell<Option<Error>> = RefCell::new(None);
        let objective = |x: &Theta| -> f64 {
            match self.objective(&Parameters::unpack(x, &self.shape)) {
                Ok(val) => val,
                Err(e) => {
                    let mut slot = closure_err.borrow_mut();
                    if slot.is_none() {
                        *slot = Some(e.into());
                    }
                    f64::NAN
                }
            }
        };
        central_gradient(point, &objective, &closure_err)
    }
}

impl<'a, M: Model> CostFunction for ArgMinAdapter<'a, M> {
    type Param = Theta;
    type Output = Cost;

    fn cost(&self, theta: &Self::Param) -> Result<Self::Output, Error> {
        let params = Parameters::unpack(theta, &self.shape);
        let binding = if self.use_constraint {
            self.model.constraint(&params, self.data).filter(|check| check.penalty > 0.0)
        } else {
            None
        };
        let evaluated = match &binding {
            Some(check) => self.objective(&check.corrected).map(|v| -v + check.penalty),
            None => self.objective(&params).map(|v| -v),
        };
        let cost = match evaluated {
            Ok(c) if c.is_finite() => c,
            _ => f64::INFINITY,
        };
        if let Some(trace) = &self.trace {
            trace.record(theta, -cost);
        }
        Ok(cost)
    }
}

impl<'a, M: Model> Gradient for ArgMinAdapter<'a, M> {
    type Param = Theta;
    type Gradient = Grad;

    fn gradient(&self, theta: &Self::Param) -> Result<Self::Gradient, Error> {
        Ok(-self.score_at(theta)?)
    }
}

impl<'a, M: Model> Anneal for ArgMinAdapter<'a, M> {
    type Param = Theta;
    type Output = Theta;
    type Float = f64;

    /// Random proposal within a total move budget of `extent`.
    ///
    /// Coordinates are visited in random order; each gets a signed move of
    /// `u · remaining` with `u ~ U[0, 1)`, after which the remaining budget
    /// is multiplied by `u`. The proposal is then projected.
    fn anneal(&self, param: &Theta, extent: f64) -> Result<Theta, Error> {
        let rng = self.rng.clone().unwrap_or_else(default_rng);
        let mut proposal = param.clone();
        {
            let mut rng = lock_rng(&rng);
            let mut pending: Vec<usize> = (0..param.len()).collect();
            let mut budget = extent;
            while !pending.is_empty() {
                let dim = pending.swap_remove(rng.gen_range(0..pending.len()));
                let sign = if rng.gen_range(0.0..1.0) > 0.5 { 1.0 } else { -1.0 };
                let amount: f64 = rng.gen_range(0.0..1.0);
                proposal[dim] += amount * budget * sign;
                budget *= amount;
            }
        }
        Ok(self.project(&proposal))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::optimization::loglik_optimizer::{trace::MemoryTrace, traits::ConstraintCheck};
    use approx::assert_relative_eq;
    use ndarray::array;
    use rand::{rngs::StdRng, SeedableRng};
    use std::sync::{Arc, Mutex};

    // -------------------------------------------------------------------------
    // Scope
    // -----
    // These tests cover:
    // - Objective kind detection and the missing-likelihood error.
    // - Cost sign, constraint penalties and the infinite-cost mapping.
    // - Analytic versus finite-difference gradients.
    // - Annealing proposals: budget and projection.
    //
    // They intentionally DO NOT cover:
    // - Running a driver (see api tests).
    // -------------------------------------------------------------------------

    /// ℓ(x) = −(x − 3)², feasible for x ≥ 0 (penalty = −x, corrected to 0).
    struct Parabola {
        analytic: bool,
    }

    impl Model for Parabola {
        type Data = ();

        fn name(&self) -> &str {
            "parabola"
        }

        fn shape(&self, _: &()) -> ParamShape {
            ParamShape::vector(1)
        }

        fn log_likelihood(&self, p: &Parameters, _: &()) -> OptResult<f64> {
            let x = p.vector.as_ref().map_or(0.0, |v| v[0]);
            if x > 100.0 {
                return Err(OptError::ModelError { text: "out of range".into() });
            }
            Ok(-(x - 3.0).powi(2))
        }

        fn score(&self, p: &Parameters, _: &()) -> OptResult<Grad> {
            if !self.analytic {
                return Err(OptError::GradientNotImplemented);
            }
            let x = p.vector.as_ref().map_or(0.0, |v| v[0]);
            Ok(array![-2.0 * (x - 3.0)])
        }

        fn constraint(&self, p: &Parameters, _: &()) -> Option<ConstraintCheck> {
            let x = p.vector.as_ref().map_or(0.0, |v| v[0]);
            (x < 0.0).then(|| ConstraintCheck {
                penalty: -x,
                corrected: Parameters::from_vector(array![0.0]),
            })
        }
    }

    struct Uniform;

    impl Model for Uniform {
        type Data = ();

        fn name(&self) -> &str {
            "uniform"
        }

        fn shape(&self, _: &()) -> ParamShape {
            ParamShape::vector(2)
        }

        fn density(&self, _: &Parameters, _: &()) -> OptResult<f64> {
            Ok(0.25)
        }
    }

    #[derive(Debug)]
    struct Empty;

    impl Model for Empty {
        type Data = ();

        fn name(&self) -> &str {
            "empty"
        }

        fn shape(&self, _: &()) -> ParamShape {
            ParamShape::vector(1)
        }
    }

    #[test]
    // Purpose
    // -------
    // The objective kind follows whichever method the model implements.
    //
    // Given
    // -----
    // - A log-likelihood model, a density-only model and a model with neither.
    //
    // Expect
    // ------
    // - LogLikelihood, Density, and `MissingLikelihood { model: "empty" }`.
    fn adapter_detects_objective_kind() {
        let opts = MLEOptions::default();
        let a = ArgMinAdapter::new(&Parabola { analytic: true }, &(), &opts, &array![1.0], true);
        let b = ArgMinAdapter::new(&Uniform, &(), &opts, &array![1.0, 2.0], true);
        let c = ArgMinAdapter::new(&Empty, &(), &opts, &array![1.0], true);

        assert_eq!(a.unwrap().kind, ObjectiveKind::LogLikelihood);
        let b = b.unwrap();
        assert_eq!(b.kind, ObjectiveKind::Density);
        assert_relative_eq!(b.cost(&array![0.0, 0.0]).unwrap(), -0.25);
        assert_relative_eq!(b.log_likelihood_at(&array![0.0, 0.0]).unwrap(), 0.25f64.ln());
        assert_eq!(c.unwrap_err(), OptError::MissingLikelihood { model: "empty".into() });
    }

    #[test]
    // Purpose
    // -------
    // Costs are negated objectives, penalized where the constraint binds and
    // infinite where the model fails.
    //
    // Given
    // -----
    // - Parabola at x = 1 (feasible), x = −2 (infeasible), x = 200 (error).
    //
    // Expect
    // ------
    // - 4; −ℓ(0) + 2 = 11 with penalties; 25 without; +∞.
    fn cost_applies_sign_penalty_and_failure_mapping() {
        let model = Parabola { analytic: true };
        let opts = MLEOptions::default();
        let penalized = ArgMinAdapter::new(&model, &(), &opts, &array![1.0], true).unwrap();
        let free = ArgMinAdapter::new(&model, &(), &opts, &array![1.0], false).unwrap();

        assert_relative_eq!(penalized.cost(&array![1.0]).unwrap(), 4.0);
        assert_relative_eq!(penalized.cost(&array![-2.0]).unwrap(), 11.0);
        assert_relative_eq!(free.cost(&array![-2.0]).unwrap(), 25.0);
        assert_eq!(penalized.cost(&array![200.0]).unwrap(), f64::INFINITY);
    }

    #[test]
    // Purpose
    // -------
    // Analytic and numerical gradients agree and carry the cost sign.
    //
    // Given
    // -----
    // - Parabola with and without an analytic score at x = 0.1 and x = −1.
    //
    // Expect
    // ------
    // - ∇c(0.1) = 2(0.1 − 3) = −5.8 both ways.
    // - At x = −1 the point is projected to 0 first: ∇c = −6.
    fn gradient_is_negated_score_with_fd_fallback() {
        let opts = MLEOptions::default();
        let analytic = Parabola { analytic: true };
        let numeric = Parabola { analytic: false };
        let a = ArgMinAdapter::new(&analytic, &(), &opts, &array![0.1], true).unwrap();
        let n = ArgMinAdapter::new(&numeric, &(), &opts, &array![0.1], true).unwrap();

        assert_relative_eq!(a.gradient(&array![0.1]).unwrap()[0], -5.8, epsilon = 1e-12);
        assert_relative_eq!(n.gradient(&array![0.1]).unwrap()[0], -5.8, epsilon = 1e-6);
        assert_relative_eq!(n.gradient(&array![-1.0]).unwrap()[0], -6.0, epsilon = 1e-6);
    }

    #[test]
    // Purpose
    // -------
    // Annealing proposals stay within the move budget and are projected.
    //
    // Given
    // -----
    // - A seeded rng, the two-dimensional uniform model and budget 1.
    // - Parabola proposals from x = 0 with a large budget.
    //
    // Expect
    // ------
    // - No coordinate moves by more than the budget.
    // - Parabola proposals are never negative.
    fn anneal_respects_budget_and_constraint() {
        let rng: SharedRng = Arc::new(Mutex::new(StdRng::seed_from_u64(3)));
        let opts = MLEOptions::default().with_rng(rng);
        let uniform = ArgMinAdapter::new(&Uniform, &(), &opts, &array![0.0, 0.0], false).unwrap();
        let model = Parabola { analytic: true };
        let parabola = ArgMinAdapter::new(&model, &(), &opts, &array![0.0], false).unwrap();

        for _ in 0..200 {
            let start = array![0.5, -0.5];
            let moved = uniform.anneal(&start, 1.0).unwrap();
            let largest = (&moved - &start).iter().fold(0.0f64, |m, d| m.max(d.abs()));
            assert!(largest <= 1.0, "moved {largest}");
            assert!(parabola.anneal(&array![0.0], 10.0).unwrap()[0] >= 0.0);
        }
    }

    #[test]
    // Purpose
    // -------
    // Every cost evaluation is mirrored into an attached trace.
    //
    // Given
    // -----
    // - A `MemoryTrace` named "probe" and two cost evaluations.
    //
    // Expect
    // ------
    // - Two rows holding the point and the negated cost.
    fn cost_evaluations_are_traced() {
        let memory = Arc::new(Mutex::new(MemoryTrace::new()));
        let opts = MLEOptions::default().with_trace(TracePath::new("probe", memory.clone()));
        let model = Parabola { analytic: true };
        let adapter = ArgMinAdapter::new(&model, &(), &opts, &array![1.0], true).unwrap();

        adapter.cost(&array![1.0]).unwrap();
        adapter.cost(&array![3.0]).unwrap();

        let guard = memory.lock().unwrap();
        assert_eq!(guard.rows("probe"), &[(array![1.0], -4.0), (array![3.0], 0.0)]);
    }
}
