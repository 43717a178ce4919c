//! loglik_optimizer::simplex — derivative-free Nelder–Mead driver.
//!
//! Purpose
//! -------
//! Minimize the adapter cost without derivatives, stopping once the simplex
//! has collapsed to a characteristic size below the configured tolerance.
//!
//! Key behaviors
//! -------------
//! - The initial simplex is `θ₀` plus `θ₀ + step · eᵢ` for each coordinate.
//! - Each iteration tries, in order: reflection, expansion, outside or
//!   inside contraction, and finally a shrink towards the best vertex
//!   (coefficients α = 1, γ = 2, ρ = ½, σ = ½).
//! - The simplex size is the mean Euclidean distance of the vertices from
//!   their centroid; the run converges when it drops below `tolerance`.
//!
//! Invariants & assumptions
//! ------------------------
//! - Vertices are kept sorted by cost (best first) between iterations.
//! - Costs may be `+∞` (failed model evaluations); such vertices sort last
//!   and are replaced first.
//!
//! Testing notes
//! -------------
//! - Unit tests solve one- and two-dimensional quadratics and check the size
//!   measure on a hand-computed simplex.
use crate::optimization::loglik_optimizer::types::{Cost, SolverState, Theta};
use argmin::core::{
    ArgminError, CostFunction, Error, Problem, Solver, State, TerminationReason,
    TerminationStatus, KV,
};

const REFLECTION: f64 = 1.0;
const EXPANSION: f64 = 2.0;
const CONTRACTION: f64 = 0.5;
const SHRINK: f64 = 0.5;

/// Nelder–Mead simplex with a size-based stopping rule.
#[derive(Debug, Clone)]
pub struct Simplex {
    step_size: f64,
    tolerance: f64,
    vertices: Vec<(Theta, Cost)>,
}

impl Simplex {
    pub fn new(step_size: f64, tolerance: f64) -> Self {
        Self { step_size, tolerance, vertices: Vec::new() }
    }

    /// Mean distance of the vertices from their centroid.
    pub fn size(&self) -> f64 {
        let Some((first, _)) = self.vertices.first() else {
            return 0.0;
        };
        let count = self.vertices.len() as f64;
        let mut centroid = Theta::zeros(first.len());
        for (x, _) in &self.vertices {
            centroid += x;
        }
        centroid /= count;
        let total: f64 = self
            .vertices
            .iter()
            .map(|(x, _)| (x - &centroid).mapv(|d| d * d).sum().sqrt())
            .sum();
        total / count
    }

    fn sort(&mut self) {
        self.vertices.sort_by(|a, b| a.1.total_cmp(&b.1));
    }

    /// Centroid of every vertex except the worst.
    fn centroid(&self) -> Theta {
        let n = self.vertices.len() - 1;
        let mut c = Theta::zeros(self.vertices[0].0.len());
        for (x, _) in &self.vertices[..n] {
            c += x;
        }
        c / n as f64
    }

    fn shrink<O>(&mut self, problem: &mut Problem<O>) -> Result<(), Error>
    where
        O: CostFunction<Param = Theta, Output = Cost>,
    {
        let best = self.vertices[0].0.clone();
        for vertex in self.vertices.iter_mut().skip(1) {
            let x = &best + &((&vertex.0 - &best) * SHRINK);
            let cost = problem.cost(&x)?;
            *vertex = (x, cost);
        }
        Ok(())
    }
}

impl<O> Solver<O, SolverState<()>> for Simplex
where
    O: CostFunction<Param = Theta, Output = Cost>,
{
    const NAME: &'static str = "Nelder-Mead simplex";

    fn init(
        &mut self, problem: &mut Problem<O>, mut state: SolverState<()>,
    ) -> Result<(SolverState<()>, Option<KV>), Error> {
        let start = state.take_param().ok_or_else(|| ArgminError::NotInitialized {
            text: "Simplex requires a starting point.".to_string(),
        })?;
        self.vertices.clear();
        let cost = problem.cost(&start)?;
        self.vertices.push((start.clone(), cost));
        for i in 0..start.len() {
            let mut x = start.clone();
            x[i] += self.step_size;
            let cost = problem.cost(&x)?;
            self.vertices.push((x, cost));
        }
        self.sort();
        let (best, best_cost) = self.vertices[0].clone();
        Ok((state.param(best).cost(best_cost), None))
    }

    fn next_iter(
        &mut self, problem: &mut Problem<O>, state: SolverState<()>,
    ) -> Result<(SolverState<()>, Option<KV>), Error> {
        let n = self.vertices.len() - 1;
        if n == 0 {
            let (best, best_cost) = self.vertices[0].clone();
            return Ok((state.param(best).cost(best_cost), None));
        }
        let best_cost = self.vertices[0].1;
        let (worst, worst_cost) = self.vertices[n].clone();
        let second_worst_cost = self.vertices[n - 1].1;
        let centroid = self.centroid();

        let reflected = &centroid + &((&centroid - &worst) * REFLECTION);
        let reflected_cost = problem.cost(&reflected)?;

        if reflected_cost < best_cost {
            let expanded = &centroid + &((&reflected - &centroid) * EXPANSION);
            let expanded_cost = problem.cost(&expanded)?;
            self.vertices[n] = if expanded_cost < reflected_cost {
                (expanded, expanded_cost)
            } else {
                (reflected, reflected_cost)
            };
        } else if reflected_cost < second_worst_cost {
            self.vertices[n] = (reflected, reflected_cost);
        } else {
            let outside = reflected_cost < worst_cost;
            let target = if outside { &reflected } else { &worst };
            let contracted = &centroid + &((target - &centroid) * CONTRACTION);
            let contracted_cost = problem.cost(&contracted)?;
            let accepted = if outside {
                contracted_cost <= reflected_cost
            } else {
                contracted_cost < worst_cost
            };
            if accepted {
                self.vertices[n] = (contracted, contracted_cost);
            } else {
                self.shrink(problem)?;
            }
        }

        self.sort();
        let (best, best_cost) = self.vertices[0].clone();
        Ok((state.param(best).cost(best_cost), None))
    }

    fn terminate(&mut self, _state: &SolverState<()>) -> TerminationStatus {
        if self.size() < self.tolerance {
            return TerminationStatus::Terminated(TerminationReason::SolverConverged);
        }
        TerminationStatus::NotTerminated
    }
}
