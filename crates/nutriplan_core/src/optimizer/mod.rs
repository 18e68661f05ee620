//! Solver driver and its stages.
//!
//! Requests run through a fixed fallback chain:
//! 1. local projected-gradient descent from the seeded guess,
//! 2. global differential evolution when the local stage fails,
//! 3. a closed-form deficit heuristic when both fail.
//!
//! The surrogate path skips stage 1 and scores stage 2 against the fitted
//! model. Whatever stage wins, rates are budget-corrected and clamped into
//! bounds before leaving this module, so callers always get a vector that
//! honors the hard constraints.

mod config;
mod descent;
mod evolution;
mod heuristic;
mod objective;

pub use config::{ConfidenceLevels, GlobalConfig, LocalConfig, SolverConfig};
pub(crate) use objective::ObjectiveFn;

use crate::formulate::Problem;
use crate::model::{Convergence, SolverMethod};
use crate::response::ResponseModel;
use crate::surrogate::SurrogateModel;

/// Raw output of one stage, before correction.
#[derive(Debug, Clone)]
pub(crate) struct StageSolution {
    pub rates: Vec<f64>,
    pub objective: f64,
    pub iterations: usize,
    pub converged: bool,
}

/// Corrected output of the driver.
#[derive(Debug, Clone)]
pub(crate) struct Solution {
    pub rates: Vec<f64>,
    pub method: SolverMethod,
    pub convergence: Convergence,
    pub iterations: usize,
    pub objective_value: f64,
    pub budget_corrected: bool,
}

/// Run the fallback chain and post-process the winning rates.
pub(crate) fn solve(
    problem: &Problem,
    model: &ResponseModel<'_>,
    config: &SolverConfig,
    surrogate: Option<&dyn SurrogateModel>,
) -> Solution {
    let mut objective = ObjectiveFn::new(problem, model, config);
    if let Some(surrogate) = surrogate {
        objective = objective.with_surrogate(surrogate);
    }

    let staged = if surrogate.is_some() {
        evolution::solve_global(problem, &objective, &config.global)
            .map(|solution| (SolverMethod::Surrogate, solution))
    } else {
        match descent::solve_local(problem, &objective, &config.local) {
            Ok(solution) => Ok((SolverMethod::Local, solution)),
            Err(_) => evolution::solve_global(problem, &objective, &config.global)
                .map(|solution| (SolverMethod::Global, solution)),
        }
    };

    let (method, stage) = match staged {
        Ok(staged) => staged,
        Err(_) => (
            SolverMethod::Heuristic,
            heuristic::solve_heuristic(problem, &objective),
        ),
    };

    let mut rates = stage.rates;
    let budget_corrected = correct_for_budget(problem, model, config, &mut rates);
    problem.clamp_to_bounds(&mut rates);

    let convergence = if method == SolverMethod::Heuristic {
        Convergence::Fallback
    } else if stage.converged {
        Convergence::Converged
    } else {
        Convergence::Partial
    };

    // Report the objective at the rates we actually return, which may
    // differ from the stage optimum after correction.
    let objective_value = objective.value(&rates);

    Solution {
        rates,
        method,
        convergence,
        iterations: stage.iterations,
        objective_value,
        budget_corrected,
    }
}

/// Uniformly rescale rates when cost overshoots the budget beyond
/// tolerance. Scaling toward zero preserves bounds and non-negativity.
fn correct_for_budget(
    problem: &Problem,
    model: &ResponseModel<'_>,
    config: &SolverConfig,
    rates: &mut [f64],
) -> bool {
    let Some(budget) = problem.budget else {
        return false;
    };
    let cost = model.cost(rates);
    if cost <= budget * (1.0 + config.budget_tolerance) || cost <= 0.0 {
        return false;
    }
    let scale = budget / cost;
    for rate in rates.iter_mut() {
        *rate *= scale;
    }
    true
}
