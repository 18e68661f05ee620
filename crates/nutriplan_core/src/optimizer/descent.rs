//! Projected-gradient local stage.
//!
//! Minimizes the penalized objective from the formulator's seeded guess:
//! central-difference gradients, an Armijo backtracking line search, and
//! projection onto the bound box after every step. Fast when the seed is in
//! the right basin; reports failure instead of limping so the driver can
//! escalate to the global stage.

use crate::error::StageFailure;
use crate::formulate::Problem;
use crate::optimizer::objective::ObjectiveFn;
use crate::optimizer::{LocalConfig, StageSolution};

const STAGE: &str = "local";

/// Relative perturbation for central differences.
const FD_EPSILON: f64 = 1e-6;
/// Sufficient-decrease constant for the Armijo test.
const ARMIJO_C1: f64 = 1e-4;
/// Line search shrink factor.
const BACKTRACK_FACTOR: f64 = 0.5;
/// Smallest step length the line search will try.
const MIN_STEP: f64 = 1e-12;
/// Ceiling on the Barzilai-Borwein step estimate.
const MAX_STEP: f64 = 1e4;
/// Projected-gradient norm treated as stationary.
const GRAD_TOLERANCE: f64 = 1e-4;
/// Consecutive failed line searches tolerated before giving up.
const STALL_PATIENCE: usize = 3;

pub(crate) fn solve_local(
    problem: &Problem,
    objective: &ObjectiveFn<'_>,
    config: &LocalConfig,
) -> Result<StageSolution, StageFailure> {
    if config.max_iterations == 0 {
        return Err(StageFailure::IterationCap {
            stage: STAGE,
            iterations: 0,
        });
    }

    let bounds = problem.bounds();
    let mut x = problem.initial_guess();
    project(&mut x, &bounds);

    let mut value = objective.value(&x);
    if !value.is_finite() {
        return Err(StageFailure::NonFinite { stage: STAGE });
    }

    let mut stalls = 0usize;
    let mut previous: Option<(Vec<f64>, Vec<f64>)> = None;
    for iteration in 1..=config.max_iterations {
        let gradient = central_gradient(objective, &x);
        if gradient.iter().any(|g| !g.is_finite()) {
            return Err(StageFailure::NonFinite { stage: STAGE });
        }

        let active_norm = projected_norm(&x, &gradient, &bounds);
        if active_norm < GRAD_TOLERANCE {
            return Ok(StageSolution {
                rates: x,
                objective: value,
                iterations: iteration,
                converged: true,
            });
        }

        // Backtrack from the Barzilai-Borwein estimate until the Armijo
        // sufficient-decrease test passes.
        let mut step = match &previous {
            Some((prev_x, prev_gradient)) => {
                barzilai_borwein(&x, prev_x, &gradient, prev_gradient)
                    .unwrap_or(config.initial_step)
            }
            None => config.initial_step,
        }
        .clamp(MIN_STEP, MAX_STEP);
        let mut accepted: Option<(Vec<f64>, f64)> = None;
        while step >= MIN_STEP {
            let mut candidate: Vec<f64> = x
                .iter()
                .zip(&gradient)
                .map(|(xi, gi)| xi - step * gi)
                .collect();
            project(&mut candidate, &bounds);
            let candidate_value = objective.value(&candidate);
            if candidate_value.is_finite()
                && candidate_value <= value - ARMIJO_C1 * step * active_norm * active_norm
            {
                accepted = Some((candidate, candidate_value));
                break;
            }
            step *= BACKTRACK_FACTOR;
        }

        match accepted {
            Some((next, next_value)) => {
                let decrease = value - next_value;
                previous = Some((std::mem::replace(&mut x, next), gradient));
                value = next_value;
                stalls = 0;
                if decrease < config.tolerance * (1.0 + value.abs()) {
                    return Ok(StageSolution {
                        rates: x,
                        objective: value,
                        iterations: iteration,
                        converged: true,
                    });
                }
            }
            None => {
                stalls += 1;
                if stalls >= STALL_PATIENCE {
                    return Err(StageFailure::Stalled {
                        stage: STAGE,
                        iterations: iteration,
                    });
                }
            }
        }
    }

    Err(StageFailure::IterationCap {
        stage: STAGE,
        iterations: config.max_iterations,
    })
}

/// Spectral step estimate from the last accepted move. `None` when the
/// curvature signal is unusable (first iteration or non-positive).
fn barzilai_borwein(
    x: &[f64],
    prev_x: &[f64],
    gradient: &[f64],
    prev_gradient: &[f64],
) -> Option<f64> {
    let mut dx_dg = 0.0;
    let mut dx_dx = 0.0;
    for i in 0..x.len() {
        let dx = x[i] - prev_x[i];
        let dg = gradient[i] - prev_gradient[i];
        dx_dg += dx * dg;
        dx_dx += dx * dx;
    }
    if dx_dg > f64::EPSILON && dx_dx > 0.0 {
        Some(dx_dx / dx_dg)
    } else {
        None
    }
}

fn central_gradient(objective: &ObjectiveFn<'_>, x: &[f64]) -> Vec<f64> {
    let mut gradient = vec![0.0; x.len()];
    let mut probe = x.to_vec();
    for i in 0..x.len() {
        let h = FD_EPSILON * x[i].abs().max(1.0);
        probe[i] = x[i] + h;
        let forward = objective.value(&probe);
        probe[i] = x[i] - h;
        let backward = objective.value(&probe);
        probe[i] = x[i];
        gradient[i] = (forward - backward) / (2.0 * h);
    }
    gradient
}

fn project(x: &mut [f64], bounds: &[(f64, f64)]) {
    for (xi, (lower, upper)) in x.iter_mut().zip(bounds) {
        *xi = xi.clamp(*lower, *upper);
    }
}

/// Norm of the gradient components that can still move the iterate.
/// A component pressing against its bound contributes nothing, so a point
/// pinned to the box counts as stationary.
fn projected_norm(x: &[f64], gradient: &[f64], bounds: &[(f64, f64)]) -> f64 {
    let mut sum = 0.0;
    for ((xi, gi), (lower, upper)) in x.iter().zip(gradient).zip(bounds) {
        let movable = (*gi > 0.0 && *xi > *lower) || (*gi < 0.0 && *xi < *upper);
        if movable {
            sum += gi * gi;
        }
    }
    sum.sqrt()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::formulate::formulate;
    use crate::model::{Nutrient, Objective, RequestBuilder};
    use crate::optimizer::SolverConfig;
    use crate::response::ResponseModel;

    #[test]
    fn test_project_clamps_into_box() {
        let bounds = vec![(0.0, 10.0), (5.0, 15.0)];
        let mut x = vec![-3.0, 20.0];
        project(&mut x, &bounds);
        assert_eq!(x, vec![0.0, 15.0]);
    }

    #[test]
    fn test_projected_norm_ignores_pinned_components() {
        let bounds = vec![(0.0, 10.0)];
        // gradient pushes down but the iterate already sits on the floor
        assert_eq!(projected_norm(&[0.0], &[5.0], &bounds), 0.0);
        // free iterate counts fully
        assert_eq!(projected_norm(&[5.0], &[5.0], &bounds), 5.0);
    }

    #[test]
    fn test_local_converges_on_single_nutrient_cost_problem() {
        let catalog = Catalog::builtin();
        let request = RequestBuilder::new("f", "corn")
            .target_yield(180.0)
            .soil_ph(6.5)
            .organic_matter(3.0)
            .soil_test(Nutrient::Nitrogen, 25.0)
            .requirement(Nutrient::Nitrogen, 100.0, (120.0, 180.0), 0.65)
            .limit(Nutrient::Nitrogen, 200.0)
            .objective(Objective::MinimizeCost)
            .build();
        let problem = formulate(&request, &catalog).unwrap();
        let model = ResponseModel::new(&catalog, &request, &problem);
        let config = SolverConfig::default();
        let objective = ObjectiveFn::new(&problem, &model, &config);

        let solution = solve_local(&problem, &objective, &config.local).unwrap();
        assert!(solution.converged);
        // optimum hugs the deficiency minimum of (100-25)/0.65
        let min_rate = problem.specs()[0].min_rate;
        assert!(
            (solution.rates[0] - min_rate).abs() < 5.0,
            "Expected near {}, got {}",
            min_rate,
            solution.rates[0]
        );
    }

    #[test]
    fn test_zero_iteration_budget_is_an_error() {
        let catalog = Catalog::builtin();
        let request = RequestBuilder::new("f", "corn")
            .target_yield(100.0)
            .soil_test(Nutrient::Nitrogen, 10.0)
            .requirement(Nutrient::Nitrogen, 80.0, (100.0, 140.0), 0.6)
            .build();
        let problem = formulate(&request, &catalog).unwrap();
        let model = ResponseModel::new(&catalog, &request, &problem);
        let config = SolverConfig::default();
        let objective = ObjectiveFn::new(&problem, &model, &config);
        let local = LocalConfig {
            max_iterations: 0,
            ..LocalConfig::default()
        };

        let failure = solve_local(&problem, &objective, &local).unwrap_err();
        assert_eq!(
            failure,
            StageFailure::IterationCap {
                stage: "local",
                iterations: 0
            }
        );
    }
}
