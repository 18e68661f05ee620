//! Closed-form fallback stage.
//!
//! Fills each nutrient's deficit up to the midpoint of its optimal range,
//! clamped into bounds. Total: it cannot fail, which is the point, since it
//! only runs after both real solvers have.

use crate::formulate::Problem;
use crate::optimizer::objective::ObjectiveFn;
use crate::optimizer::StageSolution;

pub(crate) fn solve_heuristic(problem: &Problem, objective: &ObjectiveFn<'_>) -> StageSolution {
    let rates: Vec<f64> = problem
        .specs()
        .iter()
        .map(|spec| {
            let midpoint = (spec.optimal_range.0 + spec.optimal_range.1) / 2.0;
            let deficit = midpoint - spec.soil_level;
            if deficit <= 0.0 || spec.uptake_efficiency <= 0.0 {
                return spec.lower;
            }
            (deficit / spec.uptake_efficiency).clamp(spec.lower, spec.upper)
        })
        .collect();
    let objective_value = objective.value(&rates);
    StageSolution {
        rates,
        objective: objective_value,
        iterations: 0,
        converged: false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::formulate::formulate;
    use crate::model::{Nutrient, RequestBuilder};
    use crate::optimizer::SolverConfig;
    use crate::response::ResponseModel;

    #[test]
    fn test_heuristic_fills_to_optimal_midpoint() {
        let catalog = Catalog::builtin();
        let request = RequestBuilder::new("f", "corn")
            .target_yield(180.0)
            .soil_test(Nutrient::Nitrogen, 25.0)
            .requirement(Nutrient::Nitrogen, 100.0, (120.0, 180.0), 0.65)
            .limit(Nutrient::Nitrogen, 300.0)
            .build();
        let problem = formulate(&request, &catalog).unwrap();
        let model = ResponseModel::new(&catalog, &request, &problem);
        let config = SolverConfig::default();
        let objective = ObjectiveFn::new(&problem, &model, &config);

        let solution = solve_heuristic(&problem, &objective);
        // midpoint 150, soil 25, efficiency 0.65
        let expected = (150.0 - 25.0) / 0.65;
        assert!(
            (solution.rates[0] - expected).abs() < 1e-9,
            "Expected {}, got {}",
            expected,
            solution.rates[0]
        );
        assert!(!solution.converged);
    }

    #[test]
    fn test_heuristic_is_total_on_degenerate_bounds() {
        let catalog = Catalog::builtin();
        let request = RequestBuilder::new("f", "corn")
            .target_yield(180.0)
            .soil_test(Nutrient::Nitrogen, 25.0)
            .requirement(Nutrient::Nitrogen, 100.0, (120.0, 180.0), 0.65)
            .limit(Nutrient::Nitrogen, 0.0)
            .build();
        let problem = formulate(&request, &catalog).unwrap();
        let model = ResponseModel::new(&catalog, &request, &problem);
        let config = SolverConfig::default();
        let objective = ObjectiveFn::new(&problem, &model, &config);

        let solution = solve_heuristic(&problem, &objective);
        assert_eq!(solution.rates, vec![0.0]);
        assert!(solution.objective.is_finite());
    }

    #[test]
    fn test_heuristic_skips_sufficient_soil() {
        let catalog = Catalog::builtin();
        let request = RequestBuilder::new("f", "corn")
            .target_yield(180.0)
            .soil_test(Nutrient::Potassium, 200.0)
            .requirement(Nutrient::Potassium, 80.0, (100.0, 150.0), 0.60)
            .build();
        let problem = formulate(&request, &catalog).unwrap();
        let model = ResponseModel::new(&catalog, &request, &problem);
        let config = SolverConfig::default();
        let objective = ObjectiveFn::new(&problem, &model, &config);

        let solution = solve_heuristic(&problem, &objective);
        // soil already above the optimal midpoint of 125
        assert_eq!(solution.rates, vec![0.0]);
    }
}
