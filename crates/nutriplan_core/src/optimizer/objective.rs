//! The penalized objective both solver stages minimize.
//!
//! All four request objectives are expressed as minimization of a
//! dimensionless score; constraint violations (budget, deficiency minimums)
//! are added as smooth quadratic penalties so gradient steps stay
//! informative near the boundary.

use crate::formulate::Problem;
use crate::model::Objective;
use crate::optimizer::SolverConfig;
use crate::response::ResponseModel;
use crate::surrogate::SurrogateModel;

/// Weight of yield attainment in the balanced objective.
const BALANCED_YIELD_WEIGHT: f64 = 0.70;
/// Weight of normalized profit in the balanced objective.
const BALANCED_PROFIT_WEIGHT: f64 = 0.30;

pub(crate) struct ObjectiveFn<'a> {
    problem: &'a Problem,
    model: &'a ResponseModel<'a>,
    penalty_weight: f64,
    surrogate: Option<&'a dyn SurrogateModel>,
}

impl<'a> ObjectiveFn<'a> {
    pub fn new(problem: &'a Problem, model: &'a ResponseModel<'a>, config: &SolverConfig) -> Self {
        Self {
            problem,
            model,
            penalty_weight: config.penalty_weight,
            surrogate: None,
        }
    }

    /// Score yield through a fitted surrogate instead of the closed-form
    /// curves. Costs and penalties stay exact.
    pub fn with_surrogate(mut self, surrogate: &'a dyn SurrogateModel) -> Self {
        self.surrogate = Some(surrogate);
        self
    }

    /// Penalized score to minimize. Lower is better for every objective.
    pub fn value(&self, rates: &[f64]) -> f64 {
        self.score(rates) + self.penalty(rates)
    }

    fn yield_fraction(&self, rates: &[f64]) -> f64 {
        match self.surrogate {
            Some(surrogate) => {
                let macro_rates: Vec<f64> = self
                    .problem
                    .macro_indices()
                    .iter()
                    .map(|&i| rates.get(i).copied().unwrap_or(0.0))
                    .collect();
                surrogate
                    .predict(&macro_rates)
                    .clamp(0.0, crate::response::MAX_YIELD_FRACTION)
            }
            None => self.model.yield_fraction(rates),
        }
    }

    fn score(&self, rates: &[f64]) -> f64 {
        let fraction = self.yield_fraction(rates);
        let cost = self.model.cost(rates);
        let revenue_reference = self.model.target_yield() * self.model.crop_price();
        let revenue = fraction * revenue_reference;
        let profit_norm = (revenue - cost) / revenue_reference;
        match self.problem.objective {
            Objective::MaximizeYield => -fraction,
            Objective::MinimizeCost => cost / revenue_reference,
            Objective::MaximizeProfit => -profit_norm,
            Objective::Balanced => {
                -(BALANCED_YIELD_WEIGHT * fraction + BALANCED_PROFIT_WEIGHT * profit_norm)
            }
        }
    }

    fn penalty(&self, rates: &[f64]) -> f64 {
        let mut penalty = 0.0;
        if let Some(budget) = self.problem.budget {
            let cost = self.model.cost(rates);
            if cost > budget {
                let overshoot = (cost - budget) / budget;
                penalty += self.penalty_weight * overshoot * overshoot;
            }
        }
        for (rate, spec) in rates.iter().zip(self.problem.specs()) {
            if spec.min_rate > 0.0 && *rate < spec.min_rate {
                let shortfall = (spec.min_rate - rate) / spec.min_rate.max(1.0);
                penalty += self.penalty_weight * shortfall * shortfall;
            }
        }
        penalty
    }
}
