use std::collections::BTreeMap;
use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::model::{InteractionKind, Nutrient};

/// Which solver stage produced the final rates.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolverMethod {
    /// Projected-gradient descent from the seeded guess.
    Local,
    /// Differential evolution over the full bound box.
    Global,
    /// Closed-form deficit fill, used when both solvers fail.
    Heuristic,
    /// Differential evolution scored against the fitted surrogate.
    Surrogate,
}

impl fmt::Display for SolverMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            SolverMethod::Local => "local",
            SolverMethod::Global => "global",
            SolverMethod::Heuristic => "heuristic",
            SolverMethod::Surrogate => "surrogate",
        };
        write!(f, "{}", name)
    }
}

/// How the producing stage terminated.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Convergence {
    /// The stage met its tolerance.
    Converged,
    /// The stage hit its iteration cap and returned its best iterate.
    Partial,
    /// The heuristic filled in after both solvers failed.
    Fallback,
}

/// Solver diagnostics attached to every result.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolverReport {
    pub method: SolverMethod,
    pub convergence: Convergence,
    pub iterations: usize,
    pub elapsed_ms: f64,
    /// Final value of the internal minimization objective, after any
    /// budget correction.
    pub objective_value: f64,
    /// Whether rates were rescaled to honor the budget.
    pub budget_corrected: bool,
}

/// Per-acre economics of the recommended program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EconomicSummary {
    pub total_cost: f64,
    pub expected_revenue: f64,
    pub net_profit: f64,
    /// Net profit over cost, as a percentage. Zero when nothing is spent.
    pub roi_percent: f64,
}

/// One catalog interaction that fired for the recommended rates.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ActiveInteraction {
    pub pair: (Nutrient, Nutrient),
    pub kind: InteractionKind,
    pub coefficient: f64,
    /// Yield contribution of this interaction in yield units per acre.
    /// Negative for antagonistic and competitive pairs.
    pub net_effect: f64,
}

/// Aggregate risk of the recommended program.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RiskAssessment {
    /// Additive score capped at 1.0.
    pub score: f64,
    pub factors: Vec<String>,
}

/// A named alternative rate program offered alongside the optimum.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AlternativeStrategy {
    pub name: String,
    pub rates: BTreeMap<Nutrient, f64>,
    pub projected_yield: f64,
    pub projected_cost: f64,
    pub description: String,
}

/// Complete output of one optimization run.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OptimizationResult {
    /// Recommended application rates in lb/acre, keyed by nutrient.
    /// Contains exactly the nutrients the request listed requirements for.
    pub rates: BTreeMap<Nutrient, f64>,
    pub expected_yield: f64,
    /// Confidence in the yield estimate, set by the producing solver stage.
    pub yield_confidence: f64,
    pub economics: EconomicSummary,
    pub solver: SolverReport,
    pub active_interactions: Vec<ActiveInteraction>,
    pub risk: RiskAssessment,
    pub recommendations: Vec<String>,
    pub alternatives: Vec<AlternativeStrategy>,
    pub generated_at: Timestamp,
    pub catalog_version: String,
}

impl OptimizationResult {
    /// Recommended rate for one nutrient, zero if it was not in the request.
    #[must_use]
    pub fn rate(&self, nutrient: Nutrient) -> f64 {
        self.rates.get(&nutrient).copied().unwrap_or(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rate_lookup_defaults_to_zero() {
        let result = OptimizationResult {
            rates: BTreeMap::from([(Nutrient::Nitrogen, 120.0)]),
            expected_yield: 170.0,
            yield_confidence: 0.85,
            economics: EconomicSummary {
                total_cost: 100.0,
                expected_revenue: 765.0,
                net_profit: 665.0,
                roi_percent: 665.0,
            },
            solver: SolverReport {
                method: SolverMethod::Local,
                convergence: Convergence::Converged,
                iterations: 10,
                elapsed_ms: 1.0,
                objective_value: -1.0,
                budget_corrected: false,
            },
            active_interactions: Vec::new(),
            risk: RiskAssessment {
                score: 0.0,
                factors: Vec::new(),
            },
            recommendations: Vec::new(),
            alternatives: Vec::new(),
            generated_at: Timestamp::UNIX_EPOCH,
            catalog_version: "test".to_string(),
        };
        assert_eq!(result.rate(Nutrient::Nitrogen), 120.0);
        assert_eq!(result.rate(Nutrient::Boron), 0.0);
    }

    #[test]
    fn test_rates_map_orders_by_catalog() {
        let rates = BTreeMap::from([
            (Nutrient::Zinc, 2.0),
            (Nutrient::Nitrogen, 120.0),
            (Nutrient::Potassium, 80.0),
        ]);
        let keys: Vec<Nutrient> = rates.keys().copied().collect();
        assert_eq!(
            keys,
            vec![Nutrient::Nitrogen, Nutrient::Potassium, Nutrient::Zinc]
        );
    }
}
