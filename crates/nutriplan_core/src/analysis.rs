//! Post-solve analysis: economics, active interactions, and risk scoring.
//!
//! Everything here is a pure function of the request, the formulated
//! problem, and a rate vector, so analyzing the same solution twice gives
//! byte-identical output.

use serde::{Deserialize, Serialize};

use crate::formulate::Problem;
use crate::model::{ActiveInteraction, EconomicSummary, OptimizationRequest, RiskAssessment};
use crate::response::ResponseModel;

/// Thresholds and weights for the additive risk score.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RiskConfig {
    /// Fraction of an environmental limit a rate may reach quietly.
    #[serde(default = "default_limit_proximity")]
    pub limit_proximity: f64,
    #[serde(default = "default_limit_weight")]
    pub limit_weight: f64,
    /// Fraction of the budget that may be spent quietly.
    #[serde(default = "default_budget_utilization")]
    pub budget_utilization: f64,
    #[serde(default = "default_budget_weight")]
    pub budget_weight: f64,
    /// pH window outside which availability becomes unpredictable.
    #[serde(default = "default_ph_window")]
    pub ph_window: (f64, f64),
    #[serde(default = "default_ph_weight")]
    pub ph_weight: f64,
    /// Organic matter percentage below which leaching risk rises.
    #[serde(default = "default_min_organic_matter")]
    pub min_organic_matter: f64,
    #[serde(default = "default_organic_matter_weight")]
    pub organic_matter_weight: f64,
}

fn default_limit_proximity() -> f64 {
    0.80
}

fn default_limit_weight() -> f64 {
    0.2
}

fn default_budget_utilization() -> f64 {
    0.90
}

fn default_budget_weight() -> f64 {
    0.3
}

fn default_ph_window() -> (f64, f64) {
    (5.5, 8.0)
}

fn default_ph_weight() -> f64 {
    0.2
}

fn default_min_organic_matter() -> f64 {
    1.0
}

fn default_organic_matter_weight() -> f64 {
    0.1
}

impl Default for RiskConfig {
    fn default() -> Self {
        Self {
            limit_proximity: default_limit_proximity(),
            limit_weight: default_limit_weight(),
            budget_utilization: default_budget_utilization(),
            budget_weight: default_budget_weight(),
            ph_window: default_ph_window(),
            ph_weight: default_ph_weight(),
            min_organic_matter: default_min_organic_matter(),
            organic_matter_weight: default_organic_matter_weight(),
        }
    }
}

/// Everything the analyzer derives from a rate vector.
#[derive(Debug, Clone, PartialEq)]
pub struct AnalysisReport {
    pub active_interactions: Vec<ActiveInteraction>,
    pub economics: EconomicSummary,
    pub risk: RiskAssessment,
}

/// Analyze one rate vector. Pure and idempotent.
#[must_use]
pub fn analyze(
    request: &OptimizationRequest,
    problem: &Problem,
    model: &ResponseModel<'_>,
    rates: &[f64],
    config: &RiskConfig,
) -> AnalysisReport {
    AnalysisReport {
        active_interactions: model.interaction_effects(rates),
        economics: economics(model, rates),
        risk: risk(request, problem, model, rates, config),
    }
}

fn economics(model: &ResponseModel<'_>, rates: &[f64]) -> EconomicSummary {
    let total_cost = model.cost(rates);
    let expected_revenue = model.expected_yield(rates) * model.crop_price();
    let net_profit = expected_revenue - total_cost;
    let roi_percent = if total_cost > 0.0 {
        net_profit / total_cost * 100.0
    } else {
        0.0
    };
    EconomicSummary {
        total_cost,
        expected_revenue,
        net_profit,
        roi_percent,
    }
}

fn risk(
    request: &OptimizationRequest,
    problem: &Problem,
    model: &ResponseModel<'_>,
    rates: &[f64],
    config: &RiskConfig,
) -> RiskAssessment {
    let mut score = 0.0;
    let mut factors = Vec::new();

    for (rate, spec) in rates.iter().zip(problem.specs()) {
        if spec.upper > 0.0 && spec.upper < f64::INFINITY {
            let utilization = rate / spec.upper;
            if utilization >= config.limit_proximity {
                score += config.limit_weight;
                factors.push(format!(
                    "{} rate {:.0} lb/acre is at {:.0}% of its {:.0} lb/acre limit",
                    spec.nutrient,
                    rate,
                    utilization * 100.0,
                    spec.upper
                ));
            }
        }
    }

    if let Some(budget) = problem.budget {
        let cost = model.cost(rates);
        if cost >= budget * config.budget_utilization {
            score += config.budget_weight;
            factors.push(format!(
                "program cost ${:.2} uses {:.0}% of the ${:.2} budget",
                cost,
                cost / budget * 100.0,
                budget
            ));
        }
    }

    let (ph_low, ph_high) = config.ph_window;
    if request.soil_ph < ph_low || request.soil_ph > ph_high {
        score += config.ph_weight;
        factors.push(format!(
            "soil pH {:.1} is outside the {:.1}-{:.1} window where availability is predictable",
            request.soil_ph, ph_low, ph_high
        ));
    }

    if request.organic_matter_pct < config.min_organic_matter {
        score += config.organic_matter_weight;
        factors.push(format!(
            "organic matter {:.1}% is below {:.1}%, raising leaching risk",
            request.organic_matter_pct, config.min_organic_matter
        ));
    }

    RiskAssessment {
        score: score.min(1.0),
        factors,
    }
}
