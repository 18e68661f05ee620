//! Agronomic guidance and alternative strategies.
//!
//! Turns the optimized rates into the advice a consultant would attach:
//! application timing, soil amendments, and risk warnings, plus two named
//! alternative programs bracketing the optimum.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::formulate::Problem;
use crate::model::{
    AlternativeStrategy, Nutrient, OptimizationRequest, RiskAssessment,
};
use crate::response::ResponseModel;

/// Thresholds that trigger guidance lines.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RecommendConfig {
    /// Nitrogen rate above which split application is advised, lb/acre.
    #[serde(default = "default_split_nitrogen")]
    pub split_nitrogen_rate: f64,
    /// Below this pH, lime is advised.
    #[serde(default = "default_lime_ph")]
    pub lime_ph: f64,
    /// Above this pH, micronutrient tie-up warnings apply.
    #[serde(default = "default_alkaline_ph")]
    pub alkaline_ph: f64,
    /// Organic matter percentage worth building toward.
    #[serde(default = "default_organic_matter_target")]
    pub organic_matter_target: f64,
    /// Risk score above which an explicit warning is emitted.
    #[serde(default = "default_risk_warning")]
    pub risk_warning: f64,
}

fn default_split_nitrogen() -> f64 {
    60.0
}

fn default_lime_ph() -> f64 {
    5.5
}

fn default_alkaline_ph() -> f64 {
    7.5
}

fn default_organic_matter_target() -> f64 {
    2.0
}

fn default_risk_warning() -> f64 {
    0.5
}

impl Default for RecommendConfig {
    fn default() -> Self {
        Self {
            split_nitrogen_rate: default_split_nitrogen(),
            lime_ph: default_lime_ph(),
            alkaline_ph: default_alkaline_ph(),
            organic_matter_target: default_organic_matter_target(),
            risk_warning: default_risk_warning(),
        }
    }
}

/// Human-readable guidance for the recommended rates, in a stable order.
#[must_use]
pub fn guidance(
    request: &OptimizationRequest,
    problem: &Problem,
    rates: &[f64],
    risk: &RiskAssessment,
    config: &RecommendConfig,
) -> Vec<String> {
    let mut lines = Vec::new();
    let rate_of = |nutrient: Nutrient| -> f64 {
        problem
            .specs()
            .iter()
            .zip(rates)
            .find(|(spec, _)| spec.nutrient == nutrient)
            .map(|(_, rate)| *rate)
            .unwrap_or(0.0)
    };

    let nitrogen = rate_of(Nutrient::Nitrogen);
    if nitrogen > config.split_nitrogen_rate {
        lines.push(format!(
            "Split the {nitrogen:.0} lb/acre nitrogen program: apply half at planting and side-dress the remainder at V6 to cut volatilization losses."
        ));
    }
    if rate_of(Nutrient::Phosphorus) > 0.0 {
        lines.push(
            "Band phosphorus at planting; broadcast applications tie up quickly and feed the crop poorly."
                .to_string(),
        );
    }
    if rate_of(Nutrient::Potassium) > 0.0 {
        lines.push(
            "Apply potassium before or at planting and incorporate it into the root zone."
                .to_string(),
        );
    }

    for requirement in &request.requirements {
        if let Some(stage) = &requirement.critical_stage
            && rate_of(requirement.nutrient) > 0.0
        {
            lines.push(format!(
                "Finish the {} application before {stage}; uptake peaks at that stage and later material is largely wasted.",
                requirement.nutrient
            ));
        }
    }

    if request.soil_ph < config.lime_ph {
        lines.push(format!(
            "Soil pH {:.1} is acidic enough to limit uptake; apply lime ahead of the fertilizer program.",
            request.soil_ph
        ));
    } else if request.soil_ph > config.alkaline_ph {
        lines.push(format!(
            "Soil pH {:.1} will tie up zinc and iron; prefer chelated micronutrient sources.",
            request.soil_ph
        ));
    }

    if request.organic_matter_pct < config.organic_matter_target {
        lines.push(format!(
            "Organic matter at {:.1}% is thin; cover crops or manure would improve nutrient retention.",
            request.organic_matter_pct
        ));
    }

    if risk.score > config.risk_warning {
        lines.push(format!(
            "Risk score {:.2} is elevated; review the flagged factors before committing the full program.",
            risk.score
        ));
    }
    if risk.score > request.risk_tolerance {
        lines.push(format!(
            "Risk score {:.2} exceeds your stated tolerance of {:.2}; the conservative alternative below trades yield for margin.",
            risk.score, request.risk_tolerance
        ));
    }

    lines
}

/// Two bracketing programs: minimum-requirement and top-of-optimal.
#[must_use]
pub fn alternatives(problem: &Problem, model: &ResponseModel<'_>) -> Vec<AlternativeStrategy> {
    let conservative_rates: Vec<f64> = problem
        .specs()
        .iter()
        .map(|spec| spec.min_rate.clamp(spec.lower, spec.upper))
        .collect();
    let aggressive_rates: Vec<f64> = problem
        .specs()
        .iter()
        .map(|spec| {
            let deficit = spec.optimal_range.1 - spec.soil_level;
            if deficit <= 0.0 || spec.uptake_efficiency <= 0.0 {
                return spec.lower;
            }
            (deficit / spec.uptake_efficiency).clamp(spec.lower, spec.upper)
        })
        .collect();

    vec![
        strategy(
            "conservative",
            "Covers deficiency minimums only; lowest spend that avoids visible deficiency.",
            conservative_rates,
            problem,
            model,
        ),
        strategy(
            "aggressive",
            "Pushes availability to the top of the optimal range; maximum response, minimum margin.",
            aggressive_rates,
            problem,
            model,
        ),
    ]
}

fn strategy(
    name: &str,
    description: &str,
    rates: Vec<f64>,
    problem: &Problem,
    model: &ResponseModel<'_>,
) -> AlternativeStrategy {
    let projected_yield = model.expected_yield(&rates);
    let projected_cost = model.cost(&rates);
    let rates: BTreeMap<Nutrient, f64> = problem
        .specs()
        .iter()
        .map(|s| s.nutrient)
        .zip(rates)
        .collect();
    AlternativeStrategy {
        name: name.to_string(),
        rates,
        projected_yield,
        projected_cost,
        description: description.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::Catalog;
    use crate::formulate::formulate;
    use crate::model::RequestBuilder;

    fn fixture(ph: f64, organic_matter: f64) -> (Catalog, OptimizationRequest) {
        let catalog = Catalog::builtin();
        let request = RequestBuilder::new("f", "corn")
            .target_yield(180.0)
            .soil_ph(ph)
            .organic_matter(organic_matter)
            .soil_test(Nutrient::Nitrogen, 25.0)
            .soil_test(Nutrient::Phosphorus, 15.0)
            .soil_test(Nutrient::Potassium, 120.0)
            .requirement(Nutrient::Nitrogen, 100.0, (120.0, 180.0), 0.65)
            .requirement(Nutrient::Phosphorus, 30.0, (40.0, 80.0), 0.25)
            .requirement(Nutrient::Potassium, 80.0, (100.0, 150.0), 0.60)
            .limit(Nutrient::Nitrogen, 200.0)
            .limit(Nutrient::Phosphorus, 100.0)
            .limit(Nutrient::Potassium, 200.0)
            .build();
        (catalog, request)
    }

    fn no_risk() -> RiskAssessment {
        RiskAssessment {
            score: 0.0,
            factors: Vec::new(),
        }
    }

    #[test]
    fn test_heavy_nitrogen_triggers_split_advice() {
        let (catalog, request) = fixture(6.5, 3.0);
        let problem = formulate(&request, &catalog).unwrap();
        let lines = guidance(
            &request,
            &problem,
            &[120.0, 0.0, 0.0],
            &no_risk(),
            &RecommendConfig::default(),
        );
        assert!(
            lines.iter().any(|l| l.contains("Split")),
            "expected split advice in {:?}",
            lines
        );
    }

    #[test]
    fn test_acid_soil_gets_lime_advice() {
        let (catalog, request) = fixture(5.2, 3.0);
        let problem = formulate(&request, &catalog).unwrap();
        let lines = guidance(
            &request,
            &problem,
            &[50.0, 0.0, 0.0],
            &no_risk(),
            &RecommendConfig::default(),
        );
        assert!(lines.iter().any(|l| l.contains("lime")));
    }

    #[test]
    fn test_critical_stage_adds_a_timing_deadline() {
        let (catalog, mut request) = fixture(6.5, 3.0);
        request.requirements[0].critical_stage = Some("V8".to_string());
        let problem = formulate(&request, &catalog).unwrap();
        let lines = guidance(
            &request,
            &problem,
            &[120.0, 0.0, 0.0],
            &no_risk(),
            &RecommendConfig::default(),
        );
        assert!(
            lines.iter().any(|l| l.contains("before V8")),
            "expected a V8 deadline in {:?}",
            lines
        );

        // no deadline when nothing is applied for that nutrient
        let lines = guidance(
            &request,
            &problem,
            &[0.0, 0.0, 0.0],
            &no_risk(),
            &RecommendConfig::default(),
        );
        assert!(lines.iter().all(|l| !l.contains("V8")));
    }

    #[test]
    fn test_alkaline_soil_gets_chelation_advice() {
        let (catalog, request) = fixture(7.9, 3.0);
        let problem = formulate(&request, &catalog).unwrap();
        let lines = guidance(
            &request,
            &problem,
            &[50.0, 0.0, 0.0],
            &no_risk(),
            &RecommendConfig::default(),
        );
        assert!(lines.iter().any(|l| l.contains("chelated")));
    }

    #[test]
    fn test_risk_warning_appears_above_threshold() {
        let (catalog, request) = fixture(6.5, 3.0);
        let problem = formulate(&request, &catalog).unwrap();
        let risky = RiskAssessment {
            score: 0.7,
            factors: vec!["budget nearly exhausted".to_string()],
        };
        let lines = guidance(
            &request,
            &problem,
            &[50.0, 0.0, 0.0],
            &risky,
            &RecommendConfig::default(),
        );
        assert!(lines.iter().any(|l| l.contains("elevated")));
        // 0.7 also exceeds the default tolerance of 0.5
        assert!(lines.iter().any(|l| l.contains("tolerance")));
    }

    #[test]
    fn test_alternatives_bracket_the_program() {
        let (catalog, request) = fixture(6.5, 3.0);
        let problem = formulate(&request, &catalog).unwrap();
        let model = ResponseModel::new(&catalog, &request, &problem);
        let strategies = alternatives(&problem, &model);
        assert_eq!(strategies.len(), 2);

        let conservative = &strategies[0];
        let aggressive = &strategies[1];
        assert_eq!(conservative.name, "conservative");
        assert_eq!(aggressive.name, "aggressive");
        assert!(conservative.projected_cost < aggressive.projected_cost);
        assert!(conservative.projected_yield <= aggressive.projected_yield);
        // conservative covers exactly the deficiency minimums
        let n_min = (100.0 - 25.0) / 0.65;
        let got = conservative.rates[&Nutrient::Nitrogen];
        assert!(
            (got - n_min).abs() < 1e-9,
            "Expected {}, got {}",
            n_min,
            got
        );
    }
}
