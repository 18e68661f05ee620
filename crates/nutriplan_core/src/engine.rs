//! End-to-end engine: validate, formulate, solve, analyze, recommend.

use std::collections::BTreeMap;
use std::time::Instant;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};

use crate::analysis::{self, RiskConfig};
use crate::catalog::{CATALOG, CATALOG_VERSION};
use crate::error::ValidationError;
use crate::formulate::formulate;
use crate::model::{Nutrient, OptimizationRequest, OptimizationResult, ResponsePath, SolverReport};
use crate::optimizer::{self, SolverConfig};
use crate::recommend::{self, RecommendConfig};
use crate::response::ResponseModel;
use crate::surrogate::{RegressionForest, SurrogateConfig, SurrogateModel, generate_training_samples};

/// All tunables in one place. The defaults are what the CLI ships with.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EngineConfig {
    #[serde(default)]
    pub solver: SolverConfig,
    #[serde(default)]
    pub risk: RiskConfig,
    #[serde(default)]
    pub surrogate: SurrogateConfig,
    #[serde(default)]
    pub recommend: RecommendConfig,
}

/// The optimization engine. Cheap to construct; holds no state between
/// requests, so one instance can serve many fields.
#[derive(Debug, Clone, Default)]
pub struct Engine {
    config: EngineConfig,
}

impl Engine {
    #[must_use]
    pub fn new(config: EngineConfig) -> Self {
        Self { config }
    }

    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Run one request end to end.
    pub fn optimize(
        &self,
        request: &OptimizationRequest,
    ) -> Result<OptimizationResult, ValidationError> {
        let catalog = &*CATALOG;
        let problem = formulate(request, catalog)?;
        let model = ResponseModel::new(catalog, request, &problem);

        let started = Instant::now();
        let forest = (request.response_path == ResponsePath::Surrogate).then(|| {
            let samples = generate_training_samples(&self.config.surrogate, &problem, &model);
            RegressionForest::fit(&samples, &self.config.surrogate)
        });
        let surrogate = forest.as_ref().map(|f| f as &dyn SurrogateModel);
        let solution = optimizer::solve(&problem, &model, &self.config.solver, surrogate);
        let elapsed_ms = started.elapsed().as_secs_f64() * 1000.0;

        let report = analysis::analyze(
            request,
            &problem,
            &model,
            &solution.rates,
            &self.config.risk,
        );
        let recommendations = recommend::guidance(
            request,
            &problem,
            &solution.rates,
            &report.risk,
            &self.config.recommend,
        );
        let alternatives = recommend::alternatives(&problem, &model);

        let rates: BTreeMap<Nutrient, f64> = problem
            .specs()
            .iter()
            .map(|s| s.nutrient)
            .zip(solution.rates.iter().copied())
            .collect();

        Ok(OptimizationResult {
            rates,
            expected_yield: model.expected_yield(&solution.rates),
            yield_confidence: self.config.solver.confidence.for_method(solution.method),
            economics: report.economics,
            solver: SolverReport {
                method: solution.method,
                convergence: solution.convergence,
                iterations: solution.iterations,
                elapsed_ms,
                objective_value: solution.objective_value,
                budget_corrected: solution.budget_corrected,
            },
            active_interactions: report.active_interactions,
            risk: report.risk,
            recommendations,
            alternatives,
            generated_at: Timestamp::now(),
            catalog_version: CATALOG_VERSION.to_string(),
        })
    }
}

/// One-shot convenience around a default [`Engine`].
pub fn optimize(request: &OptimizationRequest) -> Result<OptimizationResult, ValidationError> {
    Engine::default().optimize(request)
}
