use serde::{Deserialize, Serialize};

use crate::model::SolverMethod;

/// Tuning for the projected-gradient local stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LocalConfig {
    #[serde(default = "default_local_iterations")]
    pub max_iterations: usize,
    /// Relative objective-change tolerance for convergence.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// First step length tried by the backtracking line search.
    #[serde(default = "default_initial_step")]
    pub initial_step: f64,
}

fn default_local_iterations() -> usize {
    120
}

fn default_tolerance() -> f64 {
    1e-6
}

fn default_initial_step() -> f64 {
    1.0
}

impl Default for LocalConfig {
    fn default() -> Self {
        Self {
            max_iterations: default_local_iterations(),
            tolerance: default_tolerance(),
            initial_step: default_initial_step(),
        }
    }
}

/// Tuning for the differential-evolution global stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GlobalConfig {
    #[serde(default = "default_population")]
    pub population: usize,
    #[serde(default = "default_generations")]
    pub max_generations: usize,
    /// Mutation scale factor F.
    #[serde(default = "default_differential_weight")]
    pub differential_weight: f64,
    /// Crossover probability CR.
    #[serde(default = "default_crossover_probability")]
    pub crossover_probability: f64,
    /// Population objective spread below which the stage stops early.
    #[serde(default = "default_tolerance")]
    pub tolerance: f64,
    /// RNG seed. Fixed by default so identical requests give identical
    /// rates.
    #[serde(default = "default_seed")]
    pub seed: u64,
}

fn default_population() -> usize {
    40
}

fn default_generations() -> usize {
    200
}

fn default_differential_weight() -> f64 {
    0.8
}

fn default_crossover_probability() -> f64 {
    0.9
}

fn default_seed() -> u64 {
    0x5EED
}

impl Default for GlobalConfig {
    fn default() -> Self {
        Self {
            population: default_population(),
            max_generations: default_generations(),
            differential_weight: default_differential_weight(),
            crossover_probability: default_crossover_probability(),
            tolerance: default_tolerance(),
            seed: default_seed(),
        }
    }
}

/// Yield-estimate confidence reported for each producing stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfidenceLevels {
    #[serde(default = "default_local_confidence")]
    pub local: f64,
    #[serde(default = "default_global_confidence")]
    pub global: f64,
    #[serde(default = "default_heuristic_confidence")]
    pub heuristic: f64,
    #[serde(default = "default_surrogate_confidence")]
    pub surrogate: f64,
}

fn default_local_confidence() -> f64 {
    0.85
}

fn default_global_confidence() -> f64 {
    0.75
}

fn default_heuristic_confidence() -> f64 {
    0.60
}

fn default_surrogate_confidence() -> f64 {
    0.80
}

impl Default for ConfidenceLevels {
    fn default() -> Self {
        Self {
            local: default_local_confidence(),
            global: default_global_confidence(),
            heuristic: default_heuristic_confidence(),
            surrogate: default_surrogate_confidence(),
        }
    }
}

impl ConfidenceLevels {
    #[must_use]
    pub fn for_method(&self, method: SolverMethod) -> f64 {
        match method {
            SolverMethod::Local => self.local,
            SolverMethod::Global => self.global,
            SolverMethod::Heuristic => self.heuristic,
            SolverMethod::Surrogate => self.surrogate,
        }
    }
}

/// Full solver configuration: both stages plus the shared penalty and
/// budget-correction settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SolverConfig {
    #[serde(default)]
    pub local: LocalConfig,
    #[serde(default)]
    pub global: GlobalConfig,
    /// Budget overshoot fraction tolerated before rates are rescaled.
    #[serde(default = "default_budget_tolerance")]
    pub budget_tolerance: f64,
    /// Weight on squared constraint violations in the penalized objective.
    #[serde(default = "default_penalty_weight")]
    pub penalty_weight: f64,
    #[serde(default)]
    pub confidence: ConfidenceLevels,
}

fn default_budget_tolerance() -> f64 {
    0.05
}

fn default_penalty_weight() -> f64 {
    50.0
}

impl Default for SolverConfig {
    fn default() -> Self {
        Self {
            local: LocalConfig::default(),
            global: GlobalConfig::default(),
            budget_tolerance: default_budget_tolerance(),
            penalty_weight: default_penalty_weight(),
            confidence: ConfidenceLevels::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_fill_from_empty_json() {
        let config: SolverConfig = serde_json::from_str("{}").unwrap();
        assert_eq!(config.local.max_iterations, 120);
        assert_eq!(config.global.population, 40);
        assert_eq!(config.global.max_generations, 200);
        assert!((config.budget_tolerance - 0.05).abs() < 1e-12);
    }

    #[test]
    fn test_confidence_ranks_local_above_heuristic() {
        let confidence = ConfidenceLevels::default();
        assert!(confidence.local > confidence.global);
        assert!(confidence.global > confidence.heuristic);
        assert!(
            confidence.for_method(SolverMethod::Heuristic) < confidence.for_method(SolverMethod::Surrogate)
        );
    }
}
