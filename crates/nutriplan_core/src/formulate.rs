//! Turns a validated request into the numeric problem the solvers consume.
//!
//! The formulator fixes the decision-variable order (catalog order over the
//! requested nutrients), derives per-nutrient bounds from environmental
//! limits, seeds the initial guess by nutrient class, and precomputes the
//! deficiency rates the constraint penalties enforce.

use crate::catalog::{Catalog, DEFAULT_RATE_CEILING};
use crate::error::ValidationError;
use crate::model::{Nutrient, NutrientClass, Objective, OptimizationRequest};

/// Initial guess for primary macronutrients, lb/acre.
const INITIAL_PRIMARY: f64 = 100.0;
/// Initial guess for secondary nutrients, lb/acre.
const INITIAL_SECONDARY: f64 = 30.0;
/// Initial guess for micronutrients, lb/acre.
const INITIAL_MICRO: f64 = 5.0;

/// One decision variable with everything the solvers need to know about it.
#[derive(Debug, Clone)]
pub struct NutrientSpec {
    pub nutrient: Nutrient,
    /// Confidence-weighted soil availability. Zero when untested.
    pub soil_level: f64,
    pub uptake_efficiency: f64,
    /// Availability the crop needs to avoid deficiency.
    pub minimum_level: f64,
    pub optimal_range: (f64, f64),
    pub max_tolerance: f64,
    /// Application rate that just clears the deficiency threshold.
    pub min_rate: f64,
    pub lower: f64,
    pub upper: f64,
    pub initial: f64,
    pub unit_cost: f64,
}

/// The formulated optimization problem.
#[derive(Debug, Clone)]
pub struct Problem {
    specs: Vec<NutrientSpec>,
    macro_indices: Vec<usize>,
    pub budget: Option<f64>,
    pub objective: Objective,
}

impl Problem {
    #[must_use]
    pub fn specs(&self) -> &[NutrientSpec] {
        &self.specs
    }

    /// Indices of primary macronutrients within the decision vector. The
    /// surrogate trains on exactly these dimensions.
    #[must_use]
    pub fn macro_indices(&self) -> &[usize] {
        &self.macro_indices
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.specs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }

    #[must_use]
    pub fn nutrients(&self) -> Vec<Nutrient> {
        self.specs.iter().map(|s| s.nutrient).collect()
    }

    #[must_use]
    pub fn bounds(&self) -> Vec<(f64, f64)> {
        self.specs.iter().map(|s| (s.lower, s.upper)).collect()
    }

    #[must_use]
    pub fn initial_guess(&self) -> Vec<f64> {
        self.specs.iter().map(|s| s.initial).collect()
    }

    #[must_use]
    pub fn min_rates(&self) -> Vec<f64> {
        self.specs.iter().map(|s| s.min_rate).collect()
    }

    /// Clamp a candidate vector into the bound box, in place.
    pub fn clamp_to_bounds(&self, rates: &mut [f64]) {
        for (rate, spec) in rates.iter_mut().zip(&self.specs) {
            *rate = rate.clamp(spec.lower, spec.upper);
        }
    }
}

/// Validate a request and build the numeric problem from it.
pub fn formulate(
    request: &OptimizationRequest,
    catalog: &Catalog,
) -> Result<Problem, ValidationError> {
    validate(request)?;

    let mut specs = Vec::with_capacity(request.requirements.len());
    // Catalog order keeps the decision vector stable regardless of how the
    // request listed its requirements. First requirement wins on duplicates.
    for nutrient in Nutrient::ALL {
        let Some(requirement) = request.requirement(nutrient) else {
            continue;
        };
        let soil_level = request.soil_level(nutrient).unwrap_or(0.0);
        let upper = request
            .limit(nutrient)
            .map(|l| l.effective_cap())
            .unwrap_or(DEFAULT_RATE_CEILING);
        let seed = match nutrient.class() {
            NutrientClass::Primary => INITIAL_PRIMARY,
            NutrientClass::Secondary => INITIAL_SECONDARY,
            NutrientClass::Micro => INITIAL_MICRO,
        };
        specs.push(NutrientSpec {
            nutrient,
            soil_level,
            uptake_efficiency: requirement.uptake_efficiency,
            minimum_level: requirement.minimum,
            optimal_range: requirement.optimal,
            max_tolerance: requirement.max_tolerance,
            min_rate: requirement.minimum_rate(soil_level).min(upper),
            lower: 0.0,
            upper,
            initial: seed.clamp(0.0, upper),
            unit_cost: catalog.unit_cost(nutrient),
        });
    }

    let macro_indices = specs
        .iter()
        .enumerate()
        .filter(|(_, s)| s.nutrient.class() == NutrientClass::Primary)
        .map(|(i, _)| i)
        .collect();

    Ok(Problem {
        specs,
        macro_indices,
        budget: request.budget,
        objective: request.objective,
    })
}

fn validate(request: &OptimizationRequest) -> Result<(), ValidationError> {
    if request.soil_tests.is_empty() {
        return Err(ValidationError::EmptySoilTests);
    }
    if request.requirements.is_empty() {
        return Err(ValidationError::EmptyRequirements);
    }
    if request.field_size_acres <= 0.0 {
        return Err(ValidationError::NonPositiveFieldSize {
            acres: request.field_size_acres,
        });
    }
    if request.target_yield <= 0.0 {
        return Err(ValidationError::NonPositiveTargetYield {
            value: request.target_yield,
        });
    }
    for test in &request.soil_tests {
        if test.value < 0.0 {
            return Err(ValidationError::NegativeSoilTest {
                nutrient: test.nutrient,
                value: test.value,
            });
        }
    }
    if !(0.0..=14.0).contains(&request.soil_ph) {
        return Err(ValidationError::PhOutOfRange {
            ph: request.soil_ph,
        });
    }
    if !(0.0..=20.0).contains(&request.organic_matter_pct) {
        return Err(ValidationError::OrganicMatterOutOfRange {
            pct: request.organic_matter_pct,
        });
    }
    if let Some(budget) = request.budget
        && budget <= 0.0
    {
        return Err(ValidationError::NonPositiveBudget { budget });
    }
    if !(0.0..=1.0).contains(&request.risk_tolerance) {
        return Err(ValidationError::RiskToleranceOutOfRange {
            value: request.risk_tolerance,
        });
    }
    if request.crop_price <= 0.0 {
        return Err(ValidationError::NonPositiveCropPrice {
            price: request.crop_price,
        });
    }
    for requirement in &request.requirements {
        let efficiency = requirement.uptake_efficiency;
        if !(efficiency > 0.0 && efficiency <= 1.0) {
            return Err(ValidationError::UptakeEfficiencyOutOfRange {
                nutrient: requirement.nutrient,
                value: efficiency,
            });
        }
        if requirement.optimal.0 > requirement.optimal.1 {
            return Err(ValidationError::InvertedOptimalRange {
                nutrient: requirement.nutrient,
                low: requirement.optimal.0,
                high: requirement.optimal.1,
            });
        }
    }
    Ok(())
}
