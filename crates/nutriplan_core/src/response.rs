//! Yield response model.
//!
//! Relative yield starts from a soil baseline and accumulates one capped
//! term per nutrient plus pairwise interaction terms gated on soil
//! conditions. Everything here is pure; the solvers call these functions
//! thousands of times per run.

use crate::catalog::{Catalog, INTERACTION_PRODUCT_SCALE};
use crate::formulate::Problem;
use crate::model::{ActiveInteraction, Nutrient, NutrientClass, OptimizationRequest, ResponsePath};

/// Fraction of target yield the unfertilized soil delivers.
pub const BASELINE_FRACTION: f64 = 0.80;

/// Hard ceiling on relative yield. Fertilizer cannot push a crop past
/// 120% of its genetic target.
pub const MAX_YIELD_FRACTION: f64 = 1.20;

/// Evaluates yield, cost, and interactions for candidate rate vectors.
///
/// The vector layout is fixed by the [`Problem`] that built this model:
/// `rates[i]` belongs to `nutrients()[i]`.
#[derive(Debug, Clone)]
pub struct ResponseModel<'a> {
    catalog: &'a Catalog,
    nutrients: Vec<Nutrient>,
    unit_costs: Vec<f64>,
    target_yield: f64,
    crop_price: f64,
    soil_ph: f64,
    soil_type: String,
    include_interactions: bool,
    path: ResponsePath,
}

impl<'a> ResponseModel<'a> {
    #[must_use]
    pub fn new(catalog: &'a Catalog, request: &OptimizationRequest, problem: &Problem) -> Self {
        Self {
            catalog,
            nutrients: problem.nutrients(),
            unit_costs: problem.specs().iter().map(|s| s.unit_cost).collect(),
            target_yield: request.target_yield,
            crop_price: request.crop_price,
            soil_ph: request.soil_ph,
            soil_type: request.soil_type.clone(),
            include_interactions: request.include_interactions,
            path: request.response_path,
        }
    }

    #[must_use]
    pub fn target_yield(&self) -> f64 {
        self.target_yield
    }

    #[must_use]
    pub fn crop_price(&self) -> f64 {
        self.crop_price
    }

    #[must_use]
    pub fn nutrients(&self) -> &[Nutrient] {
        &self.nutrients
    }

    /// Relative yield for a rate vector, clamped to
    /// `[0, MAX_YIELD_FRACTION]`.
    #[must_use]
    pub fn yield_fraction(&self, rates: &[f64]) -> f64 {
        let mut fraction = BASELINE_FRACTION;
        for (i, nutrient) in self.nutrients.iter().enumerate() {
            let rate = rates.get(i).copied().unwrap_or(0.0).max(0.0);
            fraction += self.nutrient_term(*nutrient, rate);
        }
        if self.include_interactions {
            fraction += self.interaction_fraction(rates);
        }
        fraction.clamp(0.0, MAX_YIELD_FRACTION)
    }

    /// Expected yield in yield units per acre.
    #[must_use]
    pub fn expected_yield(&self, rates: &[f64]) -> f64 {
        self.yield_fraction(rates) * self.target_yield
    }

    /// Program cost in currency per acre. Negative rates cost nothing.
    #[must_use]
    pub fn cost(&self, rates: &[f64]) -> f64 {
        rates
            .iter()
            .zip(&self.unit_costs)
            .map(|(rate, cost)| rate.max(0.0) * cost)
            .sum()
    }

    /// Catalog interactions that fire for this rate vector, with their
    /// yield contributions in yield units.
    #[must_use]
    pub fn interaction_effects(&self, rates: &[f64]) -> Vec<ActiveInteraction> {
        if !self.include_interactions {
            return Vec::new();
        }
        let mut effects = Vec::new();
        for interaction in self.catalog.interactions() {
            if let Some(effect) = self.interaction_term(interaction, rates) {
                effects.push(ActiveInteraction {
                    pair: interaction.pair,
                    kind: interaction.kind,
                    coefficient: interaction.coefficient,
                    net_effect: effect * self.target_yield,
                });
            }
        }
        effects
    }

    fn nutrient_term(&self, nutrient: Nutrient, rate: f64) -> f64 {
        let curve = self.catalog.response(nutrient);
        let diminishing = self.path == ResponsePath::ClosedForm
            || self.path == ResponsePath::Surrogate;
        let raw = if diminishing && nutrient.class() == NutrientClass::Primary {
            curve.slope * rate - curve.quadratic * rate * rate
        } else {
            curve.slope * rate
        };
        raw.min(curve.cap)
    }

    fn interaction_fraction(&self, rates: &[f64]) -> f64 {
        self.catalog
            .interactions()
            .iter()
            .filter_map(|i| self.interaction_term(i, rates))
            .sum()
    }

    /// Yield-fraction contribution of one interaction, or `None` when it
    /// does not fire (missing nutrient, zero rate, or unmet condition).
    fn interaction_term(
        &self,
        interaction: &crate::model::NutrientInteraction,
        rates: &[f64],
    ) -> Option<f64> {
        if !interaction.condition.matches(self.soil_ph, &self.soil_type) {
            return None;
        }
        let a = self.nutrients.iter().position(|n| *n == interaction.pair.0)?;
        let b = self.nutrients.iter().position(|n| *n == interaction.pair.1)?;
        let rate_a = rates.get(a).copied().unwrap_or(0.0);
        let rate_b = rates.get(b).copied().unwrap_or(0.0);
        if rate_a <= 0.0 || rate_b <= 0.0 {
            return None;
        }
        let weight = interaction.signed_weight();
        if weight == 0.0 {
            return None;
        }
        Some(weight * rate_a * rate_b * INTERACTION_PRODUCT_SCALE)
    }
}
