//! Integration tests for the nutriplan optimization engine
//!
//! Tests are organized by topic:
//! - `scenarios` - End-to-end engine runs on realistic field setups
//! - `fallback` - Solver chain escalation and method reporting
//! - `invariants` - Bound, budget, and yield-cap properties across paths
//! - `serialization` - Request and result wire formats


use crate::model::{Nutrient, Objective, OptimizationRequest, RequestBuilder};

/// The reference corn scenario used across the suite: 180 bu/acre target,
/// depleted N and P, adequate K, $150/acre budget.
pub(crate) fn corn_scenario() -> OptimizationRequest {
    RequestBuilder::new("north-40", "corn")
        .sampled(jiff::civil::date(2026, 3, 14))
        .target_yield(180.0)
        .soil_ph(6.5)
        .organic_matter(3.2)
        .soil_test(Nutrient::Nitrogen, 25.0)
        .soil_test(Nutrient::Phosphorus, 15.0)
        .soil_test(Nutrient::Potassium, 120.0)
        .requirement(Nutrient::Nitrogen, 100.0, (120.0, 180.0), 0.65)
        .requirement(Nutrient::Phosphorus, 30.0, (40.0, 80.0), 0.25)
        .requirement(Nutrient::Potassium, 80.0, (100.0, 150.0), 0.60)
        .limit(Nutrient::Nitrogen, 200.0)
        .limit(Nutrient::Phosphorus, 100.0)
        .limit(Nutrient::Potassium, 200.0)
        .budget(150.0)
        .objective(Objective::Balanced)
        .build()
}
