//! Built-in agronomic reference data.
//!
//! Unit costs, yield response coefficients, and the pairwise interaction
//! table live here. Callers normally go through the [`CATALOG`] static; the
//! tables are versioned so results can record what they were computed from.

use std::sync::LazyLock;

use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};

use crate::model::{ActivationCondition, InteractionKind, Nutrient, NutrientInteraction};

/// Stamped onto every result for provenance.
pub const CATALOG_VERSION: &str = "2026.2";

/// Cost assumed for a nutrient with no catalog entry, currency per lb.
pub const DEFAULT_UNIT_COST: f64 = 1.0;

/// Bound applied to nutrients with no environmental limit, lb/acre.
pub const DEFAULT_RATE_CEILING: f64 = 300.0;

/// Scale applied to rate products in interaction terms so that typical
/// macro rate pairs land in the low single-digit yield-percent range.
pub const INTERACTION_PRODUCT_SCALE: f64 = 1.0e-5;

/// Shape of one nutrient's contribution to relative yield.
///
/// Primary nutrients follow `slope * r - quadratic * r^2` capped at `cap`;
/// the rest are linear in `slope` up to the same cap. All three values are
/// in yield-fraction units (0.05 means five percent of target yield).
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ResponseCoefficients {
    pub slope: f64,
    pub quadratic: f64,
    pub cap: f64,
}

/// Fallback curve for nutrients missing from the response table.
pub const DEFAULT_RESPONSE: ResponseCoefficients = ResponseCoefficients {
    slope: 0.001,
    quadratic: 0.0,
    cap: 0.02,
};

const UNIT_COSTS: [(Nutrient, f64); 12] = [
    (Nutrient::Nitrogen, 0.55),
    (Nutrient::Phosphorus, 0.65),
    (Nutrient::Potassium, 0.50),
    (Nutrient::Calcium, 0.30),
    (Nutrient::Magnesium, 0.40),
    (Nutrient::Sulfur, 0.35),
    (Nutrient::Zinc, 2.50),
    (Nutrient::Iron, 2.00),
    (Nutrient::Manganese, 2.20),
    (Nutrient::Copper, 3.00),
    (Nutrient::Boron, 4.00),
    (Nutrient::Molybdenum, 8.00),
];

const RESPONSES: [(Nutrient, ResponseCoefficients); 12] = [
    (
        Nutrient::Nitrogen,
        ResponseCoefficients {
            slope: 0.0025,
            quadratic: 4.0e-6,
            cap: 0.25,
        },
    ),
    (
        Nutrient::Phosphorus,
        ResponseCoefficients {
            slope: 0.0030,
            quadratic: 6.0e-6,
            cap: 0.15,
        },
    ),
    (
        Nutrient::Potassium,
        ResponseCoefficients {
            slope: 0.0020,
            quadratic: 3.0e-6,
            cap: 0.15,
        },
    ),
    (
        Nutrient::Calcium,
        ResponseCoefficients {
            slope: 0.0012,
            quadratic: 0.0,
            cap: 0.05,
        },
    ),
    (
        Nutrient::Magnesium,
        ResponseCoefficients {
            slope: 0.0015,
            quadratic: 0.0,
            cap: 0.05,
        },
    ),
    (
        Nutrient::Sulfur,
        ResponseCoefficients {
            slope: 0.0020,
            quadratic: 0.0,
            cap: 0.06,
        },
    ),
    (
        Nutrient::Zinc,
        ResponseCoefficients {
            slope: 0.008,
            quadratic: 0.0,
            cap: 0.04,
        },
    ),
    (
        Nutrient::Iron,
        ResponseCoefficients {
            slope: 0.006,
            quadratic: 0.0,
            cap: 0.03,
        },
    ),
    (
        Nutrient::Manganese,
        ResponseCoefficients {
            slope: 0.006,
            quadratic: 0.0,
            cap: 0.03,
        },
    ),
    (
        Nutrient::Copper,
        ResponseCoefficients {
            slope: 0.008,
            quadratic: 0.0,
            cap: 0.03,
        },
    ),
    (
        Nutrient::Boron,
        ResponseCoefficients {
            slope: 0.010,
            quadratic: 0.0,
            cap: 0.03,
        },
    ),
    (
        Nutrient::Molybdenum,
        ResponseCoefficients {
            slope: 0.015,
            quadratic: 0.0,
            cap: 0.02,
        },
    ),
];

/// Reference data the engine consults for costs, curves, and interactions.
#[derive(Debug, Clone)]
pub struct Catalog {
    costs: FxHashMap<Nutrient, f64>,
    responses: FxHashMap<Nutrient, ResponseCoefficients>,
    interactions: Vec<NutrientInteraction>,
}

/// Shared built-in catalog.
pub static CATALOG: LazyLock<Catalog> = LazyLock::new(Catalog::builtin);

impl Catalog {
    /// The built-in tables. Interaction strengths and coefficients follow
    /// standard agronomy references; pH-gated pairs reflect availability
    /// chemistry (e.g. P-Zn antagonism only expresses in alkaline soils).
    #[must_use]
    pub fn builtin() -> Self {
        let interactions = vec![
            NutrientInteraction {
                pair: (Nutrient::Nitrogen, Nutrient::Phosphorus),
                kind: InteractionKind::Synergistic,
                strength: 0.70,
                coefficient: 1.15,
                condition: ActivationCondition::in_ph_range(6.0, 7.5),
            },
            NutrientInteraction {
                pair: (Nutrient::Nitrogen, Nutrient::Potassium),
                kind: InteractionKind::Synergistic,
                strength: 0.60,
                coefficient: 1.10,
                condition: ActivationCondition::always(),
            },
            NutrientInteraction {
                pair: (Nutrient::Nitrogen, Nutrient::Sulfur),
                kind: InteractionKind::Synergistic,
                strength: 0.50,
                coefficient: 1.08,
                condition: ActivationCondition::always(),
            },
            NutrientInteraction {
                pair: (Nutrient::Phosphorus, Nutrient::Zinc),
                kind: InteractionKind::Antagonistic,
                strength: 0.80,
                coefficient: 0.85,
                condition: ActivationCondition::in_ph_range(6.5, 14.0),
            },
            NutrientInteraction {
                pair: (Nutrient::Phosphorus, Nutrient::Iron),
                kind: InteractionKind::Antagonistic,
                strength: 0.60,
                coefficient: 0.90,
                condition: ActivationCondition::in_ph_range(7.0, 14.0),
            },
            NutrientInteraction {
                pair: (Nutrient::Potassium, Nutrient::Magnesium),
                kind: InteractionKind::Competitive,
                strength: 0.70,
                coefficient: 0.88,
                condition: ActivationCondition::on_soil_type("sandy"),
            },
            NutrientInteraction {
                pair: (Nutrient::Calcium, Nutrient::Magnesium),
                kind: InteractionKind::Competitive,
                strength: 0.50,
                coefficient: 0.92,
                condition: ActivationCondition::always(),
            },
            NutrientInteraction {
                pair: (Nutrient::Zinc, Nutrient::Copper),
                kind: InteractionKind::Competitive,
                strength: 0.40,
                coefficient: 0.93,
                condition: ActivationCondition::always(),
            },
        ];

        Self {
            costs: UNIT_COSTS.into_iter().collect(),
            responses: RESPONSES.into_iter().collect(),
            interactions,
        }
    }

    /// Unit cost in currency per lb. Nutrients missing from the table get
    /// [`DEFAULT_UNIT_COST`].
    #[must_use]
    pub fn unit_cost(&self, nutrient: Nutrient) -> f64 {
        self.costs
            .get(&nutrient)
            .copied()
            .unwrap_or(DEFAULT_UNIT_COST)
    }

    /// Response curve for a nutrient, falling back to [`DEFAULT_RESPONSE`].
    #[must_use]
    pub fn response(&self, nutrient: Nutrient) -> ResponseCoefficients {
        self.responses
            .get(&nutrient)
            .copied()
            .unwrap_or(DEFAULT_RESPONSE)
    }

    #[must_use]
    pub fn interactions(&self) -> &[NutrientInteraction] {
        &self.interactions
    }

    /// Interactions touching one nutrient, in catalog order.
    pub fn interactions_for(
        &self,
        nutrient: Nutrient,
    ) -> impl Iterator<Item = &NutrientInteraction> {
        self.interactions.iter().filter(move |i| i.involves(nutrient))
    }
}

impl Default for Catalog {
    fn default() -> Self {
        Self::builtin()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_nutrient_has_cost_and_curve() {
        let catalog = Catalog::builtin();
        for n in Nutrient::ALL {
            assert!(catalog.unit_cost(n) > 0.0, "{n} has no positive cost");
            let curve = catalog.response(n);
            assert!(curve.slope > 0.0, "{n} has no positive slope");
            assert!(curve.cap > 0.0, "{n} has no positive cap");
        }
    }

    #[test]
    fn test_interaction_pairs_are_unique() {
        let catalog = Catalog::builtin();
        let mut seen = std::collections::HashSet::new();
        for interaction in catalog.interactions() {
            let (a, b) = interaction.pair;
            let key = if a <= b { (a, b) } else { (b, a) };
            assert!(seen.insert(key), "{a}-{b} listed twice");
        }
    }

    #[test]
    fn test_interactions_for_finds_both_sides() {
        let catalog = Catalog::builtin();
        let for_zinc: Vec<_> = catalog.interactions_for(Nutrient::Zinc).collect();
        // P-Zn and Zn-Cu
        assert_eq!(for_zinc.len(), 2);
    }

    #[test]
    fn test_primary_curves_reach_cap_below_the_default_ceiling() {
        let catalog = Catalog::builtin();
        for n in [Nutrient::Nitrogen, Nutrient::Phosphorus, Nutrient::Potassium] {
            let c = catalog.response(n);
            let cap_rate = (0..=DEFAULT_RATE_CEILING as u32).map(f64::from).find(|r| {
                c.slope * r - c.quadratic * r * r >= c.cap
            });
            assert!(
                cap_rate.is_some(),
                "{n} curve never reaches its cap {} below the ceiling",
                c.cap
            );
        }
    }
}
