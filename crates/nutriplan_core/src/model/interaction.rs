use serde::{Deserialize, Serialize};

use crate::model::Nutrient;

/// Direction of a pairwise nutrient interaction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InteractionKind {
    /// The pair together produces more yield than the sum of the parts.
    Synergistic,
    /// One nutrient suppresses availability of the other.
    Antagonistic,
    /// No cross effect. Carried for catalog completeness.
    Independent,
    /// The pair competes for the same uptake pathway.
    Competitive,
}

/// Soil conditions under which an interaction applies.
///
/// An empty condition matches every field.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ActivationCondition {
    /// Inclusive pH window, e.g. `(6.0, 7.5)`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ph_range: Option<(f64, f64)>,
    /// Soil texture class this interaction is limited to, matched
    /// case-insensitively.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub soil_type: Option<String>,
}

impl ActivationCondition {
    #[must_use]
    pub fn always() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn in_ph_range(low: f64, high: f64) -> Self {
        Self {
            ph_range: Some((low, high)),
            soil_type: None,
        }
    }

    #[must_use]
    pub fn on_soil_type(soil_type: &str) -> Self {
        Self {
            ph_range: None,
            soil_type: Some(soil_type.to_string()),
        }
    }

    #[must_use]
    pub fn matches(&self, soil_ph: f64, soil_type: &str) -> bool {
        if let Some((low, high)) = self.ph_range
            && (soil_ph < low || soil_ph > high)
        {
            return false;
        }
        if let Some(required) = &self.soil_type
            && !required.eq_ignore_ascii_case(soil_type)
        {
            return false;
        }
        true
    }
}

/// A pairwise interaction between two nutrients.
///
/// `coefficient` is a yield multiplier anchor: values above 1.0 boost the
/// joint response, values below 1.0 suppress it. `strength` scales how much
/// of that anchor actually applies. The pair is unordered; each pair appears
/// once in the catalog and is evaluated symmetrically.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NutrientInteraction {
    pub pair: (Nutrient, Nutrient),
    pub kind: InteractionKind,
    /// How strongly the interaction expresses, `0.0..=1.0`.
    pub strength: f64,
    /// Yield multiplier anchor, centered on 1.0.
    pub coefficient: f64,
    #[serde(default)]
    pub condition: ActivationCondition,
}

impl NutrientInteraction {
    #[must_use]
    pub fn involves(&self, nutrient: Nutrient) -> bool {
        self.pair.0 == nutrient || self.pair.1 == nutrient
    }

    /// Signed deviation from neutral, scaled by strength. Independent
    /// interactions always contribute zero.
    #[must_use]
    pub fn signed_weight(&self) -> f64 {
        if self.kind == InteractionKind::Independent {
            return 0.0;
        }
        (self.coefficient - 1.0) * self.strength
    }
}
