use std::fmt;

use serde::{Deserialize, Serialize};

/// The closed set of nutrients the engine can optimize.
///
/// Used as a map key throughout, so ordering follows agronomic convention:
/// primary macronutrients first, then secondary, then micronutrients.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Nutrient {
    Nitrogen,
    Phosphorus,
    Potassium,
    Calcium,
    Magnesium,
    Sulfur,
    Zinc,
    Iron,
    Manganese,
    Copper,
    Boron,
    Molybdenum,
}

/// Agronomic grouping that drives response-curve shape and rate seeding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NutrientClass {
    /// N, P, K. Applied at high rates and modeled with diminishing returns.
    Primary,
    /// Ca, Mg, S. Moderate rates, linear response up to a cap.
    Secondary,
    /// Trace elements applied at single-digit rates.
    Micro,
}

impl Nutrient {
    /// Every nutrient in catalog order.
    pub const ALL: [Nutrient; 12] = [
        Nutrient::Nitrogen,
        Nutrient::Phosphorus,
        Nutrient::Potassium,
        Nutrient::Calcium,
        Nutrient::Magnesium,
        Nutrient::Sulfur,
        Nutrient::Zinc,
        Nutrient::Iron,
        Nutrient::Manganese,
        Nutrient::Copper,
        Nutrient::Boron,
        Nutrient::Molybdenum,
    ];

    #[must_use]
    pub fn class(self) -> NutrientClass {
        match self {
            Nutrient::Nitrogen | Nutrient::Phosphorus | Nutrient::Potassium => {
                NutrientClass::Primary
            }
            Nutrient::Calcium | Nutrient::Magnesium | Nutrient::Sulfur => NutrientClass::Secondary,
            _ => NutrientClass::Micro,
        }
    }

    /// Chemical symbol used in rendered reports.
    #[must_use]
    pub fn symbol(self) -> &'static str {
        match self {
            Nutrient::Nitrogen => "N",
            Nutrient::Phosphorus => "P",
            Nutrient::Potassium => "K",
            Nutrient::Calcium => "Ca",
            Nutrient::Magnesium => "Mg",
            Nutrient::Sulfur => "S",
            Nutrient::Zinc => "Zn",
            Nutrient::Iron => "Fe",
            Nutrient::Manganese => "Mn",
            Nutrient::Copper => "Cu",
            Nutrient::Boron => "B",
            Nutrient::Molybdenum => "Mo",
        }
    }
}

impl fmt::Display for Nutrient {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Nutrient::Nitrogen => "nitrogen",
            Nutrient::Phosphorus => "phosphorus",
            Nutrient::Potassium => "potassium",
            Nutrient::Calcium => "calcium",
            Nutrient::Magnesium => "magnesium",
            Nutrient::Sulfur => "sulfur",
            Nutrient::Zinc => "zinc",
            Nutrient::Iron => "iron",
            Nutrient::Manganese => "manganese",
            Nutrient::Copper => "copper",
            Nutrient::Boron => "boron",
            Nutrient::Molybdenum => "molybdenum",
        };
        write!(f, "{}", name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_catalog_order_covers_every_nutrient_once() {
        let mut seen = std::collections::HashSet::new();
        for n in Nutrient::ALL {
            assert!(seen.insert(n), "{} listed twice in catalog order", n);
        }
        assert_eq!(seen.len(), 12);
    }

    #[test]
    fn test_class_partitions() {
        let primary = Nutrient::ALL
            .iter()
            .filter(|n| n.class() == NutrientClass::Primary)
            .count();
        let secondary = Nutrient::ALL
            .iter()
            .filter(|n| n.class() == NutrientClass::Secondary)
            .count();
        let micro = Nutrient::ALL
            .iter()
            .filter(|n| n.class() == NutrientClass::Micro)
            .count();
        assert_eq!((primary, secondary, micro), (3, 3, 6));
    }

    #[test]
    fn test_serde_names_are_lowercase() {
        let json = serde_json::to_string(&Nutrient::Nitrogen).unwrap();
        assert_eq!(json, "\"nitrogen\"");
        let back: Nutrient = serde_json::from_str("\"molybdenum\"").unwrap();
        assert_eq!(back, Nutrient::Molybdenum);
    }
}
