use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::model::Nutrient;

/// A single laboratory soil test result for one nutrient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SoilTestRecord {
    pub nutrient: Nutrient,
    /// Measured concentration in `unit` (typically ppm).
    pub value: f64,
    #[serde(default = "default_unit")]
    pub unit: String,
    pub sampled: Date,
    #[serde(default = "default_method")]
    pub method: String,
    /// Laboratory confidence in the reading, `0.0..=1.0`.
    #[serde(default = "default_confidence")]
    pub confidence: f64,
}

fn default_unit() -> String {
    "ppm".to_string()
}

fn default_method() -> String {
    "Mehlich-3".to_string()
}

fn default_confidence() -> f64 {
    0.9
}

impl SoilTestRecord {
    #[must_use]
    pub fn new(nutrient: Nutrient, value: f64, sampled: Date) -> Self {
        Self {
            nutrient,
            value,
            unit: default_unit(),
            sampled,
            method: default_method(),
            confidence: default_confidence(),
        }
    }
}

/// What the crop needs from one nutrient to reach the target yield.
///
/// All rates derived from a requirement are in lb/acre of applied nutrient.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CropRequirement {
    pub nutrient: Nutrient,
    /// Below this available level the crop is deficient.
    pub minimum: f64,
    /// Available level range over which yield response is strongest.
    pub optimal: (f64, f64),
    /// Above this level the nutrient risks toxicity or lockout.
    pub max_tolerance: f64,
    /// Fraction of an applied pound the crop can actually take up, `(0.0, 1.0]`.
    pub uptake_efficiency: f64,
    /// Growth stage by which the nutrient must be available, e.g. "V6".
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub critical_stage: Option<String>,
}

impl CropRequirement {
    /// Application rate needed to move the soil from `soil_level` up to
    /// `target_level`, accounting for uptake losses. Never negative.
    #[must_use]
    pub fn rate_for_level(&self, soil_level: f64, target_level: f64) -> f64 {
        let deficit = target_level - soil_level;
        if deficit <= 0.0 || self.uptake_efficiency <= 0.0 {
            return 0.0;
        }
        deficit / self.uptake_efficiency
    }

    /// Rate required to just clear the deficiency threshold.
    #[must_use]
    pub fn minimum_rate(&self, soil_level: f64) -> f64 {
        self.rate_for_level(soil_level, self.minimum)
    }

    /// Midpoint of the optimal availability range.
    #[must_use]
    pub fn optimal_midpoint(&self) -> f64 {
        (self.optimal.0 + self.optimal.1) / 2.0
    }
}

/// Environmental and regulatory ceilings on how much of a nutrient may be
/// applied. The effective cap is the tightest of the three.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnvironmentalLimit {
    pub nutrient: Nutrient,
    /// Agronomic maximum application rate in lb/acre.
    pub max_rate: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub regulatory_cap: Option<f64>,
    /// Seasonal multiplier on `max_rate`, e.g. 0.5 for fall application windows.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub seasonal_factor: Option<f64>,
}

impl EnvironmentalLimit {
    #[must_use]
    pub fn new(nutrient: Nutrient, max_rate: f64) -> Self {
        Self {
            nutrient,
            max_rate,
            regulatory_cap: None,
            seasonal_factor: None,
        }
    }

    /// Tightest applicable ceiling, floored at zero.
    #[must_use]
    pub fn effective_cap(&self) -> f64 {
        let mut cap = self.max_rate;
        if let Some(factor) = self.seasonal_factor {
            cap *= factor;
        }
        if let Some(regulatory) = self.regulatory_cap {
            cap = cap.min(regulatory);
        }
        cap.max(0.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn nitrogen_requirement() -> CropRequirement {
        CropRequirement {
            nutrient: Nutrient::Nitrogen,
            minimum: 100.0,
            optimal: (120.0, 180.0),
            max_tolerance: 250.0,
            uptake_efficiency: 0.65,
            critical_stage: None,
        }
    }

    #[test]
    fn test_minimum_rate_scales_by_efficiency() {
        let req = nitrogen_requirement();
        let rate = req.minimum_rate(25.0);
        let expected = 75.0 / 0.65;
        assert!(
            (rate - expected).abs() < 1e-9,
            "Expected {}, got {}",
            expected,
            rate
        );
    }

    #[test]
    fn test_minimum_rate_is_zero_when_soil_is_sufficient() {
        let req = nitrogen_requirement();
        assert_eq!(req.minimum_rate(150.0), 0.0);
    }

    #[test]
    fn test_effective_cap_takes_tightest_ceiling() {
        let limit = EnvironmentalLimit {
            nutrient: Nutrient::Phosphorus,
            max_rate: 100.0,
            regulatory_cap: Some(40.0),
            seasonal_factor: Some(0.5),
        };
        // seasonal: 100 * 0.5 = 50, regulatory tightens to 40
        assert_eq!(limit.effective_cap(), 40.0);
    }

    #[test]
    fn test_effective_cap_never_negative() {
        let limit = EnvironmentalLimit {
            nutrient: Nutrient::Zinc,
            max_rate: -5.0,
            regulatory_cap: None,
            seasonal_factor: None,
        };
        assert_eq!(limit.effective_cap(), 0.0);
    }
}
