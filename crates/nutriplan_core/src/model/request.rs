use jiff::civil::Date;
use serde::{Deserialize, Serialize};

use crate::model::{
    CropRequirement, EnvironmentalLimit, Nutrient, NutrientClass, SoilTestRecord,
};

/// What the optimizer should maximize or minimize.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Objective {
    MaximizeYield,
    MinimizeCost,
    MaximizeProfit,
    /// Weighted blend of yield attainment and profit.
    #[default]
    Balanced,
}

/// Which yield response formulation the solver evaluates.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResponsePath {
    /// Diminishing-returns curves with interaction terms.
    #[default]
    ClosedForm,
    /// Capped linear response for every nutrient class.
    Linear,
    /// Tree-ensemble regression fit on synthetic response samples.
    Surrogate,
}

/// One complete optimization problem for one field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    pub field_id: String,
    pub crop: String,
    /// Yield goal in `yield_unit` per acre.
    pub target_yield: f64,
    #[serde(default = "default_yield_unit")]
    pub yield_unit: String,
    pub soil_tests: Vec<SoilTestRecord>,
    pub requirements: Vec<CropRequirement>,
    #[serde(default)]
    pub limits: Vec<EnvironmentalLimit>,
    /// Spend ceiling in currency per acre. `None` means unconstrained.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub budget: Option<f64>,
    #[serde(default)]
    pub objective: Objective,
    #[serde(default)]
    pub response_path: ResponsePath,
    #[serde(default = "default_include_interactions")]
    pub include_interactions: bool,
    pub soil_ph: f64,
    #[serde(default = "default_soil_type")]
    pub soil_type: String,
    /// Organic matter percentage, `0.0..=100.0`.
    pub organic_matter_pct: f64,
    #[serde(default = "default_field_size")]
    pub field_size_acres: f64,
    /// Risk the grower will tolerate before the engine recommends backing
    /// off, `0.0..=1.0`.
    #[serde(default = "default_risk_tolerance")]
    pub risk_tolerance: f64,
    /// Expected sale price in currency per yield unit.
    #[serde(default = "default_crop_price")]
    pub crop_price: f64,
}

fn default_yield_unit() -> String {
    "bu/acre".to_string()
}

fn default_include_interactions() -> bool {
    true
}

fn default_soil_type() -> String {
    "loam".to_string()
}

fn default_field_size() -> f64 {
    1.0
}

fn default_risk_tolerance() -> f64 {
    0.5
}

fn default_crop_price() -> f64 {
    4.50
}

impl OptimizationRequest {
    /// Confidence-weighted soil availability for one nutrient, or `None`
    /// when no test covers it.
    #[must_use]
    pub fn soil_level(&self, nutrient: Nutrient) -> Option<f64> {
        let mut weighted = 0.0;
        let mut weight = 0.0;
        let mut plain = 0.0;
        let mut count = 0usize;
        for test in self.soil_tests.iter().filter(|t| t.nutrient == nutrient) {
            weighted += test.value * test.confidence.max(0.0);
            weight += test.confidence.max(0.0);
            plain += test.value;
            count += 1;
        }
        if count == 0 {
            return None;
        }
        if weight > 0.0 {
            Some(weighted / weight)
        } else {
            Some(plain / count as f64)
        }
    }

    #[must_use]
    pub fn requirement(&self, nutrient: Nutrient) -> Option<&CropRequirement> {
        self.requirements.iter().find(|r| r.nutrient == nutrient)
    }

    #[must_use]
    pub fn limit(&self, nutrient: Nutrient) -> Option<&EnvironmentalLimit> {
        self.limits.iter().find(|l| l.nutrient == nutrient)
    }

    /// Revenue at the target yield, used to normalize economic objectives.
    #[must_use]
    pub fn target_revenue(&self) -> f64 {
        self.target_yield * self.crop_price
    }
}

/// Fluent construction for [`OptimizationRequest`].
///
/// ```
/// use nutriplan_core::model::{Nutrient, Objective, RequestBuilder};
///
/// let request = RequestBuilder::new("north-40", "corn")
///     .target_yield(180.0)
///     .soil_ph(6.5)
///     .organic_matter(3.2)
///     .soil_test(Nutrient::Nitrogen, 25.0)
///     .requirement(Nutrient::Nitrogen, 100.0, (120.0, 180.0), 0.65)
///     .limit(Nutrient::Nitrogen, 200.0)
///     .budget(150.0)
///     .objective(Objective::Balanced)
///     .build();
/// assert_eq!(request.requirements.len(), 1);
/// ```
#[derive(Debug, Clone)]
pub struct RequestBuilder {
    request: OptimizationRequest,
    sample_date: Date,
}

impl RequestBuilder {
    #[must_use]
    pub fn new(field_id: &str, crop: &str) -> Self {
        Self {
            request: OptimizationRequest {
                field_id: field_id.to_string(),
                crop: crop.to_string(),
                target_yield: 0.0,
                yield_unit: default_yield_unit(),
                soil_tests: Vec::new(),
                requirements: Vec::new(),
                limits: Vec::new(),
                budget: None,
                objective: Objective::default(),
                response_path: ResponsePath::default(),
                include_interactions: default_include_interactions(),
                soil_ph: 6.5,
                soil_type: default_soil_type(),
                organic_matter_pct: 2.0,
                field_size_acres: default_field_size(),
                risk_tolerance: default_risk_tolerance(),
                crop_price: default_crop_price(),
            },
            sample_date: jiff::Zoned::now().date(),
        }
    }

    #[must_use]
    pub fn target_yield(mut self, value: f64) -> Self {
        self.request.target_yield = value;
        self
    }

    #[must_use]
    pub fn yield_unit(mut self, unit: &str) -> Self {
        self.request.yield_unit = unit.to_string();
        self
    }

    /// Date stamped onto soil tests added after this call.
    #[must_use]
    pub fn sampled(mut self, date: Date) -> Self {
        self.sample_date = date;
        self
    }

    #[must_use]
    pub fn soil_test(mut self, nutrient: Nutrient, value: f64) -> Self {
        self.request
            .soil_tests
            .push(SoilTestRecord::new(nutrient, value, self.sample_date));
        self
    }

    #[must_use]
    pub fn soil_test_record(mut self, record: SoilTestRecord) -> Self {
        self.request.soil_tests.push(record);
        self
    }

    #[must_use]
    pub fn requirement(
        mut self,
        nutrient: Nutrient,
        minimum: f64,
        optimal: (f64, f64),
        uptake_efficiency: f64,
    ) -> Self {
        self.request.requirements.push(CropRequirement {
            nutrient,
            minimum,
            optimal,
            max_tolerance: optimal.1 * 1.5,
            uptake_efficiency,
            critical_stage: None,
        });
        self
    }

    #[must_use]
    pub fn requirement_record(mut self, requirement: CropRequirement) -> Self {
        self.request.requirements.push(requirement);
        self
    }

    /// Shorthand that fills minimum and efficiency from class defaults.
    #[must_use]
    pub fn simple_requirement(self, nutrient: Nutrient, optimal: (f64, f64)) -> Self {
        let efficiency = match nutrient.class() {
            NutrientClass::Primary => 0.6,
            NutrientClass::Secondary => 0.45,
            NutrientClass::Micro => 0.3,
        };
        self.requirement(nutrient, optimal.0 * 0.8, optimal, efficiency)
    }

    #[must_use]
    pub fn limit(mut self, nutrient: Nutrient, max_rate: f64) -> Self {
        self.request
            .limits
            .push(EnvironmentalLimit::new(nutrient, max_rate));
        self
    }

    #[must_use]
    pub fn limit_record(mut self, limit: EnvironmentalLimit) -> Self {
        self.request.limits.push(limit);
        self
    }

    #[must_use]
    pub fn budget(mut self, budget: f64) -> Self {
        self.request.budget = Some(budget);
        self
    }

    #[must_use]
    pub fn objective(mut self, objective: Objective) -> Self {
        self.request.objective = objective;
        self
    }

    #[must_use]
    pub fn response_path(mut self, path: ResponsePath) -> Self {
        self.request.response_path = path;
        self
    }

    #[must_use]
    pub fn include_interactions(mut self, include: bool) -> Self {
        self.request.include_interactions = include;
        self
    }

    #[must_use]
    pub fn soil_ph(mut self, ph: f64) -> Self {
        self.request.soil_ph = ph;
        self
    }

    #[must_use]
    pub fn soil_type(mut self, soil_type: &str) -> Self {
        self.request.soil_type = soil_type.to_string();
        self
    }

    #[must_use]
    pub fn organic_matter(mut self, pct: f64) -> Self {
        self.request.organic_matter_pct = pct;
        self
    }

    #[must_use]
    pub fn field_size(mut self, acres: f64) -> Self {
        self.request.field_size_acres = acres;
        self
    }

    #[must_use]
    pub fn risk_tolerance(mut self, tolerance: f64) -> Self {
        self.request.risk_tolerance = tolerance;
        self
    }

    #[must_use]
    pub fn crop_price(mut self, price: f64) -> Self {
        self.request.crop_price = price;
        self
    }

    #[must_use]
    pub fn build(self) -> OptimizationRequest {
        self.request
    }
}
