use std::fmt;

use crate::model::Nutrient;

/// Request preconditions that must hold before any solver runs.
#[derive(Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// At least one soil test is required.
    EmptySoilTests,
    /// At least one crop requirement is required.
    EmptyRequirements,
    NonPositiveFieldSize {
        acres: f64,
    },
    NonPositiveTargetYield {
        value: f64,
    },
    NegativeSoilTest {
        nutrient: Nutrient,
        value: f64,
    },
    PhOutOfRange {
        ph: f64,
    },
    OrganicMatterOutOfRange {
        pct: f64,
    },
    NonPositiveBudget {
        budget: f64,
    },
    RiskToleranceOutOfRange {
        value: f64,
    },
    UptakeEfficiencyOutOfRange {
        nutrient: Nutrient,
        value: f64,
    },
    InvertedOptimalRange {
        nutrient: Nutrient,
        low: f64,
        high: f64,
    },
    NonPositiveCropPrice {
        price: f64,
    },
}

impl fmt::Display for ValidationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ValidationError::EmptySoilTests => {
                write!(f, "request has no soil tests; at least one is required")
            }
            ValidationError::EmptyRequirements => {
                write!(f, "request has no crop requirements; at least one is required")
            }
            ValidationError::NonPositiveFieldSize { acres } => {
                write!(f, "field size must be positive, got {acres} acres")
            }
            ValidationError::NonPositiveTargetYield { value } => {
                write!(f, "target yield must be positive, got {value}")
            }
            ValidationError::NegativeSoilTest { nutrient, value } => {
                write!(f, "soil test for {nutrient} is negative ({value})")
            }
            ValidationError::PhOutOfRange { ph } => {
                write!(f, "soil pH {ph} is outside the plausible range 0..=14")
            }
            ValidationError::OrganicMatterOutOfRange { pct } => {
                write!(f, "organic matter {pct}% is outside 0..=20")
            }
            ValidationError::NonPositiveBudget { budget } => {
                write!(f, "budget must be positive when set, got {budget}")
            }
            ValidationError::RiskToleranceOutOfRange { value } => {
                write!(f, "risk tolerance {value} is outside 0..=1")
            }
            ValidationError::UptakeEfficiencyOutOfRange { nutrient, value } => {
                write!(
                    f,
                    "uptake efficiency for {nutrient} must be in (0, 1], got {value}"
                )
            }
            ValidationError::InvertedOptimalRange { nutrient, low, high } => {
                write!(
                    f,
                    "optimal range for {nutrient} is inverted ({low} > {high})"
                )
            }
            ValidationError::NonPositiveCropPrice { price } => {
                write!(f, "crop price must be positive, got {price}")
            }
        }
    }
}

impl std::error::Error for ValidationError {}

/// Why a solver stage gave up. Drives the fallback chain; never reaches the
/// caller because the heuristic stage is total.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StageFailure {
    /// The objective or its gradient stopped being finite.
    NonFinite { stage: &'static str },
    /// Line search could not find any descent direction.
    Stalled { stage: &'static str, iterations: usize },
    /// The stage ran out of iterations without meeting tolerance.
    IterationCap { stage: &'static str, iterations: usize },
    /// The stage was configured with nothing to do.
    Degenerate {
        stage: &'static str,
        reason: &'static str,
    },
}

impl StageFailure {
    #[must_use]
    pub fn stage(&self) -> &'static str {
        match self {
            StageFailure::NonFinite { stage }
            | StageFailure::Stalled { stage, .. }
            | StageFailure::IterationCap { stage, .. }
            | StageFailure::Degenerate { stage, .. } => stage,
        }
    }
}

impl fmt::Display for StageFailure {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StageFailure::NonFinite { stage } => {
                write!(f, "{stage} solver produced a non-finite objective")
            }
            StageFailure::Stalled { stage, iterations } => {
                write!(
                    f,
                    "{stage} solver stalled after {iterations} iterations with no descent step"
                )
            }
            StageFailure::IterationCap { stage, iterations } => {
                write!(
                    f,
                    "{stage} solver hit its iteration cap ({iterations}) before converging"
                )
            }
            StageFailure::Degenerate { stage, reason } => {
                write!(f, "{stage} solver cannot run: {reason}")
            }
        }
    }
}

impl std::error::Error for StageFailure {}
