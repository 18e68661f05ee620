//! Domain types shared across the engine.
//!
//! The model is split by concern:
//! - [`nutrient`]: nutrient identity and classification
//! - [`records`]: soil tests, crop requirements, environmental limits
//! - [`interaction`]: pairwise nutrient interactions and their gating
//! - [`request`]: the optimization request and its builder
//! - [`results`]: everything the engine reports back

mod interaction;
mod nutrient;
mod records;
mod request;
mod results;

pub use interaction::{ActivationCondition, InteractionKind, NutrientInteraction};
pub use nutrient::{Nutrient, NutrientClass};
pub use records::{CropRequirement, EnvironmentalLimit, SoilTestRecord};
pub use request::{Objective, OptimizationRequest, RequestBuilder, ResponsePath};
pub use results::{
    ActiveInteraction, AlternativeStrategy, Convergence, EconomicSummary, OptimizationResult,
    RiskAssessment, SolverMethod, SolverReport,
};
