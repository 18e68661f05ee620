//! Multi-nutrient fertilizer optimization library
//!
//! This crate turns a field's soil tests and crop requirements into
//! application rates. It supports:
//! - Twelve nutrients across primary, secondary, and micro classes
//! - Diminishing-returns yield response with pairwise interactions gated
//!   on pH and soil type
//! - A solver fallback chain: projected-gradient descent, differential
//!   evolution, then a closed-form deficit heuristic
//! - A tree-ensemble surrogate path for the yield response
//! - Budget correction, risk scoring, agronomic guidance, and bracketing
//!   alternative programs
//!
//! # Builder DSL
//!
//! Use the fluent builder API for ergonomic request setup:
//!
//! ```
//! use nutriplan_core::model::{Nutrient, Objective, RequestBuilder};
//!
//! let request = RequestBuilder::new("north-40", "corn")
//!     .target_yield(180.0)
//!     .soil_ph(6.5)
//!     .organic_matter(3.2)
//!     .soil_test(Nutrient::Nitrogen, 25.0)
//!     .soil_test(Nutrient::Phosphorus, 15.0)
//!     .soil_test(Nutrient::Potassium, 120.0)
//!     .requirement(Nutrient::Nitrogen, 100.0, (120.0, 180.0), 0.65)
//!     .requirement(Nutrient::Phosphorus, 30.0, (40.0, 80.0), 0.25)
//!     .requirement(Nutrient::Potassium, 80.0, (100.0, 150.0), 0.60)
//!     .limit(Nutrient::Nitrogen, 200.0)
//!     .budget(150.0)
//!     .objective(Objective::Balanced)
//!     .build();
//!
//! let result = nutriplan_core::optimize(&request).unwrap();
//! assert!(result.rate(Nutrient::Nitrogen) > 0.0);
//! ```

#![warn(clippy::all)]

// ============================================================================
// Core modules
// ============================================================================

pub mod analysis;
pub mod catalog;
pub mod engine;
pub mod error;
pub mod formulate;
pub mod optimizer;
pub mod recommend;
pub mod response;
pub mod surrogate;

// ============================================================================
// Type definition modules
// ============================================================================

pub mod model;

// ============================================================================
// Test modules
// ============================================================================

#[cfg(test)]
mod tests;

// ============================================================================
// Public re-exports for convenience
// ============================================================================

pub use engine::{Engine, EngineConfig, optimize};
pub use model::{OptimizationRequest, OptimizationResult, RequestBuilder};
