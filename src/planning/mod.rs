//! Planning
//!
//! Planner collaborator interface and the reasoning-backed planner.

pub mod planner;

// Re-export commonly used types
pub use planner::{validate_plan, LlmPlanner, Planner};
