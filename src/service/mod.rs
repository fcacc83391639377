//! Request orchestration
//!
//! Wires planner, executor and analyzer into one request/response cycle.

pub mod orchestration;
pub mod builder;

// Re-export commonly used types
pub use orchestration::{OrchestrationResponse, PlanOrchestrationService};
pub use builder::{build_dispatcher, build_reasoner, build_service};
