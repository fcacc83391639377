//! Type definitions module
//!
//! Core values passed between pipeline stages: plan -> trace -> verdict.

pub mod plan;
pub mod trace;
pub mod verdict;

// Re-export commonly used types
pub use plan::{Parameters, Plan, PlanStep};
pub use trace::{ExecutionTrace, StepResult};
pub use verdict::Verdict;
