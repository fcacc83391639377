//! toolflow - plan execution pipeline
//!
//! Turns a natural-language request into a sequence of tool invocations,
//! executes them against a catalog of heterogeneous tools and summarizes the
//! outcome.
//!
//! # Architecture
//!
//! request -> `Planner` -> `Plan` -> `PlanExecutor` -> `ExecutionTrace`
//! -> `ResultAnalyzer` -> `Verdict`
//!
//! - **catalog**: tool definitions (remote endpoint or container image)
//! - **dispatch**: one step against the remote-call or job-submission backend
//! - **execution**: ordered plan runs with a named continuation policy
//! - **planning / analysis**: reasoning-service collaborators
//! - **service**: the composed request/response cycle

pub mod errors;
pub mod types;
pub mod catalog;
pub mod dispatch;
pub mod execution;
pub mod reasoning;
pub mod planning;
pub mod analysis;
pub mod service;
pub mod telemetry;
pub mod cli;

// Re-export commonly used types
pub use errors::{FlowError, Result};
pub use types::{ExecutionTrace, Plan, PlanStep, StepResult, Verdict};
pub use service::{OrchestrationResponse, PlanOrchestrationService};
