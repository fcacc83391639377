//! Plan execution
//!
//! Runs plans step by step through the dispatcher under a named
//! continuation policy.

pub mod policy;
pub mod executor;

// Re-export commonly used types
pub use policy::ContinuationPolicy;
pub use executor::PlanExecutor;
