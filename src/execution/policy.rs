//! Continuation policies
//!
//! Decide, after each step, whether the remaining steps are dispatched.
//! Steps that are not dispatched are still recorded so the trace always
//! lines up with the plan.

use crate::errors::FlowError;
use crate::types::StepResult;
use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// What to do after a step completes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ContinuationPolicy {
    /// A failed step never stops the plan
    #[default]
    ContinueOnError,

    /// Stop dispatching after the first failed step
    AbortOnFirstFailure,
}

impl ContinuationPolicy {
    /// Whether execution proceeds past `result`
    pub fn should_continue(&self, result: &StepResult) -> bool {
        match self {
            ContinuationPolicy::ContinueOnError => true,
            ContinuationPolicy::AbortOnFirstFailure => result.is_ok(),
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ContinuationPolicy::ContinueOnError => "continue_on_error",
            ContinuationPolicy::AbortOnFirstFailure => "abort_on_first_failure",
        }
    }
}

impl FromStr for ContinuationPolicy {
    type Err = FlowError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "continue_on_error" => Ok(ContinuationPolicy::ContinueOnError),
            "abort_on_first_failure" => Ok(ContinuationPolicy::AbortOnFirstFailure),
            other => Err(FlowError::Config(format!(
                "Invalid continuation policy: {}",
                other
            ))),
        }
    }
}

/// Error message recorded for steps skipped after a halt at `step` (1-based)
pub fn skipped_message(step: usize) -> String {
    format!("skipped: plan halted after step {}", step)
}
