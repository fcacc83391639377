//! Step results and the execution trace
//!
//! Every dispatched step yields exactly one `StepResult`. The trace keeps
//! them in plan order: position i of the trace is the outcome of step i.

use crate::types::plan::{Parameters, PlanStep};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::time::Duration;

/// Outcome of a single plan step
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "status", rename_all = "snake_case")]
pub enum StepResult {
    /// The backend accepted the call and returned a decodable result
    Ok {
        tool_name: String,
        parameters: Parameters,
        output: Value,
        duration_ms: u64,
    },

    /// The step could not be completed
    Failed {
        tool_name: String,
        parameters: Parameters,
        error: String,
        duration_ms: u64,
    },
}

impl StepResult {
    /// Create successful result
    pub fn success(step: &PlanStep, output: Value, duration: Duration) -> Self {
        StepResult::Ok {
            tool_name: step.tool_name.clone(),
            parameters: step.parameters.clone(),
            output,
            duration_ms: duration.as_millis() as u64,
        }
    }

    /// Create failed result
    pub fn failure(step: &PlanStep, error: impl Into<String>, duration: Duration) -> Self {
        StepResult::Failed {
            tool_name: step.tool_name.clone(),
            parameters: step.parameters.clone(),
            error: error.into(),
            duration_ms: duration.as_millis() as u64,
        }
    }

    pub fn tool_name(&self) -> &str {
        match self {
            StepResult::Ok { tool_name, .. } | StepResult::Failed { tool_name, .. } => tool_name,
        }
    }

    pub fn parameters(&self) -> &Parameters {
        match self {
            StepResult::Ok { parameters, .. } | StepResult::Failed { parameters, .. } => {
                parameters
            }
        }
    }

    pub fn duration_ms(&self) -> u64 {
        match self {
            StepResult::Ok { duration_ms, .. } | StepResult::Failed { duration_ms, .. } => {
                *duration_ms
            }
        }
    }

    pub fn is_ok(&self) -> bool {
        matches!(self, StepResult::Ok { .. })
    }

    pub fn is_failed(&self) -> bool {
        !self.is_ok()
    }

    /// Decoded backend output, if the step succeeded
    pub fn output(&self) -> Option<&Value> {
        match self {
            StepResult::Ok { output, .. } => Some(output),
            StepResult::Failed { .. } => None,
        }
    }

    /// Error message, if the step failed
    pub fn error_message(&self) -> Option<&str> {
        match self {
            StepResult::Ok { .. } => None,
            StepResult::Failed { error, .. } => Some(error),
        }
    }
}

/// Ordered step outcomes for one plan run
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ExecutionTrace {
    results: Vec<StepResult>,
}

impl ExecutionTrace {
    /// Freeze collected results into a trace
    pub fn new(results: Vec<StepResult>) -> Self {
        Self { results }
    }

    pub fn results(&self) -> &[StepResult] {
        &self.results
    }

    pub fn len(&self) -> usize {
        self.results.len()
    }

    pub fn is_empty(&self) -> bool {
        self.results.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&StepResult> {
        self.results.get(index)
    }

    pub fn iter(&self) -> std::slice::Iter<'_, StepResult> {
        self.results.iter()
    }

    pub fn success_count(&self) -> usize {
        self.results.iter().filter(|r| r.is_ok()).count()
    }

    pub fn failure_count(&self) -> usize {
        self.results.len() - self.success_count()
    }

    /// True when no step failed (vacuously true for an empty trace)
    pub fn all_succeeded(&self) -> bool {
        self.results.iter().all(StepResult::is_ok)
    }

    /// Failed steps with their 1-based step number
    pub fn failures(&self) -> impl Iterator<Item = (usize, &StepResult)> {
        self.results
            .iter()
            .enumerate()
            .filter(|(_, r)| r.is_failed())
            .map(|(i, r)| (i + 1, r))
    }

    /// Sum of step durations in milliseconds
    pub fn total_duration_ms(&self) -> u64 {
        self.results.iter().map(StepResult::duration_ms).sum()
    }
}

impl From<Vec<StepResult>> for ExecutionTrace {
    fn from(results: Vec<StepResult>) -> Self {
        Self::new(results)
    }
}

impl<'a> IntoIterator for &'a ExecutionTrace {
    type Item = &'a StepResult;
    type IntoIter = std::slice::Iter<'a, StepResult>;

    fn into_iter(self) -> Self::IntoIter {
        self.results.iter()
    }
}
