//! Plan and plan step types
//!
//! A plan is the ordered list of tool invocations produced by a planner.
//! Execution order is list order. The serialized form is a bare JSON array
//! of `{"tool_name": ..., "parameters": {...}}` objects.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

/// Parameter mapping handed to a tool (name -> value)
pub type Parameters = Map<String, Value>;

/// One tool invocation within a plan
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanStep {
    /// Tool to invoke; resolved against the catalog at dispatch time
    pub tool_name: String,

    /// Parameters passed to the tool
    #[serde(default)]
    pub parameters: Parameters,
}

impl PlanStep {
    /// Create a new plan step
    pub fn new(tool_name: impl Into<String>, parameters: Parameters) -> Self {
        Self {
            tool_name: tool_name.into(),
            parameters,
        }
    }

    /// Create a step from a JSON object literal; non-object values yield no parameters
    pub fn from_json(tool_name: impl Into<String>, parameters: Value) -> Self {
        let parameters = match parameters {
            Value::Object(map) => map,
            _ => Map::new(),
        };
        Self::new(tool_name, parameters)
    }
}

/// Ordered sequence of plan steps. Immutable once built.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Plan {
    steps: Vec<PlanStep>,
}

impl Plan {
    /// Create a plan from ordered steps
    pub fn new(steps: Vec<PlanStep>) -> Self {
        Self { steps }
    }

    /// The zero-step plan
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn steps(&self) -> &[PlanStep] {
        &self.steps
    }

    pub fn len(&self) -> usize {
        self.steps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.steps.is_empty()
    }

    pub fn iter(&self) -> std::slice::Iter<'_, PlanStep> {
        self.steps.iter()
    }

    /// Distinct tool names in first-use order
    pub fn tool_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = Vec::new();
        for step in &self.steps {
            if !names.contains(&step.tool_name.as_str()) {
                names.push(step.tool_name.as_str());
            }
        }
        names
    }
}

impl From<Vec<PlanStep>> for Plan {
    fn from(steps: Vec<PlanStep>) -> Self {
        Self::new(steps)
    }
}

impl<'a> IntoIterator for &'a Plan {
    type Item = &'a PlanStep;
    type IntoIter = std::slice::Iter<'a, PlanStep>;

    fn into_iter(self) -> Self::IntoIter {
        self.steps.iter()
    }
}
