//! Planner collaborator
//!
//! Turns a user request plus a catalog snapshot into a validated plan.
//! A plan naming any tool outside the snapshot is rejected as a whole;
//! steps are never silently dropped.

use crate::catalog::ToolSummary;
use crate::errors::{FlowError, Result};
use crate::reasoning::{parse_embedded, JsonShape, Reasoner};
use crate::types::Plan;
use async_trait::async_trait;
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{error, info};

/// Produces plans from free-text requests
#[async_trait]
pub trait Planner: Send + Sync {
    /// Create a plan that only uses tools from `tools`
    async fn create_plan(&self, request: &str, tools: &[ToolSummary]) -> Result<Plan>;
}

/// Reject a plan if any step names a tool outside `tools`
pub fn validate_plan(plan: &Plan, tools: &[ToolSummary]) -> Result<()> {
    let available: HashSet<&str> = tools.iter().map(|t| t.name.as_str()).collect();

    for (i, step) in plan.iter().enumerate() {
        if !available.contains(step.tool_name.as_str()) {
            return Err(FlowError::Planning(format!(
                "Tool {} is not available (step {})",
                step.tool_name,
                i + 1
            )));
        }
    }
    Ok(())
}

/// Planner backed by a reasoning service
pub struct LlmPlanner {
    reasoner: Arc<dyn Reasoner>,
}

impl LlmPlanner {
    pub fn new(reasoner: Arc<dyn Reasoner>) -> Self {
        Self { reasoner }
    }

    /// Build the planning prompt
    pub fn build_prompt(request: &str, tools: &[ToolSummary]) -> String {
        let tools_description = tools
            .iter()
            .map(|tool| {
                format!(
                    "Tool: {}\nDescription: {}\nParameters: {}\n",
                    tool.name, tool.description, tool.parameters
                )
            })
            .collect::<Vec<_>>()
            .join("\n");

        format!(
            r#"User Request: {request}

Available Tools:
{tools_description}
Create a plan to fulfill the user request using the available tools.
The plan should be a JSON array of actions, where each action is an object with 'tool_name' and 'parameters'.
Only use tools that are listed above.

Example Plan:
[
    {{
        "tool_name": "example_tool",
        "parameters": {{
            "param1": "value1",
            "param2": "value2"
        }}
    }}
]

Return only the JSON array, no additional text."#
        )
    }
}

#[async_trait]
impl Planner for LlmPlanner {
    async fn create_plan(&self, request: &str, tools: &[ToolSummary]) -> Result<Plan> {
        let prompt = Self::build_prompt(request, tools);

        let text = self.reasoner.complete(&prompt).await.map_err(|e| {
            error!(error = %e, "planning request failed");
            FlowError::Planning(e.to_string())
        })?;

        let plan: Plan = parse_embedded(&text, JsonShape::Array).map_err(|e| {
            error!(error = %e, "planner returned an unparseable plan");
            FlowError::Planning(format!("Failed to parse plan: {}", e))
        })?;

        validate_plan(&plan, tools)?;
        info!(steps = plan.len(), "created plan");
        Ok(plan)
    }
}
