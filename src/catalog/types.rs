//! Tool definition types
//!
//! A tool is fulfilled either by a synchronous network call to a fixed
//! endpoint or by submitting a containerized job. The target enum makes
//! "exactly one of endpoint/image" unrepresentable any other way.

use crate::errors::FlowError;
use serde::{Deserialize, Serialize};
use serde_json::Value;

/// How a tool is executed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ExecutionKind {
    RemoteCall,
    JobSubmission,
}

impl ExecutionKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            ExecutionKind::RemoteCall => "remote_call",
            ExecutionKind::JobSubmission => "job_submission",
        }
    }
}

/// Where a tool's work is sent
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ToolTarget {
    /// HTTP(S) endpoint receiving the parameters as a JSON POST body
    Endpoint(String),

    /// Container image run as a job with the parameters in its environment
    Image(String),
}

/// Immutable tool definition
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ToolRecord", into = "ToolRecord")]
pub struct ToolDefinition {
    name: String,
    description: String,
    parameters: Value,
    returns: Value,
    target: ToolTarget,
}

impl ToolDefinition {
    /// Define a tool served by an HTTP endpoint
    pub fn remote(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        endpoint: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            returns: Value::Null,
            target: ToolTarget::Endpoint(endpoint.into()),
        }
    }

    /// Define a tool run as a containerized job
    pub fn job(
        name: impl Into<String>,
        description: impl Into<String>,
        parameters: Value,
        image: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            description: description.into(),
            parameters,
            returns: Value::Null,
            target: ToolTarget::Image(image.into()),
        }
    }

    /// Attach a return-value schema
    pub fn with_returns(mut self, returns: Value) -> Self {
        self.returns = returns;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn description(&self) -> &str {
        &self.description
    }

    /// Parameter schema (name -> type/shape descriptor)
    pub fn parameters(&self) -> &Value {
        &self.parameters
    }

    pub fn returns(&self) -> &Value {
        &self.returns
    }

    pub fn target(&self) -> &ToolTarget {
        &self.target
    }

    pub fn execution_kind(&self) -> ExecutionKind {
        match self.target {
            ToolTarget::Endpoint(_) => ExecutionKind::RemoteCall,
            ToolTarget::Image(_) => ExecutionKind::JobSubmission,
        }
    }

    pub fn endpoint(&self) -> Option<&str> {
        match &self.target {
            ToolTarget::Endpoint(url) => Some(url),
            ToolTarget::Image(_) => None,
        }
    }

    pub fn container_image(&self) -> Option<&str> {
        match &self.target {
            ToolTarget::Image(image) => Some(image),
            ToolTarget::Endpoint(_) => None,
        }
    }

    /// Planner-facing view without execution details
    pub fn summary(&self) -> ToolSummary {
        ToolSummary {
            name: self.name.clone(),
            description: self.description.clone(),
            parameters: self.parameters.clone(),
            returns: self.returns.clone(),
        }
    }
}

/// What a planner sees about a tool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ToolSummary {
    pub name: String,
    pub description: String,
    pub parameters: Value,
    #[serde(default, skip_serializing_if = "Value::is_null")]
    pub returns: Value,
}

/// Persisted catalog record
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ToolRecord {
    pub name: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub parameters: Value,
    #[serde(default)]
    pub returns: Value,
    #[serde(default)]
    pub container_image: Option<String>,
    #[serde(default)]
    pub endpoint: Option<String>,
}

fn non_empty(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.trim().is_empty())
}

impl TryFrom<ToolRecord> for ToolDefinition {
    type Error = FlowError;

    fn try_from(record: ToolRecord) -> Result<Self, Self::Error> {
        if record.name.trim().is_empty() {
            return Err(FlowError::Catalog("tool name cannot be empty".to_string()));
        }

        let target = match (non_empty(record.endpoint), non_empty(record.container_image)) {
            (Some(endpoint), None) => ToolTarget::Endpoint(endpoint),
            (None, Some(image)) => ToolTarget::Image(image),
            (Some(_), Some(_)) => {
                return Err(FlowError::Catalog(format!(
                    "tool {} declares both an endpoint and a container image",
                    record.name
                )))
            }
            (None, None) => {
                return Err(FlowError::Catalog(format!(
                    "tool {} declares neither an endpoint nor a container image",
                    record.name
                )))
            }
        };

        Ok(Self {
            name: record.name,
            description: record.description,
            parameters: record.parameters,
            returns: record.returns,
            target,
        })
    }
}

impl From<ToolDefinition> for ToolRecord {
    fn from(tool: ToolDefinition) -> Self {
        let (endpoint, container_image) = match tool.target {
            ToolTarget::Endpoint(url) => (Some(url), None),
            ToolTarget::Image(image) => (None, Some(image)),
        };
        Self {
            name: tool.name,
            description: tool.description,
            parameters: tool.parameters,
            returns: tool.returns,
            container_image,
            endpoint,
        }
    }
}
