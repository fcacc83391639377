//! Error types for toolflow
//!
//! One error enum for the whole pipeline. Step-level failures (unknown tool,
//! backend faults) are absorbed into `StepResult::Failed` by the dispatcher;
//! only planning failures escape to the caller.

use thiserror::Error;

/// Main error type for the plan execution pipeline
#[derive(Error, Debug)]
pub enum FlowError {
    /// A plan step referenced a tool the catalog does not know.
    /// The name stays out of the message; it travels in the step result.
    #[error("tool not found")]
    ToolNotFound(String),

    /// Remote call backend errors (non-2xx, undecodable body)
    #[error("Backend error: {0}")]
    Backend(String),

    /// Job submission backend errors
    #[error("Job submission failed: {0}")]
    JobSubmission(String),

    /// Timeout errors
    #[error("Operation timed out after {duration_ms}ms")]
    Timeout { duration_ms: u64 },

    /// The planner could not produce a valid plan
    #[error("Planning failed: {0}")]
    Planning(String),

    /// The reasoning collaborator returned something that is not a verdict
    #[error("Analysis parse error: {0}")]
    AnalysisParse(String),

    /// Reasoning service transport/API errors
    #[error("Reasoning service error: {0}")]
    Reasoning(String),

    /// Tool catalog load/store errors
    #[error("Catalog error: {0}")]
    Catalog(String),

    /// HTTP client errors
    #[error("HTTP request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// Serialization errors
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// I/O errors
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Generic errors with context
    #[error("{0}")]
    Generic(String),
}

/// Result type alias for pipeline operations
pub type Result<T> = std::result::Result<T, FlowError>;

/// Convert anyhow errors to FlowError
impl From<anyhow::Error> for FlowError {
    fn from(err: anyhow::Error) -> Self {
        FlowError::Generic(err.to_string())
    }
}

impl FlowError {
    /// Whether this error ends the whole request rather than a single step
    pub fn is_fatal(&self) -> bool {
        matches!(self, FlowError::Planning(_) | FlowError::Config(_))
    }

    /// Process exit code for an error that ends a CLI run
    pub fn exit_code(&self) -> i32 {
        if self.is_fatal() {
            1
        } else {
            2
        }
    }
}
