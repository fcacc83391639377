//! Analysis verdict
//!
//! Produced once per execution by the result analyzer and never mutated.
//! Wire form: `{"success", "issues", "improvements", "user_response"}`.

use serde::{Deserialize, Serialize};

/// Message shown to the user when the analysis itself could not be parsed
pub const FALLBACK_USER_MESSAGE: &str =
    "I encountered an issue while analyzing the results. Please try again.";

/// Improvement suggested when the analysis itself could not be parsed
pub const FALLBACK_IMPROVEMENT: &str = "Improve error handling";

/// Structured judgment over one plan execution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Verdict {
    success: bool,
    issues: Vec<String>,
    improvements: Vec<String>,
    #[serde(rename = "user_response")]
    user_message: String,
}

impl Verdict {
    pub fn new(
        success: bool,
        issues: Vec<String>,
        improvements: Vec<String>,
        user_message: impl Into<String>,
    ) -> Self {
        Self {
            success,
            issues,
            improvements,
            user_message: user_message.into(),
        }
    }

    /// Default failure verdict used when the reasoning output is unusable
    pub fn fallback(reason: impl std::fmt::Display) -> Self {
        Self {
            success: false,
            issues: vec![format!("Error analyzing results: {}", reason)],
            improvements: vec![FALLBACK_IMPROVEMENT.to_string()],
            user_message: FALLBACK_USER_MESSAGE.to_string(),
        }
    }

    pub fn success(&self) -> bool {
        self.success
    }

    pub fn issues(&self) -> &[String] {
        &self.issues
    }

    pub fn improvements(&self) -> &[String] {
        &self.improvements
    }

    pub fn user_message(&self) -> &str {
        &self.user_message
    }
}
