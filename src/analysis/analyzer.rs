//! Result analyzer
//!
//! Summarizes (request, plan, trace) into a `Verdict` via the reasoning
//! service. Whatever goes wrong on the way (transport failure, prose instead
//! of JSON, missing or mistyped fields) ends in the fallback verdict, so
//! analysis always terminates with a well-formed value.

use crate::errors::FlowError;
use crate::reasoning::{parse_embedded, JsonShape, Reasoner};
use crate::telemetry::{TelemetryCollector, TelemetryEvent};
use crate::types::{ExecutionTrace, Plan, Verdict};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Instant;
use tracing::{error, info};

/// Produces verdicts over executed plans
pub struct ResultAnalyzer {
    reasoner: Arc<dyn Reasoner>,
    telemetry: Option<TelemetryCollector>,
}

impl ResultAnalyzer {
    pub fn new(reasoner: Arc<dyn Reasoner>) -> Self {
        Self {
            reasoner,
            telemetry: None,
        }
    }

    /// Report fallbacks to a telemetry collector
    pub fn with_telemetry(mut self, telemetry: TelemetryCollector) -> Self {
        self.telemetry = Some(telemetry);
        self
    }

    /// Analyze an execution. Never fails.
    pub async fn analyze(&self, request: &str, plan: &Plan, trace: &ExecutionTrace) -> Verdict {
        let prompt = Self::build_prompt(request, plan, trace);

        let verdict = match self.reasoner.complete(&prompt).await {
            Ok(text) => parse_embedded::<Verdict>(&text, JsonShape::Object)
                .map_err(|e| FlowError::AnalysisParse(e.to_string())),
            Err(e) => Err(e),
        };

        match verdict {
            Ok(verdict) => {
                info!(success = verdict.success(), issues = verdict.issues().len(), "analysis completed");
                verdict
            }
            Err(e) => {
                error!(error = %e, "error analyzing results");
                if let Some(telemetry) = &self.telemetry {
                    telemetry.record(TelemetryEvent::AnalysisFallback {
                        reason: e.to_string(),
                        timestamp: Instant::now(),
                    });
                }
                Verdict::fallback(e)
            }
        }
    }

    /// Build the analysis prompt
    pub fn build_prompt(request: &str, plan: &Plan, trace: &ExecutionTrace) -> String {
        let plan_str = serde_json::to_string_pretty(plan).unwrap_or_else(|_| "[]".to_string());
        let results_str =
            serde_json::to_string_pretty(&trace_report(trace)).unwrap_or_else(|_| "[]".to_string());

        format!(
            r#"User Request: {request}

Plan:
{plan_str}

Execution Results:
{results_str}

Analyze the results and provide feedback on the following:
1. Was the plan successful in fulfilling the user request?
2. Were there any errors or issues during execution?
3. How could the plan be improved?
4. Formulate a response to the user based on the results.

Return your analysis as a JSON object with the following structure:
{{
    "success": true/false,
    "issues": ["issue1", "issue2", ...],
    "improvements": ["improvement1", "improvement2", ...],
    "user_response": "Message to the user"
}}

Return only the JSON object, no additional text."#
        )
    }
}

/// Trace entries annotated with their 1-based step number
pub fn trace_report(trace: &ExecutionTrace) -> Value {
    Value::Array(
        trace
            .iter()
            .enumerate()
            .map(|(i, result)| {
                let mut entry = serde_json::to_value(result).unwrap_or(Value::Null);
                if let Value::Object(map) = &mut entry {
                    map.insert("step".to_string(), json!(i + 1));
                }
                entry
            })
            .collect(),
    )
}
