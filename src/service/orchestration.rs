//! Plan orchestration service
//!
//! One request/response cycle: planner -> executor -> analyzer. Planning
//! failure is the only error that reaches the caller; step failures live in
//! the trace and the verdict.

use crate::analysis::ResultAnalyzer;
use crate::catalog::ToolCatalog;
use crate::errors::{FlowError, Result};
use crate::execution::PlanExecutor;
use crate::planning::Planner;
use crate::types::{ExecutionTrace, Plan, Verdict};
use chrono::{DateTime, Utc};
use serde::ser::{Serialize, SerializeStruct, Serializer};
use std::sync::Arc;
use tracing::{error, info};

/// Result of one orchestrated request
#[derive(Debug, Clone)]
pub struct OrchestrationResponse {
    pub plan: Plan,
    pub trace: ExecutionTrace,
    pub verdict: Verdict,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

impl OrchestrationResponse {
    /// The message meant for the end user
    pub fn user_message(&self) -> &str {
        self.verdict.user_message()
    }

    /// Wall-clock time from request to verdict
    pub fn elapsed_ms(&self) -> i64 {
        (self.finished_at - self.started_at).num_milliseconds()
    }
}

/// Wire envelope: `{success, plan, results, analysis, response, started_at, finished_at}`.
/// `success` reports that the request was handled; inspect `analysis.success`
/// and the individual results for partial failure.
impl Serialize for OrchestrationResponse {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        let mut state = serializer.serialize_struct("OrchestrationResponse", 7)?;
        state.serialize_field("success", &true)?;
        state.serialize_field("plan", &self.plan)?;
        state.serialize_field("results", &self.trace)?;
        state.serialize_field("analysis", &self.verdict)?;
        state.serialize_field("response", self.verdict.user_message())?;
        state.serialize_field("started_at", &self.started_at.to_rfc3339())?;
        state.serialize_field("finished_at", &self.finished_at.to_rfc3339())?;
        state.end()
    }
}

/// Composes planner, executor and analyzer
pub struct PlanOrchestrationService {
    catalog: Arc<dyn ToolCatalog>,
    planner: Arc<dyn Planner>,
    executor: PlanExecutor,
    analyzer: ResultAnalyzer,
}

impl PlanOrchestrationService {
    pub fn new(
        catalog: Arc<dyn ToolCatalog>,
        planner: Arc<dyn Planner>,
        executor: PlanExecutor,
        analyzer: ResultAnalyzer,
    ) -> Self {
        Self {
            catalog,
            planner,
            executor,
            analyzer,
        }
    }

    pub fn executor(&self) -> &PlanExecutor {
        &self.executor
    }

    /// Plan, execute and analyze `request`
    pub async fn handle(&self, request: &str) -> Result<OrchestrationResponse> {
        let request = request.trim();
        if request.is_empty() {
            return Err(FlowError::Planning("Missing user request".to_string()));
        }

        let started_at = Utc::now();
        let tools = self.catalog.summaries();

        let plan = self
            .planner
            .create_plan(request, &tools)
            .await
            .map_err(|e| {
                error!(error = %e, "error creating plan");
                match e {
                    FlowError::Planning(_) => e,
                    other => FlowError::Planning(other.to_string()),
                }
            })?;
        info!(steps = plan.len(), "created plan");

        let trace = self.executor.run(&plan).await;
        info!(results = trace.len(), failed = trace.failure_count(), "executed plan");

        let verdict = self.analyzer.analyze(request, &plan, &trace).await;
        info!(success = verdict.success(), "analysis completed");

        Ok(OrchestrationResponse {
            plan,
            trace,
            verdict,
            started_at,
            finished_at: Utc::now(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::{ToolDefinition, ToolRegistry, ToolSummary};
    use crate::dispatch::{JobBackend, JobSpec, RemoteBackend, StepDispatcher};
    use crate::reasoning::Reasoner;
    use crate::types::{Parameters, PlanStep};
    use async_trait::async_trait;
    use serde_json::{json, Value};

    struct FixedPlanner(Option<Plan>);

    #[async_trait]
    impl Planner for FixedPlanner {
        async fn create_plan(&self, _request: &str, _tools: &[ToolSummary]) -> Result<Plan> {
            self.0
                .clone()
                .ok_or_else(|| FlowError::Planning("no valid plan".to_string()))
        }
    }

    struct StaticRemote;

    #[async_trait]
    impl RemoteBackend for StaticRemote {
        async fn call(&self, _endpoint: &str, _parameters: &Parameters) -> Result<Value> {
            Ok(json!({"hits": 3}))
        }
    }

    struct NoJobs;

    #[async_trait]
    impl JobBackend for NoJobs {
        async fn submit(&self, _job: &JobSpec) -> Result<String> {
            Err(FlowError::JobSubmission("unavailable".to_string()))
        }
    }

    struct Echo(&'static str);

    #[async_trait]
    impl Reasoner for Echo {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            Ok(self.0.to_string())
        }
    }

    fn service(plan: Option<Plan>) -> PlanOrchestrationService {
        let catalog: Arc<dyn ToolCatalog> = Arc::new(ToolRegistry::from_tools(vec![
            ToolDefinition::remote("search", "Search", json!({}), "http://search"),
        ]));
        let dispatcher = StepDispatcher::new(catalog.clone(), Arc::new(StaticRemote), Arc::new(NoJobs));
        let analyzer = ResultAnalyzer::new(Arc::new(Echo(
            r#"{"success": true, "issues": [], "improvements": [], "user_response": "3 hits"}"#,
        )));
        PlanOrchestrationService::new(
            catalog,
            Arc::new(FixedPlanner(plan)),
            PlanExecutor::new(dispatcher),
            analyzer,
        )
    }

    #[tokio::test]
    async fn test_handle_happy_path() {
        let plan = Plan::new(vec![PlanStep::from_json("search", json!({"q": "x"}))]);
        let response = service(Some(plan)).handle("find x").await.unwrap();

        assert_eq!(response.trace.len(), 1);
        assert!(response.trace.get(0).unwrap().is_ok());
        assert!(response.verdict.success());
        assert_eq!(response.user_message(), "3 hits");
        assert!(response.elapsed_ms() >= 0);
    }

    #[tokio::test]
    async fn test_planning_failure_propagates() {
        let err = service(None).handle("find x").await.unwrap_err();
        assert!(matches!(err, FlowError::Planning(_)));
    }

    #[tokio::test]
    async fn test_blank_request_rejected() {
        let err = service(Some(Plan::empty())).handle("   ").await.unwrap_err();
        assert!(err.to_string().contains("Missing user request"));
    }

    #[tokio::test]
    async fn test_envelope_shape() {
        let plan = Plan::new(vec![PlanStep::from_json("search", json!({"q": "x"}))]);
        let response = service(Some(plan)).handle("find x").await.unwrap();
        let value = serde_json::to_value(&response).unwrap();

        assert_eq!(value["success"], json!(true));
        assert_eq!(value["plan"][0]["tool_name"], json!("search"));
        assert_eq!(value["results"][0]["output"], json!({"hits": 3}));
        assert_eq!(value["analysis"]["user_response"], json!("3 hits"));
        assert_eq!(value["response"], json!("3 hits"));
        assert!(value["started_at"].is_string());
    }
}
