//! Integration tests for the plan execution pipeline
//!
//! Runs the full request cycle against in-process fakes; no reasoning
//! service, tool endpoint or cluster is required.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::collections::{HashSet, VecDeque};
use std::sync::{Arc, Mutex};
use toolflow::{
    analysis::ResultAnalyzer,
    catalog::{ToolCatalog, ToolDefinition, ToolRegistry, ToolSummary},
    dispatch::{JobBackend, JobSpec, RemoteBackend, StepDispatcher, JOB_SUBMITTED, TOOL_NOT_FOUND},
    execution::{ContinuationPolicy, PlanExecutor},
    planning::{LlmPlanner, Planner},
    reasoning::Reasoner,
    telemetry::TelemetryCollector,
    types::{Parameters, Plan, PlanStep},
    FlowError, PlanOrchestrationService, Result,
};

/// Reasoner that replays canned replies in order
struct ScriptedReasoner {
    replies: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedReasoner {
    fn new(replies: &[&str]) -> Self {
        Self {
            replies: Mutex::new(replies.iter().map(|r| r.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Reasoner for ScriptedReasoner {
    async fn complete(&self, prompt: &str) -> Result<String> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.replies
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| FlowError::Reasoning("script exhausted".to_string()))
    }
}

/// Planner that hands back a fixed plan without consulting the catalog
struct FixedPlanner(Plan);

#[async_trait]
impl Planner for FixedPlanner {
    async fn create_plan(&self, _request: &str, _tools: &[ToolSummary]) -> Result<Plan> {
        Ok(self.0.clone())
    }
}

/// Remote backend keyed by endpoint; unknown endpoints answer HTTP 500
struct EndpointTable {
    responses: Vec<(String, Value)>,
    calls: Mutex<Vec<String>>,
}

impl EndpointTable {
    fn new(responses: &[(&str, Value)]) -> Self {
        Self {
            responses: responses
                .iter()
                .map(|(e, v)| (e.to_string(), v.clone()))
                .collect(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

#[async_trait]
impl RemoteBackend for EndpointTable {
    async fn call(&self, endpoint: &str, _parameters: &Parameters) -> Result<Value> {
        self.calls.lock().unwrap().push(endpoint.to_string());
        self.responses
            .iter()
            .find(|(e, _)| e == endpoint)
            .map(|(_, v)| v.clone())
            .ok_or_else(|| FlowError::Backend("HTTP 500 Internal Server Error: boom".to_string()))
    }
}

/// Job backend that accepts every submission under the generated job name
#[derive(Default)]
struct AcceptingJobs {
    submitted: Mutex<Vec<JobSpec>>,
}

#[async_trait]
impl JobBackend for AcceptingJobs {
    async fn submit(&self, job: &JobSpec) -> Result<String> {
        self.submitted.lock().unwrap().push(job.clone());
        Ok(job.name.clone())
    }
}

fn search_catalog() -> Arc<dyn ToolCatalog> {
    Arc::new(ToolRegistry::from_tools(vec![
        ToolDefinition::remote(
            "search",
            "Search the index",
            json!({"q": "string"}),
            "http://tools.local/search",
        ),
        ToolDefinition::remote("fetch", "Fetch a document", json!({}), "http://tools.local/fetch"),
        ToolDefinition::remote("broken", "Always fails", json!({}), "http://tools.local/broken"),
        ToolDefinition::job("render", "Render a report", json!({}), "registry.local/render:1.0"),
    ]))
}

fn dispatcher(catalog: Arc<dyn ToolCatalog>, remote: Arc<EndpointTable>) -> StepDispatcher {
    StepDispatcher::new(catalog, remote, Arc::new(AcceptingJobs::default()))
}

fn service_with(
    plan: Plan,
    remote: Arc<EndpointTable>,
    reasoner: Arc<ScriptedReasoner>,
) -> PlanOrchestrationService {
    let catalog = search_catalog();
    let executor = PlanExecutor::new(dispatcher(catalog.clone(), remote));
    let analyzer = ResultAnalyzer::new(reasoner);
    PlanOrchestrationService::new(catalog, Arc::new(FixedPlanner(plan)), executor, analyzer)
}

fn default_remote() -> Arc<EndpointTable> {
    Arc::new(EndpointTable::new(&[
        ("http://tools.local/search", json!({"hits": 3})),
        ("http://tools.local/fetch", json!({"body": "ok"})),
    ]))
}

#[tokio::test]
async fn test_known_and_unknown_tool_in_one_request() {
    let plan = Plan::new(vec![
        PlanStep::from_json("search", json!({"q": "x"})),
        PlanStep::from_json("ghost_tool", json!({})),
    ]);
    let reasoner = Arc::new(ScriptedReasoner::new(&[
        r#"{"success": false, "issues": ["ghost_tool is not available"], "improvements": ["register ghost_tool"], "user_response": "I searched but could not run ghost_tool."}"#,
    ]));
    let service = service_with(plan, default_remote(), reasoner.clone());

    let response = service.handle("find x").await.unwrap();

    assert_eq!(response.trace.len(), 2);
    let first = response.trace.get(0).unwrap();
    assert!(first.is_ok());
    assert_eq!(first.output(), Some(&json!({"hits": 3})));

    let second = response.trace.get(1).unwrap();
    assert!(second.is_failed());
    assert_eq!(second.error_message(), Some(TOOL_NOT_FOUND));

    assert!(!response.verdict.success());
    assert!(response.verdict.issues().iter().any(|i| i.contains("ghost_tool")));
    assert_eq!(response.user_message(), "I searched but could not run ghost_tool.");

    // The analyzer saw the request and both outcomes
    let prompts = reasoner.prompts();
    assert_eq!(prompts.len(), 1);
    assert!(prompts[0].contains("find x"));
    assert!(prompts[0].contains("tool not found"));
}

#[tokio::test]
async fn test_failure_mid_plan_does_not_stop_later_steps() {
    let plan = Plan::new(vec![
        PlanStep::from_json("search", json!({"q": "a"})),
        PlanStep::from_json("fetch", json!({"id": 1})),
        PlanStep::from_json("broken", json!({})),
        PlanStep::from_json("search", json!({"q": "b"})),
        PlanStep::from_json("fetch", json!({"id": 2})),
    ]);
    let remote = default_remote();
    let reasoner = Arc::new(ScriptedReasoner::new(&[
        r#"{"success": false, "issues": ["step 3 failed"], "improvements": [], "user_response": "Partially done."}"#,
    ]));
    let service = service_with(plan, remote.clone(), reasoner);

    let response = service.handle("gather everything").await.unwrap();

    assert_eq!(response.trace.len(), 5);
    let statuses: Vec<bool> = response.trace.iter().map(|r| r.is_ok()).collect();
    assert_eq!(statuses, vec![true, true, false, true, true]);
    assert!(response.trace.get(2).unwrap().error_message().unwrap().contains("HTTP 500"));

    // Steps 4 and 5 really were dispatched
    assert_eq!(remote.calls.lock().unwrap().len(), 5);

    let failures: Vec<usize> = response.trace.failures().map(|(n, _)| n).collect();
    assert_eq!(failures, vec![3]);
}

#[tokio::test]
async fn test_abort_policy_records_skipped_steps() {
    let catalog = search_catalog();
    let remote = default_remote();
    let executor = PlanExecutor::new(dispatcher(catalog, remote.clone()))
        .with_policy(ContinuationPolicy::AbortOnFirstFailure);

    let plan = Plan::new(vec![
        PlanStep::from_json("broken", json!({})),
        PlanStep::from_json("search", json!({"q": "never"})),
    ]);

    let trace = executor.run(&plan).await;

    assert_eq!(trace.len(), 2);
    assert!(trace.get(0).unwrap().is_failed());
    let skipped = trace.get(1).unwrap();
    assert!(skipped.is_failed());
    assert_eq!(skipped.tool_name(), "search");
    assert!(skipped.error_message().unwrap().starts_with("skipped"));
    assert_eq!(remote.calls.lock().unwrap().len(), 1);
}

#[tokio::test]
async fn test_malformed_analysis_falls_back() {
    let plan = Plan::new(vec![PlanStep::from_json("search", json!({"q": "x"}))]);
    let reasoner = Arc::new(ScriptedReasoner::new(&["Sure! Everything went great."]));
    let telemetry = TelemetryCollector::new();

    let catalog = search_catalog();
    let executor = PlanExecutor::new(dispatcher(catalog.clone(), default_remote()))
        .with_telemetry(telemetry.clone());
    let analyzer = ResultAnalyzer::new(reasoner).with_telemetry(telemetry.clone());
    let service =
        PlanOrchestrationService::new(catalog, Arc::new(FixedPlanner(plan)), executor, analyzer);

    let response = service.handle("find x").await.unwrap();

    assert!(response.trace.all_succeeded());
    assert!(!response.verdict.success());
    assert_eq!(response.verdict.issues().len(), 1);
    assert!(response.verdict.issues()[0].starts_with("Error analyzing results:"));
    assert_eq!(response.verdict.improvements(), ["Improve error handling".to_string()]);
    assert_eq!(
        response.user_message(),
        "I encountered an issue while analyzing the results. Please try again."
    );
    assert_eq!(telemetry.get_stats().analysis_fallbacks, 1);
}

#[tokio::test]
async fn test_empty_plan_still_gets_a_verdict() {
    let reasoner = Arc::new(ScriptedReasoner::new(&[
        r#"{"success": true, "issues": [], "improvements": [], "user_response": "Nothing to do."}"#,
    ]));
    let service = service_with(Plan::empty(), default_remote(), reasoner);

    let response = service.handle("say hello").await.unwrap();

    assert!(response.plan.is_empty());
    assert!(response.trace.is_empty());
    assert!(response.verdict.success());
    assert_eq!(response.user_message(), "Nothing to do.");
}

#[tokio::test]
async fn test_blank_request_is_rejected() {
    let reasoner = Arc::new(ScriptedReasoner::new(&[]));
    let service = service_with(Plan::empty(), default_remote(), reasoner);

    let err = service.handle("   ").await.unwrap_err();
    assert!(matches!(err, FlowError::Planning(_)));
}

#[tokio::test]
async fn test_llm_planner_end_to_end() {
    let reasoner = Arc::new(ScriptedReasoner::new(&[
        r#"Here is the plan:
```json
[{"tool_name": "search", "parameters": {"q": "rust"}}, {"tool_name": "render", "parameters": {"format": "pdf"}}]
```"#,
        r#"{"success": true, "issues": [], "improvements": [], "user_response": "Searched and queued the report."}"#,
    ]));

    let catalog = search_catalog();
    let executor = PlanExecutor::new(dispatcher(catalog.clone(), default_remote()));
    let planner = Arc::new(LlmPlanner::new(reasoner.clone()));
    let analyzer = ResultAnalyzer::new(reasoner.clone());
    let service = PlanOrchestrationService::new(catalog, planner, executor, analyzer);

    let response = service.handle("search rust and render a report").await.unwrap();

    assert_eq!(response.plan.tool_names(), vec!["search", "render"]);
    assert!(response.trace.all_succeeded());

    let job = response.trace.get(1).unwrap().output().unwrap();
    assert_eq!(job["status"], JOB_SUBMITTED);
    assert!(job["job_id"].as_str().unwrap().starts_with("render-"));

    // The planning prompt advertised the catalog
    let prompts = reasoner.prompts();
    assert!(prompts[0].contains("search"));
    assert!(prompts[0].contains("render"));
}

#[tokio::test]
async fn test_llm_planner_rejects_unknown_tool() {
    let reasoner = Arc::new(ScriptedReasoner::new(&[
        r#"[{"tool_name": "ghost_tool", "parameters": {}}]"#,
    ]));

    let catalog = search_catalog();
    let executor = PlanExecutor::new(dispatcher(catalog.clone(), default_remote()));
    let planner = Arc::new(LlmPlanner::new(reasoner.clone()));
    let analyzer = ResultAnalyzer::new(reasoner);
    let service = PlanOrchestrationService::new(catalog, planner, executor, analyzer);

    let err = service.handle("do the impossible").await.unwrap_err();
    assert!(matches!(err, FlowError::Planning(_)));
    assert!(err.to_string().contains("ghost_tool"));
}

#[tokio::test]
async fn test_job_ids_are_unique_per_dispatch() {
    let catalog = search_catalog();
    let jobs = Arc::new(AcceptingJobs::default());
    let dispatcher = StepDispatcher::new(catalog, default_remote(), jobs.clone());

    let step = PlanStep::from_json("render", json!({"format": "pdf"}));
    let first = dispatcher.dispatch(&step).await;
    let second = dispatcher.dispatch(&step).await;

    let ids: HashSet<String> = [first, second]
        .iter()
        .map(|r| r.output().unwrap()["job_id"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(ids.len(), 2);

    let submitted = jobs.submitted.lock().unwrap();
    assert_eq!(submitted.len(), 2);
    assert_eq!(submitted[0].image, "registry.local/render:1.0");
    assert_eq!(submitted[0].parameters_blob, r#"{"format":"pdf"}"#);
}

#[tokio::test]
async fn test_response_envelope_shape() {
    let plan = Plan::new(vec![PlanStep::from_json("search", json!({"q": "x"}))]);
    let reasoner = Arc::new(ScriptedReasoner::new(&[
        r#"{"success": true, "issues": [], "improvements": [], "user_response": "Found 3 hits."}"#,
    ]));
    let service = service_with(plan, default_remote(), reasoner);

    let response = service.handle("find x").await.unwrap();
    let envelope = serde_json::to_value(&response).unwrap();

    assert_eq!(envelope["success"], json!(true));
    assert_eq!(envelope["plan"][0]["tool_name"], json!("search"));
    assert_eq!(envelope["results"][0]["status"], json!("ok"));
    assert_eq!(envelope["results"][0]["output"], json!({"hits": 3}));
    assert_eq!(envelope["analysis"]["user_response"], json!("Found 3 hits."));
    assert_eq!(envelope["response"], json!("Found 3 hits."));
    assert!(envelope["started_at"].is_string());
    assert!(envelope["finished_at"].is_string());
    assert!(response.elapsed_ms() >= 0);
}
