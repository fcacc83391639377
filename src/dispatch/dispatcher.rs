//! Step dispatcher
//!
//! Executes exactly one plan step against the backend its tool declares and
//! folds every outcome (unknown tool, timeout, transport error, non-2xx,
//! submission failure, even a panicking backend) into a `StepResult`.
//! No retries happen here.

use crate::catalog::{ToolCatalog, ToolDefinition, ToolTarget};
use crate::dispatch::jobs::{JobBackend, JobSpec, DEFAULT_SUBMISSION_TIMEOUT};
use crate::dispatch::remote::{RemoteBackend, DEFAULT_REMOTE_TIMEOUT};
use crate::errors::{FlowError, Result};
use crate::types::{PlanStep, StepResult};
use futures_util::FutureExt;
use serde_json::{json, Value};
use std::future::Future;
use std::panic::AssertUnwindSafe;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::time::timeout;
use tracing::debug;

/// Error message recorded for steps naming an unknown tool
pub const TOOL_NOT_FOUND: &str = "tool not found";

/// Status reported for accepted job submissions
pub const JOB_SUBMITTED: &str = "submitted";

/// Per-call time bounds
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DispatchSettings {
    /// Bound on a remote call, request to decoded response
    pub remote_timeout: Duration,

    /// Bound on job submission only, not job execution
    pub submission_timeout: Duration,
}

impl Default for DispatchSettings {
    fn default() -> Self {
        Self {
            remote_timeout: DEFAULT_REMOTE_TIMEOUT,
            submission_timeout: DEFAULT_SUBMISSION_TIMEOUT,
        }
    }
}

impl DispatchSettings {
    /// Set remote call timeout
    pub fn with_remote_timeout(mut self, timeout: Duration) -> Self {
        self.remote_timeout = timeout;
        self
    }

    /// Set job submission timeout
    pub fn with_submission_timeout(mut self, timeout: Duration) -> Self {
        self.submission_timeout = timeout;
        self
    }
}

/// Single-step executor over the remote and job backends
#[derive(Clone)]
pub struct StepDispatcher {
    catalog: Arc<dyn ToolCatalog>,
    remote: Arc<dyn RemoteBackend>,
    jobs: Arc<dyn JobBackend>,
    settings: DispatchSettings,
}

impl StepDispatcher {
    /// Create dispatcher with default time bounds
    pub fn new(
        catalog: Arc<dyn ToolCatalog>,
        remote: Arc<dyn RemoteBackend>,
        jobs: Arc<dyn JobBackend>,
    ) -> Self {
        Self {
            catalog,
            remote,
            jobs,
            settings: DispatchSettings::default(),
        }
    }

    /// Override time bounds
    pub fn with_settings(mut self, settings: DispatchSettings) -> Self {
        self.settings = settings;
        self
    }

    pub fn settings(&self) -> &DispatchSettings {
        &self.settings
    }

    pub fn catalog(&self) -> &Arc<dyn ToolCatalog> {
        &self.catalog
    }

    /// Execute one step. Never fails: every fault becomes `StepResult::Failed`.
    pub async fn dispatch(&self, step: &PlanStep) -> StepResult {
        let start = Instant::now();

        let Some(tool) = self.catalog.lookup(&step.tool_name) else {
            let err = FlowError::ToolNotFound(step.tool_name.clone());
            debug!(tool = %step.tool_name, error = %err, "tool not in catalog");
            return StepResult::failure(step, err.to_string(), start.elapsed());
        };

        let outcome = match tool.target() {
            ToolTarget::Endpoint(endpoint) => {
                bounded(
                    self.settings.remote_timeout,
                    self.remote.call(endpoint, &step.parameters),
                )
                .await
            }
            ToolTarget::Image(image) => self.submit_job(&tool, image, step).await,
        };

        match outcome {
            Ok(output) => StepResult::success(step, output, start.elapsed()),
            Err(e) => {
                debug!(tool = %step.tool_name, error = %e, "step failed");
                StepResult::failure(step, e.to_string(), start.elapsed())
            }
        }
    }

    async fn submit_job(&self, tool: &ToolDefinition, image: &str, step: &PlanStep) -> Result<Value> {
        let job = JobSpec::for_tool(tool.name(), image, &step.parameters)?;
        let job_id = bounded(self.settings.submission_timeout, self.jobs.submit(&job)).await?;
        debug!(tool = tool.name(), job_id = %job_id, "job submitted");

        Ok(json!({ "job_id": job_id, "status": JOB_SUBMITTED }))
    }
}

/// Run a backend call under a deadline, turning panics into errors
async fn bounded<T, F>(limit: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match timeout(limit, AssertUnwindSafe(call).catch_unwind()).await {
        Ok(Ok(result)) => result,
        Ok(Err(panic)) => {
            let detail = panic
                .downcast_ref::<&str>()
                .map(|s| s.to_string())
                .or_else(|| panic.downcast_ref::<String>().cloned())
                .unwrap_or_else(|| "unknown panic".to_string());
            Err(FlowError::Backend(format!("backend panicked: {}", detail)))
        }
        Err(_) => Err(FlowError::Timeout {
            duration_ms: limit.as_millis() as u64,
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::catalog::ToolRegistry;
    use crate::types::Parameters;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedRemote(Result<Value>);

    #[async_trait]
    impl RemoteBackend for FixedRemote {
        async fn call(&self, _endpoint: &str, _parameters: &Parameters) -> Result<Value> {
            match &self.0 {
                Ok(v) => Ok(v.clone()),
                Err(e) => Err(FlowError::Backend(e.to_string())),
            }
        }
    }

    struct SlowRemote;

    #[async_trait]
    impl RemoteBackend for SlowRemote {
        async fn call(&self, _endpoint: &str, _parameters: &Parameters) -> Result<Value> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(json!({}))
        }
    }

    struct PanickingRemote;

    #[async_trait]
    impl RemoteBackend for PanickingRemote {
        async fn call(&self, _endpoint: &str, _parameters: &Parameters) -> Result<Value> {
            panic!("backend exploded")
        }
    }

    #[derive(Default)]
    struct RecordingJobs {
        submitted: Mutex<Vec<JobSpec>>,
    }

    #[async_trait]
    impl JobBackend for RecordingJobs {
        async fn submit(&self, job: &JobSpec) -> Result<String> {
            self.submitted.lock().unwrap().push(job.clone());
            Ok(job.name.clone())
        }
    }

    struct SlowJobs;

    #[async_trait]
    impl JobBackend for SlowJobs {
        async fn submit(&self, job: &JobSpec) -> Result<String> {
            tokio::time::sleep(Duration::from_secs(5)).await;
            Ok(job.name.clone())
        }
    }

    struct RejectingJobs;

    #[async_trait]
    impl JobBackend for RejectingJobs {
        async fn submit(&self, _job: &JobSpec) -> Result<String> {
            Err(FlowError::JobSubmission("quota exceeded".to_string()))
        }
    }

    fn catalog() -> Arc<dyn ToolCatalog> {
        Arc::new(ToolRegistry::from_tools(vec![
            crate::catalog::ToolDefinition::remote("search", "Search", json!({}), "http://search"),
            crate::catalog::ToolDefinition::job("render", "Render", json!({}), "render:1"),
        ]))
    }

    fn dispatcher(remote: impl RemoteBackend + 'static, jobs: impl JobBackend + 'static) -> StepDispatcher {
        StepDispatcher::new(catalog(), Arc::new(remote), Arc::new(jobs))
    }

    #[tokio::test]
    async fn test_unknown_tool_fails_without_backend_call() {
        let d = dispatcher(PanickingRemote, RejectingJobs);
        let result = d.dispatch(&PlanStep::from_json("ghost_tool", json!({}))).await;

        assert!(result.is_failed());
        assert_eq!(result.error_message(), Some(TOOL_NOT_FOUND));
        assert_eq!(result.tool_name(), "ghost_tool");
    }

    #[tokio::test]
    async fn test_remote_success() {
        let d = dispatcher(FixedRemote(Ok(json!({"hits": 3}))), RejectingJobs);
        let result = d.dispatch(&PlanStep::from_json("search", json!({"q": "x"}))).await;

        assert!(result.is_ok());
        assert_eq!(result.output(), Some(&json!({"hits": 3})));
        assert_eq!(result.parameters()["q"], json!("x"));
    }

    #[tokio::test]
    async fn test_remote_error_is_failed() {
        let d = dispatcher(
            FixedRemote(Err(FlowError::Backend("HTTP 500".to_string()))),
            RejectingJobs,
        );
        let result = d.dispatch(&PlanStep::from_json("search", json!({}))).await;

        assert!(result.is_failed());
        assert!(result.error_message().unwrap().contains("HTTP 500"));
    }

    #[tokio::test]
    async fn test_remote_timeout_is_failed() {
        let d = dispatcher(SlowRemote, RejectingJobs)
            .with_settings(DispatchSettings::default().with_remote_timeout(Duration::from_millis(50)));
        let result = d.dispatch(&PlanStep::from_json("search", json!({}))).await;

        assert!(result.is_failed());
        assert!(result.error_message().unwrap().contains("timed out"));
    }

    #[tokio::test]
    async fn test_submission_timeout_is_failed() {
        // Remote bound stays generous; only the submission bound applies
        let d = dispatcher(PanickingRemote, SlowJobs).with_settings(
            DispatchSettings::default()
                .with_remote_timeout(Duration::from_secs(30))
                .with_submission_timeout(Duration::from_millis(50)),
        );
        let result = d.dispatch(&PlanStep::from_json("render", json!({}))).await;

        assert!(result.is_failed());
        assert!(result.error_message().unwrap().contains("timed out"));
        assert!(result.duration_ms() < 5000);
    }

    #[tokio::test]
    async fn test_backend_panic_is_failed() {
        let d = dispatcher(PanickingRemote, RejectingJobs);
        let result = d.dispatch(&PlanStep::from_json("search", json!({}))).await;

        assert!(result.is_failed());
        assert!(result.error_message().unwrap().contains("backend exploded"));
    }

    #[tokio::test]
    async fn test_job_submission_success() {
        let jobs = Arc::new(RecordingJobs::default());
        let d = StepDispatcher::new(catalog(), Arc::new(PanickingRemote), jobs.clone());

        let result = d.dispatch(&PlanStep::from_json("render", json!({"w": 1}))).await;

        let output = result.output().unwrap();
        assert_eq!(output["status"], json!(JOB_SUBMITTED));
        assert!(output["job_id"].as_str().unwrap().starts_with("render-"));

        let submitted = jobs.submitted.lock().unwrap();
        assert_eq!(submitted.len(), 1);
        assert_eq!(submitted[0].image, "render:1");
        assert_eq!(submitted[0].parameters_blob, r#"{"w":1}"#);
    }

    #[tokio::test]
    async fn test_job_submission_failure() {
        let d = dispatcher(PanickingRemote, RejectingJobs);
        let result = d.dispatch(&PlanStep::from_json("render", json!({}))).await;

        assert!(result.is_failed());
        assert!(result.error_message().unwrap().contains("quota exceeded"));
    }
}
