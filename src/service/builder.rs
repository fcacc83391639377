//! Service assembly from configuration
//!
//! Every collaborator is constructed here and handed to the service
//! explicitly; nothing is a process-wide singleton.

use crate::analysis::ResultAnalyzer;
use crate::catalog::ToolCatalog;
use crate::cli::Config;
use crate::dispatch::{HttpRemoteBackend, KubernetesJobBackend, StepDispatcher};
use crate::errors::Result;
use crate::execution::PlanExecutor;
use crate::planning::LlmPlanner;
use crate::reasoning::{OllamaReasoner, Reasoner};
use crate::service::PlanOrchestrationService;
use crate::telemetry::TelemetryCollector;
use std::sync::Arc;
use std::time::Duration;

/// Build the default reasoning client for `config`
pub fn build_reasoner(config: &Config) -> Result<OllamaReasoner> {
    Ok(OllamaReasoner::with_timeout(
        &config.reasoning_url(),
        &config.reasoning.model,
        Duration::from_secs(config.reasoning.timeout_sec),
    )?
    .with_temperature(config.reasoning.temperature)
    .with_max_tokens(config.reasoning.max_tokens))
}

/// Build the step dispatcher with HTTP and job backends from `config`
pub fn build_dispatcher(config: &Config, catalog: Arc<dyn ToolCatalog>) -> Result<StepDispatcher> {
    let settings = config.dispatch_settings();

    let mut remote = HttpRemoteBackend::with_timeout(settings.remote_timeout)?;
    let mut jobs = KubernetesJobBackend::with_timeout(
        config.dispatch.job_api_url.clone(),
        settings.submission_timeout,
    )?
    .with_namespace(config.dispatch.job_namespace.clone())
    .with_backoff_limit(config.dispatch.job_backoff_limit);

    if let Some(token) = &config.dispatch.auth_token {
        remote = remote.with_auth_token(token.clone());
        jobs = jobs.with_auth_token(token.clone());
    }

    Ok(StepDispatcher::new(catalog, Arc::new(remote), Arc::new(jobs)).with_settings(settings))
}

/// Assemble the full pipeline with a shared reasoner
pub fn build_service(
    config: &Config,
    catalog: Arc<dyn ToolCatalog>,
    reasoner: Arc<dyn Reasoner>,
    telemetry: TelemetryCollector,
) -> Result<PlanOrchestrationService> {
    config.validate()?;

    let executor = PlanExecutor::new(build_dispatcher(config, catalog.clone())?)
        .with_policy(config.policy()?)
        .with_max_parallel(config.execution.max_parallel)
        .with_telemetry(telemetry.clone());

    let planner = Arc::new(LlmPlanner::new(reasoner.clone()));
    let analyzer = ResultAnalyzer::new(reasoner).with_telemetry(telemetry);

    Ok(PlanOrchestrationService::new(catalog, planner, executor, analyzer))
}
