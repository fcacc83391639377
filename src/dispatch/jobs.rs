//! Job submission backend
//!
//! Job-kind tools run as one-shot container jobs. The dispatcher only sees
//! submission acknowledgment: a job id comes back synchronously and nothing
//! here waits for the job to finish.

use crate::errors::{FlowError, Result};
use crate::types::Parameters;
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use std::time::Duration;

/// Environment variable carrying the JSON-encoded step parameters
pub const PARAMS_ENV_VAR: &str = "PARAMS";

/// Default submission timeout (10 seconds)
pub const DEFAULT_SUBMISSION_TIMEOUT: Duration = Duration::from_secs(10);

/// Default namespace jobs are created in
pub const DEFAULT_NAMESPACE: &str = "default";

/// Default number of pod retries the job controller may attempt
pub const DEFAULT_BACKOFF_LIMIT: u32 = 2;

/// Length of the random job name suffix
const JOB_SUFFIX_LEN: usize = 8;

/// Longest job name accepted by DNS-1123 label rules
const MAX_JOB_NAME_LEN: usize = 63;

/// Description of one job to submit
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSpec {
    /// Unique job identifier
    pub name: String,

    /// Container image reference
    pub image: String,

    /// JSON-encoded step parameters
    pub parameters_blob: String,
}

impl JobSpec {
    /// Build a job spec for a tool invocation with a fresh unique name
    pub fn for_tool(tool_name: &str, image: &str, parameters: &Parameters) -> Result<Self> {
        Ok(Self {
            name: generate_job_name(tool_name),
            image: image.to_string(),
            parameters_blob: serde_json::to_string(parameters)?,
        })
    }

    /// Render as a `batch/v1` Job manifest
    pub fn to_manifest(&self, backoff_limit: u32) -> Value {
        json!({
            "apiVersion": "batch/v1",
            "kind": "Job",
            "metadata": { "name": self.name },
            "spec": {
                "backoffLimit": backoff_limit,
                "template": {
                    "metadata": { "name": self.name },
                    "spec": {
                        "restartPolicy": "Never",
                        "containers": [{
                            "name": self.name,
                            "image": self.image,
                            "env": [{ "name": PARAMS_ENV_VAR, "value": self.parameters_blob }]
                        }]
                    }
                }
            }
        })
    }
}

/// Generate `<tool>-<8 hex chars>`, lowercased and reduced to `[a-z0-9-]`
pub fn generate_job_name(tool_name: &str) -> String {
    let mut prefix: String = tool_name
        .to_lowercase()
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c } else { '-' })
        .collect();
    prefix = prefix.trim_matches('-').to_string();
    if prefix.is_empty() {
        prefix = "job".to_string();
    }
    prefix.truncate(MAX_JOB_NAME_LEN - JOB_SUFFIX_LEN - 1);
    let prefix = prefix.trim_end_matches('-');

    let suffix = uuid::Uuid::new_v4().simple().to_string();
    format!("{}-{}", prefix, &suffix[..JOB_SUFFIX_LEN])
}

/// Asynchronous containerized job backend
#[async_trait]
pub trait JobBackend: Send + Sync {
    /// Submit a job and return its identifier. Does not wait for completion.
    async fn submit(&self, job: &JobSpec) -> Result<String>;
}

/// Submits jobs to a Kubernetes-compatible batch API over HTTP
#[derive(Debug, Clone)]
pub struct KubernetesJobBackend {
    client: Client,
    api_url: String,
    namespace: String,
    backoff_limit: u32,
    auth_token: Option<String>,
}

impl KubernetesJobBackend {
    /// Create a backend for the API server at `api_url`
    pub fn new(api_url: impl Into<String>) -> Result<Self> {
        Self::with_timeout(api_url, DEFAULT_SUBMISSION_TIMEOUT)
    }

    /// Create a backend with a custom submission timeout
    pub fn with_timeout(api_url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            api_url: api_url.into().trim_end_matches('/').to_string(),
            namespace: DEFAULT_NAMESPACE.to_string(),
            backoff_limit: DEFAULT_BACKOFF_LIMIT,
            auth_token: None,
        })
    }

    pub fn with_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.namespace = namespace.into();
        self
    }

    pub fn with_backoff_limit(mut self, backoff_limit: u32) -> Self {
        self.backoff_limit = backoff_limit;
        self
    }

    pub fn with_auth_token(mut self, token: impl Into<String>) -> Self {
        self.auth_token = Some(token.into());
        self
    }

    /// Job collection URL for the configured namespace
    pub fn jobs_url(&self) -> String {
        format!(
            "{}/apis/batch/v1/namespaces/{}/jobs",
            self.api_url, self.namespace
        )
    }
}

#[async_trait]
impl JobBackend for KubernetesJobBackend {
    async fn submit(&self, job: &JobSpec) -> Result<String> {
        let mut request = self
            .client
            .post(self.jobs_url())
            .json(&job.to_manifest(self.backoff_limit));
        if let Some(token) = &self.auth_token {
            request = request.bearer_auth(token);
        }

        let response = request
            .send()
            .await
            .map_err(|e| FlowError::JobSubmission(format!("Failed to submit {}: {}", job.name, e)))?;

        let status = response.status();
        if !status.is_success() {
            let body = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FlowError::JobSubmission(format!("HTTP {}: {}", status, body)));
        }

        // The API echoes the created object; fall back to our own name
        let created: Value = response.json().await.unwrap_or(Value::Null);
        let name = created["metadata"]["name"]
            .as_str()
            .filter(|name| !name.is_empty())
            .unwrap_or(&job.name)
            .to_string();
        Ok(name)
    }
}
