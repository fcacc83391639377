//! Step dispatch
//!
//! Routes a single plan step to the backend its tool declares:
//! - remote call: JSON POST to the tool endpoint (request/response)
//! - job submission: containerized job, acknowledged on submission only

pub mod remote;
pub mod jobs;
pub mod dispatcher;

// Re-export commonly used types
pub use remote::{HttpRemoteBackend, RemoteBackend};
pub use jobs::{generate_job_name, JobBackend, JobSpec, KubernetesJobBackend};
pub use dispatcher::{DispatchSettings, StepDispatcher, JOB_SUBMITTED, TOOL_NOT_FOUND};
