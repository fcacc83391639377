//! Configuration management for toolflow
//!
//! Provides TOML-based configuration with defaults and validation.
//! Location: ~/.toolflow/config.toml

use crate::dispatch::DispatchSettings;
use crate::errors::{FlowError, Result};
use crate::execution::ContinuationPolicy;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Complete configuration for toolflow
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub reasoning: ReasoningConfig,
    pub dispatch: DispatchConfig,
    pub execution: ExecutionConfig,
    pub catalog: CatalogConfig,
    pub telemetry: TelemetryConfig,
}

/// Reasoning service connection configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ReasoningConfig {
    pub host: String,
    pub port: u16,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    pub timeout_sec: u64,
}

/// Backend dispatch configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DispatchConfig {
    pub remote_timeout_sec: u64,
    pub submission_timeout_sec: u64,
    pub job_api_url: String,
    pub job_namespace: String,
    pub job_backoff_limit: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub auth_token: Option<String>,
}

/// Plan execution configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ExecutionConfig {
    pub policy: String,
    pub max_parallel: usize,
}

/// Tool catalog location
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CatalogConfig {
    pub path: String,
}

/// Telemetry display configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct TelemetryConfig {
    pub default_verbosity: String,
    pub color_output: bool,
}

impl Default for ReasoningConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 11434,
            model: "qwen2.5:7b-instruct".to_string(),
            temperature: 0.2,
            max_tokens: 2000,
            timeout_sec: 120,
        }
    }
}

impl Default for DispatchConfig {
    fn default() -> Self {
        Self {
            remote_timeout_sec: 30,
            submission_timeout_sec: 10,
            job_api_url: "http://127.0.0.1:8001".to_string(),
            job_namespace: "default".to_string(),
            job_backoff_limit: 2,
            auth_token: None,
        }
    }
}

impl Default for ExecutionConfig {
    fn default() -> Self {
        Self {
            policy: ContinuationPolicy::ContinueOnError.as_str().to_string(),
            max_parallel: 1,
        }
    }
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            path: "~/.toolflow/tools.json".to_string(),
        }
    }
}

impl Default for TelemetryConfig {
    fn default() -> Self {
        Self {
            default_verbosity: "normal".to_string(),
            color_output: true,
        }
    }
}

impl Config {
    /// Load configuration from file or use defaults
    pub fn load(path: Option<&Path>) -> Result<Self> {
        if let Some(config_path) = path {
            Self::load_from_file(config_path)
        } else {
            Self::load_default()
        }
    }

    /// Load configuration from specific file
    pub fn load_from_file(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| FlowError::Config(format!("Failed to read config: {}", e)))?;

        let config: Config = toml::from_str(&contents)
            .map_err(|e| FlowError::Config(format!("Failed to parse config: {}", e)))?;

        config.validate()?;
        Ok(config)
    }

    /// Load default configuration from standard location or use built-in defaults
    pub fn load_default() -> Result<Self> {
        if let Some(home) = dirs::home_dir() {
            let config_path = home.join(".toolflow").join("config.toml");
            if config_path.exists() {
                return Self::load_from_file(&config_path);
            }
        }

        Ok(Config::default())
    }

    /// Validate configuration values
    pub fn validate(&self) -> Result<()> {
        if !(0.0..=2.0).contains(&self.reasoning.temperature) {
            return Err(FlowError::Config(
                "temperature must be between 0.0 and 2.0".to_string(),
            ));
        }

        if self.reasoning.timeout_sec == 0 {
            return Err(FlowError::Config(
                "reasoning timeout_sec must be greater than 0".to_string(),
            ));
        }

        if self.dispatch.remote_timeout_sec == 0 || self.dispatch.submission_timeout_sec == 0 {
            return Err(FlowError::Config(
                "dispatch timeouts must be greater than 0".to_string(),
            ));
        }

        if self.execution.max_parallel == 0 {
            return Err(FlowError::Config(
                "max_parallel must be greater than 0".to_string(),
            ));
        }

        if self.policy()? == ContinuationPolicy::AbortOnFirstFailure
            && self.execution.max_parallel > 1
        {
            return Err(FlowError::Config(
                "abort_on_first_failure requires max_parallel = 1".to_string(),
            ));
        }

        match self.telemetry.default_verbosity.as_str() {
            "quiet" | "normal" | "verbose" | "very_verbose" => {}
            _ => {
                return Err(FlowError::Config(format!(
                    "Invalid verbosity level: {}",
                    self.telemetry.default_verbosity
                )))
            }
        }

        Ok(())
    }

    /// Save configuration to file
    pub fn save(&self, path: &Path) -> Result<()> {
        let contents = toml::to_string_pretty(self)
            .map_err(|e| FlowError::Config(format!("Failed to serialize config: {}", e)))?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)
                .map_err(|e| FlowError::Config(format!("Failed to create config dir: {}", e)))?;
        }

        std::fs::write(path, contents)
            .map_err(|e| FlowError::Config(format!("Failed to write config: {}", e)))?;

        Ok(())
    }

    /// Get reasoning service base URL
    pub fn reasoning_url(&self) -> String {
        format!("http://{}:{}", self.reasoning.host, self.reasoning.port)
    }

    /// Parsed continuation policy
    pub fn policy(&self) -> Result<ContinuationPolicy> {
        self.execution.policy.parse()
    }

    /// Time bounds for the step dispatcher
    pub fn dispatch_settings(&self) -> DispatchSettings {
        DispatchSettings::default()
            .with_remote_timeout(Duration::from_secs(self.dispatch.remote_timeout_sec))
            .with_submission_timeout(Duration::from_secs(self.dispatch.submission_timeout_sec))
    }

    /// Expand tilde in paths
    pub fn expand_path(path: &str) -> PathBuf {
        if let Some(rest) = path.strip_prefix("~/") {
            if let Some(home) = dirs::home_dir() {
                return home.join(rest);
            }
        }
        PathBuf::from(path)
    }

    /// Get tool catalog file path
    pub fn catalog_path(&self) -> PathBuf {
        Self::expand_path(&self.catalog.path)
    }
}
