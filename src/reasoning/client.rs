//! Reasoning service client
//!
//! The planner and the analyzer talk to a text-completion service through
//! the `Reasoner` trait. `OllamaReasoner` speaks the Ollama generate API:
//! - Endpoint: POST /api/generate (non-streaming)
//! - Options: temperature, num_predict

use crate::errors::{FlowError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Default Ollama API endpoint
pub const DEFAULT_OLLAMA_URL: &str = "http://127.0.0.1:11434";

/// Default model
pub const DEFAULT_MODEL: &str = "qwen2.5:7b-instruct";

/// Default sampling temperature
pub const DEFAULT_TEMPERATURE: f32 = 0.2;

/// Default completion length cap
pub const DEFAULT_MAX_TOKENS: u32 = 2000;

/// Request timeout (120 seconds)
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Free-text completion collaborator
#[async_trait]
pub trait Reasoner: Send + Sync {
    /// Complete `prompt`, returning the raw model text
    async fn complete(&self, prompt: &str) -> Result<String>;
}

/// Ollama-backed reasoner
#[derive(Debug, Clone)]
pub struct OllamaReasoner {
    client: Client,
    base_url: String,
    model: String,
    temperature: f32,
    max_tokens: u32,
}

impl OllamaReasoner {
    /// Create reasoner with default settings
    pub fn new() -> Result<Self> {
        Self::with_config(DEFAULT_OLLAMA_URL, DEFAULT_MODEL)
    }

    /// Create reasoner with custom base URL and model
    pub fn with_config(base_url: &str, model: &str) -> Result<Self> {
        Self::with_timeout(base_url, model, REQUEST_TIMEOUT)
    }

    /// Create reasoner with a custom request timeout
    pub fn with_timeout(base_url: &str, model: &str, timeout: Duration) -> Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            model: model.to_string(),
            temperature: DEFAULT_TEMPERATURE,
            max_tokens: DEFAULT_MAX_TOKENS,
        })
    }

    pub fn with_temperature(mut self, temperature: f32) -> Self {
        self.temperature = temperature;
        self
    }

    pub fn with_max_tokens(mut self, max_tokens: u32) -> Self {
        self.max_tokens = max_tokens;
        self
    }

    /// Check if the service is reachable
    pub async fn health_check(&self) -> bool {
        let url = format!("{}/api/version", self.base_url);
        match self.client.get(&url).send().await {
            Ok(response) => response.status().is_success(),
            Err(_) => false,
        }
    }

    /// Get current model name
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Get base URL
    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl Reasoner for OllamaReasoner {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let url = format!("{}/api/generate", self.base_url);

        let request = GenerateRequest {
            model: &self.model,
            prompt,
            stream: false,
            options: GenerateOptions {
                temperature: self.temperature,
                num_predict: self.max_tokens,
            },
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| FlowError::Reasoning(format!("Failed to send request: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(FlowError::Reasoning(format!("HTTP {}: {}", status, error_text)));
        }

        let body: GenerateResponse = response
            .json()
            .await
            .map_err(|e| FlowError::Reasoning(format!("Failed to parse response: {}", e)))?;

        Ok(body.response.trim().to_string())
    }
}

/// Ollama generate request
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
    options: GenerateOptions,
}

#[derive(Debug, Serialize)]
struct GenerateOptions {
    temperature: f32,
    num_predict: u32,
}

/// Ollama generate response (non-streaming)
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}
