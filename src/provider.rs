//! Text Generation Capability
//!
//! Unified interface over the LLM backends the workflow can use (a local Ollama
//! runtime, hosted OpenAI-compatible APIs, the Hugging Face Inference API). The
//! workflow treats "generate text from a prompt" as an opaque capability; retry
//! and backoff for transient failures live here, not in the orchestrator.

use crate::error::{ApiError, ProviderError, ProviderErrorKind};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

mod chat;
pub mod huggingface;
pub mod ollama;
pub mod openai;
pub mod retry;

pub use huggingface::HuggingFaceClient;
pub use ollama::OllamaClient;
pub use openai::OpenAIClient;
pub use retry::{RetryPolicy, RetryingGenerator};

/// Sampling options passed through to the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerationOptions {
    pub temperature: Option<f32>, // 0.0-2.0
    pub max_tokens: Option<u32>,
    pub top_p: Option<f32>,
    pub stop: Option<Vec<String>>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            temperature: Some(0.7),
            max_tokens: None,
            top_p: None,
            stop: None,
        }
    }
}

impl GenerationOptions {
    pub fn validate(&self) -> Result<(), String> {
        if let Some(temperature) = self.temperature {
            if !(0.0..=2.0).contains(&temperature) {
                return Err(format!(
                    "temperature must be between 0.0 and 2.0, got {}",
                    temperature
                ));
            }
        }
        if let Some(top_p) = self.top_p {
            if !(0.0..=1.0).contains(&top_p) {
                return Err(format!("top_p must be between 0.0 and 1.0, got {}", top_p));
            }
        }
        if self.max_tokens == Some(0) {
            return Err("max_tokens must be greater than zero".to_string());
        }
        Ok(())
    }
}

/// Text generation backend contract
#[async_trait]
pub trait TextGenerator: Send + Sync {
    /// Generate text for a single prompt with the given model
    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        options: &GenerationOptions,
    ) -> Result<String, ProviderError>;

    /// Get the provider name
    fn provider_name(&self) -> &str;

    /// List models available from the backend
    async fn list_models(&self) -> Result<Vec<String>, ProviderError>;
}

/// Supported backend families
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Ollama,
    #[serde(rename = "openai")]
    OpenAI,
    #[serde(rename = "huggingface")]
    HuggingFace,
}

impl BackendKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Ollama => "ollama",
            BackendKind::OpenAI => "openai",
            BackendKind::HuggingFace => "huggingface",
        }
    }

    pub fn requires_api_key(&self) -> bool {
        !matches!(self, BackendKind::Ollama)
    }
}

impl std::str::FromStr for BackendKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "ollama" | "local" => Ok(BackendKind::Ollama),
            "openai" => Ok(BackendKind::OpenAI),
            "huggingface" | "hf" => Ok(BackendKind::HuggingFace),
            other => Err(format!(
                "unknown backend '{}' (expected ollama, openai or huggingface)",
                other
            )),
        }
    }
}

/// Backend selection and connection settings
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BackendConfig {
    pub kind: BackendKind,

    /// Base URL override (each backend has its own default)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub endpoint: Option<String>,

    /// Required for hosted backends
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub api_key: Option<String>,

    #[serde(default = "default_request_timeout_secs")]
    pub request_timeout_secs: u64,
}

fn default_request_timeout_secs() -> u64 {
    120
}

impl Default for BackendConfig {
    fn default() -> Self {
        Self {
            kind: BackendKind::Ollama,
            endpoint: None,
            api_key: None,
            request_timeout_secs: default_request_timeout_secs(),
        }
    }
}

impl BackendConfig {
    /// Validate backend configuration
    pub fn validate(&self) -> Result<(), String> {
        if self.kind.requires_api_key()
            && self.api_key.as_deref().map_or(true, |k| k.trim().is_empty())
        {
            return Err(format!(
                "backend '{}' requires an api_key (set AUTOANKI__BACKEND__API_KEY)",
                self.kind.as_str()
            ));
        }
        if let Some(endpoint) = &self.endpoint {
            if !endpoint.starts_with("http://") && !endpoint.starts_with("https://") {
                return Err(format!("Invalid endpoint URL: {}", endpoint));
            }
        }
        if self.request_timeout_secs == 0 {
            return Err("request_timeout_secs must be greater than zero".to_string());
        }
        Ok(())
    }

    /// Copy with the API key masked, for display
    pub fn redacted(&self) -> Self {
        Self {
            api_key: self.api_key.as_ref().map(|_| "********".to_string()),
            ..self.clone()
        }
    }
}

/// Map an unsuccessful HTTP status to a provider error kind
pub fn classify_status(status: StatusCode) -> ProviderErrorKind {
    match status.as_u16() {
        401 | 403 => ProviderErrorKind::Unauthorized,
        404 => ProviderErrorKind::NotFound,
        429 => ProviderErrorKind::RateLimited,
        500..=599 => ProviderErrorKind::Unavailable,
        _ => ProviderErrorKind::MalformedResponse,
    }
}

// Helper function to map transport errors to ProviderError
fn map_http_error(provider: &str, error: reqwest::Error) -> ProviderError {
    if let Some(status) = error.status() {
        ProviderError::new(
            classify_status(status),
            provider,
            format!("Request failed with status {}: {}", status, error),
        )
    } else if error.is_timeout() {
        ProviderError::unavailable(provider, format!("Request timeout: {}", error))
    } else if error.is_connect() {
        ProviderError::unavailable(provider, format!("Connection error: {}", error))
    } else if error.is_decode() {
        ProviderError::malformed(provider, format!("Failed to decode response: {}", error))
    } else {
        ProviderError::unavailable(provider, format!("HTTP error: {}", error))
    }
}

/// Turn a non-success response into a classified error, keeping the body text
async fn error_from_response(provider: &str, response: reqwest::Response) -> ProviderError {
    let status = response.status();
    let error_text = response
        .text()
        .await
        .unwrap_or_else(|_| "Unknown error".to_string());
    ProviderError::new(
        classify_status(status),
        provider,
        format!("Request failed with status {}: {}", status, error_text),
    )
}

const PROVIDER_HTTP_CONNECT_TIMEOUT: Duration = Duration::from_secs(10);

fn build_provider_http_client(request_timeout: Duration) -> Result<Client, ApiError> {
    Client::builder()
        .connect_timeout(PROVIDER_HTTP_CONNECT_TIMEOUT)
        .timeout(request_timeout)
        .build()
        .map_err(|e| ApiError::ConfigError(format!("Failed to create HTTP client: {}", e)))
}

/// Provider factory for creating generator clients
pub struct ProviderFactory;

impl ProviderFactory {
    /// Build the configured backend, wrapped in the retry decorator
    pub fn create(
        backend: &BackendConfig,
        retry: &RetryPolicy,
    ) -> Result<Arc<dyn TextGenerator>, ApiError> {
        backend.validate().map_err(ApiError::ProviderNotConfigured)?;
        let timeout = Duration::from_secs(backend.request_timeout_secs);
        let api_key = backend.api_key.clone().unwrap_or_default();

        let generator: Arc<dyn TextGenerator> = match backend.kind {
            BackendKind::Ollama => Arc::new(RetryingGenerator::new(
                OllamaClient::new(backend.endpoint.clone(), timeout)?,
                retry.clone(),
            )),
            BackendKind::OpenAI => Arc::new(RetryingGenerator::new(
                OpenAIClient::new(api_key, backend.endpoint.clone(), timeout)?,
                retry.clone(),
            )),
            BackendKind::HuggingFace => Arc::new(RetryingGenerator::new(
                HuggingFaceClient::new(api_key, backend.endpoint.clone(), timeout)?,
                retry.clone(),
            )),
        };
        Ok(generator)
    }
}

// Mock provider for testing
#[cfg(test)]
pub struct MockProvider {
    responses: std::sync::Mutex<std::collections::VecDeque<Result<String, ProviderError>>>,
    prompts: std::sync::Mutex<Vec<String>>,
}

#[cfg(test)]
impl MockProvider {
    pub fn new(responses: Vec<Result<String, ProviderError>>) -> Self {
        Self {
            responses: std::sync::Mutex::new(responses.into_iter().collect()),
            prompts: std::sync::Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[cfg(test)]
#[async_trait]
impl TextGenerator for MockProvider {
    async fn generate(
        &self,
        prompt: &str,
        _model: &str,
        _options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Ok("Mock response".to_string()))
    }

    fn provider_name(&self) -> &str {
        "mock"
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        Ok(vec!["mock-model".to_string()])
    }
}
