//! Ollama client (local model runtime).

use super::chat::{self, ChatCompletionRequest};
use super::{build_provider_http_client, error_from_response, map_http_error};
use super::{GenerationOptions, TextGenerator};
use crate::error::{ApiError, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";

/// Ollama provider client (local models)
pub struct OllamaClient {
    client: Client,
    base_url: String,
}

impl OllamaClient {
    pub fn new(base_url: Option<String>, request_timeout: Duration) -> Result<Self, ApiError> {
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_OLLAMA_URL.to_string())
            .trim_end_matches('/')
            .to_string();
        let client = build_provider_http_client(request_timeout)?;

        Ok(Self { client, base_url })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TextGenerator for OllamaClient {
    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        // Ollama serves the OpenAI-compatible API under /v1
        let request = ChatCompletionRequest::single_prompt(model, prompt, options);
        let url = format!("{}/v1/chat/completions", self.base_url);
        chat::complete(&self.client, self.provider_name(), &url, None, &request).await
    }

    fn provider_name(&self) -> &str {
        "ollama"
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| map_http_error(self.provider_name(), e))?;

        if !response.status().is_success() {
            return Err(error_from_response(self.provider_name(), response).await);
        }

        #[derive(Deserialize)]
        struct TagsResponse {
            models: Vec<ModelInfo>,
        }
        #[derive(Deserialize)]
        struct ModelInfo {
            name: String,
        }

        let tags: TagsResponse = response.json().await.map_err(|e| {
            ProviderError::malformed(
                self.provider_name(),
                format!("Failed to parse models response: {}", e),
            )
        })?;

        Ok(tags.models.into_iter().map(|m| m.name).collect())
    }
}
