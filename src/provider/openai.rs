//! OpenAI-compatible hosted client. Also covers custom servers that speak the
//! same API via `endpoint`.

use super::chat::{self, ChatCompletionRequest};
use super::{build_provider_http_client, error_from_response, map_http_error};
use super::{GenerationOptions, TextGenerator};
use crate::error::{ApiError, ProviderError};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;

const DEFAULT_OPENAI_URL: &str = "https://api.openai.com/v1";

/// OpenAI provider client
pub struct OpenAIClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl OpenAIClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = build_provider_http_client(request_timeout)?;
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_OPENAI_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            api_key,
            base_url,
        })
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }
}

#[async_trait]
impl TextGenerator for OpenAIClient {
    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        let request = ChatCompletionRequest::single_prompt(model, prompt, options);
        let url = format!("{}/chat/completions", self.base_url);
        chat::complete(
            &self.client,
            self.provider_name(),
            &url,
            Some(self.api_key.as_str()),
            &request,
        )
        .await
    }

    fn provider_name(&self) -> &str {
        "openai"
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        let url = format!("{}/models", self.base_url);
        let response = self
            .client
            .get(&url)
            .header("Authorization", format!("Bearer {}", self.api_key))
            .send()
            .await
            .map_err(|e| map_http_error(self.provider_name(), e))?;

        if !response.status().is_success() {
            return Err(error_from_response(self.provider_name(), response).await);
        }

        #[derive(Deserialize)]
        struct ModelsResponse {
            data: Vec<ModelInfo>,
        }
        #[derive(Deserialize)]
        struct ModelInfo {
            id: String,
        }

        let models: ModelsResponse = response.json().await.map_err(|e| {
            ProviderError::malformed(
                self.provider_name(),
                format!("Failed to parse models response: {}", e),
            )
        })?;

        Ok(models.data.into_iter().map(|m| m.id).collect())
    }
}
