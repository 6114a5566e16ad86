//! Hugging Face Inference API client (hosted models).
//!
//! The Inference API has no single request/response schema: text-generation,
//! instruct/chat and conversational models each expect a different payload and
//! answer in a different shape. Payload selection is keyed on the model name.

use super::{build_provider_http_client, error_from_response, map_http_error};
use super::{GenerationOptions, TextGenerator};
use crate::error::{ApiError, ProviderError, ProviderErrorKind};
use async_trait::async_trait;
use reqwest::Client;
use serde_json::{json, Value};
use std::time::Duration;

const DEFAULT_HF_URL: &str = "https://api-inference.huggingface.co";
const DEFAULT_MAX_LENGTH: u32 = 512;
const PROVIDER: &str = "huggingface";

/// Hugging Face provider client
pub struct HuggingFaceClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl HuggingFaceClient {
    pub fn new(
        api_key: String,
        base_url: Option<String>,
        request_timeout: Duration,
    ) -> Result<Self, ApiError> {
        let client = build_provider_http_client(request_timeout)?;
        let base_url = base_url
            .unwrap_or_else(|| DEFAULT_HF_URL.to_string())
            .trim_end_matches('/')
            .to_string();

        Ok(Self {
            client,
            api_key,
            base_url,
        })
    }

    pub fn model_url(&self, model: &str) -> String {
        format!("{}/models/{}", self.base_url, model)
    }
}

/// Request body for the given model family
pub fn build_payload(model: &str, prompt: &str, options: &GenerationOptions) -> Value {
    let model = model.to_ascii_lowercase();
    let max_length = options.max_tokens.unwrap_or(DEFAULT_MAX_LENGTH);
    let temperature = options.temperature.unwrap_or(0.7);

    if model.contains("instruct") || model.contains("chat") {
        let mut parameters = json!({
            "max_new_tokens": max_length,
            "temperature": temperature,
            "return_full_text": false,
            "do_sample": true,
        });
        if let Some(top_p) = options.top_p {
            parameters["top_p"] = json!(top_p);
        }
        if let Some(stop) = &options.stop {
            parameters["stop"] = json!(stop);
        }
        json!({ "inputs": prompt, "parameters": parameters })
    } else if model.contains("dialogpt") {
        json!({
            "inputs": {
                "past_user_inputs": [],
                "generated_responses": [],
                "text": prompt,
            },
            "parameters": {
                "max_length": max_length,
                "temperature": temperature,
            },
        })
    } else {
        json!({
            "inputs": prompt,
            "parameters": {
                "max_length": max_length,
                "temperature": temperature,
                "num_return_sequences": 1,
            },
        })
    }
}

/// Extract generated text from any of the known response shapes
pub fn parse_response(body: &Value, prompt: &str) -> Result<String, ProviderError> {
    let text = match body {
        Value::Array(items) => match items.first() {
            Some(Value::Object(item)) => item
                .get("generated_text")
                .and_then(Value::as_str)
                .map(str::to_string)
                .or_else(|| last_generated_response(item.get("conversation"))),
            Some(Value::String(text)) => Some(text.clone()),
            _ => None,
        },
        Value::Object(object) => object
            .get("generated_text")
            .and_then(Value::as_str)
            .map(str::to_string)
            .or_else(|| last_generated_response(object.get("conversation"))),
        _ => None,
    };

    let text = text.ok_or_else(|| {
        ProviderError::malformed(PROVIDER, format!("Unexpected response format: {}", body))
    })?;

    // Text-generation models echo the prompt unless return_full_text is false
    Ok(match text.strip_prefix(prompt) {
        Some(rest) => rest.trim().to_string(),
        None => text,
    })
}

fn last_generated_response(conversation: Option<&Value>) -> Option<String> {
    conversation?
        .get("generated_responses")?
        .as_array()?
        .last()?
        .as_str()
        .map(str::to_string)
}

#[async_trait]
impl TextGenerator for HuggingFaceClient {
    async fn generate(
        &self,
        prompt: &str,
        model: &str,
        options: &GenerationOptions,
    ) -> Result<String, ProviderError> {
        let payload = build_payload(model, prompt, options);
        tracing::debug!(
            provider = PROVIDER,
            model,
            prompt_len = prompt.len(),
            "Calling inference API"
        );

        let response = self
            .client
            .post(self.model_url(model))
            .header("Authorization", format!("Bearer {}", self.api_key))
            .header("Content-Type", "application/json")
            .json(&payload)
            .send()
            .await
            .map_err(|e| map_http_error(PROVIDER, e))?;

        if !response.status().is_success() {
            // 503 means the model is still loading; classified as unavailable
            // so the retry layer picks it up.
            return Err(error_from_response(PROVIDER, response).await);
        }

        let body: Value = response.json().await.map_err(|e| {
            ProviderError::malformed(PROVIDER, format!("Failed to parse response: {}", e))
        })?;

        parse_response(&body, prompt)
    }

    fn provider_name(&self) -> &str {
        PROVIDER
    }

    async fn list_models(&self) -> Result<Vec<String>, ProviderError> {
        Err(ProviderError::new(
            ProviderErrorKind::NotFound,
            PROVIDER,
            "The Inference API does not provide a models list endpoint",
        ))
    }
}
