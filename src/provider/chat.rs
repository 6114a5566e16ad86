//! OpenAI-compatible chat completion wire format, shared by the Ollama and
//! OpenAI clients.

use super::{error_from_response, map_http_error, GenerationOptions};
use crate::error::ProviderError;
use reqwest::Client;
use serde::{Deserialize, Serialize};

#[derive(Serialize)]
pub(crate) struct ChatCompletionRequest<'a> {
    pub model: &'a str,
    pub messages: Vec<ChatMessage<'a>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop: Option<&'a [String]>,
    pub stream: bool,
}

#[derive(Serialize)]
pub(crate) struct ChatMessage<'a> {
    pub role: &'static str,
    pub content: &'a str,
}

#[derive(Deserialize)]
pub(crate) struct ChatCompletionResponse {
    pub choices: Vec<Choice>,
}

#[derive(Deserialize)]
pub(crate) struct Choice {
    pub message: ResponseMessage,
}

#[derive(Deserialize)]
pub(crate) struct ResponseMessage {
    #[serde(default)]
    pub content: Option<String>,
}

impl<'a> ChatCompletionRequest<'a> {
    /// Single user turn carrying the whole prompt
    pub fn single_prompt(model: &'a str, prompt: &'a str, options: &'a GenerationOptions) -> Self {
        Self {
            model,
            messages: vec![ChatMessage {
                role: "user",
                content: prompt,
            }],
            temperature: options.temperature,
            max_tokens: options.max_tokens,
            top_p: options.top_p,
            stop: options.stop.as_deref(),
            stream: false,
        }
    }
}

/// Pull the first choice's text out of a decoded completion
pub(crate) fn first_choice_text(
    provider: &str,
    completion: ChatCompletionResponse,
) -> Result<String, ProviderError> {
    completion
        .choices
        .into_iter()
        .next()
        .and_then(|choice| choice.message.content)
        .ok_or_else(|| ProviderError::malformed(provider, "No choices in response"))
}

/// POST a chat completion and return the generated text
pub(crate) async fn complete(
    client: &Client,
    provider: &str,
    url: &str,
    bearer: Option<&str>,
    request: &ChatCompletionRequest<'_>,
) -> Result<String, ProviderError> {
    let mut request_builder = client
        .post(url)
        .header("Content-Type", "application/json");

    if let Some(api_key) = bearer {
        request_builder = request_builder.header("Authorization", format!("Bearer {}", api_key));
    }

    let response = request_builder
        .json(request)
        .send()
        .await
        .map_err(|e| map_http_error(provider, e))?;

    if !response.status().is_success() {
        return Err(error_from_response(provider, response).await);
    }

    let completion: ChatCompletionResponse = response
        .json()
        .await
        .map_err(|e| ProviderError::malformed(provider, format!("Failed to parse response: {}", e)))?;

    first_choice_text(provider, completion)
}
