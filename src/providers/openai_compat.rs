//! OpenAI-compatible chat completions adapter
//!
//! Works with any provider exposing `POST {base_url}/chat/completions` with
//! bearer authentication (DigitalOcean inference, Perplexity chat, local
//! servers).

use super::{ChatAdapter, ChatRequest, Completion, ProviderResponse, post_json};
use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Serialize)]
struct ChatCompletionRequest<'a> {
    model: &'a str,
    messages: [Message<'a>; 2],
    max_tokens: u32,
    temperature: f64,
}

#[derive(Debug, Serialize)]
struct Message<'a> {
    role: &'static str,
    content: &'a str,
}

/// Response body of `/chat/completions`
#[derive(Debug, Clone, Deserialize)]
pub struct ChatCompletionResponse {
    #[serde(default)]
    pub choices: Vec<Choice>,
    #[serde(default)]
    pub usage: Option<Usage>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Choice {
    pub message: ChoiceMessage,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChoiceMessage {
    #[serde(default)]
    pub content: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Usage {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
}

/// Adapter for OpenAI-compatible providers
pub struct OpenAiCompatibleAdapter {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
}

impl OpenAiCompatibleAdapter {
    /// Create an adapter for `{base_url}/chat/completions`
    pub fn new(client: reqwest::Client, base_url: &str, api_key: String) -> Self {
        Self {
            client,
            endpoint: format!("{}/chat/completions", base_url.trim_end_matches('/')),
            api_key,
        }
    }
}

#[async_trait]
impl ChatAdapter for OpenAiCompatibleAdapter {
    async fn send(&self, request: ChatRequest) -> Result<Completion, ProviderError> {
        let body = ChatCompletionRequest {
            model: &request.model,
            messages: [
                Message {
                    role: "system",
                    content: &request.system,
                },
                Message {
                    role: "user",
                    content: &request.user,
                },
            ],
            max_tokens: request.max_tokens,
            temperature: request.temperature,
        };

        tracing::debug!(
            backend = %request.backend,
            model = %request.model,
            endpoint = %self.endpoint,
            "Sending chat completion request"
        );

        let start = Instant::now();
        let builder = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .json(&body);
        let response: ChatCompletionResponse =
            post_json(builder, &request.backend, request.timeout).await?;
        let latency_ms = start.elapsed().as_millis() as u64;

        ProviderResponse::OpenAi(response).into_completion(&request.backend, latency_ms)
    }
}
