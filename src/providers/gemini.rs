//! Gemini `generateContent` adapter
//!
//! The system prompt travels as `systemInstruction`, the API key in the
//! `x-goog-api-key` header, and token counts come back in `usageMetadata`.

use super::{ChatAdapter, ChatRequest, Completion, ProviderResponse, post_json};
use crate::error::ProviderError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Instant;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    contents: [Content<'a>; 1],
    system_instruction: SystemInstruction<'a>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'static str,
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct SystemInstruction<'a> {
    parts: [Part<'a>; 1],
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    max_output_tokens: u32,
    temperature: f64,
}

/// Response body of `generateContent`
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentResponse {
    #[serde(default)]
    pub candidates: Vec<Candidate>,
    #[serde(default)]
    pub usage_metadata: Option<UsageMetadata>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct Candidate {
    #[serde(default)]
    pub content: Option<CandidateContent>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidateContent {
    #[serde(default)]
    pub parts: Vec<CandidatePart>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CandidatePart {
    #[serde(default)]
    pub text: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageMetadata {
    #[serde(default)]
    pub prompt_token_count: u64,
    #[serde(default)]
    pub candidates_token_count: u64,
    #[serde(default)]
    pub total_token_count: u64,
}

/// Adapter for the Gemini API
pub struct GeminiAdapter {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
}

impl GeminiAdapter {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: String) -> Self {
        Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
            api_key,
        }
    }
}

#[async_trait]
impl ChatAdapter for GeminiAdapter {
    async fn send(&self, request: ChatRequest) -> Result<Completion, ProviderError> {
        let body = GenerateContentRequest {
            contents: [Content {
                role: "user",
                parts: [Part {
                    text: &request.user,
                }],
            }],
            system_instruction: SystemInstruction {
                parts: [Part {
                    text: &request.system,
                }],
            },
            generation_config: GenerationConfig {
                max_output_tokens: request.max_tokens,
                temperature: request.temperature,
            },
        };

        let url = format!("{}/models/{}:generateContent", self.base_url, request.model);
        tracing::debug!(
            backend = %request.backend,
            model = %request.model,
            "Sending Gemini generateContent request"
        );

        let start = Instant::now();
        let builder = self
            .client
            .post(&url)
            .header("x-goog-api-key", &self.api_key)
            .json(&body);
        let response: GenerateContentResponse =
            post_json(builder, &request.backend, request.timeout).await?;
        let latency_ms = start.elapsed().as_millis() as u64;

        ProviderResponse::Gemini(response).into_completion(&request.backend, latency_ms)
    }
}
