//! Single-backend inference endpoint
//!
//! Handles POST /infer: sends one prompt straight to a named backend,
//! bypassing classification, routing and verification.

use crate::error::AppError;
use crate::handlers::AppState;
use crate::handlers::run::validate_text;
use crate::middleware::RequestId;
use crate::pipeline::CallOverrides;
use crate::providers::TokenUsage;
use crate::router::BackendId;
use axum::{Extension, Json, extract::State, response::IntoResponse};
use serde::{Deserialize, Deserializer, Serialize};

/// Default system prompt when the caller does not supply one
const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful assistant.";

/// Inference request from client
///
/// Validation is enforced during deserialization. The backend identifier is
/// checked against configuration by the handler, since that needs state.
#[derive(Debug, Clone, Serialize)]
pub struct InferRequest {
    backend: BackendId,
    prompt: String,
    system: Option<String>,
    max_tokens: Option<u32>,
    temperature: Option<f64>,
}

impl InferRequest {
    pub fn backend(&self) -> &BackendId {
        &self.backend
    }

    pub fn prompt(&self) -> &str {
        &self.prompt
    }

    pub fn system(&self) -> Option<&str> {
        self.system.as_deref()
    }

    pub fn max_tokens(&self) -> Option<u32> {
        self.max_tokens
    }

    pub fn temperature(&self) -> Option<f64> {
        self.temperature
    }
}

impl<'de> Deserialize<'de> for InferRequest {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        #[derive(Deserialize)]
        struct RawInferRequest {
            backend: String,
            prompt: String,
            #[serde(default)]
            system: Option<String>,
            #[serde(default)]
            max_tokens: Option<u32>,
            #[serde(default)]
            temperature: Option<f64>,
        }

        let raw = RawInferRequest::deserialize(deserializer)?;

        if raw.backend.trim().is_empty() {
            return Err(serde::de::Error::custom("backend cannot be empty"));
        }
        validate_text("prompt", &raw.prompt).map_err(serde::de::Error::custom)?;

        if raw.max_tokens == Some(0) {
            return Err(serde::de::Error::custom("max_tokens must be greater than 0"));
        }
        if let Some(t) = raw.temperature {
            if !t.is_finite() || !(0.0..=2.0).contains(&t) {
                return Err(serde::de::Error::custom(format!(
                    "temperature must be between 0.0 and 2.0 (got {})",
                    t
                )));
            }
        }

        // A blank system prompt means "use the default"
        let system = raw.system.filter(|s| !s.trim().is_empty());

        Ok(InferRequest {
            backend: BackendId::from(raw.backend),
            prompt: raw.prompt,
            system,
            max_tokens: raw.max_tokens,
            temperature: raw.temperature,
        })
    }
}

/// One entry of the inference trace
#[derive(Debug, Clone, Serialize)]
pub struct InferTraceEntry {
    pub backend: BackendId,
    pub model: String,
    pub latency_ms: u64,
}

/// Inference response to client
#[derive(Debug, Clone, Serialize)]
pub struct InferResponse {
    #[serde(rename = "final")]
    pub final_text: String,
    pub backend: BackendId,
    pub latency_ms: u64,
    pub usage: TokenUsage,
    pub trace: Vec<InferTraceEntry>,
}

/// POST /infer handler
///
/// Unknown backends are rejected with 400. Provider failures are surfaced
/// directly: 504 on timeout, 502 otherwise.
pub async fn handler(
    State(state): State<AppState>,
    Extension(request_id): Extension<RequestId>,
    Json(request): Json<InferRequest>,
) -> Result<impl IntoResponse, AppError> {
    tracing::debug!(
        request_id = %request_id,
        backend = %request.backend(),
        prompt_length = request.prompt().chars().count(),
        "Received infer request"
    );

    let model = state
        .config()
        .backend(request.backend())
        .map(|b| b.model().to_string())
        .unwrap_or_default();

    let overrides = CallOverrides {
        max_tokens: request.max_tokens(),
        temperature: request.temperature(),
        ..CallOverrides::default()
    };

    let completion = state
        .pipeline()
        .infer(
            request.backend(),
            request.system().unwrap_or(DEFAULT_SYSTEM_PROMPT),
            request.prompt(),
            overrides,
        )
        .await
        .inspect_err(|e| {
            tracing::warn!(
                request_id = %request_id,
                backend = %request.backend(),
                error = %e,
                "Infer request failed"
            );
        })?;

    tracing::info!(
        request_id = %request_id,
        backend = %request.backend(),
        latency_ms = completion.latency_ms,
        "Infer request completed"
    );

    Ok(Json(InferResponse {
        final_text: completion.text,
        backend: request.backend().clone(),
        latency_ms: completion.latency_ms,
        usage: completion.usage,
        trace: vec![InferTraceEntry {
            backend: request.backend().clone(),
            model,
            latency_ms: completion.latency_ms,
        }],
    }))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_infer_request_minimal() {
        let request: InferRequest =
            serde_json::from_str(r#"{"backend": "gemini", "prompt": "Hello"}"#).unwrap();
        assert_eq!(request.backend().as_str(), "gemini");
        assert_eq!(request.prompt(), "Hello");
        assert!(request.system().is_none());
        assert!(request.max_tokens().is_none());
        assert!(request.temperature().is_none());
    }

    #[test]
    fn test_infer_request_blank_system_is_dropped() {
        let request: InferRequest = serde_json::from_str(
            r#"{"backend": "gemini", "prompt": "Hello", "system": "  "}"#,
        )
        .unwrap();
        assert!(request.system().is_none());
    }

    #[test]
    fn test_infer_request_rejects_empty_prompt() {
        let result: Result<InferRequest, _> =
            serde_json::from_str(r#"{"backend": "gemini", "prompt": ""}"#);
        assert!(result.unwrap_err().to_string().contains("prompt cannot be empty"));
    }

    #[test]
    fn test_infer_request_rejects_zero_max_tokens() {
        let result: Result<InferRequest, _> =
            serde_json::from_str(r#"{"backend": "gemini", "prompt": "Hi", "max_tokens": 0}"#);
        assert!(result.is_err());
    }

    #[test]
    fn test_infer_request_rejects_out_of_range_temperature() {
        let result: Result<InferRequest, _> =
            serde_json::from_str(r#"{"backend": "gemini", "prompt": "Hi", "temperature": 2.5}"#);
        assert!(result.unwrap_err().to_string().contains("temperature"));
    }

    #[test]
    fn test_infer_response_serializes_final() {
        let response = InferResponse {
            final_text: "Hi there".to_string(),
            backend: BackendId::from("gemini"),
            latency_ms: 12,
            usage: TokenUsage::default(),
            trace: vec![],
        };
        let json = serde_json::to_value(&response).unwrap();
        assert_eq!(json["final"], "Hi there");
        assert_eq!(json["backend"], "gemini");
        assert!(json.get("final_text").is_none());
    }
}
