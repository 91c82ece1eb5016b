//! Error types for Pentamind
//!
//! `AppError` is the only error that can reach a caller. Adapter-level failures
//! (`ProviderError`, `SearchError`) are absorbed by the pipeline stages and only
//! surface through the single-backend `/infer` endpoint.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

/// Failure kinds reported by a chat-completion adapter
///
/// Every variant is recoverable inside the pipeline: the Executor substitutes the
/// fallback backend, the Classifier substitutes a default classification.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProviderError {
    #[error("Request to {backend} timed out after {timeout_seconds} seconds")]
    Timeout {
        backend: String,
        timeout_seconds: u64,
    },

    #[error("{backend} returned HTTP {status}: {body}")]
    Http {
        backend: String,
        status: u16,
        body: String,
    },

    #[error("Request to {backend} failed: {reason}")]
    Transport { backend: String, reason: String },

    #[error("Malformed response from {backend}: {reason}")]
    MalformedResponse { backend: String, reason: String },

    #[error("Empty content in response from {backend}")]
    EmptyContent { backend: String },

    #[error("Provider for {backend} is not configured: {reason}")]
    ConfigMissing { backend: String, reason: String },
}

impl ProviderError {
    /// Short, stable label for metrics and trace payloads
    pub fn kind(&self) -> &'static str {
        match self {
            Self::Timeout { .. } => "timeout",
            Self::Http { .. } => "http_error",
            Self::Transport { .. } => "transport_error",
            Self::MalformedResponse { .. } => "malformed_response",
            Self::EmptyContent { .. } => "empty_content",
            Self::ConfigMissing { .. } => "config_missing",
        }
    }

    /// Returns true for transient failures (timeouts, network, 5xx/429)
    ///
    /// Configuration problems and well-formed but unusable responses are systemic.
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Timeout { .. } | Self::Transport { .. } => true,
            Self::Http { status, .. } => *status == 429 || *status >= 500,
            Self::MalformedResponse { .. }
            | Self::EmptyContent { .. }
            | Self::ConfigMissing { .. } => false,
        }
    }
}

/// Failure kinds reported by the search adapter
///
/// Always degrades to "no augmentation" inside the Executor.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SearchError {
    #[error("Search provider is not configured: {0}")]
    ConfigMissing(String),

    #[error("Search request failed: {0}")]
    RequestFailed(String),
}

/// Main error type for the application
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Failed to read config file {path}: {source}")]
    ConfigFileRead {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {source}")]
    ConfigParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },

    #[error("Invalid configuration in {path}: {reason}")]
    ConfigValidationFailed { path: String, reason: String },

    #[error("Missing credential: environment variable {env_var} for provider '{provider}' is not set")]
    MissingCredential { provider: String, env_var: String },

    #[error("Invalid request: {0}")]
    Validation(String),

    /// Message lists the available backends
    #[error("{0}")]
    UnknownBackend(String),

    #[error(transparent)]
    Backend(#[from] ProviderError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            Self::Validation(_) | Self::UnknownBackend(_) => StatusCode::BAD_REQUEST,
            Self::Config(_)
            | Self::ConfigFileRead { .. }
            | Self::ConfigParseFailed { .. }
            | Self::ConfigValidationFailed { .. }
            | Self::MissingCredential { .. } => StatusCode::INTERNAL_SERVER_ERROR,
            Self::Backend(ProviderError::Timeout { .. }) => StatusCode::GATEWAY_TIMEOUT,
            Self::Backend(ProviderError::ConfigMissing { .. }) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
            Self::Backend(_) => StatusCode::BAD_GATEWAY,
            Self::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = Json(serde_json::json!({
            "error": self.to_string(),
        }));

        (status, body).into_response()
    }
}

/// Convenience type alias for Results
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_error_creates() {
        let err = AppError::Config("test error".to_string());
        assert_eq!(err.to_string(), "Configuration error: test error");
    }

    #[test]
    fn test_missing_credential_names_env_var() {
        let err = AppError::MissingCredential {
            provider: "digitalocean".to_string(),
            env_var: "MODEL_ACCESS_KEY".to_string(),
        };
        let msg = err.to_string();
        assert!(msg.contains("MODEL_ACCESS_KEY"));
        assert!(msg.contains("digitalocean"));
    }

    #[test]
    fn test_backend_error_is_transparent() {
        let err = AppError::from(ProviderError::EmptyContent {
            backend: "llama".to_string(),
        });
        assert_eq!(err.to_string(), "Empty content in response from llama");
    }

    #[test]
    fn test_validation_error_response_status() {
        let response = AppError::Validation("bad".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_missing_credential_response_status() {
        let response = AppError::MissingCredential {
            provider: "p".to_string(),
            env_var: "K".to_string(),
        }
        .into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_backend_timeout_maps_to_gateway_timeout() {
        let response = AppError::Backend(ProviderError::Timeout {
            backend: "b".to_string(),
            timeout_seconds: 60,
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::GATEWAY_TIMEOUT);
    }

    #[test]
    fn test_backend_http_error_maps_to_bad_gateway() {
        let response = AppError::Backend(ProviderError::Http {
            backend: "b".to_string(),
            status: 500,
            body: "oops".to_string(),
        })
        .into_response();
        assert_eq!(response.status(), StatusCode::BAD_GATEWAY);
    }

    #[test]
    fn test_provider_error_kinds() {
        let timeout = ProviderError::Timeout {
            backend: "b".to_string(),
            timeout_seconds: 1,
        };
        assert_eq!(timeout.kind(), "timeout");
        assert!(timeout.is_retryable());

        let empty = ProviderError::EmptyContent {
            backend: "b".to_string(),
        };
        assert_eq!(empty.kind(), "empty_content");
        assert!(!empty.is_retryable());
    }

    #[test]
    fn test_http_error_retryability_depends_on_status() {
        let server = ProviderError::Http {
            backend: "b".to_string(),
            status: 503,
            body: String::new(),
        };
        let client = ProviderError::Http {
            backend: "b".to_string(),
            status: 401,
            body: String::new(),
        };
        let throttled = ProviderError::Http {
            backend: "b".to_string(),
            status: 429,
            body: String::new(),
        };
        assert!(server.is_retryable());
        assert!(!client.is_retryable());
        assert!(throttled.is_retryable());
    }
}
