//! Protocol adapters for backend and search providers
//!
//! Each provider speaks its own wire format. Adapters hide that behind two
//! traits ([`ChatAdapter`], [`SearchAdapter`]) and normalize every chat response
//! through [`ProviderResponse`] into a [`Completion`].

pub mod gemini;
pub mod mock;
pub mod openai_compat;
pub mod perplexity;

pub use gemini::GeminiAdapter;
pub use mock::{MockChatAdapter, MockSearchAdapter};
pub use openai_compat::OpenAiCompatibleAdapter;
pub use perplexity::PerplexitySearch;

use crate::config::{BackendConfig, Config, ProviderKind};
use crate::error::{ProviderError, SearchError};
use crate::router::BackendId;
use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

/// Longest provider error body kept in a `ProviderError::Http`
const MAX_ERROR_BODY_CHARS: usize = 500;

/// One chat-completion call
#[derive(Debug, Clone)]
pub struct ChatRequest {
    /// Backend label used in errors, logs and metrics
    pub backend: BackendId,
    pub model: String,
    pub system: String,
    pub user: String,
    pub max_tokens: u32,
    pub temperature: f64,
    pub timeout: Duration,
}

/// Token accounting reported by the provider
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct TokenUsage {
    pub prompt_tokens: u64,
    pub completion_tokens: u64,
    pub total_tokens: u64,
}

/// Normalized result of a chat-completion call
#[derive(Debug, Clone, PartialEq)]
pub struct Completion {
    pub text: String,
    pub latency_ms: u64,
    pub usage: TokenUsage,
}

/// A chat-completion protocol adapter
#[async_trait]
pub trait ChatAdapter: Send + Sync {
    /// Send one request and wait for the full completion
    ///
    /// # Errors
    /// Returns a `ProviderError` on timeout, non-success HTTP status, network
    /// failure, an undecodable body or an empty completion.
    async fn send(&self, request: ChatRequest) -> Result<Completion, ProviderError>;
}

/// One web search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchHit {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub snippet: String,
}

/// Results of one search query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SearchResults {
    pub query: String,
    pub results: Vec<SearchHit>,
}

/// A web search protocol adapter
#[async_trait]
pub trait SearchAdapter: Send + Sync {
    async fn search(&self, query: &str, max_results: usize) -> Result<SearchResults, SearchError>;
}

/// Decoded provider response, one variant per wire format
#[derive(Debug, Clone)]
pub enum ProviderResponse {
    OpenAi(openai_compat::ChatCompletionResponse),
    Gemini(gemini::GenerateContentResponse),
}

impl ProviderResponse {
    /// Normalize into a `Completion`
    ///
    /// # Errors
    /// `MalformedResponse` when the expected structure is missing, `EmptyContent`
    /// when the completion text is blank.
    pub fn into_completion(
        self,
        backend: &BackendId,
        latency_ms: u64,
    ) -> Result<Completion, ProviderError> {
        let (text, usage) = match self {
            Self::OpenAi(response) => {
                let choice = response.choices.into_iter().next().ok_or_else(|| {
                    ProviderError::MalformedResponse {
                        backend: backend.to_string(),
                        reason: "response has no choices".to_string(),
                    }
                })?;
                let usage = response
                    .usage
                    .map(|u| TokenUsage {
                        prompt_tokens: u.prompt_tokens,
                        completion_tokens: u.completion_tokens,
                        total_tokens: u.total_tokens,
                    })
                    .unwrap_or_default();
                (choice.message.content.unwrap_or_default(), usage)
            }
            Self::Gemini(response) => {
                let candidate = response.candidates.into_iter().next().ok_or_else(|| {
                    ProviderError::MalformedResponse {
                        backend: backend.to_string(),
                        reason: "response has no candidates".to_string(),
                    }
                })?;
                let text = candidate
                    .content
                    .map(|content| {
                        content
                            .parts
                            .into_iter()
                            .filter_map(|part| part.text)
                            .collect::<String>()
                    })
                    .unwrap_or_default();
                let usage = response
                    .usage_metadata
                    .map(|u| TokenUsage {
                        prompt_tokens: u.prompt_token_count,
                        completion_tokens: u.candidates_token_count,
                        total_tokens: u.total_token_count,
                    })
                    .unwrap_or_default();
                (text, usage)
            }
        };

        if text.trim().is_empty() {
            return Err(ProviderError::EmptyContent {
                backend: backend.to_string(),
            });
        }

        Ok(Completion {
            text,
            latency_ms,
            usage,
        })
    }
}

/// Send a prepared request and decode a JSON body, bounded by `timeout`
///
/// Shared by the HTTP adapters so every provider maps failures the same way.
/// Transport errors drop the request URL before they become text.
pub(crate) async fn post_json<T: DeserializeOwned>(
    builder: reqwest::RequestBuilder,
    backend: &BackendId,
    timeout: Duration,
) -> Result<T, ProviderError> {
    let call = async {
        let response = builder.send().await.map_err(|e| {
            if e.is_timeout() {
                ProviderError::Timeout {
                    backend: backend.to_string(),
                    timeout_seconds: timeout.as_secs(),
                }
            } else {
                ProviderError::Transport {
                    backend: backend.to_string(),
                    reason: e.without_url().to_string(),
                }
            }
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(ProviderError::Http {
                backend: backend.to_string(),
                status: status.as_u16(),
                body: body.chars().take(MAX_ERROR_BODY_CHARS).collect(),
            });
        }

        let bytes = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Transport {
                backend: backend.to_string(),
                reason: e.without_url().to_string(),
            })?;

        serde_json::from_slice::<T>(&bytes).map_err(|e| ProviderError::MalformedResponse {
            backend: backend.to_string(),
            reason: e.to_string(),
        })
    };

    match tokio::time::timeout(timeout, call).await {
        Ok(result) => result,
        Err(_) => Err(ProviderError::Timeout {
            backend: backend.to_string(),
            timeout_seconds: timeout.as_secs(),
        }),
    }
}

/// Adapters keyed by provider name
///
/// Providers whose credential is missing get no adapter. Calls routed to them
/// fail with `ProviderError::ConfigMissing` and are handled like any other
/// backend failure.
#[derive(Clone, Default)]
pub struct ProviderRegistry {
    adapters: HashMap<String, Arc<dyn ChatAdapter>>,
    /// Provider name → environment variable that was missing
    missing: HashMap<String, String>,
    search: Option<Arc<dyn SearchAdapter>>,
    search_missing: Option<String>,
}

impl std::fmt::Debug for ProviderRegistry {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let mut providers: Vec<_> = self.adapters.keys().collect();
        providers.sort();
        f.debug_struct("ProviderRegistry")
            .field("providers", &providers)
            .field("missing", &self.missing)
            .field("search", &self.search.is_some())
            .finish()
    }
}

impl ProviderRegistry {
    /// Create an empty registry (tests register adapters explicitly)
    pub fn new() -> Self {
        Self::default()
    }

    /// Build HTTP adapters for every configured provider
    ///
    /// Credentials are read from the environment here. A provider without a key
    /// is recorded as missing rather than failing the whole registry.
    pub fn from_config(config: &Config) -> Self {
        let client = reqwest::Client::new();
        let mut registry = Self::new();

        for (name, provider) in &config.providers {
            let Some(api_key) = provider.api_key() else {
                tracing::warn!(
                    provider = %name,
                    env_var = %provider.api_key_env(),
                    "Provider credential not set, backends on this provider are unavailable"
                );
                registry
                    .missing
                    .insert(name.clone(), provider.api_key_env().to_string());
                continue;
            };

            let adapter: Arc<dyn ChatAdapter> = match provider.kind() {
                ProviderKind::OpenaiCompatible => Arc::new(OpenAiCompatibleAdapter::new(
                    client.clone(),
                    provider.base_url(),
                    api_key,
                )),
                ProviderKind::Gemini => Arc::new(GeminiAdapter::new(
                    client.clone(),
                    provider.base_url(),
                    api_key,
                )),
            };
            registry.adapters.insert(name.clone(), adapter);
        }

        if let Some(search) = &config.search {
            match search.api_key() {
                Some(api_key) => {
                    registry.search = Some(Arc::new(PerplexitySearch::new(
                        client.clone(),
                        search.base_url(),
                        api_key,
                        config.timeouts.search(),
                    )));
                }
                None => {
                    tracing::warn!(
                        env_var = %search.api_key_env(),
                        "Search credential not set, research runs will not be augmented"
                    );
                    registry.search_missing = Some(search.api_key_env().to_string());
                }
            }
        }

        registry
    }

    /// Register (or replace) the adapter for a provider
    pub fn with_adapter(mut self, provider: impl Into<String>, adapter: Arc<dyn ChatAdapter>) -> Self {
        let provider = provider.into();
        self.missing.remove(&provider);
        self.adapters.insert(provider, adapter);
        self
    }

    /// Register the search adapter
    pub fn with_search(mut self, adapter: Arc<dyn SearchAdapter>) -> Self {
        self.search = Some(adapter);
        self.search_missing = None;
        self
    }

    /// Whether a provider has an adapter (its credential was present)
    pub fn has_provider(&self, provider: &str) -> bool {
        self.adapters.contains_key(provider)
    }

    /// Environment variable recorded as missing for a provider
    pub fn missing_env_var(&self, provider: &str) -> Option<&str> {
        self.missing.get(provider).map(String::as_str)
    }

    /// Resolve the adapter for a backend
    ///
    /// # Errors
    /// `ConfigMissing` when the backend's provider has no adapter.
    pub fn adapter_for(
        &self,
        backend: &BackendConfig,
    ) -> Result<Arc<dyn ChatAdapter>, ProviderError> {
        self.adapters
            .get(backend.provider())
            .cloned()
            .ok_or_else(|| ProviderError::ConfigMissing {
                backend: backend.id().to_string(),
                reason: match self.missing.get(backend.provider()) {
                    Some(env_var) => format!("environment variable {} is not set", env_var),
                    None => format!("provider '{}' has no adapter", backend.provider()),
                },
            })
    }

    /// Resolve the search adapter
    ///
    /// # Errors
    /// `SearchError::ConfigMissing` when search is not configured or its key is missing.
    pub fn search(&self) -> Result<Arc<dyn SearchAdapter>, SearchError> {
        match (&self.search, &self.search_missing) {
            (Some(adapter), _) => Ok(adapter.clone()),
            (None, Some(env_var)) => Err(SearchError::ConfigMissing(format!(
                "environment variable {} is not set",
                env_var
            ))),
            (None, None) => Err(SearchError::ConfigMissing(
                "no [search] section configured".to_string(),
            )),
        }
    }
}
