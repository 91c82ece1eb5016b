//! Scripted adapters for tests
//!
//! Deterministic stand-ins for real providers: each backend gets a queue of
//! replies consumed in order, and every request is recorded for assertions.

use super::{
    ChatAdapter, ChatRequest, Completion, SearchAdapter, SearchHit, SearchResults, TokenUsage,
};
use crate::error::{ProviderError, SearchError};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

/// Latency reported by every mock completion
pub const MOCK_LATENCY_MS: u64 = 5;

/// A scripted chat adapter
///
/// Replies are keyed by backend identifier. When a backend's queue is empty the
/// default reply is used; with no default the call fails as malformed.
#[derive(Default)]
pub struct MockChatAdapter {
    scripts: Mutex<HashMap<String, VecDeque<Result<String, ProviderError>>>>,
    default_reply: Option<String>,
    requests: Mutex<Vec<ChatRequest>>,
}

impl MockChatAdapter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Reply with `text` whenever no scripted reply is queued
    pub fn with_default(mut self, text: impl Into<String>) -> Self {
        self.default_reply = Some(text.into());
        self
    }

    /// Queue a successful reply for a backend
    pub fn reply(self, backend: &str, text: impl Into<String>) -> Self {
        self.push(backend, Ok(text.into()));
        self
    }

    /// Queue a failure for a backend
    pub fn fail(self, backend: &str, error: ProviderError) -> Self {
        self.push(backend, Err(error));
        self
    }

    fn push(&self, backend: &str, reply: Result<String, ProviderError>) {
        if let Ok(mut scripts) = self.scripts.lock() {
            scripts.entry(backend.to_string()).or_default().push_back(reply);
        }
    }

    /// Every request received so far, in order
    pub fn requests(&self) -> Vec<ChatRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }

    /// Number of requests received for a backend
    pub fn calls_to(&self, backend: &str) -> usize {
        self.requests()
            .iter()
            .filter(|r| r.backend.as_str() == backend)
            .count()
    }
}

#[async_trait]
impl ChatAdapter for MockChatAdapter {
    async fn send(&self, request: ChatRequest) -> Result<Completion, ProviderError> {
        let backend = request.backend.to_string();
        if let Ok(mut requests) = self.requests.lock() {
            requests.push(request);
        }

        let scripted = self
            .scripts
            .lock()
            .ok()
            .and_then(|mut scripts| scripts.get_mut(&backend).and_then(VecDeque::pop_front));

        let text = match scripted {
            Some(reply) => reply?,
            None => self
                .default_reply
                .clone()
                .ok_or_else(|| ProviderError::MalformedResponse {
                    backend: backend.clone(),
                    reason: "MockChatAdapter: no scripted reply".to_string(),
                })?,
        };

        let completion_tokens = text.split_whitespace().count() as u64;
        Ok(Completion {
            text,
            latency_ms: MOCK_LATENCY_MS,
            usage: TokenUsage {
                prompt_tokens: 10,
                completion_tokens,
                total_tokens: 10 + completion_tokens,
            },
        })
    }
}

/// A scripted search adapter returning the same outcome for every query
pub struct MockSearchAdapter {
    outcome: Result<Vec<SearchHit>, SearchError>,
    calls: AtomicUsize,
}

impl MockSearchAdapter {
    /// Succeed with these hits
    pub fn with_hits(hits: Vec<SearchHit>) -> Self {
        Self {
            outcome: Ok(hits),
            calls: AtomicUsize::new(0),
        }
    }

    /// Fail every query
    pub fn failing(error: SearchError) -> Self {
        Self {
            outcome: Err(error),
            calls: AtomicUsize::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl SearchAdapter for MockSearchAdapter {
    async fn search(&self, query: &str, max_results: usize) -> Result<SearchResults, SearchError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let mut results = self.outcome.clone()?;
        results.truncate(max_results);
        Ok(SearchResults {
            query: query.to_string(),
            results,
        })
    }
}
