//! Perplexity Search API adapter

use super::{SearchAdapter, SearchHit, SearchResults};
use crate::error::SearchError;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Page budget requested per result
const MAX_TOKENS_PER_PAGE: u32 = 1024;

#[derive(Debug, Serialize)]
struct SearchRequest<'a> {
    query: &'a str,
    max_results: usize,
    max_tokens_per_page: u32,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    results: Vec<SearchHit>,
}

/// Adapter for `POST {base_url}/search`
pub struct PerplexitySearch {
    client: reqwest::Client,
    endpoint: String,
    api_key: String,
    timeout: Duration,
}

impl PerplexitySearch {
    pub fn new(client: reqwest::Client, base_url: &str, api_key: String, timeout: Duration) -> Self {
        Self {
            client,
            endpoint: format!("{}/search", base_url.trim_end_matches('/')),
            api_key,
            timeout,
        }
    }
}

#[async_trait]
impl SearchAdapter for PerplexitySearch {
    async fn search(&self, query: &str, max_results: usize) -> Result<SearchResults, SearchError> {
        let body = SearchRequest {
            query,
            max_results,
            max_tokens_per_page: MAX_TOKENS_PER_PAGE,
        };

        let response = self
            .client
            .post(&self.endpoint)
            .bearer_auth(&self.api_key)
            .timeout(self.timeout)
            .json(&body)
            .send()
            .await
            .map_err(|e| SearchError::RequestFailed(e.without_url().to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::RequestFailed(format!(
                "HTTP {}: {}",
                status.as_u16(),
                body.chars().take(200).collect::<String>()
            )));
        }

        let parsed: SearchResponse = response
            .json()
            .await
            .map_err(|e| {
                SearchError::RequestFailed(format!("invalid response body: {}", e.without_url()))
            })?;

        let mut results = parsed.results;
        results.truncate(max_results);
        tracing::debug!(result_count = results.len(), "Search completed");

        Ok(SearchResults {
            query: query.to_string(),
            results,
        })
    }
}
