//! Web search through the Brave Search API
//!
//! Search never fails from the caller's point of view: any error is logged and
//! reported as an empty result list.

use std::time::Duration;

use reqwest::Client;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{debug, warn};

pub const BRAVE_SEARCH_URL: &str = "https://api.search.brave.com/res/v1/web/search";
const RESULT_COUNT: &str = "5";

#[derive(Debug, Error)]
pub enum SearchError {
    #[error("search is not configured")]
    NotConfigured,

    #[error("search request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("search API returned {status}: {body}")]
    Status { status: u16, body: String },
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub link: String,
    pub snippet: String,
}

#[derive(Debug, Deserialize)]
struct BraveResponse {
    #[serde(default)]
    web: Option<BraveWeb>,
}

#[derive(Debug, Deserialize)]
struct BraveWeb {
    #[serde(default)]
    results: Vec<BraveResult>,
}

#[derive(Debug, Deserialize)]
struct BraveResult {
    #[serde(default)]
    title: String,
    #[serde(default)]
    url: String,
    #[serde(default)]
    description: Option<String>,
}

impl From<BraveResult> for SearchResult {
    fn from(result: BraveResult) -> Self {
        Self {
            title: result.title,
            link: result.url,
            snippet: result.description.unwrap_or_default(),
        }
    }
}

/// Shared search client
#[derive(Clone)]
pub struct WebSearch {
    client: Client,
    api_key: Option<String>,
    endpoint: String,
}

impl WebSearch {
    pub fn new(api_key: Option<String>) -> Result<Self, SearchError> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(5))
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            api_key: api_key.filter(|k| !k.trim().is_empty()),
            endpoint: BRAVE_SEARCH_URL.to_string(),
        })
    }

    pub fn with_endpoint(mut self, endpoint: impl Into<String>) -> Self {
        self.endpoint = endpoint.into();
        self
    }

    pub fn is_configured(&self) -> bool {
        self.api_key.is_some()
    }

    /// Top results for `query`, empty on any failure
    pub async fn search(&self, query: &str) -> Vec<SearchResult> {
        match self.try_search(query).await {
            Ok(results) => {
                debug!(query, count = results.len(), "web search finished");
                results
            }
            Err(e) => {
                warn!(query, error = %e, "web search failed");
                Vec::new()
            }
        }
    }

    async fn try_search(&self, query: &str) -> Result<Vec<SearchResult>, SearchError> {
        let api_key = self.api_key.as_deref().ok_or(SearchError::NotConfigured)?;

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[("q", query), ("count", RESULT_COUNT)])
            .header("Accept", "application/json")
            .header("X-Subscription-Token", api_key)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(SearchError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let body: BraveResponse = response.json().await?;
        Ok(into_results(body))
    }
}

fn into_results(response: BraveResponse) -> Vec<SearchResult> {
    response
        .web
        .map(|web| web.results)
        .unwrap_or_default()
        .into_iter()
        .map(SearchResult::from)
        .collect()
}
