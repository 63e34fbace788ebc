//! Tavily Client
//!
//! Issues `POST {base_url}/search` with a bearer credential and maps the
//! `results` array into [`Source`] values.
//!
//! ## Request
//!
//! ```json
//! {"query": "...", "search_depth": "advanced", "include_domains": [],
//!  "exclude_domains": [], "max_results": 10}
//! ```
//!
//! A non-2xx response surfaces its body text verbatim in
//! [`ResearchError::SearchApi`]; connection failures and timeouts are
//! [`ResearchError::Transport`].

use super::{make_snippet, SearchGateway};
use crate::config::SearchConfig;
use crate::models::Source;
use crate::types::{AppError, ResearchError, ResearchResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

const SEARCH_DEPTH: &str = "advanced";

#[derive(Debug, Serialize)]
struct TavilyRequest<'a> {
    query: &'a str,
    search_depth: &'a str,
    include_domains: Vec<String>,
    exclude_domains: Vec<String>,
    max_results: usize,
}

/// Response body returned by the search endpoint
#[derive(Debug, Clone, Deserialize)]
pub struct TavilyResponse {
    #[serde(default)]
    pub results: Vec<TavilyResult>,
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub search_id: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TavilyResult {
    pub title: String,
    pub url: String,
    #[serde(default)]
    pub content: String,
    #[serde(default)]
    pub score: f64,
}

impl From<TavilyResult> for Source {
    fn from(result: TavilyResult) -> Self {
        Source {
            id: uuid::Uuid::new_v4().to_string(),
            snippet: make_snippet(&result.content),
            title: result.title,
            url: result.url,
            relevance_score: result.score,
        }
    }
}

pub struct TavilyClient {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    max_results: usize,
}

impl TavilyClient {
    /// Build a client from config. Fails when no API key is configured.
    pub fn from_config(config: &SearchConfig) -> Result<Self, AppError> {
        if !config.is_configured() {
            return Err(AppError::Config(
                "TAVILY_API_KEY is not set; the search API needs a credential".to_string(),
            ));
        }

        let client = reqwest::Client::builder()
            .timeout(config.timeout())
            .user_agent(concat!("deep-research/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| AppError::Config(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            max_results: config.max_results,
        })
    }

    fn endpoint(&self) -> String {
        format!("{}/search", self.base_url)
    }

    async fn send(&self, query: &str) -> ResearchResult<TavilyResponse> {
        let body = TavilyRequest {
            query,
            search_depth: SEARCH_DEPTH,
            include_domains: Vec::new(),
            exclude_domains: Vec::new(),
            max_results: self.max_results,
        };

        let response = self
            .client
            .post(self.endpoint())
            .bearer_auth(&self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            warn!(status = status.as_u16(), "Search API returned an error status");
            return Err(ResearchError::SearchApi {
                status: status.as_u16(),
                body,
            });
        }

        let bytes = response.bytes().await?;
        serde_json::from_slice::<TavilyResponse>(&bytes).map_err(|e| {
            ResearchError::Unknown(Some(format!("Failed to parse search response: {}", e)))
        })
    }
}

#[async_trait]
impl SearchGateway for TavilyClient {
    fn name(&self) -> &str {
        "Tavily"
    }

    async fn search(&self, query: &str, cancel: &CancellationToken) -> ResearchResult<Vec<Source>> {
        info!(query = %query, "Searching via Tavily");

        let response = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ResearchError::Cancelled),
            response = self.send(query) => response?,
        };

        debug!(
            search_id = response.search_id.as_deref().unwrap_or("-"),
            "Raw search response received"
        );

        let sources: Vec<Source> = response
            .results
            .into_iter()
            .take(self.max_results)
            .map(Source::from)
            .collect();

        info!(count = sources.len(), "Tavily search completed");
        Ok(sources)
    }
}
