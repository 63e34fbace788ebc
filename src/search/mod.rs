//! Search Module
//!
//! The Search Gateway: one HTTP request to the external search API per query,
//! mapped into the session's normalized `Source` list.
//!
//! The pipeline only sees the [`SearchGateway`] trait, so tests and
//! alternative providers can stand in for [`TavilyClient`].

pub mod tavily;

pub use tavily::{TavilyClient, TavilyResponse, TavilyResult};

use crate::models::Source;
use crate::types::ResearchResult;
use async_trait::async_trait;
use tokio_util::sync::CancellationToken;

/// Snippet length cap, in characters, before the ellipsis marker.
pub const SNIPPET_MAX_CHARS: usize = 200;

#[async_trait]
pub trait SearchGateway: Send + Sync {
    /// Provider name for logs
    fn name(&self) -> &str;

    /// Run one search. A single attempt, no retries.
    async fn search(&self, query: &str, cancel: &CancellationToken) -> ResearchResult<Vec<Source>>;
}

/// First 200 characters of `content`, with "..." appended when anything was cut.
pub fn make_snippet(content: &str) -> String {
    let mut chars = content.char_indices();
    match chars.nth(SNIPPET_MAX_CHARS) {
        Some((cut, _)) => format!("{}...", &content[..cut]),
        None => content.to_string(),
    }
}
