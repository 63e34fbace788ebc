//! Research Agent
//!
//! Runs the research step sequence, then one search through the gateway.
//! The narrative it returns is a fixed template, not the output of any
//! analysis.

use super::steps::simulate_steps;
use crate::models::Source;
use crate::search::SearchGateway;
use crate::types::ResearchResult;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::{error, info};

pub const RESEARCH_STEPS: [&str; 7] = [
    "Analyzing query intent",
    "Planning research strategy",
    "Searching for relevant information",
    "Evaluating source credibility",
    "Extracting key findings",
    "Organizing research results",
    "Preparing data for drafting agent",
];

#[derive(Debug, Clone)]
pub struct ResearchOutcome {
    pub sources: Vec<Source>,
    pub thoughts: String,
}

pub struct ResearchAgent;

impl ResearchAgent {
    pub async fn conduct<F>(
        gateway: &dyn SearchGateway,
        query: &str,
        step_delay: Duration,
        cancel: &CancellationToken,
        on_step: F,
    ) -> ResearchResult<ResearchOutcome>
    where
        F: FnMut(&str, f64) + Send,
    {
        simulate_steps(&RESEARCH_STEPS, step_delay, cancel, on_step).await?;

        let sources = match gateway.search(query, cancel).await {
            Ok(sources) => sources,
            Err(e) => {
                if !e.is_cancelled() {
                    error!(error = %e, provider = gateway.name(), "Research search failed");
                }
                return Err(e);
            }
        };

        info!(source_count = sources.len(), "Research phase complete");
        let thoughts = Self::thoughts(query, sources.len());
        Ok(ResearchOutcome { sources, thoughts })
    }

    fn thoughts(query: &str, source_count: usize) -> String {
        format!(
            "I've analyzed the query \"{query}\" and identified the key information needs.\n\
             Found {source_count} relevant sources with information about this topic.\n\
             The sources have been ranked by relevance and credibility.\n\
             Sources cover various aspects of the query including definitions, examples, and practical applications.\n\
             Ready to pass this information to the drafting agent for synthesis."
        )
    }
}
