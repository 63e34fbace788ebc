//! Drafting Agent
//!
//! Runs the drafting step sequence, then composes an answer from the
//! top-ranked source snippets. Pure string composition; it cannot fail
//! except by cancellation.

use super::steps::simulate_steps;
use crate::models::Source;
use crate::types::ResearchResult;
use std::time::Duration;
use tokio_util::sync::CancellationToken;
use tracing::info;

pub const DRAFTING_STEPS: [&str; 6] = [
    "Analyzing research findings",
    "Identifying key information",
    "Organizing content structure",
    "Drafting comprehensive answer",
    "Validating answer against sources",
    "Finalizing response",
];

/// Number of sources whose snippets make up the answer body.
pub const TOP_SOURCE_COUNT: usize = 3;

/// Stands in for the lead source title when there are no sources.
pub const NO_SOURCE_PLACEHOLDER: &str = "the most relevant findings";

#[derive(Debug, Clone)]
pub struct Draft {
    pub answer: String,
    pub thoughts: String,
}

pub struct DraftingAgent;

impl DraftingAgent {
    pub async fn draft<F>(
        query: &str,
        sources: &[Source],
        step_delay: Duration,
        cancel: &CancellationToken,
        on_step: F,
    ) -> ResearchResult<Draft>
    where
        F: FnMut(&str, f64) + Send,
    {
        simulate_steps(&DRAFTING_STEPS, step_delay, cancel, on_step).await?;

        let draft = Self::compose(query, sources);
        info!(answer_len = draft.answer.len(), "Drafting phase complete");
        Ok(draft)
    }

    /// Sources ordered by descending relevance. Ties keep their input order.
    pub fn rank(sources: &[Source]) -> Vec<&Source> {
        let mut ranked: Vec<&Source> = sources.iter().collect();
        ranked.sort_by(|a, b| b.relevance_score.total_cmp(&a.relevance_score));
        ranked
    }

    pub fn compose(query: &str, sources: &[Source]) -> Draft {
        let ranked = Self::rank(sources);

        let material = ranked
            .iter()
            .take(TOP_SOURCE_COUNT)
            .map(|s| s.snippet.as_str())
            .collect::<Vec<_>>()
            .join(" ");

        let lead = ranked
            .first()
            .map(|s| s.title.as_str())
            .filter(|t| !t.is_empty())
            .unwrap_or(NO_SOURCE_PLACEHOLDER);

        let count = sources.len();
        let answer = format!(
            "Based on comprehensive research, here's what I found about \"{query}\":\n\n\
             {material}\n\n\
             This information was compiled from {count} reliable sources, with particular emphasis on {lead}.\n\n\
             Additional context and details are available in the full research results."
        );

        let topic = query.split(' ').take(3).collect::<Vec<_>>().join(" ");
        let thoughts = format!(
            "I've analyzed the {count} sources provided by the research agent.\n\
             The query \"{query}\" appears to be asking about {topic}...\n\
             I've prioritized information from the most relevant sources.\n\
             The answer includes key definitions and explanations.\n\
             I've maintained factual accuracy while making the response readable and coherent."
        );

        Draft { answer, thoughts }
    }
}
