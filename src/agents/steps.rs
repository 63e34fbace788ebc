//! Step Simulator
//!
//! Walks a fixed list of step labels, reporting each one with an evenly
//! spaced percentage and pausing between them. Purely cosmetic pacing: no
//! work happens here and the percentages say nothing about real progress.

use crate::types::{ResearchError, ResearchResult};
use std::time::Duration;
use tokio_util::sync::CancellationToken;

/// Percentage reported for step `index` out of `total`.
///
/// First step is 0, last is 100. A single step reports 100.
pub fn step_progress(index: usize, total: usize) -> f64 {
    if total <= 1 {
        return 100.0;
    }
    index as f64 / (total - 1) as f64 * 100.0
}

/// Report every step in order, sleeping `delay` after each one.
///
/// Returns `Cancelled` as soon as the token fires during a pause.
pub async fn simulate_steps<F>(
    steps: &[&str],
    delay: Duration,
    cancel: &CancellationToken,
    mut on_step: F,
) -> ResearchResult<()>
where
    F: FnMut(&str, f64) + Send,
{
    let total = steps.len();
    for (index, step) in steps.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(ResearchError::Cancelled);
        }
        on_step(step, step_progress(index, total));

        tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(ResearchError::Cancelled),
            _ = tokio::time::sleep(delay) => {}
        }
    }
    Ok(())
}
