//! Research Session Store
//!
//! Holds the one "current" session, the completed-session history, and the
//! display state of both phase runners.
//!
//! ## Lifecycle
//!
//! ```text
//!  begin ─► researching ──► drafting ──► complete ─► (history)
//!                │              │
//!                └──────┬───────┘
//!                       ▼
//!                     error
//! ```
//!
//! Each [`ResearchStore::begin`] hands out a [`RunTicket`]. Pipeline updates
//! carry the ticket's generation and are dropped once a newer `begin`,
//! `clear`, or `delete` has replaced the current session, so a superseded run
//! can never write into its successor's slot.

use crate::models::{
    AgentPhaseState, HistoryEntry, Phase, ResearchSession, ResearchStatus, Source, StoreSnapshot,
};
use parking_lot::RwLock;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

/// Identifies one pipeline run against the store.
#[derive(Debug, Clone)]
pub struct RunTicket {
    pub session_id: String,
    pub query: String,
    pub generation: u64,
    pub cancel: CancellationToken,
}

#[derive(Default)]
struct StoreState {
    current: Option<ResearchSession>,
    history: Vec<HistoryEntry>,
    research_agent: AgentPhaseState,
    drafting_agent: AgentPhaseState,
    generation: u64,
    cancel: Option<CancellationToken>,
}

impl StoreState {
    fn snapshot(&self) -> StoreSnapshot {
        StoreSnapshot {
            current: self.current.clone(),
            research_agent: self.research_agent.clone(),
            drafting_agent: self.drafting_agent.clone(),
            history: self.history.clone(),
        }
    }

    /// Drop the current session and stop its run.
    fn reset_current(&mut self) {
        if let Some(token) = self.cancel.take() {
            token.cancel();
        }
        self.generation += 1;
        self.current = None;
        self.research_agent = AgentPhaseState::default();
        self.drafting_agent = AgentPhaseState::default();
    }

    fn is_live(&self, generation: u64) -> bool {
        self.generation == generation && self.current.is_some()
    }

    fn phase_mut(&mut self, phase: Phase) -> &mut AgentPhaseState {
        match phase {
            Phase::Research => &mut self.research_agent,
            Phase::Drafting => &mut self.drafting_agent,
        }
    }
}

/// Shared handle to the session store.
#[derive(Clone, Default)]
pub struct ResearchStore {
    inner: Arc<RwLock<StoreState>>,
}

impl ResearchStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.inner.read().snapshot()
    }

    pub fn history(&self) -> Vec<HistoryEntry> {
        self.inner.read().history.clone()
    }

    pub fn history_entry(&self, id: &str) -> Option<HistoryEntry> {
        self.inner.read().history.iter().find(|e| e.id == id).cloned()
    }

    /// Start a new session, discarding any in-progress one.
    pub fn begin(&self, query: &str) -> RunTicket {
        let mut state = self.inner.write();
        state.reset_current();

        let session = ResearchSession::new(query);
        let cancel = CancellationToken::new();
        let ticket = RunTicket {
            session_id: session.id.clone(),
            query: session.query.clone(),
            generation: state.generation,
            cancel: cancel.clone(),
        };

        info!(session_id = %session.id, generation = state.generation, "Research session started");
        state.current = Some(session);
        state.cancel = Some(cancel);
        ticket
    }

    /// Discard the current session without touching history.
    pub fn clear(&self) -> StoreSnapshot {
        let mut state = self.inner.write();
        state.reset_current();
        debug!("Current research cleared");
        state.snapshot()
    }

    /// Remove a history entry. Clears the current session too when the
    /// entry belongs to it. Returns the removed entry.
    pub fn delete(&self, id: &str) -> Option<HistoryEntry> {
        let mut state = self.inner.write();
        let index = state.history.iter().position(|e| e.id == id)?;
        let removed = state.history.remove(index);

        let is_current = state
            .current
            .as_ref()
            .is_some_and(|c| c.id == removed.session.id);
        if is_current {
            state.reset_current();
        }

        info!(entry_id = %id, cleared_current = is_current, "History entry deleted");
        Some(removed)
    }

    /// Record a simulated step. Stale or regressing updates are ignored.
    pub fn record_progress(&self, generation: u64, phase: Phase, step: &str, progress: f64) -> bool {
        let mut state = self.inner.write();
        if !state.is_live(generation) {
            return false;
        }

        let agent = state.phase_mut(phase);
        if progress < agent.progress {
            return false;
        }
        agent.current_step = step.to_string();
        agent.progress = progress;
        true
    }

    /// `researching → drafting`: attach sources and research thoughts.
    pub fn finish_research(&self, generation: u64, sources: Vec<Source>, thoughts: String) -> bool {
        let mut state = self.inner.write();
        if !state.is_live(generation) {
            return false;
        }

        let Some(current) = state.current.as_mut() else {
            return false;
        };
        if current.status != ResearchStatus::Researching {
            return false;
        }
        current.sources = sources;
        current.status = ResearchStatus::Drafting;
        state.research_agent.thoughts = Some(thoughts);
        true
    }

    /// `drafting → complete`: attach the answer and move the session into history.
    pub fn complete(&self, generation: u64, answer: String, thoughts: String) -> Option<HistoryEntry> {
        let mut state = self.inner.write();
        if !state.is_live(generation) {
            return None;
        }

        let current = state.current.as_mut()?;
        if current.status != ResearchStatus::Drafting {
            return None;
        }
        current.answer = answer;
        current.status = ResearchStatus::Complete;

        let entry = HistoryEntry {
            id: uuid::Uuid::new_v4().to_string(),
            session: current.clone(),
        };
        state.drafting_agent.thoughts = Some(thoughts);
        state.history.insert(0, entry.clone());
        state.cancel = None;

        info!(
            session_id = %entry.session.id,
            entry_id = %entry.id,
            history_len = state.history.len(),
            "Research session complete"
        );
        Some(entry)
    }

    /// `researching|drafting → error`.
    pub fn fail(&self, generation: u64, message: String) -> bool {
        let mut state = self.inner.write();
        if !state.is_live(generation) {
            return false;
        }

        let Some(current) = state.current.as_mut() else {
            return false;
        };
        if current.status.is_terminal() {
            return false;
        }
        current.status = ResearchStatus::Error;
        current.error = Some(message);
        state.cancel = None;
        true
    }

    /// Put previously archived entries back into history, skipping ids
    /// already present. Entries are kept most-recent-first.
    pub fn restore_history(&self, entries: Vec<HistoryEntry>) -> usize {
        let mut state = self.inner.write();
        let mut added = 0;
        for entry in entries {
            if state.history.iter().any(|e| e.id == entry.id) {
                continue;
            }
            state.history.push(entry);
            added += 1;
        }
        state
            .history
            .sort_by(|a, b| b.session.timestamp.cmp(&a.session.timestamp));
        added
    }
}
