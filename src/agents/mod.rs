//! Agent System
//!
//! The two-phase research pipeline behind every session:
//!
//! - **Research Agent**: simulated research steps, then one web search
//! - **Drafting Agent**: simulated drafting steps, then a templated answer
//!   built from the top-ranked snippets
//!
//! ## Pipeline Overview
//!
//! ```text
//! start(query)
//!      │
//!      ▼
//! ┌─────────────┐
//! │  Research   │  → steps 0..100%, then search gateway
//! │   Agent     │
//! └─────────────┘
//!      │ sources
//!      ▼
//! ┌─────────────┐
//! │  Drafting   │  → steps 0..100%, then answer synthesis
//! │   Agent     │
//! └─────────────┘
//!      │
//!      ▼
//!  complete → history (archived when autoSave is on)
//! ```
//!
//! Each run is bound to the [`RunTicket`] its session was started with.
//! Starting another session or clearing the current one cancels the ticket,
//! and everything the old run still reports is dropped by the store.

pub mod drafting;
pub mod research;
pub mod steps;

pub use drafting::{Draft, DraftingAgent, DRAFTING_STEPS, NO_SOURCE_PLACEHOLDER};
pub use research::{ResearchAgent, ResearchOutcome, RESEARCH_STEPS};
pub use steps::{simulate_steps, step_progress};

use crate::config::Config;
use crate::models::{HistoryEntry, Phase, StoreSnapshot};
use crate::search::{SearchGateway, TavilyClient};
use crate::session::{ResearchStore, RunTicket};
use crate::settings::SettingsStorage;
use crate::storage::ResearchArchive;
use crate::types::{AppError, AppResult, ResearchError};
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tracing::{debug, error, info, warn};

/// How a pipeline run ended.
#[derive(Debug, Clone)]
pub enum RunOutcome {
    Completed(HistoryEntry),
    Failed(ResearchError),
    /// A newer session or a clear took over the slot.
    Superseded,
}

pub struct ResearchService {
    gateway: Arc<dyn SearchGateway>,
    store: ResearchStore,
    archive: ResearchArchive,
    settings: Arc<SettingsStorage>,
    step_delay: Duration,
    /// Serializes history changes that touch the archive: completion with
    /// auto-save, save and delete.
    archive_lock: Mutex<()>,
}

impl ResearchService {
    pub fn new(
        gateway: Arc<dyn SearchGateway>,
        archive: ResearchArchive,
        settings: Arc<SettingsStorage>,
        step_delay: Duration,
    ) -> Self {
        Self {
            gateway,
            store: ResearchStore::new(),
            archive,
            settings,
            step_delay,
            archive_lock: Mutex::new(()),
        }
    }

    /// Wire the Tavily gateway and local storage from config.
    pub fn from_config(config: &Config, settings: Arc<SettingsStorage>) -> AppResult<Self> {
        let gateway = TavilyClient::from_config(&config.search)?;
        Ok(Self::new(
            Arc::new(gateway),
            ResearchArchive::new(config.storage.archive_dir()),
            settings,
            config.pipeline.step_delay(),
        ))
    }

    pub fn store(&self) -> &ResearchStore {
        &self.store
    }

    pub fn snapshot(&self) -> StoreSnapshot {
        self.store.snapshot()
    }

    /// Begin a session without running it.
    pub fn start(&self, query: &str) -> AppResult<RunTicket> {
        let query = query.trim();
        if query.is_empty() {
            return Err(AppError::InvalidRequest("Query must not be empty".to_string()));
        }
        Ok(self.store.begin(query))
    }

    /// Begin a session and run it in the background.
    pub fn spawn(self: &Arc<Self>, query: &str) -> AppResult<RunTicket> {
        let ticket = self.start(query)?;
        let service = Arc::clone(self);
        let run_ticket = ticket.clone();
        tokio::spawn(async move {
            service.run(run_ticket).await;
        });
        Ok(ticket)
    }

    /// Begin a session and run it to the end.
    pub async fn research(&self, query: &str) -> AppResult<RunOutcome> {
        let ticket = self.start(query)?;
        Ok(self.run(ticket).await)
    }

    /// Drive both phases for `ticket`.
    pub async fn run(&self, ticket: RunTicket) -> RunOutcome {
        let generation = ticket.generation;
        info!(session_id = %ticket.session_id, query = %ticket.query, "Running research pipeline");

        let research = ResearchAgent::conduct(
            self.gateway.as_ref(),
            &ticket.query,
            self.step_delay,
            &ticket.cancel,
            |step, progress| {
                self.store.record_progress(generation, Phase::Research, step, progress);
            },
        )
        .await;

        let outcome = match research {
            Ok(outcome) => outcome,
            Err(e) => return self.fail(&ticket, e),
        };

        if !self
            .store
            .finish_research(generation, outcome.sources.clone(), outcome.thoughts)
        {
            return RunOutcome::Superseded;
        }

        let draft = DraftingAgent::draft(
            &ticket.query,
            &outcome.sources,
            self.step_delay,
            &ticket.cancel,
            |step, progress| {
                self.store.record_progress(generation, Phase::Drafting, step, progress);
            },
        )
        .await;

        let draft = match draft {
            Ok(draft) => draft,
            Err(e) => return self.fail(&ticket, e),
        };

        let auto_save = self.settings.load().await.auto_save;
        let _guard = self.archive_lock.lock().await;

        let Some(entry) = self.store.complete(generation, draft.answer, draft.thoughts) else {
            return RunOutcome::Superseded;
        };

        if auto_save {
            if let Err(e) = self.archive.save(&entry).await {
                warn!(error = %e, entry_id = %entry.id, "Auto-save of research entry failed");
            }
        }

        RunOutcome::Completed(entry)
    }

    fn fail(&self, ticket: &RunTicket, err: ResearchError) -> RunOutcome {
        if err.is_cancelled() {
            debug!(session_id = %ticket.session_id, "Research run cancelled");
            return RunOutcome::Superseded;
        }

        error!(session_id = %ticket.session_id, error = %err, "Research process failed");
        if self.store.fail(ticket.generation, err.user_message()) {
            RunOutcome::Failed(err)
        } else {
            RunOutcome::Superseded
        }
    }

    pub fn clear(&self) -> StoreSnapshot {
        self.store.clear()
    }

    /// Persist a history entry to the archive.
    pub async fn save(&self, id: &str) -> AppResult<PathBuf> {
        let _guard = self.archive_lock.lock().await;
        let entry = self
            .store
            .history_entry(id)
            .ok_or_else(|| AppError::NotFound(format!("history entry {}", id)))?;
        self.archive.save(&entry).await
    }

    /// Remove a history entry, and its archived copy if there is one.
    pub async fn delete(&self, id: &str) -> AppResult<HistoryEntry> {
        let _guard = self.archive_lock.lock().await;
        let removed = self
            .store
            .delete(id)
            .ok_or_else(|| AppError::NotFound(format!("history entry {}", id)))?;

        if let Err(e) = self.archive.remove(id).await {
            warn!(error = %e, entry_id = %id, "Failed to remove archived copy");
        }
        Ok(removed)
    }

    /// Load archived entries back into history.
    pub async fn restore_history(&self) -> AppResult<usize> {
        let entries = self.archive.list().await?;
        let restored = self.store.restore_history(entries);
        if restored > 0 {
            info!(count = restored, dir = ?self.archive.dir(), "Restored archived research");
        }
        Ok(restored)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ResearchStatus, Source};
    use crate::settings::UserSettings;
    use crate::types::ResearchResult;
    use async_trait::async_trait;
    use tempfile::TempDir;
    use tokio_util::sync::CancellationToken;

    struct FixedGateway(ResearchResult<Vec<Source>>);

    #[async_trait]
    impl SearchGateway for FixedGateway {
        fn name(&self) -> &str {
            "fixed"
        }

        async fn search(&self, _query: &str, _cancel: &CancellationToken) -> ResearchResult<Vec<Source>> {
            self.0.clone()
        }
    }

    fn source(title: &str, score: f64) -> Source {
        Source {
            id: uuid::Uuid::new_v4().to_string(),
            title: title.to_string(),
            url: format!("https://example.com/{}", title),
            snippet: format!("snippet {}", title),
            relevance_score: score,
        }
    }

    fn service(dir: &TempDir, result: ResearchResult<Vec<Source>>) -> ResearchService {
        ResearchService::new(
            Arc::new(FixedGateway(result)),
            ResearchArchive::new(dir.path().join("archive")),
            Arc::new(SettingsStorage::with_dir(dir.path().to_path_buf())),
            Duration::ZERO,
        )
    }

    #[tokio::test]
    async fn test_successful_run_completes_and_records_history() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, Ok(vec![source("a", 0.4), source("b", 0.8)]));

        let outcome = service.research("climate change").await.unwrap();
        let RunOutcome::Completed(entry) = outcome else {
            panic!("expected completion");
        };
        assert_eq!(entry.session.status, ResearchStatus::Complete);

        let snapshot = service.snapshot();
        assert_eq!(snapshot.history.len(), 1);
        assert_eq!(snapshot.research_agent.progress, 100.0);
        assert_eq!(snapshot.research_agent.current_step, "Preparing data for drafting agent");
        assert!(snapshot.research_agent.thoughts.is_some());
        assert_eq!(snapshot.drafting_agent.current_step, "Finalizing response");
        assert!(snapshot.drafting_agent.thoughts.is_some());
    }

    #[tokio::test]
    async fn test_search_failure_moves_session_to_error() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, Err(ResearchError::Transport("connection refused".into())));

        let outcome = service.research("q").await.unwrap();
        assert!(matches!(outcome, RunOutcome::Failed(ResearchError::Transport(_))));

        let snapshot = service.snapshot();
        let current = snapshot.current.unwrap();
        assert_eq!(current.status, ResearchStatus::Error);
        assert_eq!(
            current.error.as_deref(),
            Some("Search request failed: connection refused")
        );
        assert!(snapshot.history.is_empty());
    }

    #[tokio::test]
    async fn test_unknown_failure_uses_fallback_message() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, Err(ResearchError::Unknown(None)));

        service.research("q").await.unwrap();
        let current = service.snapshot().current.unwrap();
        assert_eq!(current.error.as_deref(), Some(crate::types::UNKNOWN_ERROR_MESSAGE));
    }

    #[tokio::test]
    async fn test_blank_query_is_rejected() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, Ok(vec![]));
        assert!(matches!(service.start("   "), Err(AppError::InvalidRequest(_))));
        assert!(service.snapshot().current.is_none());
    }

    #[tokio::test]
    async fn test_superseded_run_does_not_touch_new_session() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, Ok(vec![source("a", 0.5)]));

        let stale = service.start("x").unwrap();
        service.start("y").unwrap();

        let outcome = service.run(stale).await;
        assert!(matches!(outcome, RunOutcome::Superseded));

        let snapshot = service.snapshot();
        let current = snapshot.current.unwrap();
        assert_eq!(current.query, "y");
        assert_eq!(current.status, ResearchStatus::Researching);
        assert!(snapshot.history.is_empty());
    }

    #[tokio::test]
    async fn test_save_archives_and_restore_reloads() {
        let dir = TempDir::new().unwrap();
        let first = service(&dir, Ok(vec![source("a", 0.5)]));
        let RunOutcome::Completed(entry) = first.research("x").await.unwrap() else {
            panic!("expected completion");
        };
        first.save(&entry.id).await.unwrap();

        let second = service(&dir, Ok(vec![]));
        assert_eq!(second.restore_history().await.unwrap(), 1);
        assert_eq!(second.store().history(), vec![entry]);
    }

    #[tokio::test]
    async fn test_save_unknown_id_is_not_found() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, Ok(vec![]));
        assert!(matches!(service.save("missing").await, Err(AppError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_auto_save_archives_on_completion() {
        let dir = TempDir::new().unwrap();
        let settings = SettingsStorage::with_dir(dir.path().to_path_buf());
        settings
            .save(&UserSettings {
                auto_save: true,
                ..UserSettings::default()
            })
            .await
            .unwrap();

        let service = service(&dir, Ok(vec![source("a", 0.5)]));
        let RunOutcome::Completed(entry) = service.research("x").await.unwrap() else {
            panic!("expected completion");
        };

        let archive = ResearchArchive::new(dir.path().join("archive"));
        assert_eq!(archive.load(&entry.id).await.unwrap(), entry);
    }

    #[tokio::test]
    async fn test_delete_removes_entry_and_archived_copy() {
        let dir = TempDir::new().unwrap();
        let service = service(&dir, Ok(vec![source("a", 0.5)]));
        let RunOutcome::Completed(entry) = service.research("x").await.unwrap() else {
            panic!("expected completion");
        };
        service.save(&entry.id).await.unwrap();

        service.delete(&entry.id).await.unwrap();
        let snapshot = service.snapshot();
        assert!(snapshot.history.is_empty());
        assert!(snapshot.current.is_none());
        assert!(ResearchArchive::new(dir.path().join("archive"))
            .list()
            .await
            .unwrap()
            .is_empty());
        assert!(matches!(service.delete(&entry.id).await, Err(AppError::NotFound(_))));
    }

    #[tokio::test(flavor = "multi_thread", worker_threads = 2)]
    async fn test_delete_racing_auto_save_leaves_nothing_to_restore() {
        let dir = TempDir::new().unwrap();
        SettingsStorage::with_dir(dir.path().to_path_buf())
            .save(&UserSettings {
                auto_save: true,
                ..UserSettings::default()
            })
            .await
            .unwrap();

        let shared = Arc::new(service(&dir, Ok(vec![source("a", 0.5)])));
        for _ in 0..25 {
            let ticket = shared.start("x").unwrap();
            let deleter = {
                let shared = Arc::clone(&shared);
                tokio::spawn(async move {
                    loop {
                        if let Some(entry) = shared.store().history().first().cloned() {
                            shared.delete(&entry.id).await.unwrap();
                            return;
                        }
                        tokio::task::yield_now().await;
                    }
                })
            };

            assert!(matches!(shared.run(ticket).await, RunOutcome::Completed(_)));
            deleter.await.unwrap();
        }

        assert!(shared.store().history().is_empty());
        let restarted = service(&dir, Ok(vec![]));
        assert_eq!(restarted.restore_history().await.unwrap(), 0);
    }
}
