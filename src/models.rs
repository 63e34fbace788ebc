use std::sync::Arc;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::agents::ResearchService;
use crate::config::Config;
use crate::settings::SettingsStorage;

#[derive(Clone)]
pub struct AppState {
    pub config: Config,
    pub service: Arc<ResearchService>,
    pub settings: Arc<SettingsStorage>,
}

/// Lifecycle of one research session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResearchStatus {
    #[default]
    Idle,
    Researching,
    Drafting,
    Complete,
    Error,
}

impl ResearchStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ResearchStatus::Complete | ResearchStatus::Error)
    }
}

impl std::fmt::Display for ResearchStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ResearchStatus::Idle => write!(f, "idle"),
            ResearchStatus::Researching => write!(f, "researching"),
            ResearchStatus::Drafting => write!(f, "drafting"),
            ResearchStatus::Complete => write!(f, "complete"),
            ResearchStatus::Error => write!(f, "error"),
        }
    }
}

/// A search result normalized into the session's data model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Source {
    pub id: String,
    pub title: String,
    pub url: String,
    /// At most 200 characters of content, plus "..." when cut.
    pub snippet: String,
    pub relevance_score: f64,
}

/// One research query's full lifecycle record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResearchSession {
    pub id: String,
    pub query: String,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    pub status: ResearchStatus,
    pub sources: Vec<Source>,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl ResearchSession {
    pub fn new(query: impl Into<String>) -> Self {
        Self {
            id: uuid::Uuid::new_v4().to_string(),
            query: query.into(),
            timestamp: now_millis(),
            status: ResearchStatus::Researching,
            sources: Vec::new(),
            answer: String::new(),
            error: None,
        }
    }
}

/// Current time at the millisecond precision the wire format keeps.
fn now_millis() -> DateTime<Utc> {
    let now = Utc::now();
    DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
}

/// Display state of one phase runner. An empty step means idle.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AgentPhaseState {
    pub current_step: String,
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub thoughts: Option<String>,
}

impl AgentPhaseState {
    pub fn is_idle(&self) -> bool {
        self.current_step.is_empty()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Phase {
    Research,
    Drafting,
}

/// A completed session kept in history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct HistoryEntry {
    pub id: String,
    pub session: ResearchSession,
}

/// Read-only view of the session store.
#[derive(Debug, Clone, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StoreSnapshot {
    pub current: Option<ResearchSession>,
    pub research_agent: AgentPhaseState,
    pub drafting_agent: AgentPhaseState,
    pub history: Vec<HistoryEntry>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct StartResearchRequest {
    pub query: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct StartResearchResponse {
    pub id: String,
    pub status: ResearchStatus,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub timestamp: String,
    pub search_configured: bool,
}
