// Deep Research - web search, staged agent progress and cited answer drafting

pub mod agents;
pub mod config;
pub mod models;
pub mod routes;
pub mod search;    // Search gateway (Tavily)
pub mod session;   // Current session, history and phase progress
pub mod settings;  // Display preferences persisted as one JSON record
pub mod storage;   // Archive of saved research
pub mod types;
pub mod utils;

// Re-exports for convenience
pub use agents::{ResearchService, RunOutcome};
pub use config::Config;
pub use models::AppState;
pub use session::ResearchStore;

pub fn create_router(state: AppState) -> axum::Router {
    routes::create_router(state)
}
