use crate::models::{
    AppState, HistoryEntry, StartResearchRequest, StartResearchResponse, StoreSnapshot,
};
use crate::types::AppResult;
use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::{delete, get, post},
    Json, Router,
};
use tracing::info;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/research", post(start_research))
        .route("/api/research/current", get(current).delete(clear_current))
        .route("/api/research/history", get(history))
        .route("/api/research/history/{id}", delete(delete_entry))
        .route("/api/research/history/{id}/save", post(save_entry))
        .with_state(state)
}

async fn start_research(
    State(state): State<AppState>,
    Json(request): Json<StartResearchRequest>,
) -> AppResult<(StatusCode, Json<StartResearchResponse>)> {
    let ticket = state.service.spawn(&request.query)?;
    info!(session_id = %ticket.session_id, "Research request accepted");

    let status = state
        .service
        .snapshot()
        .current
        .filter(|c| c.id == ticket.session_id)
        .map(|c| c.status)
        .unwrap_or_default();

    Ok((
        StatusCode::ACCEPTED,
        Json(StartResearchResponse {
            id: ticket.session_id,
            status,
        }),
    ))
}

async fn current(State(state): State<AppState>) -> Json<StoreSnapshot> {
    Json(state.service.snapshot())
}

async fn clear_current(State(state): State<AppState>) -> Json<StoreSnapshot> {
    Json(state.service.clear())
}

async fn history(State(state): State<AppState>) -> Json<Vec<HistoryEntry>> {
    Json(state.service.store().history())
}

async fn delete_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<HistoryEntry>> {
    Ok(Json(state.service.delete(&id).await?))
}

async fn save_entry(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let path = state.service.save(&id).await?;
    Ok(Json(serde_json::json!({
        "id": id,
        "saved": true,
        "path": path.display().to_string(),
    })))
}
