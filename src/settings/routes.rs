//! Settings API Routes
//!
//! - GET /api/settings - Current settings (defaults for anything invalid)
//! - PUT /api/settings - Replace the settings record

use super::UserSettings;
use crate::models::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tracing::{error, info};

/// Create the settings router
pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/api/settings", get(get_settings).put(update_settings))
        .with_state(state)
}

/// GET /api/settings
async fn get_settings(State(state): State<AppState>) -> Json<UserSettings> {
    Json(state.settings.load().await)
}

/// PUT /api/settings
///
/// The body goes through the same per-key validation as a load, so unknown
/// values are normalized rather than rejected.
async fn update_settings(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    let settings = UserSettings::from_value(&body);

    match state.settings.save(&settings).await {
        Ok(()) => {
            info!("Settings updated successfully");
            (StatusCode::OK, Json(settings)).into_response()
        }
        Err(e) => {
            error!("Failed to save settings: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({
                    "error": "Failed to save settings",
                    "details": e.to_string()
                })),
            )
                .into_response()
        }
    }
}
