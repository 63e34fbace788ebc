// Error taxonomy and result aliases

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};

/// Message recorded on a failed session when the failure carries no text.
pub const UNKNOWN_ERROR_MESSAGE: &str = "Unknown error";

/// Failures raised while running the research pipeline.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum ResearchError {
    /// Network or connectivity failure before a response was obtained.
    #[error("Search request failed: {0}")]
    Transport(String),

    /// The search API answered with a non-success status.
    #[error("Tavily API error: {status} - {body}")]
    SearchApi { status: u16, body: String },

    /// Anything else; the message is not guaranteed.
    #[error("{}", .0.as_deref().unwrap_or(UNKNOWN_ERROR_MESSAGE))]
    Unknown(Option<String>),

    /// The run was superseded by a newer session or cleared.
    #[error("Research run cancelled")]
    Cancelled,
}

impl ResearchError {
    /// Text stored on the session when it moves to `error`.
    pub fn user_message(&self) -> String {
        match self {
            ResearchError::Unknown(None) => UNKNOWN_ERROR_MESSAGE.to_string(),
            ResearchError::Unknown(Some(msg)) if msg.trim().is_empty() => {
                UNKNOWN_ERROR_MESSAGE.to_string()
            }
            other => other.to_string(),
        }
    }

    pub fn is_cancelled(&self) -> bool {
        matches!(self, ResearchError::Cancelled)
    }
}

impl From<reqwest::Error> for ResearchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ResearchError::Unknown(Some(format!("Failed to parse search response: {}", err)))
        } else {
            ResearchError::Transport(err.to_string())
        }
    }
}

#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Storage error: {0}")]
    Storage(String),
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::Storage(err.to_string())
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = match &self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::InvalidRequest(_) => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(serde_json::json!({ "error": self.to_string() }))).into_response()
    }
}

pub type AppResult<T> = std::result::Result<T, AppError>;
pub type ResearchResult<T> = std::result::Result<T, ResearchError>;
