use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("JSON parse error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Backend returned {status} for {endpoint}")]
    BackendStatus {
        endpoint: String,
        status: reqwest::StatusCode,
    },

    #[error("Precondition failed: {0}")]
    Precondition(String),

    #[error("No {0} snapshot available yet")]
    SnapshotMissing(&'static str),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, AppError>;

impl IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        let status = match &self {
            AppError::SnapshotMissing(_) => StatusCode::NOT_FOUND,
            AppError::Http(_) | AppError::BackendStatus { .. } | AppError::Precondition(_) => {
                StatusCode::BAD_GATEWAY
            }
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, self.to_string()).into_response()
    }
}
