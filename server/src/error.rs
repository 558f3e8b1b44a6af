//! Unified error handling for the server.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use humidor_engine::Error as EngineError;
use serde::Serialize;

use crate::sync::SyncError;

/// Application error type.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error(transparent)]
    Sync(#[from] SyncError),

    #[error("Invalid request: {0}")]
    BadRequest(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Unauthorized")]
    Unauthorized,
}

impl From<EngineError> for AppError {
    fn from(e: EngineError) -> Self {
        AppError::Sync(SyncError::Engine(e))
    }
}

/// Error response body.
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

fn engine_status(e: &EngineError) -> StatusCode {
    match e {
        EngineError::UnitNotFound(_) => StatusCode::NOT_FOUND,
        EngineError::DuplicateIdentity(_) => StatusCode::CONFLICT,
        _ => StatusCode::BAD_REQUEST,
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_message, details) = match &self {
            AppError::Sync(SyncError::Engine(e)) => {
                tracing::warn!("Engine error: {:?}", e);
                (engine_status(e), e.to_string(), None)
            }
            AppError::Sync(SyncError::Sheets(e)) => {
                tracing::error!("Sheets error: {}", e);
                (
                    StatusCode::BAD_GATEWAY,
                    "Remote sheet unavailable".to_string(),
                    Some(e.to_string()),
                )
            }
            AppError::Sync(e @ (SyncError::RowNotFound(_) | SyncError::HistoryNotFound)) => {
                (StatusCode::NOT_FOUND, e.to_string(), None)
            }
            AppError::Sync(e @ SyncError::Unlocatable(_)) => {
                (StatusCode::CONFLICT, e.to_string(), None)
            }
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone(), None),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, msg.clone(), None),
            AppError::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".to_string(), None),
        };

        let body = Json(ErrorResponse {
            error: error_message,
            details,
        });

        (status, body).into_response()
    }
}

/// Result type alias for handlers.
pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sheets::SheetsError;

    fn status_of(e: AppError) -> StatusCode {
        e.into_response().status()
    }

    #[test]
    fn status_codes() {
        assert_eq!(
            status_of(EngineError::UnitNotFound("7".into()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(EngineError::DuplicateIdentity("7".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(
            status_of(EngineError::InvalidQuantity(0).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(SyncError::Sheets(SheetsError::MissingCredential).into()),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            status_of(SyncError::HistoryNotFound.into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(SyncError::Unlocatable("row4".into()).into()),
            StatusCode::CONFLICT
        );
        assert_eq!(status_of(AppError::Unauthorized), StatusCode::UNAUTHORIZED);
    }
}
