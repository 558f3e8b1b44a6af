//! Consumption history routes.

use axum::{extract::State, http::StatusCode, routing::get, Json, Router};

use crate::auth::AuthUser;
use crate::error::Result;
use crate::AppState;
use humidor_engine::{HistoryEntry, HistoryKey};

pub fn routes() -> Router<AppState> {
    Router::new().route(
        "/history",
        get(list_handler).post(append_handler).delete(delete_handler),
    )
}

/// GET /history - Every decodable history row, read fresh.
async fn list_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<Vec<HistoryEntry>>> {
    Ok(Json(state.service.list_history().await?))
}

/// POST /history - Append an entry.
async fn append_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(entry): Json<HistoryEntry>,
) -> Result<(StatusCode, Json<HistoryEntry>)> {
    let entry = state.service.append_history(entry).await?;
    Ok((StatusCode::CREATED, Json(entry)))
}

/// DELETE /history - Delete the first row matching the key.
async fn delete_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(key): Json<HistoryKey>,
) -> Result<StatusCode> {
    state.service.delete_history(&key).await?;
    Ok(StatusCode::NO_CONTENT)
}
