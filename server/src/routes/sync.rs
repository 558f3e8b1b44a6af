//! Sync endpoint routes.

use axum::{
    extract::{State, WebSocketUpgrade},
    response::Response,
    routing::{get, post},
    Json, Router,
};

use crate::auth::AuthUser;
use crate::error::Result;
use crate::handlers::handle_websocket_connection;
use crate::sync::{RefreshSummary, StatusSnapshot};
use crate::AppState;

/// Create sync routes.
pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/sync/refresh", post(refresh_handler))
        .route("/sync/status", get(status_handler))
        .route("/ws", get(websocket_handler))
}

/// POST /sync/refresh - Re-read the sheet into local state.
async fn refresh_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
) -> Result<Json<RefreshSummary>> {
    let summary = state.service.refresh().await?;
    Ok(Json(summary))
}

/// GET /sync/status - Current sync status.
async fn status_handler(State(state): State<AppState>, _auth: AuthUser) -> Json<StatusSnapshot> {
    Json(state.service.status().current())
}

/// GET /ws - Live status over WebSocket.
async fn websocket_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    ws: WebSocketUpgrade,
) -> Response {
    ws.on_upgrade(move |socket| {
        handle_websocket_connection(socket, state.service, state.conn_manager)
    })
}
