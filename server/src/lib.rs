//! Humidor Server - HTTP and WebSocket API over a box inventory kept in a
//! Google Sheet.
//!
//! Boxes live in memory and are changed optimistically; every change is
//! then written to the sheet and the outcome is published as a sync
//! status that clients can poll or watch.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod routes;
pub mod sheets;
pub mod sync;
pub mod websocket;

use std::sync::Arc;

use axum::Router;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::sheets::SheetsError;
use crate::sync::SyncService;
use crate::websocket::ConnectionManager;

/// Application state shared across handlers.
#[derive(Clone)]
pub struct AppState {
    pub service: Arc<SyncService>,
    pub config: Arc<Config>,
    pub conn_manager: Arc<ConnectionManager>,
}

impl AppState {
    pub fn new(service: SyncService, config: Config) -> Self {
        Self {
            service: Arc::new(service),
            config: Arc::new(config),
            conn_manager: ConnectionManager::new_shared(),
        }
    }

    pub fn from_config(config: Config) -> Result<Self, SheetsError> {
        let service = SyncService::from_config(&config)?;
        Ok(Self::new(service, config))
    }
}

/// Build the application router.
pub fn build_router(state: AppState) -> Router {
    Router::new()
        .merge(routes::create_routes())
        .layer(TraceLayer::new_for_http())
        .layer(
            CorsLayer::new()
                .allow_origin(Any)
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}
