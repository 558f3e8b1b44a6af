//! HTTP route definitions.

mod boxes;
mod health;
mod history;
mod sync;

use crate::AppState;
use axum::Router;

/// Create all application routes.
pub fn create_routes() -> Router<AppState> {
    Router::new()
        .merge(health::routes())
        .merge(boxes::routes())
        .merge(history::routes())
        .merge(sync::routes())
}
