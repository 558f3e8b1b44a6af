//! Box inventory routes.
//!
//! Every mutation answers with the locally applied result and a `synced`
//! flag telling whether the sheet accepted the write.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post, put},
    Json, Router,
};
use humidor_engine::{NewLot, Status, Unit, UnitPatch};
use serde::Deserialize;

use crate::auth::AuthUser;
use crate::error::{AppError, Result};
use crate::sync::{ConsumeLog, MutationOutcome};
use crate::AppState;

pub fn routes() -> Router<AppState> {
    Router::new()
        .route("/boxes", get(list_handler).post(create_handler))
        .route(
            "/boxes/{id}",
            get(get_handler).patch(update_handler).delete(delete_handler),
        )
        .route("/boxes/{id}/consume", post(consume_handler))
        .route("/boxes/{id}/received", put(received_handler))
}

/// Filters for listing boxes.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BoxQuery {
    pub brand: Option<String>,
    pub status: Option<Status>,
    pub location: Option<String>,
    #[serde(default)]
    pub in_stock: bool,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConsumeRequest {
    pub count: u32,
    /// Also append a history entry.
    #[serde(default)]
    pub log: bool,
    #[serde(default)]
    pub notes: String,
}

#[derive(Debug, Deserialize)]
pub struct ReceivedRequest {
    pub received: bool,
}

/// GET /boxes - Local boxes, optionally filtered.
async fn list_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Query(filter): Query<BoxQuery>,
) -> Json<Vec<Unit>> {
    let inventory = state.service.inventory().await;
    let mut query = inventory.query();
    if let Some(brand) = filter.brand {
        query = query.brand(brand);
    }
    if let Some(status) = filter.status {
        query = query.status(status);
    }
    if let Some(location) = filter.location {
        query = query.location(location);
    }
    if filter.in_stock {
        query = query.in_stock();
    }
    let units: Vec<Unit> = query.all().into_iter().cloned().collect();
    Json(units)
}

/// POST /boxes - Add a lot of new boxes.
async fn create_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Json(new_lot): Json<NewLot>,
) -> Result<(StatusCode, Json<MutationOutcome<Vec<Unit>>>)> {
    let outcome = state.service.add_lot(new_lot).await?;
    Ok((StatusCode::CREATED, Json(outcome)))
}

/// GET /boxes/{id}
async fn get_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<Unit>> {
    state
        .service
        .unit(&id)
        .await
        .map(Json)
        .ok_or_else(|| AppError::NotFound(format!("Box {}", id)))
}

/// PATCH /boxes/{id}
async fn update_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
    Json(patch): Json<UnitPatch>,
) -> Result<Json<MutationOutcome<Unit>>> {
    Ok(Json(state.service.update_unit(&id, &patch).await?))
}

/// DELETE /boxes/{id}
async fn delete_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
) -> Result<Json<MutationOutcome<Unit>>> {
    Ok(Json(state.service.remove_unit(&id).await?))
}

/// POST /boxes/{id}/consume
async fn consume_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<ConsumeRequest>,
) -> Result<Json<MutationOutcome<Unit>>> {
    let log = request.log.then(|| ConsumeLog {
        notes: request.notes,
    });
    Ok(Json(state.service.consume(&id, request.count, log).await?))
}

/// PUT /boxes/{id}/received
async fn received_handler(
    State(state): State<AppState>,
    _auth: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<ReceivedRequest>,
) -> Result<Json<MutationOutcome<Unit>>> {
    Ok(Json(
        state.service.set_received(&id, request.received).await?,
    ))
}
