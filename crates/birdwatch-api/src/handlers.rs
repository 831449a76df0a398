//! CRUD endpoint handlers and the service descriptor.
//!
//! # Endpoints
//!
//! | Method | Path | Description |
//! |--------|------|-------------|
//! | `GET` | `/` | Service descriptor |
//! | `POST` | `/api/observations` | Create an observation |
//! | `GET` | `/api/observations` | List all observations |
//! | `GET` | `/api/observations/{id}` | Get one observation |
//! | `PUT` | `/api/observations/{id}` | Partially update an observation |
//! | `DELETE` | `/api/observations/{id}` | Delete an observation |

use std::sync::Arc;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use birdwatch_types::{ObservationDraft, ObservationId, ObservationPatch};
use tracing::{debug, info};

use crate::error::{ApiError, ROUTE_NOT_FOUND_MESSAGE, failure_response};
use crate::extract::Payload;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// GET / -- service descriptor
// ---------------------------------------------------------------------------

/// Describe the service and every route it exposes.
#[allow(clippy::unused_async)]
pub async fn index() -> impl IntoResponse {
    Json(serde_json::json!({
        "message": "Florida Birds API",
        "version": env!("CARGO_PKG_VERSION"),
        "endpoints": {
            "crud": {
                "create": "POST /api/observations",
                "readAll": "GET /api/observations",
                "readOne": "GET /api/observations/:id",
                "update": "PUT /api/observations/:id",
                "delete": "DELETE /api/observations/:id",
            },
            "questions": {
                "q1": "GET /api/questions/highest-observation-species",
                "q2": "GET /api/questions/average-per-observation",
                "q3": "GET /api/questions/most-diverse-location",
                "q4": "GET /api/questions/busiest-observation-date",
                "q5": "GET /api/questions/distinct-species-count",
                "q6": "GET /api/questions/most-frequent-large-groups",
                "q7": "GET /api/questions/rare-species-percentage",
                "q8": "GET /api/questions/widest-distribution",
            },
        },
    }))
}

// ---------------------------------------------------------------------------
// POST /api/observations
// ---------------------------------------------------------------------------

/// Validate and store a new observation.
pub async fn create_observation(
    State(state): State<Arc<AppState>>,
    Payload(draft): Payload<ObservationDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let new = draft.into_validated()?;
    let created = state.store.create(new).await?;

    info!(id = %created.id, species = %created.common_name, "Observation created");

    Ok((
        StatusCode::CREATED,
        Json(serde_json::json!({
            "success": true,
            "data": created,
        })),
    ))
}

// ---------------------------------------------------------------------------
// GET /api/observations
// ---------------------------------------------------------------------------

/// List every stored observation.
pub async fn list_observations(
    State(state): State<Arc<AppState>>,
) -> Result<impl IntoResponse, ApiError> {
    let records = state.store.list().await?;

    Ok(Json(serde_json::json!({
        "success": true,
        "count": records.len(),
        "data": records,
    })))
}

// ---------------------------------------------------------------------------
// GET /api/observations/{id}
// ---------------------------------------------------------------------------

/// Fetch one observation.
pub async fn get_observation(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id_str)?;
    let record = state.store.get(id).await?.ok_or(ApiError::NotFound)?;

    Ok(Json(serde_json::json!({
        "success": true,
        "data": record,
    })))
}

// ---------------------------------------------------------------------------
// PUT /api/observations/{id}
// ---------------------------------------------------------------------------

/// Apply a partial update. Fields absent from the body keep their values;
/// the merged record must still validate.
pub async fn update_observation(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
    Payload(patch): Payload<ObservationPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id_str)?;
    let updated = state
        .store
        .update(id, patch)
        .await?
        .ok_or(ApiError::NotFound)?;

    info!(%id, "Observation updated");

    Ok(Json(serde_json::json!({
        "success": true,
        "data": updated,
    })))
}

// ---------------------------------------------------------------------------
// DELETE /api/observations/{id}
// ---------------------------------------------------------------------------

/// Delete one observation.
pub async fn delete_observation(
    State(state): State<Arc<AppState>>,
    Path(id_str): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let id = parse_id(&id_str)?;
    if !state.store.delete(id).await? {
        return Err(ApiError::NotFound);
    }

    info!(%id, "Observation deleted");

    Ok(Json(serde_json::json!({
        "success": true,
        "data": {},
        "message": "Observation deleted successfully",
    })))
}

// ---------------------------------------------------------------------------
// Fallback
// ---------------------------------------------------------------------------

/// Answer unmatched routes and methods.
#[allow(clippy::unused_async)]
pub async fn route_not_found() -> Response {
    failure_response(StatusCode::NOT_FOUND, ROUTE_NOT_FOUND_MESSAGE)
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

/// A path segment that is not an id cannot name a stored record.
fn parse_id(s: &str) -> Result<ObservationId, ApiError> {
    s.parse().map_err(|e| {
        debug!(id = s, error = %e, "Unparseable observation id");
        ApiError::NotFound
    })
}
