//! Axum router construction for the observation API.
//!
//! Assembles the CRUD and question routes into a single [`Router`] with
//! request tracing, CORS, and panic recovery.

use std::any::Any;
use std::sync::Arc;

use axum::Router;
use axum::http::{HeaderName, Method, StatusCode, header};
use axum::response::Response;
use axum::routing::get;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::CorsOrigins;
use crate::error::{INTERNAL_ERROR_MESSAGE, failure_response};
use crate::handlers;
use crate::questions;
use crate::state::AppState;

/// Build the complete Axum router.
///
/// The router includes:
/// - `GET /` -- service descriptor
/// - `POST /api/observations` -- create
/// - `GET /api/observations` -- list
/// - `GET|PUT|DELETE /api/observations/{id}` -- single record
/// - `GET /api/questions/*` -- the eight aggregation questions
///
/// Unmatched paths and methods get the JSON 404 envelope. A panicking
/// handler is logged and answered with the JSON 500 envelope; the CORS
/// layer sits outside the panic guard so that response carries CORS
/// headers too.
pub fn build_router(state: Arc<AppState>) -> Router {
    let cors = cors_layer(&state.cors);

    Router::new()
        .route("/", get(handlers::index))
        // CRUD
        .route(
            "/api/observations",
            get(handlers::list_observations).post(handlers::create_observation),
        )
        .route(
            "/api/observations/{id}",
            get(handlers::get_observation)
                .put(handlers::update_observation)
                .delete(handlers::delete_observation),
        )
        // Questions
        .route(
            "/api/questions/highest-observation-species",
            get(questions::highest_observation_species),
        )
        .route(
            "/api/questions/average-per-observation",
            get(questions::average_per_observation),
        )
        .route(
            "/api/questions/most-diverse-location",
            get(questions::most_diverse_location),
        )
        .route(
            "/api/questions/busiest-observation-date",
            get(questions::busiest_observation_date),
        )
        .route(
            "/api/questions/distinct-species-count",
            get(questions::distinct_species_count),
        )
        .route(
            "/api/questions/most-frequent-large-groups",
            get(questions::most_frequent_large_groups),
        )
        .route(
            "/api/questions/rare-species-percentage",
            get(questions::rare_species_percentage),
        )
        .route(
            "/api/questions/widest-distribution",
            get(questions::widest_distribution),
        )
        .fallback(handlers::route_not_found)
        .method_not_allowed_fallback(handlers::route_not_found)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn cors_layer(origins: &CorsOrigins) -> CorsLayer {
    let allow_origin = match origins {
        CorsOrigins::Any => AllowOrigin::any(),
        // `AllowOrigin::list` panics on a wildcard entry.
        CorsOrigins::List(list) if list.iter().any(|origin| origin == "*") => AllowOrigin::any(),
        CorsOrigins::List(list) => AllowOrigin::list(list.iter().cloned()),
    };

    CorsLayer::new()
        .allow_origin(allow_origin)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::DELETE,
            Method::OPTIONS,
        ])
        .allow_headers([
            header::ORIGIN,
            HeaderName::from_static("x-requested-with"),
            header::CONTENT_TYPE,
            header::ACCEPT,
        ])
}

fn handle_panic(payload: Box<dyn Any + Send + 'static>) -> Response {
    let detail = payload
        .downcast_ref::<&str>()
        .map(|s| (*s).to_owned())
        .or_else(|| payload.downcast_ref::<String>().cloned())
        .unwrap_or_else(|| String::from("non-string panic payload"));

    tracing::error!(panic = %detail, "Request handler panicked");

    failure_response(StatusCode::INTERNAL_SERVER_ERROR, INTERNAL_ERROR_MESSAGE)
}
