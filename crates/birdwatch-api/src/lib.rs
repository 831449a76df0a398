//! HTTP API server for the Florida Birds observation service.
//!
//! This crate provides an Axum HTTP server that exposes:
//!
//! - **CRUD endpoints** (`/api/observations`, `/api/observations/{id}`)
//!   over the single observation record type
//! - **Question endpoints** (`/api/questions/*`) that each run one
//!   aggregation over the whole table and answer in plain JSON
//! - **Service descriptor** (`GET /`) listing every route
//!
//! # Architecture
//!
//! Handlers are stateless. The only shared state is the
//! [`ObservationStore`](birdwatch_db::ObservationStore) handle in
//! [`AppState`], opened once at startup and reused by every request.
//! Responses use the `{success, data | error}` envelope; unmatched routes
//! and panicking handlers get JSON 404 and 500 envelopes from the router.

pub mod config;
pub mod error;
pub mod extract;
pub mod handlers;
pub mod questions;
pub mod router;
pub mod server;
pub mod state;

// Re-export primary types for convenience.
pub use config::{ApiConfig, ConfigError, CorsOrigins, LogFormat, StoreBackend};
pub use error::ApiError;
pub use router::build_router;
pub use server::{ServerConfig, ServerError, shutdown_signal, start_server};
pub use state::AppState;
