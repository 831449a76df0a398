//! Shared application state for the API server.
//!
//! [`AppState`] holds the one store handle opened at startup. Handlers
//! share it through an [`Arc`]; all mutable state lives behind the store.

use std::sync::Arc;

use birdwatch_db::{MemoryStore, ObservationStore};

use crate::config::CorsOrigins;

/// Shared state for the Axum application.
///
/// Wrapped in [`Arc`] and injected via Axum's `State` extractor.
#[derive(Clone)]
pub struct AppState {
    /// The observation store every handler reads and writes.
    pub store: Arc<dyn ObservationStore>,
    /// Origins allowed by the CORS layer.
    pub cors: CorsOrigins,
}

impl AppState {
    /// Create application state over `store` with the default CORS policy.
    pub fn new(store: Arc<dyn ObservationStore>) -> Self {
        Self {
            store,
            cors: CorsOrigins::default(),
        }
    }

    /// Create application state over an empty [`MemoryStore`].
    pub fn in_memory() -> Self {
        Self::new(Arc::new(MemoryStore::new()))
    }

    /// Replace the CORS origin policy.
    #[must_use]
    pub fn with_cors(mut self, cors: CorsOrigins) -> Self {
        self.cors = cors;
        self
    }
}
