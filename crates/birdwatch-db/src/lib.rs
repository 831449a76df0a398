//! Data access layer for the Florida Birds observation service.
//!
//! Every endpoint reaches storage through the [`ObservationStore`] trait.
//! Two implementations exist:
//!
//! ```text
//! Handlers
//!     |
//!     +-- Arc<dyn ObservationStore>
//!         |-- PgObservationStore  (PostgreSQL, production)
//!         +-- MemoryStore         (in-process, tests and local runs)
//! ```
//!
//! Both implement the same single-record CRUD and the same eight
//! aggregation queries, with ties broken in favor of the group whose
//! first record was inserted earliest.
//!
//! # Modules
//!
//! - [`postgres`] -- `PostgreSQL` connection pool, configuration, and migrations
//! - [`store`] -- The [`ObservationStore`] trait
//! - [`observation_store`] -- SQL implementation of the trait
//! - [`memory`] -- In-memory implementation of the trait
//! - [`reduce`] -- In-process group/sort/limit reductions
//! - [`error`] -- Shared error types

pub mod error;
pub mod memory;
pub mod observation_store;
pub mod postgres;
pub mod reduce;
pub mod store;

// Re-export primary types for convenience.
pub use error::DbError;
pub use memory::MemoryStore;
pub use observation_store::{ObservationRow, PgObservationStore};
pub use postgres::{DEFAULT_DATABASE_URL, PostgresConfig, PostgresPool};
pub use store::ObservationStore;
