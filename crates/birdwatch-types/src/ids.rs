//! Type-safe identifier wrapper around [`Uuid`].
//!
//! Observations use UUID v7 (time-ordered) identifiers generated on the
//! application side, so the memory store and `PostgreSQL` assign ids the
//! same way.

use std::str::FromStr;

use serde::{Deserialize, Serialize};
use ts_rs::TS;
use uuid::Uuid;

/// Unique identifier for a stored bird observation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, TS)]
#[ts(export, export_to = "bindings/")]
pub struct ObservationId(pub Uuid);

impl ObservationId {
    /// Create a new identifier using UUID v7 (time-ordered).
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }

    /// Return the inner [`Uuid`] value.
    pub const fn into_inner(self) -> Uuid {
        self.0
    }
}

impl Default for ObservationId {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Display for ObservationId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ObservationId {
    type Err = uuid::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s).map(Self)
    }
}

impl From<Uuid> for ObservationId {
    fn from(id: Uuid) -> Self {
        Self(id)
    }
}

impl From<ObservationId> for Uuid {
    fn from(id: ObservationId) -> Self {
        id.0
    }
}
