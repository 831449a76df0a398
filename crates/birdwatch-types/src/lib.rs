//! Shared type definitions for the Florida Birds observation service.
//!
//! This crate is the single source of truth for the observation record
//! and its validation rules. Both the data layer and the HTTP API depend
//! on it; the record types flow downstream to `TypeScript` via `ts-rs`
//! for API clients.
//!
//! # Modules
//!
//! - [`ids`] -- Type-safe UUID wrapper for observation identifiers
//! - [`observation`] -- The stored record, client drafts, partial patches,
//!   and validation
//! - [`summary`] -- Reduced results produced by the aggregation queries

pub mod ids;
pub mod observation;
pub mod summary;

// Re-export all public types at crate root for convenience.
pub use ids::ObservationId;
pub use observation::{
    FieldViolation, NewObservation, Observation, ObservationDraft, ObservationPatch,
    ValidationFailure,
};
pub use summary::{
    DateActivity, LocationDiversity, RarityTally, SpeciesFrequency, SpeciesRange, SpeciesTotal,
    round_hundredths,
};

#[cfg(test)]
mod tests {
    //! Binding generation for the API record types.

    #[test]
    fn export_bindings() {
        // ts-rs writes the files to the `bindings/` directory relative to
        // the crate root.
        use ts_rs::TS;

        let _ = crate::ids::ObservationId::export_all();
        let _ = crate::observation::Observation::export_all();
    }
}
