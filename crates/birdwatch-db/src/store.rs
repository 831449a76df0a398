//! The storage seam between handlers and the record store.

use async_trait::async_trait;
use birdwatch_types::{
    DateActivity, LocationDiversity, NewObservation, Observation, ObservationId, ObservationPatch,
    RarityTally, SpeciesFrequency, SpeciesRange, SpeciesTotal,
};

use crate::error::DbError;

/// Single-record CRUD and aggregation queries over the observation table.
///
/// Implementations must be safe to share across request tasks. Every
/// write touches exactly one record, except the bulk operations used by
/// the loader. Aggregations reduce the whole table and return only the
/// winning group; ties go to the group whose first record was inserted
/// earliest.
#[async_trait]
pub trait ObservationStore: Send + Sync {
    /// Insert a validated observation, assigning its id and timestamps.
    async fn create(&self, new: NewObservation) -> Result<Observation, DbError>;

    /// Insert many observations, in order.
    async fn insert_many(&self, batch: Vec<NewObservation>) -> Result<Vec<Observation>, DbError>;

    /// Every stored observation in insertion order.
    async fn list(&self) -> Result<Vec<Observation>, DbError>;

    /// The observation with `id`, if any.
    async fn get(&self, id: ObservationId) -> Result<Option<Observation>, DbError>;

    /// Merge `patch` onto the observation with `id` and revalidate.
    ///
    /// Returns `Ok(None)` when no such observation exists and
    /// [`DbError::Validation`] when the merged record is invalid.
    async fn update(
        &self,
        id: ObservationId,
        patch: ObservationPatch,
    ) -> Result<Option<Observation>, DbError>;

    /// Delete the observation with `id`. Returns whether it existed.
    async fn delete(&self, id: ObservationId) -> Result<bool, DbError>;

    /// Delete every observation. Returns how many were removed.
    async fn delete_all(&self) -> Result<u64, DbError>;

    /// Species with the largest summed count.
    async fn top_species_by_total(&self) -> Result<Option<SpeciesTotal>, DbError>;

    /// Mean count per observation, unrounded.
    async fn average_count(&self) -> Result<Option<f64>, DbError>;

    /// Location with the most distinct species.
    async fn most_diverse_location(&self) -> Result<Option<LocationDiversity>, DbError>;

    /// Exact timestamp carried by the most records.
    async fn busiest_date(&self) -> Result<Option<DateActivity>, DbError>;

    /// Number of distinct common names.
    async fn distinct_species_count(&self) -> Result<u64, DbError>;

    /// Species with the most records whose count exceeds `threshold`.
    async fn top_species_in_groups_over(
        &self,
        threshold: u64,
    ) -> Result<Option<SpeciesFrequency>, DbError>;

    /// Rare-flagged and total record counts.
    async fn rarity_tally(&self) -> Result<RarityTally, DbError>;

    /// Species seen at the most distinct locations.
    async fn widest_distribution(&self) -> Result<Option<SpeciesRange>, DbError>;
}
