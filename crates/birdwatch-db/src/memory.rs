//! In-memory observation store.
//!
//! Records live in a `Vec` guarded by a [`RwLock`], so insertion order is
//! the first-seen order used by the [`reduce`](crate::reduce) passes.
//! Used by the HTTP tests and by `STORE_BACKEND=memory` runs; nothing
//! survives a restart.

use async_trait::async_trait;
use birdwatch_types::{
    DateActivity, LocationDiversity, NewObservation, Observation, ObservationId, ObservationPatch,
    RarityTally, SpeciesFrequency, SpeciesRange, SpeciesTotal,
};
use chrono::Utc;
use tokio::sync::RwLock;

use crate::error::DbError;
use crate::reduce;
use crate::store::ObservationStore;

/// Process-local [`ObservationStore`].
#[derive(Debug, Default)]
pub struct MemoryStore {
    records: RwLock<Vec<Observation>>,
}

impl MemoryStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.records.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.records.read().await.is_empty()
    }
}

#[async_trait]
impl ObservationStore for MemoryStore {
    async fn create(&self, new: NewObservation) -> Result<Observation, DbError> {
        let record = new.into_observation(ObservationId::new(), Utc::now());
        self.records.write().await.push(record.clone());
        Ok(record)
    }

    async fn insert_many(&self, batch: Vec<NewObservation>) -> Result<Vec<Observation>, DbError> {
        let now = Utc::now();
        let created: Vec<Observation> = batch
            .into_iter()
            .map(|new| new.into_observation(ObservationId::new(), now))
            .collect();
        self.records.write().await.extend(created.iter().cloned());
        Ok(created)
    }

    async fn list(&self) -> Result<Vec<Observation>, DbError> {
        Ok(self.records.read().await.clone())
    }

    async fn get(&self, id: ObservationId) -> Result<Option<Observation>, DbError> {
        Ok(self
            .records
            .read()
            .await
            .iter()
            .find(|r| r.id == id)
            .cloned())
    }

    async fn update(
        &self,
        id: ObservationId,
        patch: ObservationPatch,
    ) -> Result<Option<Observation>, DbError> {
        let mut records = self.records.write().await;
        let Some(slot) = records.iter_mut().find(|r| r.id == id) else {
            return Ok(None);
        };

        let revised = patch.apply(slot)?.replacing(slot, Utc::now());
        *slot = revised.clone();
        Ok(Some(revised))
    }

    async fn delete(&self, id: ObservationId) -> Result<bool, DbError> {
        let mut records = self.records.write().await;
        let Some(position) = records.iter().position(|r| r.id == id) else {
            return Ok(false);
        };
        records.remove(position);
        Ok(true)
    }

    async fn delete_all(&self) -> Result<u64, DbError> {
        let mut records = self.records.write().await;
        let removed = u64::try_from(records.len()).unwrap_or(u64::MAX);
        records.clear();
        Ok(removed)
    }

    async fn top_species_by_total(&self) -> Result<Option<SpeciesTotal>, DbError> {
        Ok(reduce::top_species_by_total(&self.records.read().await))
    }

    async fn average_count(&self) -> Result<Option<f64>, DbError> {
        Ok(reduce::average_count(&self.records.read().await))
    }

    async fn most_diverse_location(&self) -> Result<Option<LocationDiversity>, DbError> {
        Ok(reduce::most_diverse_location(&self.records.read().await))
    }

    async fn busiest_date(&self) -> Result<Option<DateActivity>, DbError> {
        Ok(reduce::busiest_date(&self.records.read().await))
    }

    async fn distinct_species_count(&self) -> Result<u64, DbError> {
        Ok(reduce::distinct_species_count(&self.records.read().await))
    }

    async fn top_species_in_groups_over(
        &self,
        threshold: u64,
    ) -> Result<Option<SpeciesFrequency>, DbError> {
        Ok(reduce::top_species_in_groups_over(
            &self.records.read().await,
            threshold,
        ))
    }

    async fn rarity_tally(&self) -> Result<RarityTally, DbError> {
        Ok(reduce::rarity_tally(&self.records.read().await))
    }

    async fn widest_distribution(&self) -> Result<Option<SpeciesRange>, DbError> {
        Ok(reduce::widest_distribution(&self.records.read().await))
    }
}
