//! Integration tests for the `PostgreSQL` observation store.
//!
//! These tests require a live `PostgreSQL` instance with an isolated test
//! database. Run with:
//!
//! ```bash
//! export DATABASE_TEST_URL=postgresql://localhost:5432/florida_birds_test
//! cargo test -p birdwatch-db -- --ignored --test-threads=1
//! ```
//!
//! All tests are marked `#[ignore]` so they are skipped during normal
//! `cargo test` runs. Each test wipes the table first, so they must not run
//! in parallel.

// Integration tests use expect/unwrap extensively for clarity -- panicking
// on failure is the correct behavior in test code.
#![allow(
    clippy::expect_used,
    clippy::unwrap_used,
    clippy::missing_panics_doc,
    clippy::float_cmp
)]

use birdwatch_db::{DbError, ObservationStore, PgObservationStore, PostgresPool};
use birdwatch_types::{NewObservation, ObservationDraft, ObservationId, ObservationPatch};

/// Fallback when `DATABASE_TEST_URL` is unset.
const DEFAULT_TEST_URL: &str = "postgresql://localhost:5432/florida_birds_test";

// =============================================================================
// Helpers
// =============================================================================

async fn setup() -> (PostgresPool, PgObservationStore) {
    let url = std::env::var("DATABASE_TEST_URL").unwrap_or_else(|_| DEFAULT_TEST_URL.to_owned());
    let pool = PostgresPool::connect_url(&url)
        .await
        .expect("Failed to connect to PostgreSQL -- is the test database running?");
    pool.run_migrations()
        .await
        .expect("Failed to run migrations");

    let store = pool.observations();
    store.delete_all().await.expect("Failed to clear table");
    (pool, store)
}

fn observation(name: &str, count: i64, location: &str, date: &str, rare: bool) -> NewObservation {
    let draft: ObservationDraft = serde_json::from_value(serde_json::json!({
        "speciesCode": name.to_lowercase().replace(' ', ""),
        "commonName": name,
        "scientificName": "Avis testus",
        "observationCount": count,
        "locationName": location,
        "latitude": 29.5853,
        "longitude": -82.1426,
        "observationDate": date,
        "isRare": rare
    }))
    .expect("valid draft json");
    draft.into_validated().expect("valid draft")
}

fn sample() -> Vec<NewObservation> {
    vec![
        observation("Rock Pigeon", 25, "Orange Creek", "2025-09-14T07:23:00Z", false),
        observation("Rock Pigeon", 18, "Paynes Prairie", "2025-09-14T08:30:00Z", false),
        observation("Northern Cardinal", 3, "Orange Creek", "2025-09-15T07:00:00Z", false),
        observation("Painted Bunting", 1, "Sweetwater Wetlands", "2025-09-16T09:15:00Z", true),
    ]
}

// =============================================================================
// CRUD
// =============================================================================

#[tokio::test]
#[ignore = "requires live PostgreSQL (DATABASE_TEST_URL)"]
async fn create_get_roundtrip() {
    let (pool, store) = setup().await;

    let created = store
        .create(observation("Rock Pigeon", 15, "Orange Creek", "2025-09-14T07:23:00Z", false))
        .await
        .unwrap();
    let fetched = store.get(created.id).await.unwrap().unwrap();

    assert_eq!(fetched.id, created.id);
    assert_eq!(fetched.common_name, "Rock Pigeon");
    assert_eq!(fetched.observation_count, 15);
    assert_eq!(fetched.observation_date, created.observation_date);

    pool.close().await;
}

#[tokio::test]
#[ignore = "requires live PostgreSQL (DATABASE_TEST_URL)"]
async fn get_unknown_id_is_none() {
    let (pool, store) = setup().await;
    assert!(store.get(ObservationId::new()).await.unwrap().is_none());
    pool.close().await;
}

#[tokio::test]
#[ignore = "requires live PostgreSQL (DATABASE_TEST_URL)"]
async fn list_returns_insertion_order() {
    let (pool, store) = setup().await;
    store.insert_many(sample()).await.unwrap();

    let all = store.list().await.unwrap();
    assert_eq!(all.len(), 4);
    assert_eq!(all.first().unwrap().observation_count, 25);
    assert_eq!(all.last().unwrap().common_name, "Painted Bunting");

    pool.close().await;
}

#[tokio::test]
#[ignore = "requires live PostgreSQL (DATABASE_TEST_URL)"]
async fn update_merges_and_rejects_invalid() {
    let (pool, store) = setup().await;
    let created = store
        .create(observation("Rock Pigeon", 15, "Orange Creek", "2025-09-14T07:23:00Z", false))
        .await
        .unwrap();

    let patch: ObservationPatch =
        serde_json::from_value(serde_json::json!({ "observationCount": 20 })).unwrap();
    let updated = store.update(created.id, patch).await.unwrap().unwrap();
    assert_eq!(updated.observation_count, 20);
    assert_eq!(updated.location_name, "Orange Creek");
    assert_eq!(updated.created_at, created.created_at);

    let bad: ObservationPatch =
        serde_json::from_value(serde_json::json!({ "commonName": null })).unwrap();
    let result = store.update(created.id, bad).await;
    assert!(matches!(result, Err(DbError::Validation(_))));

    let missing = store
        .update(ObservationId::new(), ObservationPatch::default())
        .await
        .unwrap();
    assert!(missing.is_none());

    pool.close().await;
}

#[tokio::test]
#[ignore = "requires live PostgreSQL (DATABASE_TEST_URL)"]
async fn delete_then_get_is_none() {
    let (pool, store) = setup().await;
    let created = store
        .create(observation("Rock Pigeon", 15, "Orange Creek", "2025-09-14T07:23:00Z", false))
        .await
        .unwrap();

    assert!(store.delete(created.id).await.unwrap());
    assert!(!store.delete(created.id).await.unwrap());
    assert!(store.get(created.id).await.unwrap().is_none());

    pool.close().await;
}

// =============================================================================
// Aggregations
// =============================================================================

#[tokio::test]
#[ignore = "requires live PostgreSQL (DATABASE_TEST_URL)"]
async fn aggregations_over_sample() {
    let (pool, store) = setup().await;
    store.insert_many(sample()).await.unwrap();

    let top = store.top_species_by_total().await.unwrap().unwrap();
    assert_eq!(top.common_name, "Rock Pigeon");
    assert_eq!(top.total_observations, 43);
    assert_eq!(top.record_count, 2);

    assert_eq!(store.average_count().await.unwrap(), Some(11.75));

    let diverse = store.most_diverse_location().await.unwrap().unwrap();
    assert_eq!(diverse.location_name, "Orange Creek");
    assert_eq!(diverse.species_count, 2);

    assert_eq!(store.distinct_species_count().await.unwrap(), 3);

    let large = store.top_species_in_groups_over(10).await.unwrap().unwrap();
    assert_eq!(large.common_name, "Rock Pigeon");
    assert_eq!(large.occurrences, 2);

    let tally = store.rarity_tally().await.unwrap();
    assert_eq!((tally.rare_count, tally.total_count), (1, 4));

    let widest = store.widest_distribution().await.unwrap().unwrap();
    assert_eq!(widest.common_name, "Rock Pigeon");
    assert_eq!(widest.location_count, 2);

    pool.close().await;
}

#[tokio::test]
#[ignore = "requires live PostgreSQL (DATABASE_TEST_URL)"]
async fn aggregation_ties_go_to_first_inserted() {
    let (pool, store) = setup().await;
    store
        .insert_many(vec![
            observation("Blue Jay", 5, "Orange Creek", "2025-09-14T07:00:00Z", false),
            observation("Great Blue Heron", 2, "Paynes Prairie", "2025-09-14T08:00:00Z", false),
            observation("Great Blue Heron", 3, "Paynes Prairie", "2025-09-14T09:00:00Z", false),
        ])
        .await
        .unwrap();

    let top = store.top_species_by_total().await.unwrap().unwrap();
    assert_eq!(top.common_name, "Blue Jay");

    let busiest = store.busiest_date().await.unwrap().unwrap();
    assert_eq!(busiest.observation_date.to_rfc3339(), "2025-09-14T07:00:00+00:00");

    pool.close().await;
}

#[tokio::test]
#[ignore = "requires live PostgreSQL (DATABASE_TEST_URL)"]
async fn aggregations_on_empty_table() {
    let (pool, store) = setup().await;

    assert!(store.top_species_by_total().await.unwrap().is_none());
    assert!(store.average_count().await.unwrap().is_none());
    assert!(store.most_diverse_location().await.unwrap().is_none());
    assert!(store.busiest_date().await.unwrap().is_none());
    assert_eq!(store.distinct_species_count().await.unwrap(), 0);
    assert!(store.top_species_in_groups_over(10).await.unwrap().is_none());
    assert_eq!(store.rarity_tally().await.unwrap().total_count, 0);
    assert!(store.widest_distribution().await.unwrap().is_none());

    pool.close().await;
}
