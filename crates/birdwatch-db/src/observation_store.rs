//! `PostgreSQL` implementation of [`ObservationStore`].
//!
//! Each operation is a single statement, except `update` which reads the
//! row `FOR UPDATE`, merges and revalidates the patch in Rust, and writes
//! it back inside one transaction. Aggregations are `GROUP BY` queries
//! ordered by their measure and then by `MIN(seq)` so ties go to the
//! group inserted first, matching the [`reduce`](crate::reduce) passes.
//!
//! See: `migrations/20250914000000_create_observations.sql`

use async_trait::async_trait;
use birdwatch_types::{
    DateActivity, LocationDiversity, NewObservation, Observation, ObservationId, ObservationPatch,
    RarityTally, SpeciesFrequency, SpeciesRange, SpeciesTotal, ValidationFailure,
};
use chrono::{DateTime, Utc};
use sqlx::{PgExecutor, PgPool};
use uuid::Uuid;

use crate::error::DbError;
use crate::store::ObservationStore;

/// Column list shared by every query returning a full row.
macro_rules! observation_columns {
    () => {
        "id, species_code, common_name, scientific_name, observation_count, \
         location_name, latitude, longitude, observation_date, is_rare, \
         protocol, duration, created_at, updated_at"
    };
}

/// Operations on the `observations` table.
#[derive(Debug, Clone)]
pub struct PgObservationStore {
    pool: PgPool,
}

impl PgObservationStore {
    /// Create a store over a connection pool.
    pub const fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

/// A row from the `observations` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ObservationRow {
    /// Observation UUID.
    pub id: Uuid,
    /// Species code.
    pub species_code: String,
    /// Common name.
    pub common_name: String,
    /// Scientific name.
    pub scientific_name: String,
    /// Individuals seen (`CHECK >= 0`).
    pub observation_count: i64,
    /// Location name.
    pub location_name: String,
    /// Latitude.
    pub latitude: f64,
    /// Longitude.
    pub longitude: f64,
    /// Sighting time.
    pub observation_date: DateTime<Utc>,
    /// Rare flag.
    pub is_rare: bool,
    /// Survey method.
    pub protocol: Option<String>,
    /// Survey duration in minutes.
    pub duration: Option<f64>,
    /// Creation time.
    pub created_at: DateTime<Utc>,
    /// Last modification time.
    pub updated_at: DateTime<Utc>,
}

impl TryFrom<ObservationRow> for Observation {
    type Error = DbError;

    fn try_from(row: ObservationRow) -> Result<Self, Self::Error> {
        let observation_count = u64::try_from(row.observation_count).map_err(|_e| {
            DbError::Corrupt(format!(
                "observation {} has negative count {}",
                row.id, row.observation_count
            ))
        })?;

        Ok(Self {
            id: ObservationId::from(row.id),
            species_code: row.species_code,
            common_name: row.common_name,
            scientific_name: row.scientific_name,
            observation_count,
            location_name: row.location_name,
            latitude: row.latitude,
            longitude: row.longitude,
            observation_date: row.observation_date,
            is_rare: row.is_rare,
            protocol: row.protocol,
            duration: row.duration,
            created_at: row.created_at,
            updated_at: row.updated_at,
        })
    }
}

/// Bind a count as `BIGINT`.
fn db_count(count: u64) -> Result<i64, DbError> {
    i64::try_from(count).map_err(|_e| {
        DbError::Validation(ValidationFailure::single(
            "observationCount",
            "observationCount is too large",
        ))
    })
}

/// Read a `COUNT(*)`-style column back as unsigned.
fn row_count(value: i64) -> u64 {
    u64::try_from(value).unwrap_or(0)
}

async fn insert_one<'e, E>(executor: E, record: &Observation) -> Result<Observation, DbError>
where
    E: PgExecutor<'e>,
{
    let row = sqlx::query_as::<_, ObservationRow>(concat!(
        "INSERT INTO observations (",
        observation_columns!(),
        ") VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, $10, $11, $12, $13, $14) RETURNING ",
        observation_columns!()
    ))
    .bind(record.id.into_inner())
    .bind(&record.species_code)
    .bind(&record.common_name)
    .bind(&record.scientific_name)
    .bind(db_count(record.observation_count)?)
    .bind(&record.location_name)
    .bind(record.latitude)
    .bind(record.longitude)
    .bind(record.observation_date)
    .bind(record.is_rare)
    .bind(record.protocol.as_deref())
    .bind(record.duration)
    .bind(record.created_at)
    .bind(record.updated_at)
    .fetch_one(executor)
    .await?;

    Observation::try_from(row)
}

#[async_trait]
impl ObservationStore for PgObservationStore {
    async fn create(&self, new: NewObservation) -> Result<Observation, DbError> {
        let record = new.into_observation(ObservationId::new(), Utc::now());
        let created = insert_one(&self.pool, &record).await?;

        tracing::debug!(id = %created.id, species = %created.common_name, "Inserted observation");

        Ok(created)
    }

    async fn insert_many(&self, batch: Vec<NewObservation>) -> Result<Vec<Observation>, DbError> {
        let now = Utc::now();
        let mut tx = self.pool.begin().await?;
        let mut created = Vec::with_capacity(batch.len());

        for new in batch {
            let record = new.into_observation(ObservationId::new(), now);
            created.push(insert_one(&mut *tx, &record).await?);
        }

        tx.commit().await?;

        tracing::info!(count = created.len(), "Inserted observation batch");

        Ok(created)
    }

    async fn list(&self) -> Result<Vec<Observation>, DbError> {
        let rows = sqlx::query_as::<_, ObservationRow>(concat!(
            "SELECT ",
            observation_columns!(),
            " FROM observations ORDER BY seq"
        ))
        .fetch_all(&self.pool)
        .await?;

        rows.into_iter().map(Observation::try_from).collect()
    }

    async fn get(&self, id: ObservationId) -> Result<Option<Observation>, DbError> {
        let row = sqlx::query_as::<_, ObservationRow>(concat!(
            "SELECT ",
            observation_columns!(),
            " FROM observations WHERE id = $1"
        ))
        .bind(id.into_inner())
        .fetch_optional(&self.pool)
        .await?;

        row.map(Observation::try_from).transpose()
    }

    async fn update(
        &self,
        id: ObservationId,
        patch: ObservationPatch,
    ) -> Result<Option<Observation>, DbError> {
        let mut tx = self.pool.begin().await?;

        let current = sqlx::query_as::<_, ObservationRow>(concat!(
            "SELECT ",
            observation_columns!(),
            " FROM observations WHERE id = $1 FOR UPDATE"
        ))
        .bind(id.into_inner())
        .fetch_optional(&mut *tx)
        .await?;

        // Dropping the transaction rolls it back.
        let Some(current) = current else {
            return Ok(None);
        };
        let current = Observation::try_from(current)?;
        let revised = patch.apply(&current)?.replacing(&current, Utc::now());

        let row = sqlx::query_as::<_, ObservationRow>(concat!(
            "UPDATE observations SET species_code = $2, common_name = $3, \
             scientific_name = $4, observation_count = $5, location_name = $6, \
             latitude = $7, longitude = $8, observation_date = $9, is_rare = $10, \
             protocol = $11, duration = $12, updated_at = $13 \
             WHERE id = $1 RETURNING ",
            observation_columns!()
        ))
        .bind(id.into_inner())
        .bind(&revised.species_code)
        .bind(&revised.common_name)
        .bind(&revised.scientific_name)
        .bind(db_count(revised.observation_count)?)
        .bind(&revised.location_name)
        .bind(revised.latitude)
        .bind(revised.longitude)
        .bind(revised.observation_date)
        .bind(revised.is_rare)
        .bind(revised.protocol.as_deref())
        .bind(revised.duration)
        .bind(revised.updated_at)
        .fetch_one(&mut *tx)
        .await?;

        tx.commit().await?;

        Observation::try_from(row).map(Some)
    }

    async fn delete(&self, id: ObservationId) -> Result<bool, DbError> {
        let result = sqlx::query("DELETE FROM observations WHERE id = $1")
            .bind(id.into_inner())
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn delete_all(&self) -> Result<u64, DbError> {
        let result = sqlx::query("DELETE FROM observations")
            .execute(&self.pool)
            .await?;

        Ok(result.rows_affected())
    }

    async fn top_species_by_total(&self) -> Result<Option<SpeciesTotal>, DbError> {
        let row: Option<(String, i64, i64)> = sqlx::query_as(
            r"SELECT common_name,
                     SUM(observation_count)::BIGINT AS total_observations,
                     COUNT(*) AS record_count
              FROM observations
              GROUP BY common_name
              ORDER BY total_observations DESC, MIN(seq) ASC
              LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(common_name, total, records)| SpeciesTotal {
            common_name,
            total_observations: row_count(total),
            record_count: row_count(records),
        }))
    }

    async fn average_count(&self) -> Result<Option<f64>, DbError> {
        let average: Option<f64> = sqlx::query_scalar(
            r"SELECT AVG(observation_count)::DOUBLE PRECISION FROM observations",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(average)
    }

    async fn most_diverse_location(&self) -> Result<Option<LocationDiversity>, DbError> {
        let row: Option<(String, i64)> = sqlx::query_as(
            r"SELECT location_name,
                     COUNT(DISTINCT common_name) AS species_count
              FROM observations
              GROUP BY location_name
              ORDER BY species_count DESC, MIN(seq) ASC
              LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(location_name, species)| LocationDiversity {
            location_name,
            species_count: row_count(species),
        }))
    }

    async fn busiest_date(&self) -> Result<Option<DateActivity>, DbError> {
        let row: Option<(DateTime<Utc>, i64)> = sqlx::query_as(
            r"SELECT observation_date,
                     COUNT(*) AS record_count
              FROM observations
              GROUP BY observation_date
              ORDER BY record_count DESC, MIN(seq) ASC
              LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(observation_date, records)| DateActivity {
            observation_date,
            record_count: row_count(records),
        }))
    }

    async fn distinct_species_count(&self) -> Result<u64, DbError> {
        let count: i64 =
            sqlx::query_scalar(r"SELECT COUNT(DISTINCT common_name) FROM observations")
                .fetch_one(&self.pool)
                .await?;

        Ok(row_count(count))
    }

    async fn top_species_in_groups_over(
        &self,
        threshold: u64,
    ) -> Result<Option<SpeciesFrequency>, DbError> {
        let row: Option<(String, i64)> = sqlx::query_as(
            r"SELECT common_name,
                     COUNT(*) AS occurrences
              FROM observations
              WHERE observation_count > $1
              GROUP BY common_name
              ORDER BY occurrences DESC, MIN(seq) ASC
              LIMIT 1",
        )
        .bind(i64::try_from(threshold).unwrap_or(i64::MAX))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(common_name, occurrences)| SpeciesFrequency {
            common_name,
            occurrences: row_count(occurrences),
        }))
    }

    async fn rarity_tally(&self) -> Result<RarityTally, DbError> {
        let (rare, total): (i64, i64) = sqlx::query_as(
            r"SELECT COUNT(*) FILTER (WHERE is_rare) AS rare_count,
                     COUNT(*) AS total_count
              FROM observations",
        )
        .fetch_one(&self.pool)
        .await?;

        Ok(RarityTally {
            rare_count: row_count(rare),
            total_count: row_count(total),
        })
    }

    async fn widest_distribution(&self) -> Result<Option<SpeciesRange>, DbError> {
        let row: Option<(String, i64)> = sqlx::query_as(
            r"SELECT common_name,
                     COUNT(DISTINCT location_name) AS location_count
              FROM observations
              GROUP BY common_name
              ORDER BY location_count DESC, MIN(seq) ASC
              LIMIT 1",
        )
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.map(|(common_name, locations)| SpeciesRange {
            common_name,
            location_count: row_count(locations),
        }))
    }
}
