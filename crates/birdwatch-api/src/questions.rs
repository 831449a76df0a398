//! Question endpoints: one aggregation each, answered as
//! `{question, answer, ...}`.
//!
//! An empty table is never an error. Name-valued answers fall back to
//! [`NO_DATA`] with zeroed extras; numeric answers fall back to `0`.

use std::sync::Arc;

use axum::Json;
use axum::extract::State;
use birdwatch_types::round_hundredths;
use serde_json::{Value, json};

use crate::error::ApiError;
use crate::state::AppState;

/// Answer used when there is nothing to aggregate.
pub const NO_DATA: &str = "No data available";

/// `observationCount` must exceed this to count as a large group.
pub const LARGE_GROUP_THRESHOLD: u64 = 10;

/// Q1: species with the highest summed count.
pub async fn highest_observation_species(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let top = state.store.top_species_by_total().await?;
    let answer = top.as_ref().map_or(NO_DATA, |t| t.common_name.as_str());

    Ok(Json(json!({
        "question": "Which bird species has the highest total number of observations?",
        "answer": answer,
        "details": top,
    })))
}

/// Q2: mean count per observation.
pub async fn average_per_observation(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let answer = state
        .store
        .average_count()
        .await?
        .map_or_else(|| json!(0), |avg| json!(round_hundredths(avg)));

    Ok(Json(json!({
        "question": "What is the average number of birds per observation?",
        "answer": answer,
    })))
}

/// Q3: location with the most distinct species.
pub async fn most_diverse_location(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let body = match state.store.most_diverse_location().await? {
        Some(top) => json!({
            "question": "Which location reports the greatest number of unique species?",
            "answer": top.location_name,
            "speciesCount": top.species_count,
        }),
        None => json!({
            "question": "Which location reports the greatest number of unique species?",
            "answer": NO_DATA,
            "speciesCount": 0,
        }),
    };
    Ok(Json(body))
}

/// Q4: timestamp carried by the most records.
pub async fn busiest_observation_date(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let (answer, record_count) = match state.store.busiest_date().await? {
        Some(top) => (json!(top.observation_date), top.record_count),
        None => (json!(NO_DATA), 0),
    };

    Ok(Json(json!({
        "question": "On what date were the most bird observations recorded?",
        "answer": answer,
        "recordCount": record_count,
    })))
}

/// Q5: number of distinct species.
pub async fn distinct_species_count(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let count = state.store.distinct_species_count().await?;

    Ok(Json(json!({
        "question": "How many distinct bird species have been observed in Florida?",
        "answer": count,
    })))
}

/// Q6: species most often seen in groups over [`LARGE_GROUP_THRESHOLD`].
pub async fn most_frequent_large_groups(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let top = state
        .store
        .top_species_in_groups_over(LARGE_GROUP_THRESHOLD)
        .await?;
    let (answer, occurrences) = top.map_or_else(
        || (NO_DATA.to_owned(), 0),
        |t| (t.common_name, t.occurrences),
    );

    Ok(Json(json!({
        "question": "Which species is most frequently observed in groups larger than 10?",
        "answer": answer,
        "occurrences": occurrences,
    })))
}

/// Q7: share of records flagged rare.
pub async fn rare_species_percentage(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let tally = state.store.rarity_tally().await?;

    Ok(Json(json!({
        "question": "What percentage of observations are flagged as rare species?",
        "answer": tally.render_percentage(),
        "rareCount": tally.rare_count,
        "totalCount": tally.total_count,
    })))
}

/// Q8: species seen at the most distinct locations.
pub async fn widest_distribution(
    State(state): State<Arc<AppState>>,
) -> Result<Json<Value>, ApiError> {
    let top = state.store.widest_distribution().await?;
    let (answer, location_count) = top.map_or_else(
        || (NO_DATA.to_owned(), 0),
        |t| (t.common_name, t.location_count),
    );

    Ok(Json(json!({
        "question": "Which species has the widest geographic distribution?",
        "answer": answer,
        "locationCount": location_count,
    })))
}
