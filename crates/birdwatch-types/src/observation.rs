//! The observation record and its write-time validation.
//!
//! Three shapes cover the record's lifecycle:
//!
//! - [`ObservationDraft`] -- what a client submits on create. Every field
//!   is optional so that a missing field is reported as a validation
//!   failure instead of a decoding error.
//! - [`NewObservation`] -- a draft that passed validation. Stores only
//!   accept this type, so nothing unvalidated is ever written.
//! - [`Observation`] -- a stored record with its server-assigned id and
//!   timestamps.
//!
//! [`ObservationPatch`] carries a partial update. It is merged onto the
//! stored record and the result is revalidated as a whole.

use std::fmt;

use chrono::{DateTime, Utc};
use serde::de::{self, Unexpected, Visitor};
use serde::{Deserialize, Deserializer, Serialize};
use ts_rs::TS;
use validator::{Validate, ValidationErrors};

use crate::ids::ObservationId;

// ---------------------------------------------------------------------------
// Stored record
// ---------------------------------------------------------------------------

/// A stored bird sighting event.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, TS)]
#[serde(rename_all = "camelCase")]
#[ts(export, export_to = "bindings/")]
pub struct Observation {
    /// Server-assigned identifier, immutable after creation.
    pub id: ObservationId,
    /// Short eBird-style species code (e.g. `rocpig`).
    pub species_code: String,
    /// Common name; the grouping key for species.
    pub common_name: String,
    /// Scientific (binomial) name.
    pub scientific_name: String,
    /// Number of individuals seen in this sighting event.
    pub observation_count: u64,
    /// Location name; the grouping key for places.
    pub location_name: String,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// When the sighting happened.
    pub observation_date: DateTime<Utc>,
    /// Whether the species is flagged as rare for the region.
    pub is_rare: bool,
    /// Survey method, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub protocol: Option<String>,
    /// Survey duration in minutes, if recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[ts(optional)]
    pub duration: Option<f64>,
    /// When the record was created.
    pub created_at: DateTime<Utc>,
    /// When the record was last modified.
    pub updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Validated payload
// ---------------------------------------------------------------------------

/// Client-settable fields of an observation that passed validation.
#[derive(Debug, Clone, PartialEq)]
pub struct NewObservation {
    /// Short species code.
    pub species_code: String,
    /// Common name.
    pub common_name: String,
    /// Scientific name.
    pub scientific_name: String,
    /// Number of individuals seen.
    pub observation_count: u64,
    /// Location name.
    pub location_name: String,
    /// Latitude in decimal degrees.
    pub latitude: f64,
    /// Longitude in decimal degrees.
    pub longitude: f64,
    /// When the sighting happened.
    pub observation_date: DateTime<Utc>,
    /// Rare-species flag.
    pub is_rare: bool,
    /// Survey method.
    pub protocol: Option<String>,
    /// Survey duration in minutes.
    pub duration: Option<f64>,
}

impl NewObservation {
    /// Turn the payload into a freshly created record.
    pub fn into_observation(self, id: ObservationId, now: DateTime<Utc>) -> Observation {
        Observation {
            id,
            species_code: self.species_code,
            common_name: self.common_name,
            scientific_name: self.scientific_name,
            observation_count: self.observation_count,
            location_name: self.location_name,
            latitude: self.latitude,
            longitude: self.longitude,
            observation_date: self.observation_date,
            is_rare: self.is_rare,
            protocol: self.protocol,
            duration: self.duration,
            created_at: now,
            updated_at: now,
        }
    }

    /// Replace the fields of `existing`, keeping its id and creation time.
    pub fn replacing(self, existing: &Observation, now: DateTime<Utc>) -> Observation {
        let mut record = self.into_observation(existing.id, now);
        record.created_at = existing.created_at;
        record
    }
}

// ---------------------------------------------------------------------------
// Client draft
// ---------------------------------------------------------------------------

/// An unvalidated create payload as decoded from a request body.
///
/// Unknown fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ObservationDraft {
    /// Short species code.
    #[validate(required, length(min = 1))]
    pub species_code: Option<String>,
    /// Common name.
    #[validate(required, length(min = 1))]
    pub common_name: Option<String>,
    /// Scientific name.
    #[validate(required, length(min = 1))]
    pub scientific_name: Option<String>,
    /// Number of individuals seen; negative values are rejected.
    ///
    /// Integral floats such as `3.0` are accepted.
    #[serde(default, deserialize_with = "whole_count")]
    #[validate(required, range(min = 0))]
    pub observation_count: Option<i64>,
    /// Location name.
    #[validate(required, length(min = 1))]
    pub location_name: Option<String>,
    /// Latitude in decimal degrees.
    #[validate(required)]
    pub latitude: Option<f64>,
    /// Longitude in decimal degrees.
    #[validate(required)]
    pub longitude: Option<f64>,
    /// When the sighting happened.
    #[validate(required)]
    pub observation_date: Option<DateTime<Utc>>,
    /// Rare-species flag; `false` when absent.
    pub is_rare: Option<bool>,
    /// Survey method.
    pub protocol: Option<String>,
    /// Survey duration in minutes.
    pub duration: Option<f64>,
}

impl ObservationDraft {
    /// Check required fields and numeric constraints, producing a
    /// [`NewObservation`] on success.
    ///
    /// Every violation is reported, not just the first one.
    pub fn into_validated(self) -> Result<NewObservation, ValidationFailure> {
        self.validate()?;

        let Self {
            species_code: Some(species_code),
            common_name: Some(common_name),
            scientific_name: Some(scientific_name),
            observation_count: Some(observation_count),
            location_name: Some(location_name),
            latitude: Some(latitude),
            longitude: Some(longitude),
            observation_date: Some(observation_date),
            is_rare,
            protocol,
            duration,
        } = self
        else {
            return Err(ValidationFailure::single(
                "observation",
                "observation is incomplete",
            ));
        };

        let observation_count = u64::try_from(observation_count).map_err(|_e| {
            ValidationFailure::single("observationCount", "observationCount must be at least 0")
        })?;

        Ok(NewObservation {
            species_code,
            common_name,
            scientific_name,
            observation_count,
            location_name,
            latitude,
            longitude,
            observation_date,
            is_rare: is_rare.unwrap_or(false),
            protocol,
            duration,
        })
    }
}

impl From<&Observation> for ObservationDraft {
    fn from(record: &Observation) -> Self {
        Self {
            species_code: Some(record.species_code.clone()),
            common_name: Some(record.common_name.clone()),
            scientific_name: Some(record.scientific_name.clone()),
            observation_count: i64::try_from(record.observation_count).ok(),
            location_name: Some(record.location_name.clone()),
            latitude: Some(record.latitude),
            longitude: Some(record.longitude),
            observation_date: Some(record.observation_date),
            is_rare: Some(record.is_rare),
            protocol: record.protocol.clone(),
            duration: record.duration,
        }
    }
}

// ---------------------------------------------------------------------------
// Partial update
// ---------------------------------------------------------------------------

/// A partial update decoded from a request body.
///
/// The outer `Option` records whether the field was present at all; the
/// inner one whether it was `null`. Absent fields are left unchanged.
/// `null` clears `protocol` and `duration`, resets `isRare` to `false`,
/// and fails validation for required fields. The identifier and unknown
/// fields are ignored.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ObservationPatch {
    /// New species code.
    #[serde(default, deserialize_with = "present")]
    pub species_code: Option<Option<String>>,
    /// New common name.
    #[serde(default, deserialize_with = "present")]
    pub common_name: Option<Option<String>>,
    /// New scientific name.
    #[serde(default, deserialize_with = "present")]
    pub scientific_name: Option<Option<String>>,
    /// New count.
    #[serde(default, deserialize_with = "present_whole_count")]
    pub observation_count: Option<Option<i64>>,
    /// New location name.
    #[serde(default, deserialize_with = "present")]
    pub location_name: Option<Option<String>>,
    /// New latitude.
    #[serde(default, deserialize_with = "present")]
    pub latitude: Option<Option<f64>>,
    /// New longitude.
    #[serde(default, deserialize_with = "present")]
    pub longitude: Option<Option<f64>>,
    /// New sighting time.
    #[serde(default, deserialize_with = "present")]
    pub observation_date: Option<Option<DateTime<Utc>>>,
    /// New rare flag.
    #[serde(default, deserialize_with = "present")]
    pub is_rare: Option<Option<bool>>,
    /// New survey method.
    #[serde(default, deserialize_with = "present")]
    pub protocol: Option<Option<String>>,
    /// New survey duration.
    #[serde(default, deserialize_with = "present")]
    pub duration: Option<Option<f64>>,
}

impl ObservationPatch {
    /// Merge the patch onto `current` and revalidate the result.
    pub fn apply(self, current: &Observation) -> Result<NewObservation, ValidationFailure> {
        let mut draft = ObservationDraft::from(current);

        overlay(&mut draft.species_code, self.species_code);
        overlay(&mut draft.common_name, self.common_name);
        overlay(&mut draft.scientific_name, self.scientific_name);
        overlay(&mut draft.observation_count, self.observation_count);
        overlay(&mut draft.location_name, self.location_name);
        overlay(&mut draft.latitude, self.latitude);
        overlay(&mut draft.longitude, self.longitude);
        overlay(&mut draft.observation_date, self.observation_date);
        overlay(&mut draft.is_rare, self.is_rare);
        overlay(&mut draft.protocol, self.protocol);
        overlay(&mut draft.duration, self.duration);

        draft.into_validated()
    }

    /// Whether the patch sets no fields at all.
    pub const fn is_empty(&self) -> bool {
        self.species_code.is_none()
            && self.common_name.is_none()
            && self.scientific_name.is_none()
            && self.observation_count.is_none()
            && self.location_name.is_none()
            && self.latitude.is_none()
            && self.longitude.is_none()
            && self.observation_date.is_none()
            && self.is_rare.is_none()
            && self.protocol.is_none()
            && self.duration.is_none()
    }
}

fn overlay<T>(slot: &mut Option<T>, update: Option<Option<T>>) {
    if let Some(value) = update {
        *slot = value;
    }
}

/// Marks a field as present even when its value is `null`.
fn present<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Largest magnitude at which every integral `f64` is exact.
const MAX_EXACT_COUNT: f64 = 9_007_199_254_740_992.0;

/// A count decoded from an integer, an integral float or a numeric string.
struct WholeCount(i64);

impl<'de> Deserialize<'de> for WholeCount {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_any(WholeCountVisitor)
    }
}

#[derive(Clone, Copy)]
struct WholeCountVisitor;

impl Visitor<'_> for WholeCountVisitor {
    type Value = WholeCount;

    fn expecting(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("a whole number")
    }

    fn visit_i64<E: de::Error>(self, v: i64) -> Result<Self::Value, E> {
        Ok(WholeCount(v))
    }

    fn visit_u64<E: de::Error>(self, v: u64) -> Result<Self::Value, E> {
        i64::try_from(v)
            .map(WholeCount)
            .map_err(|_e| E::invalid_value(Unexpected::Unsigned(v), &self))
    }

    fn visit_f64<E: de::Error>(self, v: f64) -> Result<Self::Value, E> {
        if !v.is_finite() || v.fract().abs() > 0.0 || v.abs() > MAX_EXACT_COUNT {
            return Err(E::invalid_value(Unexpected::Float(v), &self));
        }
        // Integral and within the exact range, so nothing is truncated.
        #[allow(clippy::cast_possible_truncation)]
        let whole = v as i64;
        Ok(WholeCount(whole))
    }

    fn visit_str<E: de::Error>(self, v: &str) -> Result<Self::Value, E> {
        let trimmed = v.trim();
        if let Ok(whole) = trimmed.parse::<i64>() {
            return Ok(WholeCount(whole));
        }
        trimmed
            .parse::<f64>()
            .map_err(|_e| E::invalid_value(Unexpected::Str(v), &self))
            .and_then(|float| self.visit_f64(float))
    }
}

fn whole_count<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    Option::<WholeCount>::deserialize(deserializer).map(|count| count.map(|c| c.0))
}

fn present_whole_count<'de, D>(deserializer: D) -> Result<Option<Option<i64>>, D::Error>
where
    D: Deserializer<'de>,
{
    whole_count(deserializer).map(Some)
}

// ---------------------------------------------------------------------------
// Validation errors
// ---------------------------------------------------------------------------

/// One rejected field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldViolation {
    /// The camelCase wire name of the field.
    pub field: String,
    /// Human-readable reason.
    pub message: String,
}

/// A create or update payload was rejected.
///
/// Violations are sorted by field name so messages are stable.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("Observation validation failed: {}", summarize(.violations))]
pub struct ValidationFailure {
    /// Every rejected field.
    pub violations: Vec<FieldViolation>,
}

impl ValidationFailure {
    /// A failure with a single violation.
    pub fn single(field: &str, message: &str) -> Self {
        Self {
            violations: vec![FieldViolation {
                field: field.to_owned(),
                message: message.to_owned(),
            }],
        }
    }

    /// Whether `field` is among the violations.
    pub fn mentions(&self, field: &str) -> bool {
        self.violations.iter().any(|v| v.field == field)
    }
}

impl From<ValidationErrors> for ValidationFailure {
    fn from(errors: ValidationErrors) -> Self {
        let mut violations: Vec<FieldViolation> = errors
            .field_errors()
            .into_iter()
            .filter_map(|(field, errs)| {
                let field = camel_case(&field);
                // One violation per field: a missing value fails nothing else.
                errs.first().map(|err| FieldViolation {
                    message: describe(&field, &err.code),
                    field,
                })
            })
            .collect();
        violations.sort_by(|a, b| a.field.cmp(&b.field));

        Self { violations }
    }
}

fn summarize(violations: &[FieldViolation]) -> String {
    violations
        .iter()
        .map(|v| v.message.as_str())
        .collect::<Vec<_>>()
        .join(", ")
}

fn describe(field: &str, code: &str) -> String {
    match code {
        "required" => format!("{field} is required"),
        "length" => format!("{field} must not be empty"),
        "range" => format!("{field} must be at least 0"),
        other => format!("{field} is invalid ({other})"),
    }
}

/// `species_code` -> `speciesCode`.
fn camel_case(name: &str) -> String {
    let mut out = String::with_capacity(name.len());
    let mut upper = false;
    for c in name.chars() {
        if c == '_' {
            upper = true;
        } else if upper {
            out.extend(c.to_uppercase());
            upper = false;
        } else {
            out.push(c);
        }
    }
    out
}
