//! Reduced results of the aggregation queries.
//!
//! Each struct is the single winning group of one group/sort/limit
//! reduction. A store returns `None` instead of a summary when there is
//! nothing to reduce. All counts are exact integers; only the average and
//! the rare percentage are floating point, rounded to hundredths at the
//! presentation edge.

use chrono::{DateTime, Utc};
use serde::Serialize;

/// The species with the largest summed `observationCount`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesTotal {
    /// Common name of the species.
    pub common_name: String,
    /// Sum of `observationCount` over the species' records.
    pub total_observations: u64,
    /// Number of records for the species.
    pub record_count: u64,
}

/// The location with the most distinct species.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct LocationDiversity {
    /// Location name.
    pub location_name: String,
    /// Number of distinct common names seen there.
    pub species_count: u64,
}

/// The exact observation timestamp shared by the most records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DateActivity {
    /// The full timestamp (not a calendar day).
    pub observation_date: DateTime<Utc>,
    /// Records carrying exactly that timestamp.
    pub record_count: u64,
}

/// The species appearing in the most records of a filtered subset.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesFrequency {
    /// Common name of the species.
    pub common_name: String,
    /// Number of matching records.
    pub occurrences: u64,
}

/// The species seen at the most distinct locations.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeciesRange {
    /// Common name of the species.
    pub common_name: String,
    /// Number of distinct location names.
    pub location_count: u64,
}

/// Rare-flagged records against all records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct RarityTally {
    /// Records with `isRare = true`.
    pub rare_count: u64,
    /// All records.
    pub total_count: u64,
}

impl RarityTally {
    /// Share of rare records in percent, or `None` for an empty store.
    #[allow(clippy::cast_precision_loss)]
    pub fn percentage(self) -> Option<f64> {
        if self.total_count == 0 {
            return None;
        }
        Some(self.rare_count as f64 / self.total_count as f64 * 100.0)
    }

    /// `"25.00%"`, or `"0%"` for an empty store.
    pub fn render_percentage(self) -> String {
        self.percentage()
            .map_or_else(|| String::from("0%"), |pct| format!("{pct:.2}%"))
    }
}

/// Round to two decimal places.
pub fn round_hundredths(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn rare_percentage_renders_two_decimals() {
        let tally = RarityTally {
            rare_count: 1,
            total_count: 4,
        };
        assert_eq!(tally.render_percentage(), "25.00%");

        let thirds = RarityTally {
            rare_count: 1,
            total_count: 3,
        };
        assert_eq!(thirds.render_percentage(), "33.33%");
    }

    #[test]
    fn empty_tally_is_zero_percent() {
        let tally = RarityTally::default();
        assert_eq!(tally.percentage(), None);
        assert_eq!(tally.render_percentage(), "0%");
    }

    #[test]
    fn rounds_to_hundredths() {
        assert_eq!(round_hundredths(11.75), 11.75);
        assert_eq!(round_hundredths(10.0 / 3.0), 3.33);
        assert_eq!(round_hundredths(2.0 / 3.0), 0.67);
    }

    #[test]
    fn summaries_serialize_camel_case() {
        let total = SpeciesTotal {
            common_name: String::from("Rock Pigeon"),
            total_observations: 43,
            record_count: 2,
        };
        let json = serde_json::to_value(&total).unwrap_or_default();
        assert_eq!(json["commonName"], "Rock Pigeon");
        assert_eq!(json["totalObservations"], 43);
        assert_eq!(json["recordCount"], 2);
    }
}
