//! In-process group/sort/limit reductions over a slice of observations.
//!
//! These mirror the SQL aggregations of
//! [`PgObservationStore`](crate::observation_store::PgObservationStore):
//! groups are kept in first-seen order and the winner is the first group
//! reaching the maximum, so a tie goes to the group whose earliest record
//! comes first in the slice.

use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use birdwatch_types::{
    DateActivity, LocationDiversity, Observation, RarityTally, SpeciesFrequency, SpeciesRange,
    SpeciesTotal,
};

/// Group `records` by `key`, folding each record into its group's
/// accumulator. Groups come back in the order their first record appears.
fn group_by<'a, K, A, I, F, G>(records: I, key: F, mut fold: G) -> Vec<(K, A)>
where
    K: Eq + Hash + Clone,
    A: Default,
    I: IntoIterator<Item = &'a Observation>,
    F: Fn(&'a Observation) -> K,
    G: FnMut(&mut A, &'a Observation),
{
    let mut groups: Vec<(K, A)> = Vec::new();
    let mut index: HashMap<K, usize> = HashMap::new();

    for record in records {
        let k = key(record);
        let slot = *index.entry(k.clone()).or_insert_with(|| {
            groups.push((k, A::default()));
            groups.len().saturating_sub(1)
        });
        if let Some((_, acc)) = groups.get_mut(slot) {
            fold(acc, record);
        }
    }

    groups
}

/// The first item with the largest `measure`.
///
/// [`Iterator::max_by_key`] returns the last maximum, which would hand
/// ties to the most recently seen group.
fn first_max<T, F>(items: impl IntoIterator<Item = T>, measure: F) -> Option<T>
where
    F: Fn(&T) -> u64,
{
    let mut best: Option<(u64, T)> = None;
    for item in items {
        let m = measure(&item);
        if best.as_ref().is_none_or(|(top, _)| m > *top) {
            best = Some((m, item));
        }
    }
    best.map(|(_, item)| item)
}

fn len_u64(len: usize) -> u64 {
    u64::try_from(len).unwrap_or(u64::MAX)
}

/// Sum of `observationCount` and record count per species.
#[derive(Debug, Default)]
struct Tally {
    total: u64,
    records: u64,
}

/// Species with the largest summed count.
pub fn top_species_by_total(records: &[Observation]) -> Option<SpeciesTotal> {
    let groups = group_by(
        records,
        |r| r.common_name.as_str(),
        |tally: &mut Tally, r| {
            tally.total = tally.total.saturating_add(r.observation_count);
            tally.records = tally.records.saturating_add(1);
        },
    );

    first_max(groups, |(_, tally)| tally.total).map(|(name, tally)| SpeciesTotal {
        common_name: name.to_owned(),
        total_observations: tally.total,
        record_count: tally.records,
    })
}

/// Mean count per observation, unrounded.
#[allow(clippy::cast_precision_loss)]
pub fn average_count(records: &[Observation]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    let sum = records
        .iter()
        .map(|r| r.observation_count)
        .fold(0_u64, u64::saturating_add);
    Some(sum as f64 / records.len() as f64)
}

/// Location with the most distinct species.
pub fn most_diverse_location(records: &[Observation]) -> Option<LocationDiversity> {
    let groups = group_by::<_, HashSet<&str>, _, _, _>(
        records,
        |r| r.location_name.as_str(),
        |species, r| {
            species.insert(r.common_name.as_str());
        },
    );

    first_max(groups, |(_, species)| len_u64(species.len())).map(|(name, species)| {
        LocationDiversity {
            location_name: name.to_owned(),
            species_count: len_u64(species.len()),
        }
    })
}

/// Exact timestamp carried by the most records.
pub fn busiest_date(records: &[Observation]) -> Option<DateActivity> {
    let groups = group_by(
        records,
        |r| r.observation_date,
        |count: &mut u64, _| *count = count.saturating_add(1),
    );

    first_max(groups, |(_, count)| *count).map(|(date, count)| DateActivity {
        observation_date: date,
        record_count: count,
    })
}

/// Number of distinct common names.
pub fn distinct_species_count(records: &[Observation]) -> u64 {
    let names: HashSet<&str> = records.iter().map(|r| r.common_name.as_str()).collect();
    len_u64(names.len())
}

/// Species with the most records whose count exceeds `threshold`.
pub fn top_species_in_groups_over(
    records: &[Observation],
    threshold: u64,
) -> Option<SpeciesFrequency> {
    let groups = group_by(
        records.iter().filter(|r| r.observation_count > threshold),
        |r| r.common_name.as_str(),
        |count: &mut u64, _| *count = count.saturating_add(1),
    );

    first_max(groups, |(_, count)| *count).map(|(name, count)| SpeciesFrequency {
        common_name: name.to_owned(),
        occurrences: count,
    })
}

/// Rare-flagged and total record counts.
pub fn rarity_tally(records: &[Observation]) -> RarityTally {
    RarityTally {
        rare_count: len_u64(records.iter().filter(|r| r.is_rare).count()),
        total_count: len_u64(records.len()),
    }
}

/// Species seen at the most distinct locations.
pub fn widest_distribution(records: &[Observation]) -> Option<SpeciesRange> {
    let groups = group_by::<_, HashSet<&str>, _, _, _>(
        records,
        |r| r.common_name.as_str(),
        |locations, r| {
            locations.insert(r.location_name.as_str());
        },
    );

    first_max(groups, |(_, locations)| len_u64(locations.len())).map(|(name, locations)| {
        SpeciesRange {
            common_name: name.to_owned(),
            location_count: len_u64(locations.len()),
        }
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used, clippy::float_cmp, clippy::indexing_slicing)]
mod tests {
    use birdwatch_types::{NewObservation, ObservationId};
    use chrono::{DateTime, Utc};

    use super::*;

    fn at(ts: &str) -> DateTime<Utc> {
        ts.parse().unwrap()
    }

    fn obs(name: &str, count: u64, location: &str, date: &str, rare: bool) -> Observation {
        NewObservation {
            species_code: name.to_lowercase().replace(' ', ""),
            common_name: name.to_owned(),
            scientific_name: String::from("Avis testus"),
            observation_count: count,
            location_name: location.to_owned(),
            latitude: 29.6,
            longitude: -82.3,
            observation_date: at(date),
            is_rare: rare,
            protocol: None,
            duration: None,
        }
        .into_observation(ObservationId::new(), Utc::now())
    }

    fn sample() -> Vec<Observation> {
        vec![
            obs("Rock Pigeon", 25, "Orange Creek", "2025-09-14T07:23:00Z", false),
            obs("Rock Pigeon", 18, "Paynes Prairie", "2025-09-14T08:30:00Z", false),
            obs("Northern Cardinal", 3, "Orange Creek", "2025-09-15T07:00:00Z", false),
            obs("Painted Bunting", 1, "Sweetwater Wetlands", "2025-09-16T09:15:00Z", true),
        ]
    }

    #[test]
    fn highest_total_species() {
        let top = top_species_by_total(&sample()).unwrap();
        assert_eq!(top.common_name, "Rock Pigeon");
        assert_eq!(top.total_observations, 43);
        assert_eq!(top.record_count, 2);
    }

    #[test]
    fn average_of_sample() {
        assert_eq!(average_count(&sample()), Some(11.75));
        assert_eq!(average_count(&[]), None);
    }

    #[test]
    fn diversity_counts_distinct_species() {
        let mut records = sample();
        // A repeat sighting must not inflate the set size.
        records.push(obs("Northern Cardinal", 2, "Orange Creek", "2025-09-18T07:00:00Z", false));

        let top = most_diverse_location(&records).unwrap();
        assert_eq!(top.location_name, "Orange Creek");
        assert_eq!(top.species_count, 2);
    }

    #[test]
    fn busiest_date_groups_by_full_timestamp() {
        let records = vec![
            obs("A", 1, "X", "2025-09-14T07:00:00Z", false),
            obs("B", 1, "X", "2025-09-14T08:00:00Z", false),
            obs("C", 1, "X", "2025-09-15T07:00:00Z", false),
            obs("D", 1, "X", "2025-09-15T07:00:00Z", false),
        ];
        let top = busiest_date(&records).unwrap();
        assert_eq!(top.observation_date, at("2025-09-15T07:00:00Z"));
        assert_eq!(top.record_count, 2);
    }

    #[test]
    fn distinct_species() {
        assert_eq!(distinct_species_count(&sample()), 3);
        assert_eq!(distinct_species_count(&[]), 0);
    }

    #[test]
    fn large_groups_filter_is_strict() {
        let records = vec![
            obs("Mourning Dove", 10, "X", "2025-09-14T07:00:00Z", false),
            obs("Mourning Dove", 10, "X", "2025-09-14T07:00:00Z", false),
            obs("Rock Pigeon", 11, "X", "2025-09-14T07:00:00Z", false),
        ];
        let top = top_species_in_groups_over(&records, 10).unwrap();
        assert_eq!(top.common_name, "Rock Pigeon");
        assert_eq!(top.occurrences, 1);

        let none = top_species_in_groups_over(&records[..2], 10);
        assert_eq!(none, None);
    }

    #[test]
    fn rarity_of_sample() {
        let tally = rarity_tally(&sample());
        assert_eq!(tally.rare_count, 1);
        assert_eq!(tally.total_count, 4);
    }

    #[test]
    fn widest_distribution_of_sample() {
        let top = widest_distribution(&sample()).unwrap();
        assert_eq!(top.common_name, "Rock Pigeon");
        assert_eq!(top.location_count, 2);
    }

    #[test]
    fn ties_go_to_first_seen_group() {
        let records = vec![
            obs("Blue Jay", 5, "Orange Creek", "2025-09-14T07:00:00Z", false),
            obs("Great Blue Heron", 2, "Paynes Prairie", "2025-09-14T08:00:00Z", false),
            obs("Great Blue Heron", 3, "Paynes Prairie", "2025-09-14T09:00:00Z", false),
        ];
        assert_eq!(top_species_by_total(&records).unwrap().common_name, "Blue Jay");
        assert_eq!(
            most_diverse_location(&records).unwrap().location_name,
            "Orange Creek"
        );
        assert_eq!(widest_distribution(&records).unwrap().common_name, "Blue Jay");
        assert_eq!(
            busiest_date(&records).unwrap().observation_date,
            at("2025-09-14T07:00:00Z")
        );
    }

    #[test]
    fn empty_input_has_no_winner() {
        assert_eq!(top_species_by_total(&[]), None);
        assert_eq!(most_diverse_location(&[]), None);
        assert_eq!(busiest_date(&[]), None);
        assert_eq!(top_species_in_groups_over(&[], 10), None);
        assert_eq!(widest_distribution(&[]), None);
        assert_eq!(rarity_tally(&[]), RarityTally::default());
    }
}
