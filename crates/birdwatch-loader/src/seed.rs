//! The fixed seed set: nine sightings across three Alachua County sites.

use anyhow::Context;
use birdwatch_types::{NewObservation, ObservationDraft};
use chrono::{DateTime, Utc};

const ORANGE_CREEK: Site = Site {
    name: "Orange Creek Restoration Area--Alachua Co.",
    latitude: 29.5853,
    longitude: -82.1426,
};

const PAYNES_PRAIRIE: Site = Site {
    name: "Paynes Prairie Preserve",
    latitude: 29.6116,
    longitude: -82.2807,
};

const SWEETWATER: Site = Site {
    name: "Sweetwater Wetlands Park",
    latitude: 29.6744,
    longitude: -82.397,
};

struct Site {
    name: &'static str,
    latitude: f64,
    longitude: f64,
}

struct Sighting {
    code: &'static str,
    common: &'static str,
    scientific: &'static str,
    count: i64,
    site: Site,
    at: &'static str,
    rare: bool,
}

const SIGHTINGS: [Sighting; 9] = [
    Sighting {
        code: "rocpig",
        common: "Rock Pigeon",
        scientific: "Columba livia",
        count: 25,
        site: ORANGE_CREEK,
        at: "2025-09-14T07:23:00Z",
        rare: false,
    },
    Sighting {
        code: "rocpig",
        common: "Rock Pigeon",
        scientific: "Columba livia",
        count: 18,
        site: PAYNES_PRAIRIE,
        at: "2025-09-14T08:30:00Z",
        rare: false,
    },
    Sighting {
        code: "norcrd",
        common: "Northern Cardinal",
        scientific: "Cardinalis cardinalis",
        count: 3,
        site: ORANGE_CREEK,
        at: "2025-09-15T07:00:00Z",
        rare: false,
    },
    Sighting {
        code: "blujay",
        common: "Blue Jay",
        scientific: "Cyanocitta cristata",
        count: 5,
        site: ORANGE_CREEK,
        at: "2025-09-14T07:23:00Z",
        rare: false,
    },
    Sighting {
        code: "paibun",
        common: "Painted Bunting",
        scientific: "Passerina ciris",
        count: 1,
        site: SWEETWATER,
        at: "2025-09-16T09:15:00Z",
        rare: true,
    },
    Sighting {
        code: "grehaw",
        common: "Great Blue Heron",
        scientific: "Ardea herodias",
        count: 2,
        site: PAYNES_PRAIRIE,
        at: "2025-09-14T08:30:00Z",
        rare: false,
    },
    Sighting {
        code: "amekes",
        common: "American Kestrel",
        scientific: "Falco sparverius",
        count: 1,
        site: SWEETWATER,
        at: "2025-09-16T09:15:00Z",
        rare: false,
    },
    Sighting {
        code: "mocdov",
        common: "Mourning Dove",
        scientific: "Zenaida macroura",
        count: 12,
        site: ORANGE_CREEK,
        at: "2025-09-14T07:23:00Z",
        rare: false,
    },
    Sighting {
        code: "rehwoo",
        common: "Red-headed Woodpecker",
        scientific: "Melanerpes erythrocephalus",
        count: 2,
        site: SWEETWATER,
        at: "2025-09-17T08:45:00Z",
        rare: false,
    },
];

/// The seed set, validated like any client payload.
pub fn seed_observations() -> anyhow::Result<Vec<NewObservation>> {
    SIGHTINGS
        .iter()
        .map(|s| {
            let at: DateTime<Utc> = s
                .at
                .parse()
                .with_context(|| format!("bad seed timestamp {}", s.at))?;
            let draft = ObservationDraft {
                species_code: Some(s.code.to_owned()),
                common_name: Some(s.common.to_owned()),
                scientific_name: Some(s.scientific.to_owned()),
                observation_count: Some(s.count),
                location_name: Some(s.site.name.to_owned()),
                latitude: Some(s.site.latitude),
                longitude: Some(s.site.longitude),
                observation_date: Some(at),
                is_rare: Some(s.rare),
                protocol: None,
                duration: None,
            };
            draft
                .into_validated()
                .with_context(|| format!("invalid seed {}", s.common))
        })
        .collect()
}
