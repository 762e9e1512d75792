//! Geographic hierarchy migration: world, continents, countries, locations
//!
//! Everything below hangs off this chain, so these stages lean hardest on
//! the fallback tables. The legacy export keyed continents and countries
//! inconsistently across files; the alias tables here recover the handful of
//! closed-set keys it actually used.

use sqlx::SqlitePool;
use tracing::{error, warn};
use uuid::Uuid;

use gamestats_common::Result;

use crate::db::{self, geography as geo_db};
use crate::fixtures::LegacyRecord;
use crate::registry::EntityKind;
use crate::report::{RecordOutcome, SkipReason, StageCounts};
use crate::resolve::RefChain;

use super::{run_records, StageContext};

pub(crate) const WORLD_FILE: &str = "core_world.json";
pub(crate) const CONTINENT_FILE: &str = "core_continent.json";
pub(crate) const COUNTRY_FILE: &str = "core_country.json";
pub(crate) const LOCATION_FILE: &str = "core_location.json";

/// Legacy continent keys to slugs
const CONTINENT_ALIASES: &[(i64, &str)] = &[
    (1, "africa"),
    (2, "europe"),
    (3, "asia"),
    (4, "north-america"),
    (5, "south-america"),
    (6, "oceania"),
];

/// Legacy country keys to slugs; the legacy system only ever held three
const COUNTRY_ALIASES: &[(i64, &str)] = &[(1, "kenya"), (2, "uganda"), (3, "tanzania")];

const CONTINENT_CHAIN: RefChain = RefChain {
    kind: EntityKind::Continent,
    aliases: CONTINENT_ALIASES,
    first_available: true,
};

const COUNTRY_CHAIN: RefChain = RefChain {
    kind: EntityKind::Country,
    aliases: COUNTRY_ALIASES,
    first_available: true,
};

/// ISO codes for the countries the legacy data actually carried
const COUNTRY_CODES: &[(&str, &str)] = &[
    ("kenya", "KE"),
    ("uganda", "UG"),
    ("tanzania", "TZ"),
    ("rwanda", "RW"),
    ("ethiopia", "ET"),
];

/// Fetch or create the default world every continent hangs from
pub(crate) async fn ensure_world(pool: &SqlitePool) -> Result<Uuid> {
    if let Some(existing) = geo_db::find_world(pool, "earth").await? {
        return Ok(existing);
    }
    geo_db::create_world(pool, "Earth", "earth", "Planet Earth").await
}

pub async fn migrate_world(cx: &StageContext<'_>) -> Result<StageCounts> {
    let records = cx.fixtures.load(WORLD_FILE)?;

    if records.is_empty() {
        warn!("No world fixtures found, ensuring the default world");
        let mut counts = StageCounts::default();
        let outcome = if geo_db::find_world(cx.pool, "earth").await?.is_some() {
            RecordOutcome::Existing
        } else {
            geo_db::create_world(cx.pool, "Earth", "earth", "Planet Earth").await?;
            RecordOutcome::Created
        };
        counts.record(&outcome);
        return Ok(counts);
    }

    run_records(cx, "world", records, |record| {
        migrate_world_record(cx, record)
    })
    .await
}

async fn migrate_world_record(
    cx: &StageContext<'_>,
    record: LegacyRecord,
) -> Result<RecordOutcome> {
    let mut slug = record.str_field("slug");
    if slug.is_empty() {
        slug = "earth".to_string();
    }

    // Worlds carry no legacy keys, so existence is the whole check
    if geo_db::find_world(cx.pool, &slug).await?.is_some() {
        return Ok(RecordOutcome::Existing);
    }

    let created = geo_db::create_world(
        cx.pool,
        &record.str_field("name"),
        &slug,
        &record.str_field("description"),
    )
    .await;

    match created {
        Ok(_) => Ok(RecordOutcome::Created),
        Err(e) => {
            error!(error = %e, %slug, "Failed to create world");
            Ok(RecordOutcome::Failed)
        }
    }
}

pub async fn migrate_continents(cx: &StageContext<'_>) -> Result<StageCounts> {
    let records = cx.fixtures.load(CONTINENT_FILE)?;

    // Continents hang from the world; make sure one exists before the loop
    let world_id = ensure_world(cx.pool).await?;

    run_records(cx, "continents", records, |record| {
        migrate_continent(cx, world_id, record)
    })
    .await
}

async fn migrate_continent(
    cx: &StageContext<'_>,
    world_id: Uuid,
    record: LegacyRecord,
) -> Result<RecordOutcome> {
    let legacy_id = record.legacy_id();
    let slug = record.str_field("slug");

    if let Some(existing) = db::find_by_natural_key(cx.pool, EntityKind::Continent, &slug).await? {
        cx.registry.set(EntityKind::Continent, legacy_id, existing);
        return Ok(RecordOutcome::Existing);
    }

    let created = geo_db::create_continent(
        cx.pool,
        &record.str_field("name"),
        &slug,
        &record.str_field("description"),
        world_id,
    )
    .await;

    match created {
        Ok(guid) => {
            cx.registry.set(EntityKind::Continent, legacy_id, guid);
            Ok(RecordOutcome::Created)
        }
        Err(e) => {
            error!(error = %e, %slug, "Failed to create continent");
            Ok(RecordOutcome::Failed)
        }
    }
}

pub async fn migrate_countries(cx: &StageContext<'_>) -> Result<StageCounts> {
    let records = cx.fixtures.load(COUNTRY_FILE)?;
    run_records(cx, "countries", records, |record| {
        migrate_country(cx, record)
    })
    .await
}

async fn migrate_country(cx: &StageContext<'_>, record: LegacyRecord) -> Result<RecordOutcome> {
    let legacy_id = record.legacy_id();
    let slug = record.str_field("slug");

    if let Some(existing) = db::find_by_natural_key(cx.pool, EntityKind::Country, &slug).await? {
        cx.registry.set(EntityKind::Country, legacy_id, existing);
        return Ok(RecordOutcome::Existing);
    }

    let continent_key = record.int_field("continent");
    let Some(continent_id) = cx.resolver().resolve(&CONTINENT_CHAIN, continent_key).await? else {
        return Ok(RecordOutcome::Skipped(SkipReason::UnresolvedReference(
            EntityKind::Continent,
        )));
    };

    let mut code = record.str_field("code");
    if code.is_empty() {
        code = country_code(&slug);
    }

    let created = geo_db::create_country(
        cx.pool,
        &record.str_field("name"),
        &slug,
        &code,
        &record.str_field("description"),
        continent_id,
    )
    .await;

    match created {
        Ok(guid) => {
            cx.registry.set(EntityKind::Country, legacy_id, guid);
            Ok(RecordOutcome::Created)
        }
        Err(e) => {
            error!(error = %e, %slug, "Failed to create country");
            Ok(RecordOutcome::Failed)
        }
    }
}

/// ISO code for a country slug; unknown slugs take their first two letters
fn country_code(slug: &str) -> String {
    if let Some((_, code)) = COUNTRY_CODES.iter().find(|(s, _)| *s == slug) {
        return (*code).to_string();
    }
    slug.chars().take(2).collect::<String>().to_uppercase()
}

pub async fn migrate_locations(cx: &StageContext<'_>) -> Result<StageCounts> {
    let records = cx.fixtures.load(LOCATION_FILE)?;
    run_records(cx, "locations", records, |record| {
        migrate_location(cx, record)
    })
    .await
}

async fn migrate_location(cx: &StageContext<'_>, record: LegacyRecord) -> Result<RecordOutcome> {
    let legacy_id = record.legacy_id();
    let slug = record.str_field("slug");

    if let Some(existing) = db::find_by_natural_key(cx.pool, EntityKind::Location, &slug).await? {
        cx.registry.set(EntityKind::Location, legacy_id, existing);
        return Ok(RecordOutcome::Existing);
    }

    let country_key = record.int_field("country");
    let Some(country_id) = cx.resolver().resolve(&COUNTRY_CHAIN, country_key).await? else {
        return Ok(RecordOutcome::Skipped(SkipReason::UnresolvedReference(
            EntityKind::Country,
        )));
    };

    let created = geo_db::create_location(
        cx.pool,
        &record.str_field("name"),
        &slug,
        &record.str_field("address"),
        &record.str_field("city"),
        country_id,
    )
    .await;

    match created {
        Ok(guid) => {
            cx.registry.set(EntityKind::Location, legacy_id, guid);
            Ok(RecordOutcome::Created)
        }
        Err(e) => {
            error!(error = %e, %slug, "Failed to create location");
            Ok(RecordOutcome::Failed)
        }
    }
}
