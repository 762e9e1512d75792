//! Event-management migration: disciplines, events, division pools, fields,
//! game rounds
//!
//! The legacy schema never recorded a division type or a round
//! classification; both are derived here from display names, the way the
//! records were actually used.

use tracing::{error, info, warn};
use uuid::Uuid;

use gamestats_common::Result;

use crate::db::{self, events as events_db};
use crate::fixtures::LegacyRecord;
use crate::registry::EntityKind;
use crate::report::{RecordOutcome, SkipReason, StageCounts};
use crate::resolve::RefChain;

use super::{run_records, StageContext};

pub(crate) const DISCIPLINE_FILE: &str = "events_discipline.json";
pub(crate) const EVENT_FILE: &str = "events_event.json";
// The data lives in the events-prefixed file; the games-prefixed variant of
// this export is empty
pub(crate) const DIVISION_POOL_FILE: &str = "events_divisionpool.json";
pub(crate) const FIELD_FILE: &str = "core_field.json";
pub(crate) const GAME_ROUND_FILE: &str = "games_gameround.json";

/// Legacy discipline keys to slugs
const DISCIPLINE_ALIASES: &[(i64, &str)] = &[(1, "ultimate"), (2, "basketball"), (3, "soccer")];

const DISCIPLINE_COUNTRY_CHAIN: RefChain = RefChain::first_available(EntityKind::Country);

const EVENT_DISCIPLINE_CHAIN: RefChain = RefChain {
    kind: EntityKind::Discipline,
    aliases: DISCIPLINE_ALIASES,
    first_available: false,
};

const DIVISION_EVENT_CHAIN: RefChain = RefChain::first_available(EntityKind::Event);
const FIELD_LOCATION_CHAIN: RefChain = RefChain::first_available(EntityKind::Location);

pub async fn migrate_disciplines(cx: &StageContext<'_>) -> Result<StageCounts> {
    let records = cx.fixtures.load(DISCIPLINE_FILE)?;
    run_records(cx, "disciplines", records, |record| {
        migrate_discipline(cx, record)
    })
    .await
}

async fn migrate_discipline(cx: &StageContext<'_>, record: LegacyRecord) -> Result<RecordOutcome> {
    let legacy_id = record.legacy_id();
    let slug = record.str_field("slug");

    if let Some(existing) = db::find_by_natural_key(cx.pool, EntityKind::Discipline, &slug).await? {
        cx.registry.set(EntityKind::Discipline, legacy_id, existing);
        return Ok(RecordOutcome::Existing);
    }

    let country_key = record.int_field("country");
    let Some(country_id) = cx
        .resolver()
        .resolve(&DISCIPLINE_COUNTRY_CHAIN, country_key)
        .await?
    else {
        return Ok(RecordOutcome::Skipped(SkipReason::UnresolvedReference(
            EntityKind::Country,
        )));
    };

    let created = events_db::create_discipline(
        cx.pool,
        &record.str_field("name"),
        &slug,
        &record.str_field("description"),
        country_id,
    )
    .await;

    match created {
        Ok(guid) => {
            cx.registry.set(EntityKind::Discipline, legacy_id, guid);
            Ok(RecordOutcome::Created)
        }
        Err(e) => {
            error!(error = %e, %slug, "Failed to create discipline");
            Ok(RecordOutcome::Failed)
        }
    }
}

pub async fn migrate_events(cx: &StageContext<'_>) -> Result<StageCounts> {
    let records = cx.fixtures.load(EVENT_FILE)?;
    run_records(cx, "events", records, |record| migrate_event(cx, record)).await
}

async fn migrate_event(cx: &StageContext<'_>, record: LegacyRecord) -> Result<RecordOutcome> {
    let legacy_id = record.legacy_id();
    let slug = record.str_field("slug");

    if let Some(existing) = db::find_by_natural_key(cx.pool, EntityKind::Event, &slug).await? {
        cx.registry.set(EntityKind::Event, legacy_id, existing);
        return Ok(RecordOutcome::Existing);
    }

    let resolver = cx.resolver();

    // Both edges are optional; an event without them is still worth keeping
    let discipline_key = record.int_field("discipline");
    let discipline_id = resolver
        .resolve(&EVENT_DISCIPLINE_CHAIN, discipline_key)
        .await?;
    if discipline_id.is_none() {
        warn!(legacy_key = discipline_key, "Discipline not found for event");
    }

    let location_key = record.int_field("location");
    let location_id = resolver.mapped(EntityKind::Location, location_key).await?;
    if location_id.is_none() {
        warn!(legacy_key = location_key, "Location not found for event");
    }

    let event = events_db::NewEvent {
        name: record.str_field("name"),
        slug: slug.clone(),
        description: record.str_field("description"),
        year: record.int_field("year"),
        start_date: record.time_field("start_date"),
        end_date: record.time_field("end_date"),
        discipline_id,
        location_id,
    };

    match events_db::create_event(cx.pool, &event).await {
        Ok(guid) => {
            cx.registry.set(EntityKind::Event, legacy_id, guid);
            Ok(RecordOutcome::Created)
        }
        Err(e) => {
            error!(error = %e, %slug, "Failed to create event");
            Ok(RecordOutcome::Failed)
        }
    }
}

pub async fn migrate_division_pools(cx: &StageContext<'_>) -> Result<StageCounts> {
    let records = cx.fixtures.load(DIVISION_POOL_FILE)?;
    if records.is_empty() {
        info!("No division pool fixtures found");
        return Ok(StageCounts::default());
    }

    run_records(cx, "division_pools", records, |record| {
        migrate_division_pool(cx, record)
    })
    .await
}

async fn migrate_division_pool(
    cx: &StageContext<'_>,
    record: LegacyRecord,
) -> Result<RecordOutcome> {
    let legacy_id = record.legacy_id();
    let name = record.str_field("name");

    if let Some(existing) = db::find_by_natural_key(cx.pool, EntityKind::Division, &name).await? {
        cx.registry.set(EntityKind::Division, legacy_id, existing);
        return Ok(RecordOutcome::Existing);
    }

    let event_id = cx
        .resolver()
        .resolve(&DIVISION_EVENT_CHAIN, record.int_field("event"))
        .await?;

    let mut division_type = record.str_field("division_type");
    if division_type.is_empty() {
        division_type = infer_division_type(&name).to_string();
    }

    let created = events_db::create_division_pool(
        cx.pool,
        &name,
        &division_type,
        &record.str_field("description"),
        event_id,
    )
    .await;

    match created {
        Ok(guid) => {
            cx.registry.set(EntityKind::Division, legacy_id, guid);
            Ok(RecordOutcome::Created)
        }
        Err(e) => {
            error!(error = %e, %name, "Failed to create division pool");
            Ok(RecordOutcome::Failed)
        }
    }
}

/// The legacy schema had no division type column; read it off the name
fn infer_division_type(name: &str) -> &'static str {
    let lower = name.to_lowercase();
    if lower.contains("mixed") {
        "mixed"
    } else if lower.contains("open") {
        "open"
    } else if lower.contains("women") {
        "women"
    } else {
        "pool"
    }
}

pub async fn migrate_fields(cx: &StageContext<'_>) -> Result<StageCounts> {
    let records = cx.fixtures.load(FIELD_FILE)?;
    if records.is_empty() {
        info!("No field fixtures found");
        return Ok(StageCounts::default());
    }

    run_records(cx, "fields", records, |record| migrate_field(cx, record)).await
}

async fn migrate_field(cx: &StageContext<'_>, record: LegacyRecord) -> Result<RecordOutcome> {
    let legacy_id = record.legacy_id();
    let name = record.str_field("name");

    if let Some(existing) = db::find_by_natural_key(cx.pool, EntityKind::Field, &name).await? {
        cx.registry.set(EntityKind::Field, legacy_id, existing);
        return Ok(RecordOutcome::Existing);
    }

    let location_id = cx
        .resolver()
        .resolve(&FIELD_LOCATION_CHAIN, record.int_field("location"))
        .await?;

    let created = events_db::create_field(
        cx.pool,
        &name,
        &record.str_field("surface_type"),
        record.int_field("capacity"),
        location_id,
    )
    .await;

    match created {
        Ok(guid) => {
            cx.registry.set(EntityKind::Field, legacy_id, guid);
            Ok(RecordOutcome::Created)
        }
        Err(e) => {
            error!(error = %e, %name, "Failed to create field");
            Ok(RecordOutcome::Failed)
        }
    }
}

pub async fn migrate_game_rounds(cx: &StageContext<'_>) -> Result<StageCounts> {
    let records = cx.fixtures.load(GAME_ROUND_FILE)?;

    // Rounds attach to whichever event migrated first
    let event_id = db::first_id(cx.pool, EntityKind::Event).await?;

    run_records(cx, "game_rounds", records, |record| {
        migrate_game_round(cx, event_id, record)
    })
    .await
}

async fn migrate_game_round(
    cx: &StageContext<'_>,
    event_id: Option<Uuid>,
    record: LegacyRecord,
) -> Result<RecordOutcome> {
    let legacy_id = record.legacy_id();
    let name = record.str_field("name");

    if let Some(existing) = db::find_by_natural_key(cx.pool, EntityKind::GameRound, &name).await? {
        cx.registry.set(EntityKind::GameRound, legacy_id, existing);
        return Ok(RecordOutcome::Existing);
    }

    let (round_type, round_number) = round_profile(&name, legacy_id);

    let created =
        events_db::create_game_round(cx.pool, &name, round_type, round_number, event_id).await;

    match created {
        Ok(guid) => {
            cx.registry.set(EntityKind::GameRound, legacy_id, guid);
            Ok(RecordOutcome::Created)
        }
        Err(e) => {
            error!(error = %e, %name, "Failed to create game round");
            Ok(RecordOutcome::Failed)
        }
    }
}

/// Round classification from the display name.
///
/// The legacy schema never stored this; the table covers the names that
/// actually occur, including the misspelled quarter finals.
fn round_profile(name: &str, legacy_id: i64) -> (&'static str, i64) {
    match name {
        "Round Robin" => ("pool", 1),
        "Play-Offs" => ("bracket", 2),
        "Quater Finals" | "Quarter Finals" => ("bracket", 3),
        "Semi-Finals" => ("bracket", 4),
        "Finals" => ("final", 5),
        _ => ("pool", legacy_id),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn division_type_reads_off_the_name() {
        assert_eq!(infer_division_type("Mixed Division"), "mixed");
        assert_eq!(infer_division_type("Open"), "open");
        assert_eq!(infer_division_type("Women's Division"), "women");
        assert_eq!(infer_division_type("Pool A"), "pool");
        assert_eq!(infer_division_type("Something Else"), "pool");
    }

    #[test]
    fn round_profile_covers_known_names() {
        assert_eq!(round_profile("Round Robin", 9), ("pool", 1));
        assert_eq!(round_profile("Play-Offs", 9), ("bracket", 2));
        // Both the correct spelling and the legacy typo classify
        assert_eq!(round_profile("Quarter Finals", 9), ("bracket", 3));
        assert_eq!(round_profile("Quater Finals", 9), ("bracket", 3));
        assert_eq!(round_profile("Semi-Finals", 9), ("bracket", 4));
        assert_eq!(round_profile("Finals", 9), ("final", 5));
        assert_eq!(round_profile("Unknown Round", 9), ("pool", 9));
    }
}
