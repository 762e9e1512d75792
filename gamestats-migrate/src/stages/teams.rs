//! Team and player migration
//!
//! Players get the composite existence check (name scoped to team) because
//! the legacy rosters reuse names across teams; a name-only match is only
//! trusted when it is unambiguous. The legacy bracket filled empty roster
//! slots with single-letter placeholder players, which are dropped here and
//! never enter the registry.

use tracing::{error, info};

use gamestats_common::Result;

use crate::db::{self, teams as teams_db};
use crate::fixtures::LegacyRecord;
use crate::registry::EntityKind;
use crate::report::{RecordOutcome, SkipReason, StageCounts};
use crate::resolve::RefChain;

use super::{run_records, StageContext};

pub(crate) const TEAM_FILE: &str = "games_team.json";
pub(crate) const PLAYER_FILE: &str = "games_player.json";

/// Name the legacy system gave placeholder (bye) players
const PLACEHOLDER_PLAYER: &str = "A";

const TEAM_DIVISION_CHAIN: RefChain = RefChain::first_available(EntityKind::Division);

pub async fn migrate_teams(cx: &StageContext<'_>) -> Result<StageCounts> {
    let records = cx.fixtures.load(TEAM_FILE)?;
    run_records(cx, "teams", records, |record| migrate_team(cx, record)).await
}

async fn migrate_team(cx: &StageContext<'_>, record: LegacyRecord) -> Result<RecordOutcome> {
    let legacy_id = record.legacy_id();
    let name = record.str_field("name");

    if let Some(existing) = db::find_by_natural_key(cx.pool, EntityKind::Team, &name).await? {
        cx.registry.set(EntityKind::Team, legacy_id, existing);
        return Ok(RecordOutcome::Existing);
    }

    // The legacy origin column sometimes held a division key
    let division_id = cx
        .resolver()
        .resolve(&TEAM_DIVISION_CHAIN, record.int_field("origin"))
        .await?;

    // Home locations were never exported; any location beats none
    let home_location_id = db::first_id(cx.pool, EntityKind::Location).await?;

    let created = teams_db::create_team(
        cx.pool,
        &name,
        record.int_field("initial_seed"),
        division_id,
        home_location_id,
    )
    .await;

    match created {
        Ok(guid) => {
            cx.registry.set(EntityKind::Team, legacy_id, guid);
            Ok(RecordOutcome::Created)
        }
        Err(e) => {
            error!(error = %e, %name, "Failed to create team");
            Ok(RecordOutcome::Failed)
        }
    }
}

pub async fn migrate_players(cx: &StageContext<'_>) -> Result<StageCounts> {
    let records = cx.fixtures.load(PLAYER_FILE)?;
    let counts = run_records(cx, "players", records, |record| {
        migrate_player(cx, record)
    })
    .await?;

    info!(
        total_mapped = cx.registry.count(EntityKind::Player),
        "Players migration complete"
    );
    Ok(counts)
}

async fn migrate_player(cx: &StageContext<'_>, record: LegacyRecord) -> Result<RecordOutcome> {
    let legacy_id = record.legacy_id();
    let name = record.str_field("name");

    if name.is_empty() || name == PLACEHOLDER_PLAYER {
        return Ok(RecordOutcome::Skipped(SkipReason::PlaceholderName));
    }

    let team_key = record.int_field("team");
    let team_id = cx.registry.get(EntityKind::Team, team_key);

    // Same name on the same team is the same person
    if let Some(team_id) = team_id {
        if let Some(existing) = teams_db::find_player_on_team(cx.pool, &name, team_id).await? {
            cx.registry.set(EntityKind::Player, legacy_id, existing);
            return Ok(RecordOutcome::Existing);
        }
    }

    // A name-only match still counts, but only when it is unambiguous
    if let Some(existing) = teams_db::find_single_player_by_name(cx.pool, &name).await? {
        cx.registry.set(EntityKind::Player, legacy_id, existing);
        return Ok(RecordOutcome::Existing);
    }

    // Team membership is required at creation
    let Some(team_id) = team_id else {
        return Ok(RecordOutcome::Skipped(SkipReason::UnresolvedReference(
            EntityKind::Team,
        )));
    };

    let mut gender = record.str_field("gender");
    if gender.is_empty() {
        gender = "M".to_string();
    }

    match teams_db::create_player(cx.pool, &name, &gender, team_id).await {
        Ok(guid) => {
            cx.registry.set(EntityKind::Player, legacy_id, guid);
            Ok(RecordOutcome::Created)
        }
        Err(e) => {
            error!(error = %e, %name, "Failed to create player");
            Ok(RecordOutcome::Failed)
        }
    }
}
