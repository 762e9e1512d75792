//! Game and scoring migration
//!
//! Games are the join point of the whole graph: both teams must already be
//! mapped or the record is skipped, while division and field fall back to
//! any available row because the store requires them and the legacy keys
//! for them are unreliable. Scoring rows have no natural key at all; the
//! (game, player) pair stands in for one.

use tracing::{error, warn};

use gamestats_common::Result;

use crate::db::{self, games as games_db};
use crate::fixtures::LegacyRecord;
use crate::registry::EntityKind;
use crate::report::{RecordOutcome, SkipReason, StageCounts};
use crate::resolve::RefChain;

use super::{run_records, StageContext};

pub(crate) const GAME_FILE: &str = "games_game.json";
pub(crate) const SCORING_FILE: &str = "games_scoring.json";

const GAME_DIVISION_CHAIN: RefChain = RefChain::first_available(EntityKind::Division);
const GAME_FIELD_CHAIN: RefChain = RefChain::first_available(EntityKind::Field);

/// Legacy games are history; they arrive already played
const MIGRATED_GAME_STATUS: &str = "completed";

/// The legacy schema had no duration column
const DEFAULT_GAME_MINUTES: i64 = 60;

pub async fn migrate_games(cx: &StageContext<'_>) -> Result<StageCounts> {
    let records = cx.fixtures.load(GAME_FILE)?;
    run_records(cx, "games", records, |record| migrate_game(cx, record)).await
}

async fn migrate_game(cx: &StageContext<'_>, record: LegacyRecord) -> Result<RecordOutcome> {
    let legacy_id = record.legacy_id();
    let name = record.str_field("name");

    if let Some(existing) = db::find_by_natural_key(cx.pool, EntityKind::Game, &name).await? {
        cx.registry.set(EntityKind::Game, legacy_id, existing);
        return Ok(RecordOutcome::Existing);
    }

    let resolver = cx.resolver();

    let home_key = record.int_field("home_team");
    let away_key = record.int_field("away_team");
    let home_team = resolver.mapped(EntityKind::Team, home_key).await?;
    let away_team = resolver.mapped(EntityKind::Team, away_key).await?;
    let (Some(home_team_id), Some(away_team_id)) = (home_team, away_team) else {
        warn!(%name, home_key, away_key, "Teams not found for game");
        return Ok(RecordOutcome::Skipped(SkipReason::UnresolvedReference(
            EntityKind::Team,
        )));
    };

    let Some(division_pool_id) = resolver
        .resolve(&GAME_DIVISION_CHAIN, record.int_field("division_pool"))
        .await?
    else {
        return Ok(RecordOutcome::Skipped(SkipReason::UnresolvedReference(
            EntityKind::Division,
        )));
    };

    let Some(field_id) = resolver
        .resolve(&GAME_FIELD_CHAIN, record.int_field("field"))
        .await?
    else {
        return Ok(RecordOutcome::Skipped(SkipReason::UnresolvedReference(
            EntityKind::Field,
        )));
    };

    // Round membership is the one optional edge
    let game_round_id = resolver
        .mapped(EntityKind::GameRound, record.int_field("game_round"))
        .await?;

    let game = games_db::NewGame {
        name: &name,
        scheduled_time: record.time_field("date"),
        allocated_time_minutes: DEFAULT_GAME_MINUTES,
        status: MIGRATED_GAME_STATUS,
        home_team_score: record.int_field("home_team_score"),
        away_team_score: record.int_field("away_team_score"),
        home_team_id,
        away_team_id,
        division_pool_id,
        field_id,
        game_round_id,
    };

    match games_db::create_game(cx.pool, game).await {
        Ok(guid) => {
            cx.registry.set(EntityKind::Game, legacy_id, guid);
            Ok(RecordOutcome::Created)
        }
        Err(e) => {
            error!(error = %e, %name, "Failed to create game");
            Ok(RecordOutcome::Failed)
        }
    }
}

pub async fn migrate_scoring(cx: &StageContext<'_>) -> Result<StageCounts> {
    let records = cx.fixtures.load(SCORING_FILE)?;
    run_records(cx, "scoring", records, |record| {
        migrate_scoring_record(cx, record)
    })
    .await
}

async fn migrate_scoring_record(
    cx: &StageContext<'_>,
    record: LegacyRecord,
) -> Result<RecordOutcome> {
    let resolver = cx.resolver();

    let Some(game_id) = resolver
        .mapped(EntityKind::Game, record.int_field("game"))
        .await?
    else {
        return Ok(RecordOutcome::Skipped(SkipReason::UnresolvedReference(
            EntityKind::Game,
        )));
    };

    let Some(player_id) = resolver
        .mapped(EntityKind::Player, record.int_field("player"))
        .await?
    else {
        return Ok(RecordOutcome::Skipped(SkipReason::UnresolvedReference(
            EntityKind::Player,
        )));
    };

    if games_db::scoring_exists(cx.pool, game_id, player_id).await? {
        return Ok(RecordOutcome::Existing);
    }

    let scoring = games_db::NewScoring {
        goals: record.int_field("goals"),
        assists: record.int_field("assists"),
        blocks: record.int_field("blocks"),
        turns: record.int_field("turns"),
        game_id,
        player_id,
    };

    match games_db::create_scoring(cx.pool, scoring).await {
        Ok(_) => Ok(RecordOutcome::Created),
        Err(e) => {
            error!(error = %e, "Failed to create scoring record");
            Ok(RecordOutcome::Failed)
        }
    }
}
