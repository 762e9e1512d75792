//! Spirit score migration, with nomination synthesis
//!
//! The new schema requires every spirit score to name a submitting user,
//! which the legacy data never had. The stage borrows an existing admin
//! account when one migrated, and otherwise fabricates a single disabled
//! system account. Each record also carries up to four nominee foreign keys
//! that become child nomination rows.

use sqlx::SqlitePool;
use tracing::{error, info, warn};
use uuid::Uuid;

use gamestats_common::Result;

use crate::db::{self, spirit as spirit_db, users as users_db};
use crate::fixtures::LegacyRecord;
use crate::registry::EntityKind;
use crate::report::{RecordOutcome, SkipReason, StageCounts};
use crate::resolve::Resolver;

use super::{run_records, StageContext};

pub(crate) const SPIRIT_FILE: &str = "games_spiritscore.json";

const SYSTEM_EMAIL: &str = "migration@system.local";

/// Sentinel stored for the fabricated account; deliberately not a digest,
/// so it can never match a login attempt
const SYSTEM_PASSWORD_SENTINEL: &str = "$migration$not-a-real-password";

/// Nominee fields and the category each one carries
const MVP_NOMINEES: [(&str, &str); 2] = [
    ("mvp_female_nomination", "female"),
    ("mvp_male_nomination", "male"),
];
const SPIRIT_NOMINEES: [(&str, &str); 2] = [
    ("spirit_female_nomination", "female"),
    ("spirit_male_nomination", "male"),
];

pub async fn migrate_spirit_scores(cx: &StageContext<'_>) -> Result<StageCounts> {
    let records = cx.fixtures.load(SPIRIT_FILE)?;
    if records.is_empty() {
        info!("No spirit score fixtures found");
        return Ok(StageCounts::default());
    }

    let submitter = system_user(cx.pool).await?;

    run_records(cx, "spirit_scores", records, |record| {
        migrate_spirit_score(cx, submitter, record)
    })
    .await
}

/// An existing admin, the previously fabricated system account, or a fresh
/// disabled system account, in that order
async fn system_user(pool: &SqlitePool) -> Result<Uuid> {
    if let Some(admin) = users_db::first_user_with_role(pool, "admin").await? {
        info!("Using an existing admin account to submit migrated spirit scores");
        return Ok(admin);
    }

    if let Some(existing) = db::find_by_natural_key(pool, EntityKind::User, SYSTEM_EMAIL).await? {
        return Ok(existing);
    }

    let guid = users_db::create_user(
        pool,
        users_db::NewUser {
            email: SYSTEM_EMAIL,
            password_hash: SYSTEM_PASSWORD_SENTINEL,
            password_salt: "",
            full_name: "Migration System User",
            role: "system",
            is_active: false,
            last_login_at: None,
        },
    )
    .await?;
    info!(email = SYSTEM_EMAIL, "Created system account for migrated spirit scores");
    Ok(guid)
}

async fn migrate_spirit_score(
    cx: &StageContext<'_>,
    submitter: Uuid,
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

    let Some(team_id) = resolver
        .mapped(EntityKind::Team, record.int_field("team"))
        .await?
    else {
        return Ok(RecordOutcome::Skipped(SkipReason::UnresolvedReference(
            EntityKind::Team,
        )));
    };

    let Some(scored_by_team_id) = resolver
        .mapped(EntityKind::Team, record.int_field("scored_by"))
        .await?
    else {
        return Ok(RecordOutcome::Skipped(SkipReason::UnresolvedReference(
            EntityKind::Team,
        )));
    };

    if spirit_db::spirit_score_exists(cx.pool, game_id, team_id, scored_by_team_id).await? {
        return Ok(RecordOutcome::Existing);
    }

    let score = spirit_db::NewSpiritScore {
        rules_knowledge: record.int_field("rules_knowledge"),
        fouls_body_contact: record.int_field("fouls_body_contact"),
        fair_mindedness: record.int_field("fair_mindedness"),
        attitude: record.int_field("attitude"),
        communication: record.int_field("communication"),
        game_id,
        team_id,
        scored_by_team_id,
        submitted_by_user_id: submitter,
    };

    let score_id = match spirit_db::create_spirit_score(cx.pool, score).await {
        Ok(guid) => guid,
        Err(e) => {
            error!(error = %e, "Failed to create spirit score");
            return Ok(RecordOutcome::Failed);
        }
    };

    create_nominations(cx, &record, score_id).await?;

    Ok(RecordOutcome::Created)
}

/// Turn the nominee foreign keys into child nomination rows.
///
/// Absent or unmapped nominees are dropped without comment; a rejected
/// nomination insert only warns, the spirit score itself already counts as
/// created.
async fn create_nominations(
    cx: &StageContext<'_>,
    record: &LegacyRecord,
    score_id: Uuid,
) -> Result<()> {
    let resolver = cx.resolver();

    for (field, category) in MVP_NOMINEES {
        let Some(player_id) = nominee(&resolver, record, field).await? else {
            continue;
        };
        if let Err(e) = spirit_db::create_mvp_nomination(cx.pool, category, score_id, player_id).await
        {
            warn!(error = %e, category, "Failed to create MVP nomination");
        }
    }

    for (field, category) in SPIRIT_NOMINEES {
        let Some(player_id) = nominee(&resolver, record, field).await? else {
            continue;
        };
        if let Err(e) =
            spirit_db::create_spirit_nomination(cx.pool, category, score_id, player_id).await
        {
            warn!(error = %e, category, "Failed to create spirit nomination");
        }
    }

    Ok(())
}

/// Player behind one nominee field, when present and mapped
async fn nominee(
    resolver: &Resolver<'_>,
    record: &LegacyRecord,
    field: &str,
) -> Result<Option<Uuid>> {
    let legacy_key = record.int_field(field);
    if legacy_key <= 0 {
        return Ok(None);
    }
    resolver.mapped(EntityKind::Player, legacy_key).await
}
