//! Game and per-player scoring persistence

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use gamestats_common::Result;

/// Fields for a new game row
pub struct NewGame<'a> {
    pub name: &'a str,
    pub scheduled_time: DateTime<Utc>,
    pub allocated_time_minutes: i64,
    pub status: &'a str,
    pub home_team_score: i64,
    pub away_team_score: i64,
    pub home_team_id: Uuid,
    pub away_team_id: Uuid,
    pub division_pool_id: Uuid,
    pub field_id: Uuid,
    pub game_round_id: Option<Uuid>,
}

/// Insert a game and return its guid
pub async fn create_game(pool: &SqlitePool, game: NewGame<'_>) -> Result<Uuid> {
    let guid = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO games (guid, name, scheduled_time, allocated_time_minutes, status,
                           home_team_score, away_team_score, home_team_id, away_team_id,
                           division_pool_id, field_id, game_round_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(game.name)
    .bind(game.scheduled_time.to_rfc3339())
    .bind(game.allocated_time_minutes)
    .bind(game.status)
    .bind(game.home_team_score)
    .bind(game.away_team_score)
    .bind(game.home_team_id.to_string())
    .bind(game.away_team_id.to_string())
    .bind(game.division_pool_id.to_string())
    .bind(game.field_id.to_string())
    .bind(game.game_round_id.map(|id| id.to_string()))
    .execute(pool)
    .await?;

    Ok(guid)
}

/// Fields for a new scoring row
pub struct NewScoring {
    pub goals: i64,
    pub assists: i64,
    pub blocks: i64,
    pub turns: i64,
    pub game_id: Uuid,
    pub player_id: Uuid,
}

/// Scoring rows have no natural key; existence is the (game, player) pair
pub async fn scoring_exists(pool: &SqlitePool, game_id: Uuid, player_id: Uuid) -> Result<bool> {
    let count: i64 =
        sqlx::query_scalar("SELECT COUNT(*) FROM scoring WHERE game_id = ? AND player_id = ?")
            .bind(game_id.to_string())
            .bind(player_id.to_string())
            .fetch_one(pool)
            .await?;
    Ok(count > 0)
}

/// Insert a scoring row and return its guid
pub async fn create_scoring(pool: &SqlitePool, scoring: NewScoring) -> Result<Uuid> {
    let guid = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO scoring (guid, goals, assists, blocks, turns, game_id, player_id,
                             created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(scoring.goals)
    .bind(scoring.assists)
    .bind(scoring.blocks)
    .bind(scoring.turns)
    .bind(scoring.game_id.to_string())
    .bind(scoring.player_id.to_string())
    .execute(pool)
    .await?;

    Ok(guid)
}
