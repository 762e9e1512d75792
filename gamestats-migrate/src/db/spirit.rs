//! Spirit score and nomination persistence

use sqlx::SqlitePool;
use uuid::Uuid;

use gamestats_common::Result;

/// Fields for a new spirit score row
pub struct NewSpiritScore {
    pub rules_knowledge: i64,
    pub fouls_body_contact: i64,
    pub fair_mindedness: i64,
    pub attitude: i64,
    pub communication: i64,
    pub game_id: Uuid,
    pub team_id: Uuid,
    pub scored_by_team_id: Uuid,
    pub submitted_by_user_id: Uuid,
}

/// Existence is the (game, scored team, scoring team) triple
pub async fn spirit_score_exists(
    pool: &SqlitePool,
    game_id: Uuid,
    team_id: Uuid,
    scored_by_team_id: Uuid,
) -> Result<bool> {
    let count: i64 = sqlx::query_scalar(
        "SELECT COUNT(*) FROM spirit_scores \
         WHERE game_id = ? AND team_id = ? AND scored_by_team_id = ?",
    )
    .bind(game_id.to_string())
    .bind(team_id.to_string())
    .bind(scored_by_team_id.to_string())
    .fetch_one(pool)
    .await?;
    Ok(count > 0)
}

/// Insert a spirit score and return its guid
pub async fn create_spirit_score(pool: &SqlitePool, score: NewSpiritScore) -> Result<Uuid> {
    let guid = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO spirit_scores (guid, rules_knowledge, fouls_body_contact, fair_mindedness,
                                   attitude, communication, game_id, team_id, scored_by_team_id,
                                   submitted_by_user_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(score.rules_knowledge)
    .bind(score.fouls_body_contact)
    .bind(score.fair_mindedness)
    .bind(score.attitude)
    .bind(score.communication)
    .bind(score.game_id.to_string())
    .bind(score.team_id.to_string())
    .bind(score.scored_by_team_id.to_string())
    .bind(score.submitted_by_user_id.to_string())
    .execute(pool)
    .await?;

    Ok(guid)
}

/// Insert a most-valuable-player nomination attached to a spirit score
pub async fn create_mvp_nomination(
    pool: &SqlitePool,
    category: &str,
    spirit_score_id: Uuid,
    player_id: Uuid,
) -> Result<Uuid> {
    let guid = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO mvp_nominations (guid, category, spirit_score_id, player_id,
                                     created_at, updated_at)
        VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(category)
    .bind(spirit_score_id.to_string())
    .bind(player_id.to_string())
    .execute(pool)
    .await?;

    Ok(guid)
}

/// Insert a spirit nomination attached to a spirit score
pub async fn create_spirit_nomination(
    pool: &SqlitePool,
    category: &str,
    spirit_score_id: Uuid,
    player_id: Uuid,
) -> Result<Uuid> {
    let guid = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO spirit_nominations (guid, category, spirit_score_id, player_id,
                                        created_at, updated_at)
        VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(category)
    .bind(spirit_score_id.to_string())
    .bind(player_id.to_string())
    .execute(pool)
    .await?;

    Ok(guid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{events, games, teams, test_pool, users};
    use chrono::Utc;

    #[tokio::test]
    async fn test_spirit_score_triple_existence_and_nominations() {
        let pool = test_pool().await;

        let home = teams::create_team(&pool, "Home", 1, None, None).await.unwrap();
        let away = teams::create_team(&pool, "Away", 2, None, None).await.unwrap();
        let division = events::create_division_pool(&pool, "Open", "open", "", None)
            .await
            .unwrap();
        let field = events::create_field(&pool, "Pitch 1", "grass", 0, None)
            .await
            .unwrap();
        let game = games::create_game(
            &pool,
            games::NewGame {
                name: "Home vs Away",
                scheduled_time: Utc::now(),
                allocated_time_minutes: 60,
                status: "completed",
                home_team_score: 10,
                away_team_score: 9,
                home_team_id: home,
                away_team_id: away,
                division_pool_id: division,
                field_id: field,
                game_round_id: None,
            },
        )
        .await
        .unwrap();
        let submitter = users::create_user(
            &pool,
            users::NewUser {
                email: "admin@example.com",
                password_hash: "deadbeef",
                password_salt: "salt",
                full_name: "Admin",
                role: "admin",
                is_active: true,
                last_login_at: None,
            },
        )
        .await
        .unwrap();

        assert!(!spirit_score_exists(&pool, game, home, away).await.unwrap());

        let score = create_spirit_score(
            &pool,
            NewSpiritScore {
                rules_knowledge: 2,
                fouls_body_contact: 2,
                fair_mindedness: 3,
                attitude: 2,
                communication: 2,
                game_id: game,
                team_id: home,
                scored_by_team_id: away,
                submitted_by_user_id: submitter,
            },
        )
        .await
        .unwrap();

        assert!(spirit_score_exists(&pool, game, home, away).await.unwrap());
        // The reverse direction is a distinct score
        assert!(!spirit_score_exists(&pool, game, away, home).await.unwrap());

        let nominee = teams::create_player(&pool, "Nominee", "F", home).await.unwrap();
        create_mvp_nomination(&pool, "female", score, nominee).await.unwrap();
        create_spirit_nomination(&pool, "female", score, nominee)
            .await
            .unwrap();

        let mvp_count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM mvp_nominations")
            .fetch_one(&pool)
            .await
            .unwrap();
        assert_eq!(mvp_count, 1);
    }
}
