//! Team and player persistence

use sqlx::SqlitePool;
use uuid::Uuid;

use gamestats_common::Result;

use super::parse_guid;

/// Insert a team and return its guid
pub async fn create_team(
    pool: &SqlitePool,
    name: &str,
    initial_seed: i64,
    division_pool_id: Option<Uuid>,
    home_location_id: Option<Uuid>,
) -> Result<Uuid> {
    let guid = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO teams (guid, name, initial_seed, division_pool_id, home_location_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(name)
    .bind(initial_seed)
    .bind(division_pool_id.map(|id| id.to_string()))
    .bind(home_location_id.map(|id| id.to_string()))
    .execute(pool)
    .await?;

    Ok(guid)
}

/// Insert a player and return its guid
pub async fn create_player(
    pool: &SqlitePool,
    name: &str,
    gender: &str,
    team_id: Uuid,
) -> Result<Uuid> {
    let guid = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO players (guid, name, gender, team_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(name)
    .bind(gender)
    .bind(team_id.to_string())
    .execute(pool)
    .await?;

    Ok(guid)
}

/// Player lookup scoped to one team
pub async fn find_player_on_team(
    pool: &SqlitePool,
    name: &str,
    team_id: Uuid,
) -> Result<Option<Uuid>> {
    let row = sqlx::query("SELECT guid FROM players WHERE name = ? AND team_id = ?")
        .bind(name)
        .bind(team_id.to_string())
        .fetch_optional(pool)
        .await?;
    row.map(|row| parse_guid(&row)).transpose()
}

/// Name-only player lookup that only matches when the name is unambiguous.
/// Two players sharing a name on different teams are distinct people, so an
/// ambiguous match resolves to nobody.
pub async fn find_single_player_by_name(pool: &SqlitePool, name: &str) -> Result<Option<Uuid>> {
    let rows = sqlx::query("SELECT guid FROM players WHERE name = ? LIMIT 2")
        .bind(name)
        .fetch_all(pool)
        .await?;
    match rows.as_slice() {
        [row] => Ok(Some(parse_guid(row)?)),
        _ => Ok(None),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;

    #[tokio::test]
    async fn test_player_lookups_scope_by_team_and_ambiguity() {
        let pool = test_pool().await;

        let aces = create_team(&pool, "Aces", 1, None, None).await.unwrap();
        let rhinos = create_team(&pool, "Rhinos", 2, None, None).await.unwrap();

        let on_aces = create_player(&pool, "Wanjiru", "F", aces).await.unwrap();

        assert_eq!(
            find_player_on_team(&pool, "Wanjiru", aces).await.unwrap(),
            Some(on_aces)
        );
        assert_eq!(
            find_player_on_team(&pool, "Wanjiru", rhinos).await.unwrap(),
            None
        );
        assert_eq!(
            find_single_player_by_name(&pool, "Wanjiru").await.unwrap(),
            Some(on_aces)
        );

        // A same-named player on another team makes the name ambiguous
        create_player(&pool, "Wanjiru", "F", rhinos).await.unwrap();
        assert_eq!(
            find_single_player_by_name(&pool, "Wanjiru").await.unwrap(),
            None
        );
    }
}
