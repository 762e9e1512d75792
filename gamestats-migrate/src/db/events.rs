//! Event structure persistence (disciplines, events, division pools,
//! fields, game rounds)

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use gamestats_common::Result;

/// Insert a discipline and return its guid
pub async fn create_discipline(
    pool: &SqlitePool,
    name: &str,
    slug: &str,
    description: &str,
    country_id: Uuid,
) -> Result<Uuid> {
    let guid = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO disciplines (guid, name, slug, description, country_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(name)
    .bind(slug)
    .bind(description)
    .bind(country_id.to_string())
    .execute(pool)
    .await?;

    Ok(guid)
}

/// New event row; optional edges stay NULL when unresolved
#[derive(Debug, Clone)]
pub struct NewEvent {
    pub name: String,
    pub slug: String,
    pub description: String,
    pub year: i64,
    pub start_date: DateTime<Utc>,
    pub end_date: DateTime<Utc>,
    pub discipline_id: Option<Uuid>,
    pub location_id: Option<Uuid>,
}

/// Insert an event and return its guid
pub async fn create_event(pool: &SqlitePool, event: &NewEvent) -> Result<Uuid> {
    let guid = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO events (
            guid, name, slug, description, year, start_date, end_date,
            discipline_id, location_id, created_at, updated_at
        ) VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(&event.name)
    .bind(&event.slug)
    .bind(&event.description)
    .bind(event.year)
    .bind(event.start_date.to_rfc3339())
    .bind(event.end_date.to_rfc3339())
    .bind(event.discipline_id.map(|id| id.to_string()))
    .bind(event.location_id.map(|id| id.to_string()))
    .execute(pool)
    .await?;

    Ok(guid)
}

/// Insert a division pool and return its guid
pub async fn create_division_pool(
    pool: &SqlitePool,
    name: &str,
    division_type: &str,
    description: &str,
    event_id: Option<Uuid>,
) -> Result<Uuid> {
    let guid = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO division_pools (guid, name, division_type, description, event_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(name)
    .bind(division_type)
    .bind(description)
    .bind(event_id.map(|id| id.to_string()))
    .execute(pool)
    .await?;

    Ok(guid)
}

/// Insert a playing field and return its guid
pub async fn create_field(
    pool: &SqlitePool,
    name: &str,
    surface_type: &str,
    capacity: i64,
    location_id: Option<Uuid>,
) -> Result<Uuid> {
    let guid = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO fields (guid, name, surface_type, capacity, location_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(name)
    .bind(surface_type)
    .bind(capacity)
    .bind(location_id.map(|id| id.to_string()))
    .execute(pool)
    .await?;

    Ok(guid)
}

/// Insert a game round and return its guid
pub async fn create_game_round(
    pool: &SqlitePool,
    name: &str,
    round_type: &str,
    round_number: i64,
    event_id: Option<Uuid>,
) -> Result<Uuid> {
    let guid = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO game_rounds (guid, name, round_type, round_number, event_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(name)
    .bind(round_type)
    .bind(round_number)
    .bind(event_id.map(|id| id.to_string()))
    .execute(pool)
    .await?;

    Ok(guid)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::test_pool;
    use crate::registry::EntityKind;
    use chrono::TimeZone;

    #[tokio::test]
    async fn test_event_round_trip_with_optional_edges_absent() {
        let pool = test_pool().await;

        let event = NewEvent {
            name: "Nationals 2009".to_string(),
            slug: "nationals-2009".to_string(),
            description: String::new(),
            year: 2009,
            start_date: Utc.with_ymd_and_hms(2009, 7, 18, 0, 0, 0).unwrap(),
            end_date: Utc.with_ymd_and_hms(2009, 7, 19, 0, 0, 0).unwrap(),
            discipline_id: None,
            location_id: None,
        };
        let guid = create_event(&pool, &event).await.unwrap();

        assert_eq!(
            crate::db::find_by_natural_key(&pool, EntityKind::Event, "nationals-2009")
                .await
                .unwrap(),
            Some(guid)
        );

        let discipline_id: Option<String> =
            sqlx::query_scalar("SELECT discipline_id FROM events WHERE guid = ?")
                .bind(guid.to_string())
                .fetch_one(&pool)
                .await
                .unwrap();
        assert!(discipline_id.is_none());
    }

    #[tokio::test]
    async fn test_division_pool_and_round_persist() {
        let pool = test_pool().await;

        let division = create_division_pool(&pool, "Open Pool A", "open", "", None)
            .await
            .unwrap();
        let round = create_game_round(&pool, "Finals", "final", 5, None)
            .await
            .unwrap();

        assert_eq!(
            crate::db::find_by_natural_key(&pool, EntityKind::Division, "Open Pool A")
                .await
                .unwrap(),
            Some(division)
        );
        assert_eq!(
            crate::db::find_by_natural_key(&pool, EntityKind::GameRound, "Finals")
                .await
                .unwrap(),
            Some(round)
        );
    }
}
