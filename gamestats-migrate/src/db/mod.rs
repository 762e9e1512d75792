//! Entity store operations
//!
//! Thin async functions over the SQLite pool, one module per entity family.
//! Creates generate the UUID surrogate, bind it as TEXT, and hand it back so
//! the caller can register the legacy mapping. The generic probes here cover
//! the lookups every stage shares: natural-key search, guid liveness, and
//! the insertion-order "first row" used by last-resort reference fallbacks.

pub mod events;
pub mod games;
pub mod geography;
pub mod spirit;
pub mod teams;
pub mod users;

use sqlx::{sqlite::SqliteRow, Row, SqlitePool};
use uuid::Uuid;

use gamestats_common::{Error, Result};

use crate::registry::EntityKind;

/// Look up an entity guid by its natural key
pub async fn find_by_natural_key(
    pool: &SqlitePool,
    kind: EntityKind,
    value: &str,
) -> Result<Option<Uuid>> {
    let sql = format!(
        "SELECT guid FROM {} WHERE {} = ?",
        kind.table(),
        kind.natural_key_column()
    );
    let row = sqlx::query(&sql).bind(value).fetch_optional(pool).await?;
    row.map(|row| parse_guid(&row)).transpose()
}

/// True when a previously assigned guid still has a live row
pub async fn guid_exists(pool: &SqlitePool, kind: EntityKind, guid: Uuid) -> Result<bool> {
    let sql = format!("SELECT 1 FROM {} WHERE guid = ?", kind.table());
    let row = sqlx::query(&sql)
        .bind(guid.to_string())
        .fetch_optional(pool)
        .await?;
    Ok(row.is_some())
}

/// First row of a kind by insertion order.
///
/// SQLite rowid pins "first" deterministically, which keeps repeated runs
/// resolving last-resort fallbacks to the same entity.
pub async fn first_id(pool: &SqlitePool, kind: EntityKind) -> Result<Option<Uuid>> {
    let sql = format!("SELECT guid FROM {} ORDER BY rowid LIMIT 1", kind.table());
    let row = sqlx::query(&sql).fetch_optional(pool).await?;
    row.map(|row| parse_guid(&row)).transpose()
}

pub(crate) fn parse_guid(row: &SqliteRow) -> Result<Uuid> {
    let guid_str: String = row.get("guid");
    Uuid::parse_str(&guid_str)
        .map_err(|e| Error::Internal(format!("Invalid guid in store: {}", e)))
}

#[cfg(test)]
pub(crate) async fn test_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    gamestats_common::db::init_schema(&pool)
        .await
        .expect("Schema initialization failed");
    pool
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_natural_key_lookup_and_first_id() {
        let pool = test_pool().await;

        assert!(find_by_natural_key(&pool, EntityKind::Team, "Aces")
            .await
            .unwrap()
            .is_none());
        assert!(first_id(&pool, EntityKind::Team).await.unwrap().is_none());

        let first = teams::create_team(&pool, "Aces", 1, None, None).await.unwrap();
        let second = teams::create_team(&pool, "Rhinos", 2, None, None)
            .await
            .unwrap();

        assert_eq!(
            find_by_natural_key(&pool, EntityKind::Team, "Rhinos")
                .await
                .unwrap(),
            Some(second)
        );
        assert_eq!(first_id(&pool, EntityKind::Team).await.unwrap(), Some(first));
    }

    #[tokio::test]
    async fn test_guid_liveness() {
        let pool = test_pool().await;
        let team = teams::create_team(&pool, "Aces", 1, None, None).await.unwrap();

        assert!(guid_exists(&pool, EntityKind::Team, team).await.unwrap());

        sqlx::query("DELETE FROM teams WHERE guid = ?")
            .bind(team.to_string())
            .execute(&pool)
            .await
            .unwrap();

        assert!(!guid_exists(&pool, EntityKind::Team, team).await.unwrap());
    }
}
