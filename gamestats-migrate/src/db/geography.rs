//! Geographic entity persistence (worlds, continents, countries, locations)

use sqlx::SqlitePool;
use uuid::Uuid;

use gamestats_common::Result;

use super::parse_guid;

/// Look up a world by slug. Worlds carry no legacy keys, so this is the
/// only lookup they need.
pub async fn find_world(pool: &SqlitePool, slug: &str) -> Result<Option<Uuid>> {
    let row = sqlx::query("SELECT guid FROM worlds WHERE slug = ?")
        .bind(slug)
        .fetch_optional(pool)
        .await?;
    row.map(|row| parse_guid(&row)).transpose()
}

/// Insert a world and return its guid
pub async fn create_world(
    pool: &SqlitePool,
    name: &str,
    slug: &str,
    description: &str,
) -> Result<Uuid> {
    let guid = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO worlds (guid, name, slug, description, created_at, updated_at)
        VALUES (?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(name)
    .bind(slug)
    .bind(description)
    .execute(pool)
    .await?;

    Ok(guid)
}

/// Insert a continent and return its guid
pub async fn create_continent(
    pool: &SqlitePool,
    name: &str,
    slug: &str,
    description: &str,
    world_id: Uuid,
) -> Result<Uuid> {
    let guid = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO continents (guid, name, slug, description, world_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(name)
    .bind(slug)
    .bind(description)
    .bind(world_id.to_string())
    .execute(pool)
    .await?;

    Ok(guid)
}

/// Insert a country and return its guid
pub async fn create_country(
    pool: &SqlitePool,
    name: &str,
    slug: &str,
    code: &str,
    description: &str,
    continent_id: Uuid,
) -> Result<Uuid> {
    let guid = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO countries (guid, name, slug, code, description, continent_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(name)
    .bind(slug)
    .bind(code)
    .bind(description)
    .bind(continent_id.to_string())
    .execute(pool)
    .await?;

    Ok(guid)
}

/// Insert a location and return its guid
pub async fn create_location(
    pool: &SqlitePool,
    name: &str,
    slug: &str,
    address: &str,
    city: &str,
    country_id: Uuid,
) -> Result<Uuid> {
    let guid = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO locations (guid, name, slug, address, city, country_id, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(name)
    .bind(slug)
    .bind(address)
    .bind(city)
    .bind(country_id.to_string())
    .execute(pool)
    .await?;

    Ok(guid)
}
