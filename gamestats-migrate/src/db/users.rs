//! User account persistence

use chrono::{DateTime, Utc};
use sqlx::SqlitePool;
use uuid::Uuid;

use gamestats_common::Result;

use super::parse_guid;

/// Fields for a new user row
pub struct NewUser<'a> {
    pub email: &'a str,
    pub password_hash: &'a str,
    pub password_salt: &'a str,
    pub full_name: &'a str,
    pub role: &'a str,
    pub is_active: bool,
    pub last_login_at: Option<DateTime<Utc>>,
}

/// Insert a user and return its guid
pub async fn create_user(pool: &SqlitePool, user: NewUser<'_>) -> Result<Uuid> {
    let guid = Uuid::new_v4();
    sqlx::query(
        r#"
        INSERT INTO users (guid, email, password_hash, password_salt, full_name, role,
                           is_active, last_login_at, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, CURRENT_TIMESTAMP, CURRENT_TIMESTAMP)
        "#,
    )
    .bind(guid.to_string())
    .bind(user.email)
    .bind(user.password_hash)
    .bind(user.password_salt)
    .bind(user.full_name)
    .bind(user.role)
    .bind(user.is_active)
    .bind(user.last_login_at.map(|t| t.to_rfc3339()))
    .execute(pool)
    .await?;

    Ok(guid)
}

/// Oldest user carrying the given role, if any
pub async fn first_user_with_role(pool: &SqlitePool, role: &str) -> Result<Option<Uuid>> {
    let row = sqlx::query("SELECT guid FROM users WHERE role = ? ORDER BY rowid LIMIT 1")
        .bind(role)
        .fetch_optional(pool)
        .await?;
    row.map(|row| parse_guid(&row)).transpose()
}
