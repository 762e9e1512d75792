//! User account migration
//!
//! Legacy accounts arrive without usable password digests, so every migrated
//! account gets one shared salted digest of a well-known default password
//! and is expected to reset it on first login.

use tracing::{debug, error, info};

use gamestats_common::{auth, Result};

use crate::db::{self, users as users_db};
use crate::fixtures::LegacyRecord;
use crate::registry::EntityKind;
use crate::report::{RecordOutcome, SkipReason, StageCounts};

use super::{run_records, StageContext};

pub(crate) const USER_FILE: &str = "authman_user.json";

/// Password every migrated account starts with
const DEFAULT_PASSWORD: &str = "ChangeMe123!";

/// Test spectator account that never carries over
const EXCLUDED_EMAIL: &str = "man@test.com";

pub async fn migrate_users(cx: &StageContext<'_>) -> Result<StageCounts> {
    let records = cx.fixtures.load(USER_FILE)?;
    if records.is_empty() {
        info!("No user fixtures found");
        return Ok(StageCounts::default());
    }

    // One salt and digest shared by every account created this run
    let salt = auth::generate_salt();
    let password_hash = auth::hash_password(DEFAULT_PASSWORD, &salt);

    run_records(cx, "users", records, |record| {
        migrate_user(cx, &password_hash, &salt, record)
    })
    .await
}

async fn migrate_user(
    cx: &StageContext<'_>,
    password_hash: &str,
    salt: &str,
    record: LegacyRecord,
) -> Result<RecordOutcome> {
    let legacy_id = record.legacy_id();
    let email = record.str_field("email");

    if email.is_empty() {
        return Ok(RecordOutcome::Skipped(SkipReason::MissingNaturalKey));
    }
    if email == EXCLUDED_EMAIL {
        info!(%email, "Skipping test spectator account");
        return Ok(RecordOutcome::Skipped(SkipReason::ExcludedAccount));
    }

    if let Some(existing) = db::find_by_natural_key(cx.pool, EntityKind::User, &email).await? {
        cx.registry.set(EntityKind::User, legacy_id, existing);
        return Ok(RecordOutcome::Existing);
    }

    let full_name = display_name(&record, &email);
    let role = role_for(&record);

    let created = users_db::create_user(
        cx.pool,
        users_db::NewUser {
            email: &email,
            password_hash,
            password_salt: salt,
            full_name: &full_name,
            role: &role,
            is_active: record.bool_field("is_active"),
            last_login_at: record.opt_time_field("last_login"),
        },
    )
    .await;

    match created {
        Ok(guid) => {
            cx.registry.set(EntityKind::User, legacy_id, guid);
            debug!(%email, %role, "Migrated user");
            Ok(RecordOutcome::Created)
        }
        Err(e) => {
            error!(error = %e, %email, "Failed to create user");
            Ok(RecordOutcome::Failed)
        }
    }
}

/// First and last name, falling back to username, falling back to email
fn display_name(record: &LegacyRecord, email: &str) -> String {
    let first = record.str_field("first_name");
    let last = record.str_field("last_name");

    let mut name = format!("{} {}", first, last).trim().to_string();
    if name.is_empty() {
        name = record.str_field("username");
    }
    if name.is_empty() {
        name = email.to_string();
    }
    name
}

/// Explicit role field, or one derived from the legacy permission flags
fn role_for(record: &LegacyRecord) -> String {
    let role = record.str_field("role");
    if !role.is_empty() {
        return role;
    }

    if record.bool_field("is_superuser") {
        "admin"
    } else if record.bool_field("is_staff") {
        "staff"
    } else {
        "user"
    }
    .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::fixtures::LegacyKey;
    use serde_json::json;

    fn user_record(fields: serde_json::Value) -> LegacyRecord {
        LegacyRecord {
            model: "authman.user".to_string(),
            pk: LegacyKey::Int(1),
            fields: fields.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn name_prefers_first_and_last() {
        let rec = user_record(json!({
            "first_name": "Grace",
            "last_name": "Wanjiru",
            "username": "gwanjiru",
        }));
        assert_eq!(display_name(&rec, "g@example.com"), "Grace Wanjiru");
    }

    #[test]
    fn name_falls_back_to_username_then_email() {
        let rec = user_record(json!({ "username": "gwanjiru" }));
        assert_eq!(display_name(&rec, "g@example.com"), "gwanjiru");

        let rec = user_record(json!({}));
        assert_eq!(display_name(&rec, "g@example.com"), "g@example.com");
    }

    #[test]
    fn role_derives_from_permission_flags() {
        let rec = user_record(json!({ "is_superuser": true, "is_staff": true }));
        assert_eq!(role_for(&rec), "admin");

        let rec = user_record(json!({ "is_staff": true }));
        assert_eq!(role_for(&rec), "staff");

        let rec = user_record(json!({}));
        assert_eq!(role_for(&rec), "user");

        // An explicit role always wins
        let rec = user_record(json!({ "role": "editor", "is_superuser": true }));
        assert_eq!(role_for(&rec), "editor");
    }
}
