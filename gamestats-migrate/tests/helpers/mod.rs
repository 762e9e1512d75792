//! Shared helpers for migration integration tests
//!
//! Provides an in-memory entity store with the full schema applied and
//! writers for legacy fixture files in the export shape the loader expects.

use std::path::Path;

use serde_json::{json, Value};
use sqlx::SqlitePool;

/// In-memory store with the full schema applied
pub async fn test_pool() -> SqlitePool {
    let pool = SqlitePool::connect("sqlite::memory:")
        .await
        .expect("Failed to create in-memory database");
    gamestats_common::db::init_schema(&pool)
        .await
        .expect("Schema initialization failed");
    pool
}

/// Write one fixture file in the legacy export shape
pub fn write_fixture(dir: &Path, file: &str, records: Value) {
    let data = serde_json::to_string_pretty(&records).expect("Fixture serialization failed");
    std::fs::write(dir.join(file), data).expect("Failed to write fixture file");
}

/// Count the rows of one table
pub async fn count_rows(pool: &SqlitePool, table: &str) -> i64 {
    let sql = format!("SELECT COUNT(*) FROM {}", table);
    sqlx::query_scalar(&sql)
        .fetch_one(pool)
        .await
        .expect("Count query failed")
}

/// Write a small but complete fixture set covering every stage: two teams
/// of two players each, one game between them with scoring rows, and a
/// spirit score carrying all four nominations.
///
/// The game record deliberately uses the older export field names
/// (`team1`, `pool`, ...) so the alias collapse is exercised end to end.
pub fn write_full_fixture_set(dir: &Path) {
    write_fixture(
        dir,
        "authman_user.json",
        json!([
            {"model": "authman.user", "pk": 1, "fields": {
                "email": "alice@example.com",
                "first_name": "Alice",
                "last_name": "Otieno",
                "is_superuser": true,
                "is_staff": true,
                "is_active": true,
                "last_login": "2019-06-30T16:45:12.345",
            }},
            {"model": "authman.user", "pk": 2, "fields": {
                "email": "bob@example.com",
                "username": "bobk",
                "is_active": true,
            }},
        ]),
    );

    write_fixture(
        dir,
        "core_world.json",
        json!([
            {"model": "core.world", "pk": 1, "fields": {
                "name": "Earth", "slug": "earth", "description": "Planet Earth",
            }},
        ]),
    );

    write_fixture(
        dir,
        "core_continent.json",
        json!([
            {"model": "core.continent", "pk": 1, "fields": {
                "name": "Africa", "slug": "africa", "description": "",
            }},
        ]),
    );

    write_fixture(
        dir,
        "core_country.json",
        json!([
            {"model": "core.country", "pk": 1, "fields": {
                "name": "Kenya", "slug": "kenya", "continent": 1,
            }},
        ]),
    );

    write_fixture(
        dir,
        "core_location.json",
        json!([
            {"model": "core.location", "pk": 1, "fields": {
                "name": "Nairobi Polo Club", "slug": "nairobi-polo-club",
                "country": 1, "address": "Jamhuri Park", "city": "Nairobi",
            }},
        ]),
    );

    write_fixture(
        dir,
        "core_field.json",
        json!([
            {"model": "core.field", "pk": 1, "fields": {
                "name": "Main Field", "location": 1,
                "surface_type": "grass", "capacity": 500,
            }},
        ]),
    );

    write_fixture(
        dir,
        "events_discipline.json",
        json!([
            {"model": "events.discipline", "pk": 1, "fields": {
                "name": "Ultimate", "slug": "ultimate", "country": 1, "description": "",
            }},
        ]),
    );

    write_fixture(
        dir,
        "events_event.json",
        json!([
            {"model": "events.event", "pk": 1, "fields": {
                "name": "Kenya Nationals 2019", "slug": "kenya-nationals-2019",
                "discipline": 1, "location": 1, "year": 2019,
                "start_date": "2019-06-29T08:00:00",
                "end_date": "2019-06-30T18:00:00",
            }},
        ]),
    );

    write_fixture(
        dir,
        "events_divisionpool.json",
        json!([
            {"model": "events.divisionpool", "pk": 1, "fields": {
                "name": "Mixed Open", "event": 1,
            }},
        ]),
    );

    write_fixture(
        dir,
        "games_gameround.json",
        json!([
            {"model": "games.gameround", "pk": 1, "fields": {"name": "Round Robin"}},
            {"model": "games.gameround", "pk": 2, "fields": {"name": "Finals"}},
        ]),
    );

    write_fixture(
        dir,
        "games_team.json",
        json!([
            {"model": "games.team", "pk": 1, "fields": {
                "name": "Nairobi Sharks", "origin": 1, "initial_seed": 1,
            }},
            {"model": "games.team", "pk": 2, "fields": {
                "name": "Mombasa Waves", "origin": 1, "initial_seed": 2,
            }},
        ]),
    );

    write_fixture(
        dir,
        "games_player.json",
        json!([
            {"model": "games.player", "pk": 1, "fields": {
                "name": "Wanjiru Kamau", "team": 1, "gender": "F",
            }},
            {"model": "games.player", "pk": 2, "fields": {
                "name": "Juma Odhiambo", "team": 1, "gender": "M",
            }},
            {"model": "games.player", "pk": 3, "fields": {
                "name": "Amina Hassan", "team": 2, "gender": "F",
            }},
            {"model": "games.player", "pk": 4, "fields": {
                "name": "Peter Mwangi", "team": 2, "gender": "M",
            }},
        ]),
    );

    write_fixture(
        dir,
        "games_game.json",
        json!([
            {"model": "games.game", "pk": 1, "fields": {
                "name": "Sharks vs Waves",
                "team1": 1, "team2": 2,
                "team1_score": 13, "team2_score": 11,
                "pool": 1, "field": 1, "game_round": 2,
                "date": "2019-06-30T14:00:00",
            }},
        ]),
    );

    write_fixture(
        dir,
        "games_scoring.json",
        json!([
            {"model": "games.scoring", "pk": 1, "fields": {
                "game": 1, "player": 1, "goals": 5, "assists": 2, "blocks": 1, "turns": 3,
            }},
            {"model": "games.scoring", "pk": 2, "fields": {
                "game": 1, "player": 3, "goals": 4, "assists": 3, "blocks": 0, "turns": 2,
            }},
        ]),
    );

    write_fixture(
        dir,
        "games_spiritscore.json",
        json!([
            {"model": "games.spiritscore", "pk": 1, "fields": {
                "game": 1, "team": 1, "scored_by": 2,
                "rules_knowledge": 2, "fouls_body_contact": 2,
                "fair_mindedness": 2, "attitude": 3, "communication": 2,
                "mvp_female_nomination": 1, "mvp_male_nomination": 2,
                "spirit_female_nomination": 1, "spirit_male_nomination": 2,
            }},
        ]),
    );
}
