//! Legacy fixture decoding and normalization
//!
//! Source records are Django `dumpdata` JSON arrays: objects with a `model`
//! tag, a legacy `pk`, and a free-form `fields` map. Decoding normalizes the
//! messy parts in place so the stages downstream only ever see one shape:
//! - datetime strings gain a `T` separator and a `Z` zone suffix
//! - the legacy boolean flags become real JSON booleans
//! - renamed game fields collapse onto their canonical names
//!
//! Typed accessors apply the uniform defaulting rules (missing or
//! unparseable numerics read as 0, strings as "", times as now) so stage
//! code never branches on field presence.

use std::path::{Path, PathBuf};

use chrono::{DateTime, NaiveDate, NaiveDateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::{info, warn};

use gamestats_common::{Error, Result};

/// Every fixture file a full legacy export contains
pub const FIXTURE_FILES: [&str; 15] = [
    "authman_user.json",
    "core_world.json",
    "core_continent.json",
    "core_country.json",
    "core_location.json",
    "core_field.json",
    "events_discipline.json",
    "events_event.json",
    "events_divisionpool.json",
    "games_gameround.json",
    "games_team.json",
    "games_player.json",
    "games_game.json",
    "games_scoring.json",
    "games_spiritscore.json",
];

/// Model tag carried by game records
pub const GAME_MODEL: &str = "games.game";

/// Legacy flags normalized to booleans at decode time
const BOOL_FIELDS: [&str; 3] = ["is_superuser", "is_staff", "is_active"];

/// Game field renames, legacy name to canonical name. The value moves only
/// when the canonical key is absent or null; a populated canonical key wins.
const GAME_FIELD_ALIASES: [(&str, &str); 6] = [
    ("start_time", "date"),
    ("team1", "home_team"),
    ("team2", "away_team"),
    ("team1_score", "home_team_score"),
    ("team2_score", "away_team_score"),
    ("pool", "division_pool"),
];

static DATE_PREFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"^\d{4}-\d{2}-\d{2}").unwrap());
static ZONE_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"[+-]\d{2}:\d{2}$").unwrap());

/// Legacy primary key; exports carry integers, strings, or the odd float
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum LegacyKey {
    Int(i64),
    Float(f64),
    Str(String),
}

impl LegacyKey {
    /// Integer view of the key; unparseable keys read as 0
    pub fn as_int(&self) -> i64 {
        match self {
            LegacyKey::Int(i) => *i,
            LegacyKey::Float(f) => *f as i64,
            LegacyKey::Str(s) => s.trim().parse().unwrap_or(0),
        }
    }
}

/// One decoded legacy record, immutable once loaded
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LegacyRecord {
    pub model: String,
    pub pk: LegacyKey,
    pub fields: Map<String, Value>,
}

impl LegacyRecord {
    /// The record's legacy integer key
    pub fn legacy_id(&self) -> i64 {
        self.pk.as_int()
    }

    /// True when the field is present and not null
    pub fn has_field(&self, key: &str) -> bool {
        !matches!(self.fields.get(key), None | Some(Value::Null))
    }

    /// String view of a field; missing reads as "", strings are trimmed
    pub fn str_field(&self, key: &str) -> String {
        match self.fields.get(key) {
            None | Some(Value::Null) => String::new(),
            Some(Value::String(s)) => s.trim().to_string(),
            Some(Value::Number(n)) => match n.as_i64() {
                Some(i) => i.to_string(),
                None => n.to_string(),
            },
            Some(other) => other.to_string(),
        }
    }

    /// Integer view of a field; missing or unparseable reads as 0
    pub fn int_field(&self, key: &str) -> i64 {
        match self.fields.get(key) {
            Some(Value::Number(n)) => n
                .as_i64()
                .or_else(|| n.as_f64().map(|f| f as i64))
                .unwrap_or(0),
            Some(Value::String(s)) => s.trim().parse().unwrap_or(0),
            _ => 0,
        }
    }

    /// Boolean view of a field; accepts the legacy string and numeric forms
    pub fn bool_field(&self, key: &str) -> bool {
        match self.fields.get(key) {
            Some(Value::Bool(b)) => *b,
            Some(Value::String(s)) => s == "true" || s == "1" || s == "True",
            Some(Value::Number(n)) => n.as_f64().map(|f| f != 0.0).unwrap_or(false),
            _ => false,
        }
    }

    /// Timestamp view of a field; missing or unparseable reads as now
    pub fn time_field(&self, key: &str) -> DateTime<Utc> {
        self.opt_time_field(key).unwrap_or_else(Utc::now)
    }

    /// Timestamp view that keeps absence observable; a present but
    /// unparseable value still reads as now
    pub fn opt_time_field(&self, key: &str) -> Option<DateTime<Utc>> {
        match self.fields.get(key) {
            None | Some(Value::Null) => None,
            Some(Value::String(s)) => Some(parse_datetime(s).unwrap_or_else(Utc::now)),
            Some(_) => Some(Utc::now()),
        }
    }
}

/// Parse the datetime shapes the legacy export produces
fn parse_datetime(s: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Some(dt.with_timezone(&Utc));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%dT%H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(naive) = NaiveDateTime::parse_from_str(s, "%Y-%m-%d %H:%M:%S") {
        return Some(Utc.from_utc_datetime(&naive));
    }
    if let Ok(date) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(Utc.from_utc_datetime(&date.and_hms_opt(0, 0, 0)?));
    }
    None
}

fn is_datetime_like(s: &str) -> bool {
    DATE_PREFIX.is_match(s)
}

/// Bring a datetime string to ISO 8601 with an explicit zone.
///
/// Values already carrying a zone pass through untouched, and a bare date
/// with no time component stays a bare date.
fn normalize_datetime(s: &str) -> String {
    if s.ends_with('Z') || ZONE_SUFFIX.is_match(s) {
        return s.to_string();
    }

    let mut out = s.to_string();
    if out.contains(' ') && !out.contains('T') {
        out = out.replacen(' ', "T", 1);
    }

    if out.contains('T') {
        out.push('Z');
    }
    out
}

/// Collapse the legacy boolean encodings to a real boolean
fn normalize_bool_value(value: &Value) -> bool {
    match value {
        Value::Bool(b) => *b,
        Value::String(s) => s == "1" || s == "true" || s == "True",
        Value::Number(n) => n.as_f64() == Some(1.0),
        _ => false,
    }
}

/// In-place value normalization applied to every decoded record
fn normalize_record(record: &mut LegacyRecord) {
    for (key, value) in record.fields.iter_mut() {
        if let Value::String(s) = value {
            if !s.is_empty() && is_datetime_like(s) {
                let normalized = normalize_datetime(s);
                if normalized != *s {
                    *s = normalized;
                }
            }
        }

        if BOOL_FIELDS.contains(&key.as_str()) {
            *value = Value::Bool(normalize_bool_value(value));
        }
    }
}

/// Collapse renamed game fields onto their canonical names, idempotently
fn apply_field_aliases(record: &mut LegacyRecord) {
    if record.model != GAME_MODEL {
        return;
    }

    for (alias, canonical) in GAME_FIELD_ALIASES {
        let canonical_missing = matches!(record.fields.get(canonical), None | Some(Value::Null));
        if canonical_missing {
            if let Some(value) = record.fields.remove(alias) {
                record.fields.insert(canonical.to_string(), value);
            }
        }
    }
}

/// Outcome of checking every known fixture file
#[derive(Debug, Default)]
pub struct ValidationReport {
    /// Files that decoded, with their record counts
    pub validated: Vec<(&'static str, usize)>,
    /// Files absent from the directory
    pub missing: Vec<&'static str>,
    /// Per-file decode failures, formatted `file: error`
    pub errors: Vec<String>,
}

impl ValidationReport {
    pub fn is_clean(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn total_records(&self) -> usize {
        self.validated.iter().map(|(_, n)| n).sum()
    }
}

/// A directory of legacy fixture files
#[derive(Debug, Clone)]
pub struct FixtureDir {
    dir: PathBuf,
}

impl FixtureDir {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    pub fn path(&self) -> &Path {
        &self.dir
    }

    /// Load and normalize one fixture file.
    ///
    /// A missing file decodes as an empty set; malformed JSON is a decode
    /// error tagged with the file name.
    pub fn load(&self, file_name: &str) -> Result<Vec<LegacyRecord>> {
        let path = self.dir.join(file_name);
        let data = match std::fs::read_to_string(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        let mut records: Vec<LegacyRecord> = serde_json::from_str(&data)
            .map_err(|e| Error::decode(file_name, e.to_string()))?;

        for record in &mut records {
            normalize_record(record);
            apply_field_aliases(record);
        }

        Ok(records)
    }

    /// Check every known fixture file, collecting problems without stopping
    pub fn validate_all(&self) -> ValidationReport {
        let mut report = ValidationReport::default();

        for file in FIXTURE_FILES {
            if !self.dir.join(file).exists() {
                warn!(file, "Fixture file not found");
                report.missing.push(file);
                continue;
            }

            match self.load(file) {
                Ok(records) => {
                    info!(file, records = records.len(), "Validated fixture file");
                    report.validated.push((file, records.len()));
                }
                Err(e) => {
                    report.errors.push(format!("{}: {}", file, e));
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(model: &str, pk: i64, fields: Value) -> LegacyRecord {
        LegacyRecord {
            model: model.to_string(),
            pk: LegacyKey::Int(pk),
            fields: fields.as_object().cloned().unwrap_or_default(),
        }
    }

    #[test]
    fn datetime_normalization_vectors() {
        let cases = [
            ("2009-07-18 10:00:00", "2009-07-18T10:00:00Z"),
            ("2009-07-18T10:00:00", "2009-07-18T10:00:00Z"),
            ("2009-07-18T10:00:00Z", "2009-07-18T10:00:00Z"),
            ("2009-07-18T10:00:00+03:00", "2009-07-18T10:00:00+03:00"),
            ("2009-07-18T10:00:00-05:00", "2009-07-18T10:00:00-05:00"),
            // A bare date has no time component to anchor a zone to
            ("2009-07-18", "2009-07-18"),
        ];
        for (input, expected) in cases {
            assert_eq!(normalize_datetime(input), expected, "input {}", input);
        }
    }

    #[test]
    fn only_datetime_like_strings_are_touched() {
        let mut rec = record(
            "games.team",
            1,
            serde_json::json!({
                "name": "Nairobi 2009-07-18",
                "founded": "2009-07-18 10:00:00",
            }),
        );
        normalize_record(&mut rec);

        assert_eq!(rec.str_field("name"), "Nairobi 2009-07-18");
        assert_eq!(rec.str_field("founded"), "2009-07-18T10:00:00Z");
    }

    #[test]
    fn designated_flags_become_booleans() {
        let mut rec = record(
            "authman.user",
            1,
            serde_json::json!({
                "is_superuser": "1",
                "is_staff": "True",
                "is_active": 1,
                "username": "1",
            }),
        );
        normalize_record(&mut rec);

        assert_eq!(rec.fields["is_superuser"], Value::Bool(true));
        assert_eq!(rec.fields["is_staff"], Value::Bool(true));
        assert_eq!(rec.fields["is_active"], Value::Bool(true));
        // Non-flag fields keep their original type
        assert_eq!(rec.fields["username"], Value::String("1".to_string()));
    }

    #[test]
    fn falsy_flag_encodings_become_false() {
        for encoded in [
            Value::String("0".to_string()),
            Value::String("false".to_string()),
            Value::Number(0.into()),
            Value::Bool(false),
            Value::Null,
        ] {
            let mut rec = record("authman.user", 1, serde_json::json!({}));
            rec.fields.insert("is_active".to_string(), encoded.clone());
            normalize_record(&mut rec);
            assert_eq!(rec.fields["is_active"], Value::Bool(false), "from {:?}", encoded);
        }
    }

    #[test]
    fn game_aliases_move_to_canonical_names() {
        let mut rec = record(
            GAME_MODEL,
            9,
            serde_json::json!({
                "team1": 4,
                "team2": 7,
                "team1_score": 15,
                "team2_score": 11,
                "pool": 2,
                "start_time": "2009-07-18T10:00:00Z",
            }),
        );
        apply_field_aliases(&mut rec);

        assert_eq!(rec.int_field("home_team"), 4);
        assert_eq!(rec.int_field("away_team"), 7);
        assert_eq!(rec.int_field("home_team_score"), 15);
        assert_eq!(rec.int_field("away_team_score"), 11);
        assert_eq!(rec.int_field("division_pool"), 2);
        assert!(rec.has_field("date"));
        assert!(!rec.has_field("team1"));
        assert!(!rec.has_field("pool"));
        assert!(!rec.has_field("start_time"));
    }

    #[test]
    fn populated_canonical_field_wins_over_alias() {
        let mut rec = record(
            GAME_MODEL,
            9,
            serde_json::json!({
                "home_team": 4,
                "team1": 99,
            }),
        );
        apply_field_aliases(&mut rec);

        assert_eq!(rec.int_field("home_team"), 4);
        // The alias stays behind untouched when the canonical key is set
        assert_eq!(rec.int_field("team1"), 99);
    }

    #[test]
    fn null_canonical_field_is_replaced_by_alias() {
        let mut rec = record(
            GAME_MODEL,
            9,
            serde_json::json!({
                "home_team": null,
                "team1": 4,
            }),
        );
        apply_field_aliases(&mut rec);

        assert_eq!(rec.int_field("home_team"), 4);
        assert!(!rec.has_field("team1"));
    }

    #[test]
    fn alias_collapse_is_idempotent() {
        let mut rec = record(
            GAME_MODEL,
            9,
            serde_json::json!({ "team1": 4, "team1_score": 15 }),
        );
        apply_field_aliases(&mut rec);
        let after_first = rec.fields.clone();
        apply_field_aliases(&mut rec);

        assert_eq!(rec.fields, after_first);
    }

    #[test]
    fn aliases_apply_only_to_game_records() {
        let mut rec = record("games.team", 3, serde_json::json!({ "team1": 4 }));
        apply_field_aliases(&mut rec);
        assert_eq!(rec.int_field("team1"), 4);
        assert!(!rec.has_field("home_team"));
    }

    #[test]
    fn int_field_defaults_and_coercions() {
        let rec = record(
            "games.scoring",
            1,
            serde_json::json!({
                "goals": 3,
                "assists": "5",
                "blocks": " 2 ",
                "turns": null,
                "weird": "abc",
                "fraction": 2.9,
            }),
        );
        assert_eq!(rec.int_field("goals"), 3);
        assert_eq!(rec.int_field("assists"), 5);
        assert_eq!(rec.int_field("blocks"), 2);
        assert_eq!(rec.int_field("turns"), 0);
        assert_eq!(rec.int_field("missing"), 0);
        assert_eq!(rec.int_field("weird"), 0);
        assert_eq!(rec.int_field("fraction"), 2);
    }

    #[test]
    fn str_field_trims_and_defaults() {
        let rec = record(
            "core.location",
            1,
            serde_json::json!({
                "name": "  Kasarani  ",
                "code": 42,
                "city": null,
            }),
        );
        assert_eq!(rec.str_field("name"), "Kasarani");
        assert_eq!(rec.str_field("code"), "42");
        assert_eq!(rec.str_field("city"), "");
        assert_eq!(rec.str_field("missing"), "");
    }

    #[test]
    fn time_field_parses_known_shapes() {
        let rec = record(
            "events.event",
            1,
            serde_json::json!({
                "start_date": "2009-07-18T10:00:00Z",
                "end_date": "2009-07-19",
            }),
        );
        let start = rec.time_field("start_date");
        assert_eq!(start.to_rfc3339(), "2009-07-18T10:00:00+00:00");
        let end = rec.time_field("end_date");
        assert_eq!(end.to_rfc3339(), "2009-07-19T00:00:00+00:00");
    }

    #[test]
    fn opt_time_field_keeps_absence_observable() {
        let rec = record(
            "authman.user",
            1,
            serde_json::json!({ "last_login": null }),
        );
        assert!(rec.opt_time_field("last_login").is_none());
        assert!(rec.opt_time_field("missing").is_none());
    }

    #[test]
    fn legacy_keys_read_as_integers() {
        assert_eq!(LegacyKey::Int(42).as_int(), 42);
        assert_eq!(LegacyKey::Str("17".to_string()).as_int(), 17);
        assert_eq!(LegacyKey::Str("abc".to_string()).as_int(), 0);
        assert_eq!(LegacyKey::Float(3.0).as_int(), 3);
    }

    #[test]
    fn load_missing_file_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let fixtures = FixtureDir::new(dir.path());
        let records = fixtures.load("games_team.json").unwrap();
        assert!(records.is_empty());
    }

    #[test]
    fn load_malformed_file_is_a_decode_error() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("games_team.json"), "{ nope").unwrap();

        let fixtures = FixtureDir::new(dir.path());
        let err = fixtures.load("games_team.json").unwrap_err();
        assert!(err.to_string().contains("games_team.json"), "{}", err);
    }

    #[test]
    fn load_normalizes_records() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("games_game.json"),
            serde_json::json!([{
                "model": "games.game",
                "pk": 1,
                "fields": {
                    "name": "Final",
                    "team1": 4,
                    "start_time": "2009-07-18 10:00:00"
                }
            }])
            .to_string(),
        )
        .unwrap();

        let fixtures = FixtureDir::new(dir.path());
        let records = fixtures.load("games_game.json").unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].int_field("home_team"), 4);
        assert_eq!(records[0].str_field("date"), "2009-07-18T10:00:00Z");
    }

    #[test]
    fn validate_all_collects_problems_without_stopping() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(
            dir.path().join("games_team.json"),
            r#"[{"model": "games.team", "pk": 1, "fields": {"name": "Aces"}}]"#,
        )
        .unwrap();
        std::fs::write(dir.path().join("games_player.json"), "not json").unwrap();

        let fixtures = FixtureDir::new(dir.path());
        let report = fixtures.validate_all();

        assert!(!report.is_clean());
        assert_eq!(report.errors.len(), 1);
        assert!(report.errors[0].starts_with("games_player.json"));
        assert!(report.validated.contains(&("games_team.json", 1)));
        assert_eq!(report.missing.len(), FIXTURE_FILES.len() - 2);
        assert_eq!(report.total_records(), 1);
    }
}
