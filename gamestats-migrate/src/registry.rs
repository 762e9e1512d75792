//! Legacy identifier registry
//!
//! Maps legacy integer keys to the UUID surrogates assigned during
//! migration, one independent map per entity kind. The registry is the only
//! place reference resolution can translate a legacy foreign key, so every
//! stage records its mappings here, for entities it creates and for entities
//! it finds already present.
//!
//! The whole registry serializes to a single JSON snapshot so a later run
//! (or an operator) can inspect or reuse the assignments.

use std::collections::BTreeMap;
use std::fmt;
use std::path::Path;
use std::sync::RwLock;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use gamestats_common::{Error, Result};

/// Entity kinds that carry a legacy-key mapping
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum EntityKind {
    #[serde(rename = "users")]
    User,
    #[serde(rename = "continents")]
    Continent,
    #[serde(rename = "countries")]
    Country,
    #[serde(rename = "locations")]
    Location,
    #[serde(rename = "fields")]
    Field,
    #[serde(rename = "disciplines")]
    Discipline,
    #[serde(rename = "events")]
    Event,
    #[serde(rename = "divisions")]
    Division,
    #[serde(rename = "game_rounds")]
    GameRound,
    #[serde(rename = "teams")]
    Team,
    #[serde(rename = "players")]
    Player,
    #[serde(rename = "games")]
    Game,
}

impl EntityKind {
    /// Every kind, in snapshot order
    pub const ALL: [EntityKind; 12] = [
        EntityKind::User,
        EntityKind::Continent,
        EntityKind::Country,
        EntityKind::Location,
        EntityKind::Field,
        EntityKind::Discipline,
        EntityKind::Event,
        EntityKind::Division,
        EntityKind::GameRound,
        EntityKind::Team,
        EntityKind::Player,
        EntityKind::Game,
    ];

    /// Store table holding this kind
    pub fn table(&self) -> &'static str {
        match self {
            EntityKind::User => "users",
            EntityKind::Continent => "continents",
            EntityKind::Country => "countries",
            EntityKind::Location => "locations",
            EntityKind::Field => "fields",
            EntityKind::Discipline => "disciplines",
            EntityKind::Event => "events",
            EntityKind::Division => "division_pools",
            EntityKind::GameRound => "game_rounds",
            EntityKind::Team => "teams",
            EntityKind::Player => "players",
            EntityKind::Game => "games",
        }
    }

    /// Column the kind's natural key lives in
    pub fn natural_key_column(&self) -> &'static str {
        match self {
            EntityKind::User => "email",
            EntityKind::Continent
            | EntityKind::Country
            | EntityKind::Location
            | EntityKind::Discipline
            | EntityKind::Event => "slug",
            EntityKind::Field
            | EntityKind::Division
            | EntityKind::GameRound
            | EntityKind::Team
            | EntityKind::Player
            | EntityKind::Game => "name",
        }
    }

    /// Singular label for log and skip-reason text
    pub fn label(&self) -> &'static str {
        match self {
            EntityKind::User => "user",
            EntityKind::Continent => "continent",
            EntityKind::Country => "country",
            EntityKind::Location => "location",
            EntityKind::Field => "field",
            EntityKind::Discipline => "discipline",
            EntityKind::Event => "event",
            EntityKind::Division => "division",
            EntityKind::GameRound => "game round",
            EntityKind::Team => "team",
            EntityKind::Player => "player",
            EntityKind::Game => "game",
        }
    }
}

impl fmt::Display for EntityKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Concurrency-safe legacy-key to UUID registry.
///
/// A mapping, once recorded, is never replaced; the first assignment for a
/// (kind, legacy key) pair wins for the lifetime of the registry.
#[derive(Debug)]
pub struct IdRegistry {
    inner: RwLock<BTreeMap<EntityKind, BTreeMap<i64, Uuid>>>,
}

impl IdRegistry {
    /// Empty registry with all kinds present
    pub fn new() -> Self {
        let mut maps = BTreeMap::new();
        for kind in EntityKind::ALL {
            maps.insert(kind, BTreeMap::new());
        }
        Self {
            inner: RwLock::new(maps),
        }
    }

    /// Record a mapping unless the legacy key is already assigned
    pub fn set(&self, kind: EntityKind, legacy_id: i64, guid: Uuid) {
        let mut maps = self.inner.write().unwrap();
        maps.entry(kind).or_default().entry(legacy_id).or_insert(guid);
    }

    /// Look up the surrogate for a legacy key
    pub fn get(&self, kind: EntityKind, legacy_id: i64) -> Option<Uuid> {
        let maps = self.inner.read().unwrap();
        maps.get(&kind).and_then(|m| m.get(&legacy_id)).copied()
    }

    /// Number of mappings recorded for one kind
    pub fn count(&self, kind: EntityKind) -> usize {
        let maps = self.inner.read().unwrap();
        maps.get(&kind).map(BTreeMap::len).unwrap_or(0)
    }

    /// Per-kind mapping counts, for end-of-run reporting
    pub fn stats(&self) -> BTreeMap<EntityKind, usize> {
        let maps = self.inner.read().unwrap();
        maps.iter().map(|(kind, m)| (*kind, m.len())).collect()
    }

    /// Write the registry as a pretty-printed JSON snapshot
    pub fn save(&self, path: &Path) -> Result<()> {
        let maps = self.inner.read().unwrap();
        let json = serde_json::to_string_pretty(&*maps)
            .map_err(|e| Error::Internal(format!("Failed to serialize mapping: {}", e)))?;
        std::fs::write(path, json)?;
        Ok(())
    }

    /// Load a snapshot; a missing file yields an empty registry
    pub fn load(path: &Path) -> Result<Self> {
        let data = match std::fs::read_to_string(path) {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Self::new()),
            Err(e) => return Err(e.into()),
        };

        let loaded: BTreeMap<EntityKind, BTreeMap<i64, Uuid>> = serde_json::from_str(&data)
            .map_err(|e| Error::decode(path.display().to_string(), e.to_string()))?;

        // Snapshots from older runs may omit kinds; keep the full set present
        let registry = Self::new();
        {
            let mut maps = registry.inner.write().unwrap();
            for (kind, entries) in loaded {
                maps.insert(kind, entries);
            }
        }
        Ok(registry)
    }
}

impl Default for IdRegistry {
    fn default() -> Self {
        Self::new()
    }
}
