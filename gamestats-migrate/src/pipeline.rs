//! Stage ordering and pipeline execution
//!
//! Stages run strictly in foreign-key dependency order, so that by the time
//! a stage resolves a reference, the stage that owns the referenced entities
//! has already populated the registry. A stage that aborts on a store error
//! is recorded as failed and the pipeline moves on; later stages degrade
//! through the resolution fallbacks instead of bringing the run down.

use std::path::Path;
use std::time::Instant;

use sqlx::SqlitePool;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use gamestats_common::Result;

use crate::fixtures::FixtureDir;
use crate::registry::{EntityKind, IdRegistry};
use crate::report::{RunReport, StageCounts, StageReport};
use crate::stages::{self, StageContext};

/// One migration stage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Users,
    World,
    Continents,
    Countries,
    Locations,
    Disciplines,
    Events,
    DivisionPools,
    Fields,
    GameRounds,
    Teams,
    Players,
    Games,
    Scoring,
    SpiritScores,
}

/// Execution order. Referenced entities always migrate before the entities
/// that point at them.
pub const ORDER: [Stage; 15] = [
    // Accounts
    Stage::Users,
    // Geography, outermost first
    Stage::World,
    Stage::Continents,
    Stage::Countries,
    Stage::Locations,
    // Competition structure
    Stage::Disciplines,
    Stage::Events,
    Stage::DivisionPools,
    Stage::Fields,
    Stage::GameRounds,
    // Participants
    Stage::Teams,
    Stage::Players,
    // Results
    Stage::Games,
    Stage::Scoring,
    Stage::SpiritScores,
];

impl Stage {
    /// Stage name as logged and reported
    pub fn name(&self) -> &'static str {
        match self {
            Stage::Users => "users",
            Stage::World => "world",
            Stage::Continents => "continents",
            Stage::Countries => "countries",
            Stage::Locations => "locations",
            Stage::Disciplines => "disciplines",
            Stage::Events => "events",
            Stage::DivisionPools => "division_pools",
            Stage::Fields => "fields",
            Stage::GameRounds => "game_rounds",
            Stage::Teams => "teams",
            Stage::Players => "players",
            Stage::Games => "games",
            Stage::Scoring => "scoring",
            Stage::SpiritScores => "spirit_scores",
        }
    }

    /// Fixture file the stage reads
    pub fn fixture_file(&self) -> &'static str {
        match self {
            Stage::Users => stages::users::USER_FILE,
            Stage::World => stages::geography::WORLD_FILE,
            Stage::Continents => stages::geography::CONTINENT_FILE,
            Stage::Countries => stages::geography::COUNTRY_FILE,
            Stage::Locations => stages::geography::LOCATION_FILE,
            Stage::Disciplines => stages::events::DISCIPLINE_FILE,
            Stage::Events => stages::events::EVENT_FILE,
            Stage::DivisionPools => stages::events::DIVISION_POOL_FILE,
            Stage::Fields => stages::events::FIELD_FILE,
            Stage::GameRounds => stages::events::GAME_ROUND_FILE,
            Stage::Teams => stages::teams::TEAM_FILE,
            Stage::Players => stages::teams::PLAYER_FILE,
            Stage::Games => stages::games::GAME_FILE,
            Stage::Scoring => stages::games::SCORING_FILE,
            Stage::SpiritScores => stages::spirit::SPIRIT_FILE,
        }
    }

    async fn run(&self, cx: &StageContext<'_>) -> Result<StageCounts> {
        match self {
            Stage::Users => stages::users::migrate_users(cx).await,
            Stage::World => stages::geography::migrate_world(cx).await,
            Stage::Continents => stages::geography::migrate_continents(cx).await,
            Stage::Countries => stages::geography::migrate_countries(cx).await,
            Stage::Locations => stages::geography::migrate_locations(cx).await,
            Stage::Disciplines => stages::events::migrate_disciplines(cx).await,
            Stage::Events => stages::events::migrate_events(cx).await,
            Stage::DivisionPools => stages::events::migrate_division_pools(cx).await,
            Stage::Fields => stages::events::migrate_fields(cx).await,
            Stage::GameRounds => stages::events::migrate_game_rounds(cx).await,
            Stage::Teams => stages::teams::migrate_teams(cx).await,
            Stage::Players => stages::teams::migrate_players(cx).await,
            Stage::Games => stages::games::migrate_games(cx).await,
            Stage::Scoring => stages::games::migrate_scoring(cx).await,
            Stage::SpiritScores => stages::spirit::migrate_spirit_scores(cx).await,
        }
    }
}

/// Runs the full stage sequence against one store
pub struct Migrator {
    pool: SqlitePool,
    registry: IdRegistry,
}

impl Migrator {
    pub fn new(pool: SqlitePool) -> Self {
        Self {
            pool,
            registry: IdRegistry::new(),
        }
    }

    /// Start from a previously saved mapping snapshot
    pub fn with_registry(pool: SqlitePool, registry: IdRegistry) -> Self {
        Self { pool, registry }
    }

    pub fn registry(&self) -> &IdRegistry {
        &self.registry
    }

    /// Run every stage in order and report what happened.
    ///
    /// The run itself never fails: fixture problems are logged, aborted
    /// stages are recorded in the report, and cancellation stops the
    /// sequence cleanly between stages.
    pub async fn run_all(&self, fixtures_dir: &Path, cancel: &CancellationToken) -> RunReport {
        let started = Instant::now();
        info!(fixtures = %fixtures_dir.display(), "Starting legacy data migration");

        let fixtures = FixtureDir::new(fixtures_dir);
        let validation = fixtures.validate_all();
        for problem in &validation.errors {
            warn!(%problem, "Fixture validation error");
        }
        info!(
            files = validation.validated.len(),
            records = validation.total_records(),
            "Fixture validation complete"
        );

        let cx = StageContext {
            pool: &self.pool,
            registry: &self.registry,
            fixtures: &fixtures,
            cancel,
        };

        let mut stages = Vec::with_capacity(ORDER.len());
        let mut cancelled = false;

        for stage in ORDER {
            if cancel.is_cancelled() {
                warn!(stage = stage.name(), "Cancellation requested, stopping before stage");
                cancelled = true;
                break;
            }

            let name = stage.name();
            info!(stage = name, file = stage.fixture_file(), "Running migration stage");
            let stage_started = Instant::now();

            match stage.run(&cx).await {
                Ok(counts) => {
                    info!(
                        stage = name,
                        created = counts.created,
                        existing = counts.existing,
                        skipped = counts.skipped,
                        failed = counts.failed,
                        "✓ Stage complete"
                    );
                    stages.push(StageReport {
                        stage: name,
                        ok: true,
                        counts,
                        error: None,
                        elapsed: stage_started.elapsed(),
                    });
                }
                Err(e) => {
                    error!(stage = name, error = %e, "Stage aborted");
                    stages.push(StageReport {
                        stage: name,
                        ok: false,
                        counts: StageCounts::default(),
                        error: Some(e.to_string()),
                        elapsed: stage_started.elapsed(),
                    });
                }
            }
        }

        let cancelled = cancelled || cancel.is_cancelled();
        let elapsed = started.elapsed();
        let successful = stages.iter().filter(|s| s.ok).count();
        info!(
            successful,
            total = ORDER.len(),
            elapsed_ms = elapsed.as_millis() as u64,
            "Migration run finished"
        );

        let mapping_counts = self.registry.stats();
        let count = |kind: EntityKind| mapping_counts.get(&kind).copied().unwrap_or(0);
        info!(
            teams = count(EntityKind::Team),
            players = count(EntityKind::Player),
            games = count(EntityKind::Game),
            fields = count(EntityKind::Field),
            divisions = count(EntityKind::Division),
            "Legacy mapping statistics"
        );

        let failed: Vec<_> = stages.iter().filter(|s| !s.ok).map(|s| s.stage).collect();
        if !failed.is_empty() {
            warn!(stages = %failed.join(", "), "Stages finished with errors");
        }

        RunReport {
            stages,
            elapsed,
            cancelled,
            mapping_counts,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_order_is_dependency_complete() {
        assert_eq!(ORDER.len(), 15);
        // Referenced stages come before their dependents
        let position = |stage: Stage| ORDER.iter().position(|s| *s == stage).unwrap();
        assert!(position(Stage::World) < position(Stage::Continents));
        assert!(position(Stage::Continents) < position(Stage::Countries));
        assert!(position(Stage::Countries) < position(Stage::Locations));
        assert!(position(Stage::Teams) < position(Stage::Players));
        assert!(position(Stage::Players) < position(Stage::Games));
        assert!(position(Stage::Games) < position(Stage::Scoring));
        assert!(position(Stage::Games) < position(Stage::SpiritScores));
        assert!(position(Stage::Users) < position(Stage::SpiritScores));
    }

    #[test]
    fn stage_names_are_unique() {
        let mut names: Vec<_> = ORDER.iter().map(Stage::name).collect();
        names.sort();
        names.dedup();
        assert_eq!(names.len(), 15);
    }

    #[test]
    fn every_stage_reads_a_validated_fixture_file() {
        for stage in ORDER {
            assert!(
                crate::fixtures::FIXTURE_FILES.contains(&stage.fixture_file()),
                "{} reads a file validation does not know",
                stage.name()
            );
        }
    }

    #[tokio::test]
    async fn empty_fixture_dir_still_completes_every_stage() {
        let pool = crate::db::test_pool().await;
        let dir = tempfile::tempdir().unwrap();
        let migrator = Migrator::new(pool);
        let cancel = CancellationToken::new();

        let report = migrator.run_all(dir.path(), &cancel).await;

        assert!(report.all_ok());
        assert!(!report.cancelled);
        assert_eq!(report.stages.len(), 15);
        // The world is synthesized even without fixture data
        assert_eq!(report.total_created(), 1);
    }

    #[tokio::test]
    async fn pre_cancelled_run_executes_nothing() {
        let pool = crate::db::test_pool().await;
        let dir = tempfile::tempdir().unwrap();
        let migrator = Migrator::new(pool);
        let cancel = CancellationToken::new();
        cancel.cancel();

        let report = migrator.run_all(dir.path(), &cancel).await;

        assert!(report.cancelled);
        assert!(report.stages.is_empty());
    }
}
