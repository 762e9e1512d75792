//! gamestats-migrate - Legacy fixture migration tool
//!
//! Loads the legacy JSON fixture exports, migrates them into the GameStats
//! entity store in dependency order, and records the legacy-key to UUID
//! mapping. The whole run is idempotent: executing it again against the
//! same store creates nothing new.

use std::path::PathBuf;

use anyhow::{bail, Result};
use clap::Parser;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use gamestats_common::config::MigrationConfig;
use gamestats_common::db::init_database;
use gamestats_migrate::{FixtureDir, IdRegistry, Migrator};

/// Command-line arguments for gamestats-migrate
#[derive(Parser, Debug)]
#[command(name = "gamestats-migrate")]
#[command(about = "Idempotent legacy fixture migration for GameStats")]
#[command(version)]
struct Args {
    /// Directory holding the legacy fixture files
    #[arg(long, env = "GAMESTATS_FIXTURES_DIR")]
    fixtures_dir: Option<PathBuf>,

    /// SQLite database file backing the entity store
    #[arg(long, env = "GAMESTATS_DATABASE")]
    database: Option<PathBuf>,

    /// TOML configuration file
    #[arg(long)]
    config: Option<PathBuf>,

    /// Mapping snapshot file, loaded at start and rewritten at the end
    #[arg(long, env = "GAMESTATS_MAPPING_SNAPSHOT")]
    mapping_snapshot: Option<PathBuf>,

    /// Decode and check the fixture files, then exit without migrating
    #[arg(long)]
    validate_only: bool,

    /// Run even when the configuration disables migration
    #[arg(long)]
    force: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let args = Args::parse();

    info!(
        "Starting GameStats migration tool v{}",
        env!("CARGO_PKG_VERSION")
    );

    let config = MigrationConfig::resolve(
        args.fixtures_dir.as_deref(),
        args.database.as_deref(),
        args.mapping_snapshot.as_deref(),
        args.config.as_deref(),
    )?;
    info!("Fixtures directory: {}", config.fixtures_dir.display());

    if args.validate_only {
        return validate_fixtures(&config);
    }

    if !config.enabled && !args.force {
        warn!("Migration is disabled by configuration (use --force to override)");
        return Ok(());
    }

    let pool = init_database(&config.database_path).await?;
    info!("✓ Connected to {}", config.database_path.display());

    let migrator = match &config.mapping_snapshot {
        Some(path) => {
            let registry = IdRegistry::load(path)?;
            info!("✓ Loaded mapping snapshot from {}", path.display());
            Migrator::with_registry(pool, registry)
        }
        None => Migrator::new(pool),
    };

    let cancel = CancellationToken::new();
    let signal_cancel = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupt received, stopping after the current record");
            signal_cancel.cancel();
        }
    });

    let report = migrator.run_all(&config.fixtures_dir, &cancel).await;

    // Persist the mapping even for unsuccessful runs; whatever was assigned
    // is already in the store
    if let Some(path) = &config.mapping_snapshot {
        match migrator.registry().save(path) {
            Ok(()) => info!("✓ Saved mapping snapshot to {}", path.display()),
            Err(e) => warn!("Failed to save mapping snapshot: {}", e),
        }
    }

    if report.cancelled {
        bail!("migration cancelled before completion");
    }

    let failed = report.failed_stages();
    if !failed.is_empty() {
        error!("Stages finished with errors: {}", failed.join(", "));
        bail!("{} of {} stages failed", failed.len(), report.stages.len());
    }

    info!(
        "✓ Migration complete: {} entities created in {:.1?}",
        report.total_created(),
        report.elapsed
    );

    Ok(())
}

/// Handle `--validate-only`: check every fixture file and report
fn validate_fixtures(config: &MigrationConfig) -> Result<()> {
    let fixtures = FixtureDir::new(&config.fixtures_dir);
    let report = fixtures.validate_all();

    info!(
        "Checked fixture files: {} valid ({} records), {} missing",
        report.validated.len(),
        report.total_records(),
        report.missing.len()
    );

    if !report.is_clean() {
        for problem in &report.errors {
            error!("Fixture validation error: {}", problem);
        }
        bail!("{} fixture files failed validation", report.errors.len());
    }

    info!("✓ All present fixture files decoded cleanly");
    Ok(())
}
