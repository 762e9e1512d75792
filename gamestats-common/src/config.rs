//! Configuration loading for the migration tools

use crate::{Error, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

/// Default config file looked up when no `--config` is given
const DEFAULT_CONFIG_FILE: &str = "gamestats.toml";

/// Migration tool configuration.
///
/// Every value resolves in priority order:
/// 1. Command-line argument (highest priority)
/// 2. Environment variable (`GAMESTATS_*`)
/// 3. TOML config file
/// 4. Compiled default (fallback)
#[derive(Debug, Clone)]
pub struct MigrationConfig {
    /// Master switch; when false the tool runs nothing unless forced
    pub enabled: bool,
    /// Directory holding the legacy fixture files
    pub fixtures_dir: PathBuf,
    /// SQLite database file backing the entity store
    pub database_path: PathBuf,
    /// Identifier mapping snapshot, loaded at start and written at end
    pub mapping_snapshot: Option<PathBuf>,
}

impl Default for MigrationConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            fixtures_dir: PathBuf::from("migrations/fixtures"),
            database_path: PathBuf::from("gamestats.db"),
            mapping_snapshot: None,
        }
    }
}

/// TOML config file shape; every key is optional
#[derive(Debug, Default, Deserialize)]
struct ConfigFile {
    enabled: Option<bool>,
    fixtures_dir: Option<PathBuf>,
    database_path: Option<PathBuf>,
    mapping_snapshot: Option<PathBuf>,
}

impl MigrationConfig {
    /// Resolve the full configuration from CLI arguments, environment,
    /// an optional TOML file, and compiled defaults.
    ///
    /// `config_path` follows its own two-level lookup: an explicit path must
    /// exist, while the default `gamestats.toml` is skipped when absent.
    pub fn resolve(
        cli_fixtures: Option<&Path>,
        cli_database: Option<&Path>,
        cli_snapshot: Option<&Path>,
        config_path: Option<&Path>,
    ) -> Result<Self> {
        let file = load_config_file(config_path)?;
        let defaults = MigrationConfig::default();

        let fixtures_dir = resolve_path(
            cli_fixtures,
            "GAMESTATS_FIXTURES_DIR",
            file.fixtures_dir.as_deref(),
        )
        .unwrap_or(defaults.fixtures_dir);

        let database_path = resolve_path(
            cli_database,
            "GAMESTATS_DATABASE",
            file.database_path.as_deref(),
        )
        .unwrap_or(defaults.database_path);

        let mapping_snapshot = resolve_path(
            cli_snapshot,
            "GAMESTATS_MAPPING_SNAPSHOT",
            file.mapping_snapshot.as_deref(),
        );

        let enabled = resolve_flag("GAMESTATS_MIGRATION_ENABLED", file.enabled)
            .unwrap_or(defaults.enabled);

        Ok(Self {
            enabled,
            fixtures_dir,
            database_path,
            mapping_snapshot,
        })
    }
}

/// Resolve one path value through the CLI > env > file priority chain
fn resolve_path(
    cli_arg: Option<&Path>,
    env_var_name: &str,
    file_value: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(path) = cli_arg {
        return Some(path.to_path_buf());
    }
    if let Ok(path) = std::env::var(env_var_name) {
        if !path.is_empty() {
            return Some(PathBuf::from(path));
        }
    }
    file_value.map(Path::to_path_buf)
}

/// Resolve one boolean through the env > file priority chain
fn resolve_flag(env_var_name: &str, file_value: Option<bool>) -> Option<bool> {
    if let Ok(value) = std::env::var(env_var_name) {
        match value.to_ascii_lowercase().as_str() {
            "1" | "true" | "yes" => return Some(true),
            "0" | "false" | "no" => return Some(false),
            _ => {}
        }
    }
    file_value
}

/// Load the TOML config file if one applies
fn load_config_file(config_path: Option<&Path>) -> Result<ConfigFile> {
    let path = match config_path {
        Some(path) => {
            if !path.exists() {
                return Err(Error::Config(format!(
                    "Config file not found: {}",
                    path.display()
                )));
            }
            path.to_path_buf()
        }
        None => {
            let default = PathBuf::from(DEFAULT_CONFIG_FILE);
            if !default.exists() {
                return Ok(ConfigFile::default());
            }
            default
        }
    };

    let content = std::fs::read_to_string(&path)?;
    toml::from_str(&content)
        .map_err(|e| Error::Config(format!("Invalid config file {}: {}", path.display(), e)))
}
