//! Configuration types and parsing for docmigrate.yml

use crate::error::{CoreError, CoreResult};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};

/// Config file names searched in a project directory, in order.
pub const CONFIG_FILE_NAMES: &[&str] = &["docmigrate.yml", "docmigrate.yaml"];

/// Main project configuration from docmigrate.yml
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Project name
    pub name: String,

    /// Directory holding the migration files, relative to the project root
    #[serde(default = "default_migrations_dir")]
    pub migrations_dir: String,

    /// Name of the collection (table) that records applied migrations
    #[serde(default = "default_changelog_collection_name")]
    pub changelog_collection_name: String,

    /// File extension of migration files, including the leading dot
    #[serde(default = "default_migration_file_extension")]
    pub migration_file_extension: String,

    /// Database that migrations run against
    #[serde(default)]
    pub database: DatabaseConfig,

    /// Named databases to migrate (`-t prod`)
    #[serde(default)]
    pub targets: HashMap<String, TargetConfig>,
}

/// Per-target overrides
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(deny_unknown_fields)]
pub struct TargetConfig {
    /// Database the target migrates instead of the base one
    #[serde(default)]
    pub database: Option<DatabaseConfig>,
}

/// Database that migrations run against
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DatabaseConfig {
    /// Database path (DuckDB file or `:memory:`)
    #[serde(default = "default_db_path")]
    pub path: String,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: default_db_path(),
        }
    }
}

const DEFAULT_DB_PATH: &str = ":memory:";

fn default_db_path() -> String {
    DEFAULT_DB_PATH.to_string()
}

fn default_migrations_dir() -> String {
    "migrations".to_string()
}

fn default_changelog_collection_name() -> String {
    "changelog".to_string()
}

fn default_migration_file_extension() -> String {
    ".sql".to_string()
}

/// Returns true when `name` is a plain SQL identifier (`[A-Za-z_][A-Za-z0-9_]*`).
///
/// The changelog collection name is interpolated into SQL, so anything else
/// is rejected.
pub fn is_plain_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl Config {
    /// Read and validate a config file
    pub fn load(path: &Path) -> CoreResult<Self> {
        if !path.exists() {
            return Err(CoreError::ConfigNotFound {
                path: path.display().to_string(),
            });
        }

        let content = std::fs::read_to_string(path).map_err(|e| CoreError::IoWithPath {
            path: path.display().to_string(),
            source: e,
        })?;
        let config: Config =
            serde_yaml::from_str(&content).map_err(|e| CoreError::ConfigParseError {
                message: format!("{}: {}", path.display(), e),
            })?;
        config.validate()?;
        Ok(config)
    }

    /// Find and load the config file in `dir`
    /// Looks for docmigrate.yml or docmigrate.yaml
    pub fn load_from_dir(dir: &Path) -> CoreResult<Self> {
        Self::load(&Self::config_path(dir)?)
    }

    /// Locate the config file in `dir`, failing when none exists.
    pub fn config_path(dir: &Path) -> CoreResult<PathBuf> {
        CONFIG_FILE_NAMES
            .iter()
            .map(|name| dir.join(name))
            .find(|path| path.exists())
            .ok_or_else(|| CoreError::ConfigNotFound {
                path: dir.join(CONFIG_FILE_NAMES[0]).display().to_string(),
            })
    }

    /// Check that a config file exists in `dir` without parsing it
    pub fn should_exist(dir: &Path) -> CoreResult<()> {
        Self::config_path(dir).map(|_| ())
    }

    /// Reject values the engine cannot use
    fn validate(&self) -> CoreResult<()> {
        if self.name.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "Project name cannot be empty".to_string(),
            });
        }

        if self.migrations_dir.is_empty() {
            return Err(CoreError::ConfigInvalid {
                message: "migrations_dir cannot be empty".to_string(),
            });
        }

        if !is_plain_identifier(&self.changelog_collection_name) {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "changelog_collection_name '{}' must be a plain identifier (letters, digits, '_')",
                    self.changelog_collection_name
                ),
            });
        }

        if !self.migration_file_extension.starts_with('.')
            || self.migration_file_extension.len() < 2
        {
            return Err(CoreError::ConfigInvalid {
                message: format!(
                    "migration_file_extension '{}' must start with '.' (e.g. \".sql\")",
                    self.migration_file_extension
                ),
            });
        }

        Ok(())
    }

    /// Get absolute migrations directory relative to a project root
    pub fn migrations_dir_absolute(&self, root: &Path) -> PathBuf {
        root.join(&self.migrations_dir)
    }

    /// Target names, sorted
    pub fn available_targets(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.targets.keys().map(|s| s.as_str()).collect();
        names.sort_unstable();
        names
    }

    /// Database for `target`, or the base database when no target is given
    ///
    /// A target without its own `database` section uses the base one. An
    /// unknown target is an error listing the known ones.
    pub fn get_database_config(&self, target: Option<&str>) -> CoreResult<DatabaseConfig> {
        match target {
            Some(name) => {
                let target_config =
                    self.targets
                        .get(name)
                        .ok_or_else(|| CoreError::ConfigInvalid {
                            message: format!(
                                "Target '{}' not found. Available targets: {}",
                                name,
                                self.available_targets().join(", ")
                            ),
                        })?;

                Ok(target_config
                    .database
                    .clone()
                    .unwrap_or_else(|| self.database.clone()))
            }
            None => Ok(self.database.clone()),
        }
    }

    /// Resolve target from CLI flag or DM_TARGET environment variable
    ///
    /// Priority: CLI flag > DM_TARGET env var > None
    pub fn resolve_target(cli_target: Option<&str>) -> Option<String> {
        cli_target
            .map(String::from)
            .or_else(|| std::env::var("DM_TARGET").ok())
    }
}

#[cfg(test)]
#[path = "config_test.rs"]
mod tests;
