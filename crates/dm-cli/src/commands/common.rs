//! Shared utilities for CLI commands

use anyhow::{Context, Result};
use dm_core::{Config, MigrationId, MigrationsDir};
use dm_db::{Database, DbClient, DuckDbBackend};
use dm_migrate::{DuckDbChangelog, Migrator, SqlMigrationSource};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::cli::GlobalArgs;

/// Error type representing a non-zero process exit code.
///
/// Use `return Err(ExitCode(N).into())` instead of `std::process::exit(N)`
/// so that RAII destructors run and cleanup happens properly.
#[derive(Debug)]
pub(crate) struct ExitCode(pub(crate) i32);

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        // Empty: the command already printed its own error.
        write!(f, "")
    }
}

impl std::error::Error for ExitCode {}

/// A loaded docmigrate project
pub(crate) struct Project {
    pub(crate) root: PathBuf,
    pub(crate) config: Config,
}

impl Project {
    /// Load the config from `--config` or the project directory
    pub(crate) fn load(global: &GlobalArgs) -> Result<Self> {
        let root = PathBuf::from(&global.project_dir);
        let config = match &global.config {
            Some(path) => Config::load(Path::new(path)),
            None => Config::load_from_dir(&root),
        }
        .context("Failed to load docmigrate config")?;
        Ok(Self { root, config })
    }

    pub(crate) fn migrations_dir(&self) -> MigrationsDir {
        MigrationsDir::new(
            self.config.migrations_dir_absolute(&self.root),
            self.config.migration_file_extension.clone(),
        )
    }

    /// Database path for the resolved target, relative paths taken from the
    /// project directory
    pub(crate) fn database_path(&self, target: Option<&str>) -> Result<String> {
        let resolved_target = Config::resolve_target(target);
        let db_config = self
            .config
            .get_database_config(resolved_target.as_deref())
            .context("Failed to get database configuration")?;
        Ok(resolve_database_path(&self.root, &db_config.path))
    }
}

/// Join a relative database path onto `root`; `:memory:` and absolute
/// paths are returned unchanged.
pub(crate) fn resolve_database_path(root: &Path, path: &str) -> String {
    if path == ":memory:" || Path::new(path).is_absolute() {
        path.to_string()
    } else {
        root.join(path).display().to_string()
    }
}

/// Everything a migration command needs: the client, a connection, and the
/// migrator wired to the project's migrations directory and changelog.
pub(crate) struct Session {
    pub(crate) client: DbClient,
    pub(crate) db: DuckDbBackend,
    pub(crate) migrator: Migrator<dyn Database, DbClient>,
}

impl Session {
    pub(crate) fn open(global: &GlobalArgs) -> Result<Self> {
        let project = Project::load(global)?;
        let path = project.database_path(global.target.as_deref())?;
        let client = DbClient::open(&path).context("Failed to connect to database")?;
        let db = client.database().context("Failed to connect to database")?;

        let source = SqlMigrationSource::new(project.migrations_dir());
        let changelog = DuckDbChangelog::new(project.config.changelog_collection_name.clone());
        let migrator: Migrator<dyn Database, DbClient> =
            Migrator::new(Arc::new(source), Arc::new(changelog));
        log::debug!("Session opened on {}", path);

        Ok(Self {
            client,
            db,
            migrator,
        })
    }
}

/// Print one `<label>: <id>` line per migration.
pub(crate) fn print_migrated(label: &str, ids: &[MigrationId]) {
    for id in ids {
        println!("{}: {}", label, id);
    }
}

#[cfg(test)]
#[path = "common_test.rs"]
mod tests;
