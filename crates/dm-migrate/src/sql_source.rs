//! Migrations stored as SQL files in the migrations directory.
//!
//! A file holds an up section and an optional down section, each introduced
//! by a marker comment on its own line:
//!
//! ```sql
//! -- migrate:up
//! CREATE TABLE users (id INTEGER);
//!
//! -- migrate:down
//! DROP TABLE users;
//! ```

use crate::source::{MigrationListing, MigrationSource, SourceError};
use crate::unit::{MigrationOperation, MigrationUnit};
use async_trait::async_trait;
use dm_core::{CoreError, MigrationId, MigrationsDir};
use dm_db::{Database, DbClient};
use std::sync::Arc;

/// Marker line starting the up section
pub const UP_MARKER: &str = "-- migrate:up";

/// Marker line starting the down section
pub const DOWN_MARKER: &str = "-- migrate:down";

type SqlOperation = MigrationOperation<dyn Database, DbClient>;

/// The sections of a parsed SQL migration file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SqlScript {
    pub up: String,
    pub down: Option<String>,
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Section {
    Preamble,
    Up,
    Down,
}

/// Split a migration file into its up and down sections.
///
/// Markers are matched case-insensitively on trimmed lines. Only blank lines
/// and `--` comments may precede the up marker, and each marker may appear
/// once.
pub fn parse_sql_migration(content: &str) -> Result<SqlScript, String> {
    let mut section = Section::Preamble;
    let mut up: Option<String> = None;
    let mut down: Option<String> = None;

    for (idx, line) in content.lines().enumerate() {
        let marker = line.trim().to_ascii_lowercase();
        if marker == UP_MARKER {
            if up.is_some() {
                return Err(format!("duplicate '{}' marker on line {}", UP_MARKER, idx + 1));
            }
            up = Some(String::new());
            section = Section::Up;
            continue;
        }
        if marker == DOWN_MARKER {
            if down.is_some() {
                return Err(format!(
                    "duplicate '{}' marker on line {}",
                    DOWN_MARKER,
                    idx + 1
                ));
            }
            down = Some(String::new());
            section = Section::Down;
            continue;
        }

        let target = match section {
            Section::Preamble => {
                if marker.is_empty() || marker.starts_with("--") {
                    continue;
                }
                return Err(format!(
                    "statement before '{}' on line {}",
                    UP_MARKER,
                    idx + 1
                ));
            }
            Section::Up => up.as_mut(),
            Section::Down => down.as_mut(),
        };
        if let Some(buf) = target {
            buf.push_str(line);
            buf.push('\n');
        }
    }

    let up = up.ok_or_else(|| format!("missing '{}' marker", UP_MARKER))?;
    Ok(SqlScript { up, down })
}

fn has_statements(sql: &str) -> bool {
    sql.lines().any(|line| {
        let line = line.trim();
        !line.is_empty() && !line.starts_with("--")
    })
}

/// Operation running `sql` as a batch. Blank sections are no-ops.
fn batch_operation(sql: String) -> SqlOperation {
    if !has_statements(&sql) {
        return SqlOperation::noop();
    }
    let sql: Arc<str> = Arc::from(sql);
    SqlOperation::direct(move |db, _client| {
        let sql = Arc::clone(&sql);
        Box::pin(async move { db.execute_batch(&sql).await.map_err(anyhow::Error::from) })
    })
}

/// Operation that always fails: the file defines no way to revert itself.
fn irreversible_operation(id: &MigrationId) -> SqlOperation {
    let message = format!("migration {} has no down section", id);
    SqlOperation::direct(move |_db, _client| {
        let message = message.clone();
        Box::pin(async move { Err(anyhow::anyhow!(message)) })
    })
}

/// Loads SQL migration files from a [`MigrationsDir`].
#[derive(Debug, Clone)]
pub struct SqlMigrationSource {
    dir: MigrationsDir,
}

impl SqlMigrationSource {
    pub fn new(dir: MigrationsDir) -> Self {
        Self { dir }
    }

    pub fn dir(&self) -> &MigrationsDir {
        &self.dir
    }
}

#[async_trait]
impl MigrationListing for SqlMigrationSource {
    async fn should_exist(&self) -> Result<(), SourceError> {
        self.dir
            .should_exist()
            .map_err(|e| SourceError::DirectoryNotFound(e.to_string()))
    }

    async fn file_names(&self) -> Result<Vec<MigrationId>, SourceError> {
        self.dir
            .file_names()
            .map_err(|e| SourceError::Listing(e.to_string()))
    }
}

#[async_trait]
impl MigrationSource<dyn Database, DbClient> for SqlMigrationSource {
    async fn load_migration(
        &self,
        id: &MigrationId,
    ) -> Result<MigrationUnit<dyn Database, DbClient>, SourceError> {
        let content = self.dir.read(id).map_err(|e| match e {
            CoreError::MigrationNotFound { .. } => {
                SourceError::Load(format!("Cannot find migration file {}", id))
            }
            other => SourceError::Load(other.to_string()),
        })?;
        let script = parse_sql_migration(&content)
            .map_err(|reason| SourceError::Load(format!("Invalid migration file {}: {}", id, reason)))?;

        let down = match script.down {
            Some(sql) if has_statements(&sql) => batch_operation(sql),
            _ => irreversible_operation(id),
        };
        Ok(MigrationUnit::new(batch_operation(script.up), down))
    }
}

#[cfg(test)]
#[path = "sql_source_test.rs"]
mod tests;
