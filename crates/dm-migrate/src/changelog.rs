//! The changelog: the persistent record of applied migrations.

use crate::unit::Handle;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use dm_core::config::is_plain_identifier;
use dm_core::MigrationId;
use dm_db::{Database, SqlValue};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// One applied migration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChangelogEntry {
    pub file_name: MigrationId,
    pub applied_at: DateTime<Utc>,
}

impl ChangelogEntry {
    pub fn new(file_name: MigrationId, applied_at: DateTime<Utc>) -> Self {
        Self {
            file_name,
            applied_at,
        }
    }
}

/// Changelog store errors
#[derive(Error, Debug)]
pub enum ChangelogError {
    /// The store is not usable (bad configuration, no connection)
    #[error("{0}")]
    Config(String),

    #[error("{0}")]
    Read(String),

    #[error("Could not update changelog: {0}")]
    Write(String),
}

/// Persistent record of applied migrations for database handle `D`.
#[async_trait]
pub trait ChangelogStore<D: ?Sized + Handle>: Send + Sync {
    /// Fail when the store is unavailable.
    async fn should_exist(&self) -> Result<(), ChangelogError>;

    /// All entries in storage order.
    async fn entries(&self, db: &D) -> Result<Vec<ChangelogEntry>, ChangelogError>;

    /// Record `id` as applied now.
    async fn record_applied(&self, db: &D, id: &MigrationId) -> Result<(), ChangelogError>;

    /// Remove the entry for `id`.
    async fn record_reverted(&self, db: &D, id: &MigrationId) -> Result<(), ChangelogError>;
}

/// Changelog kept in a DuckDB table named after the configured collection.
///
/// The table is created on the first write. Reading a database where it does
/// not exist yet yields no entries.
#[derive(Debug, Clone)]
pub struct DuckDbChangelog {
    collection: String,
}

impl DuckDbChangelog {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
        }
    }

    /// Table name
    pub fn collection(&self) -> &str {
        &self.collection
    }

    fn check_collection(&self) -> Result<(), ChangelogError> {
        if is_plain_identifier(&self.collection) {
            Ok(())
        } else {
            Err(ChangelogError::Config(format!(
                "Invalid changelog collection name '{}'",
                self.collection
            )))
        }
    }

    async fn ensure_collection(&self, db: &dyn Database) -> Result<(), ChangelogError> {
        self.check_collection()?;
        let sql = format!(
            "CREATE TABLE IF NOT EXISTS {} (file_name VARCHAR NOT NULL, applied_at TIMESTAMP NOT NULL)",
            self.collection
        );
        log::trace!("Ensuring changelog table {} ({})", self.collection, db.db_type());
        db.execute_batch(&sql)
            .await
            .map_err(|e| ChangelogError::Write(e.to_string()))
    }

    /// Record `id` as applied at `applied_at`.
    pub async fn record_applied_at(
        &self,
        db: &dyn Database,
        id: &MigrationId,
        applied_at: DateTime<Utc>,
    ) -> Result<(), ChangelogError> {
        self.ensure_collection(db).await?;
        let sql = format!(
            "INSERT INTO {} (file_name, applied_at) VALUES (?, epoch_ms(CAST(? AS BIGINT)))",
            self.collection
        );
        db.execute_with_params(
            &sql,
            &[
                SqlValue::from(id.as_str()),
                SqlValue::Integer(applied_at.timestamp_millis()),
            ],
        )
        .await
        .map_err(|e| ChangelogError::Write(e.to_string()))?;
        log::debug!("Changelog {}: recorded {}", self.collection, id);
        Ok(())
    }
}

#[async_trait]
impl ChangelogStore<dyn Database> for DuckDbChangelog {
    async fn should_exist(&self) -> Result<(), ChangelogError> {
        self.check_collection()
    }

    async fn entries(&self, db: &dyn Database) -> Result<Vec<ChangelogEntry>, ChangelogError> {
        self.check_collection()?;
        let exists = db
            .relation_exists(&self.collection)
            .await
            .map_err(|e| ChangelogError::Read(e.to_string()))?;
        if !exists {
            return Ok(Vec::new());
        }

        let sql = format!(
            "SELECT CAST(file_name AS VARCHAR), CAST(epoch_ms(applied_at) AS BIGINT) FROM {} ORDER BY rowid",
            self.collection
        );
        let rows = db
            .query_rows(&sql, &[])
            .await
            .map_err(|e| ChangelogError::Read(e.to_string()))?;
        rows.iter().map(|row| parse_entry(row)).collect()
    }

    async fn record_applied(
        &self,
        db: &dyn Database,
        id: &MigrationId,
    ) -> Result<(), ChangelogError> {
        self.record_applied_at(db, id, Utc::now()).await
    }

    async fn record_reverted(
        &self,
        db: &dyn Database,
        id: &MigrationId,
    ) -> Result<(), ChangelogError> {
        self.ensure_collection(db).await?;
        let sql = format!("DELETE FROM {} WHERE file_name = ?", self.collection);
        let removed = db
            .execute_with_params(&sql, &[SqlValue::from(id.as_str())])
            .await
            .map_err(|e| ChangelogError::Write(e.to_string()))?;
        log::debug!(
            "Changelog {}: removed {} entr{} for {}",
            self.collection,
            removed,
            if removed == 1 { "y" } else { "ies" },
            id
        );
        Ok(())
    }
}

fn parse_entry(row: &[SqlValue]) -> Result<ChangelogEntry, ChangelogError> {
    let malformed = || ChangelogError::Read(format!("Malformed changelog row: {:?}", row));

    let file_name = match row.first() {
        Some(SqlValue::Text(s)) => MigrationId::try_new(s.as_str()),
        Some(SqlValue::Integer(n)) => MigrationId::try_new(n.to_string()),
        _ => None,
    }
    .ok_or_else(malformed)?;
    let millis = match row.get(1) {
        Some(SqlValue::Integer(ms)) => *ms,
        Some(SqlValue::Text(s)) => s.parse().map_err(|_| malformed())?,
        _ => return Err(malformed()),
    };
    let applied_at = DateTime::from_timestamp_millis(millis).ok_or_else(malformed)?;
    Ok(ChangelogEntry::new(file_name, applied_at))
}

#[cfg(test)]
#[path = "changelog_test.rs"]
mod tests;
