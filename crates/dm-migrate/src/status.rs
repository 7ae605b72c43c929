//! Reconciles available migrations against the changelog.

use crate::changelog::ChangelogStore;
use crate::error::MigrateResult;
use crate::source::MigrationListing;
use crate::unit::Handle;
use chrono::{DateTime, SecondsFormat, Utc};
use dm_core::MigrationId;
use serde::{Serialize, Serializer};
use std::collections::HashMap;
use std::fmt;

/// Marker shown for a migration that has not been applied
pub const PENDING: &str = "PENDING";

/// When a migration was applied, or that it has not been.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppliedAt {
    Applied(DateTime<Utc>),
    Pending,
}

impl AppliedAt {
    pub fn is_pending(&self) -> bool {
        matches!(self, AppliedAt::Pending)
    }

    pub fn timestamp(&self) -> Option<DateTime<Utc>> {
        match self {
            AppliedAt::Applied(at) => Some(*at),
            AppliedAt::Pending => None,
        }
    }
}

impl fmt::Display for AppliedAt {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AppliedAt::Applied(at) => f.write_str(&at.to_rfc3339_opts(SecondsFormat::Millis, true)),
            AppliedAt::Pending => f.write_str(PENDING),
        }
    }
}

impl Serialize for AppliedAt {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// Status of one available migration
///
/// Serializes as `{"fileName": ..., "appliedAt": ...}`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusItem {
    pub file_name: MigrationId,
    pub applied_at: AppliedAt,
}

/// Report every available migration, in source order, with its applied time.
///
/// Both prerequisites are checked before anything is read. Errors from the
/// source or the changelog propagate unchanged. When the changelog holds
/// several entries for one migration the first one wins. Entries for
/// migrations the source no longer lists are ignored.
pub async fn status<D, S, L>(source: &S, changelog: &L, db: &D) -> MigrateResult<Vec<StatusItem>>
where
    D: ?Sized + Handle,
    S: MigrationListing + ?Sized,
    L: ChangelogStore<D> + ?Sized,
{
    source.should_exist().await?;
    changelog.should_exist().await?;

    let file_names = source.file_names().await?;
    let entries = changelog.entries(db).await?;

    let mut applied: HashMap<&str, DateTime<Utc>> = HashMap::with_capacity(entries.len());
    for entry in &entries {
        applied
            .entry(entry.file_name.as_str())
            .or_insert(entry.applied_at);
    }

    let items = file_names
        .into_iter()
        .map(|file_name| {
            let applied_at = applied
                .get(file_name.as_str())
                .map_or(AppliedAt::Pending, |at| AppliedAt::Applied(*at));
            StatusItem {
                file_name,
                applied_at,
            }
        })
        .collect();
    Ok(items)
}

#[cfg(test)]
#[path = "status_test.rs"]
mod tests;
