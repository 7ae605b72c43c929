//! Bundles a migration source and a changelog store.

use crate::changelog::ChangelogStore;
use crate::error::MigrateResult;
use crate::source::MigrationSource;
use crate::status::StatusItem;
use crate::unit::Handle;
use crate::{down, status, up};
use dm_core::MigrationId;
use std::sync::Arc;

/// Entry point for `status`, `up`, and `down` against one source and changelog.
pub struct Migrator<D: ?Sized + Handle, C: ?Sized + Handle> {
    source: Arc<dyn MigrationSource<D, C>>,
    changelog: Arc<dyn ChangelogStore<D>>,
}

impl<D: ?Sized + Handle, C: ?Sized + Handle> Migrator<D, C> {
    pub fn new(
        source: Arc<dyn MigrationSource<D, C>>,
        changelog: Arc<dyn ChangelogStore<D>>,
    ) -> Self {
        Self { source, changelog }
    }

    pub async fn status(&self, db: &D) -> MigrateResult<Vec<StatusItem>> {
        status::status(self.source.as_ref(), self.changelog.as_ref(), db).await
    }

    pub async fn up(&self, db: &D, client: &C) -> MigrateResult<Vec<MigrationId>> {
        up::up(self.source.as_ref(), self.changelog.as_ref(), db, client).await
    }

    pub async fn down(&self, db: &D, client: &C) -> MigrateResult<Vec<MigrationId>> {
        down::down(self.source.as_ref(), self.changelog.as_ref(), db, client).await
    }
}

impl<D: ?Sized + Handle, C: ?Sized + Handle> Clone for Migrator<D, C> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            changelog: Arc::clone(&self.changelog),
        }
    }
}

#[cfg(test)]
#[path = "migrator_test.rs"]
mod tests;
