//! Applies pending migrations.

use crate::changelog::ChangelogStore;
use crate::error::{MigrateError, MigrateResult, StepFailure};
use crate::invoke::invoke;
use crate::source::MigrationSource;
use crate::status::status;
use crate::unit::Handle;
use dm_core::MigrationId;

/// Apply every pending migration in source order and return their ids.
///
/// Stops at the first failure. The error carries the ids this run applied
/// before the failing one. A migration whose operation succeeded but whose
/// changelog entry could not be written is included there too.
pub async fn up<D, C, S, L>(
    source: &S,
    changelog: &L,
    db: &D,
    client: &C,
) -> MigrateResult<Vec<MigrationId>>
where
    D: ?Sized + Handle,
    C: ?Sized + Handle,
    S: MigrationSource<D, C> + ?Sized,
    L: ChangelogStore<D> + ?Sized,
{
    let pending: Vec<MigrationId> = status(source, changelog, db)
        .await?
        .into_iter()
        .filter(|item| item.applied_at.is_pending())
        .map(|item| item.file_name)
        .collect();
    log::debug!("{} pending migration(s)", pending.len());

    let mut migrated = Vec::with_capacity(pending.len());
    for id in pending {
        if let Err(cause) = migrate_up(source, changelog, db, client, &id, &mut migrated).await {
            log::debug!("Stopping after {} migration(s): {}", migrated.len(), cause);
            return Err(MigrateError::Up {
                id,
                cause,
                migrated,
            });
        }
    }
    Ok(migrated)
}

async fn migrate_up<D, C, S, L>(
    source: &S,
    changelog: &L,
    db: &D,
    client: &C,
    id: &MigrationId,
    migrated: &mut Vec<MigrationId>,
) -> Result<(), StepFailure>
where
    D: ?Sized + Handle,
    C: ?Sized + Handle,
    S: MigrationSource<D, C> + ?Sized,
    L: ChangelogStore<D> + ?Sized,
{
    let unit = source.load_migration(id).await.map_err(StepFailure::Load)?;
    invoke(&unit.up, db, client)
        .await
        .map_err(StepFailure::Execution)?;
    migrated.push(id.clone());
    changelog
        .record_applied(db, id)
        .await
        .map_err(StepFailure::Changelog)?;
    log::info!("Migrated up {}", id);
    Ok(())
}

#[cfg(test)]
#[path = "up_test.rs"]
mod tests;
