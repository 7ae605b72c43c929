//! Reverts the most recently applied migration.

use crate::changelog::ChangelogStore;
use crate::error::{MigrateError, MigrateResult, StepFailure};
use crate::invoke::invoke;
use crate::source::MigrationSource;
use crate::status::status;
use crate::unit::Handle;
use dm_core::MigrationId;

/// Revert the last applied migration in source order.
///
/// Returns its id, or an empty list when nothing is applied. If the down
/// operation succeeds but the changelog entry cannot be removed, the entry
/// stays and [`MigrateError::DownUnrecorded`] is returned.
pub async fn down<D, C, S, L>(
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
    let items = status(source, changelog, db).await?;
    let Some(last) = items
        .into_iter()
        .rfind(|item| !item.applied_at.is_pending())
    else {
        log::debug!("No applied migrations to revert");
        return Ok(Vec::new());
    };
    let id = last.file_name;

    let unit = match source.load_migration(&id).await {
        Ok(unit) => unit,
        Err(e) => {
            return Err(MigrateError::Down {
                id,
                cause: StepFailure::Load(e),
            })
        }
    };
    if let Err(e) = invoke(&unit.down, db, client).await {
        return Err(MigrateError::Down {
            id,
            cause: StepFailure::Execution(e),
        });
    }
    if let Err(cause) = changelog.record_reverted(db, &id).await {
        log::warn!(
            "Down operation for {} completed but its changelog entry was not removed: {}",
            id,
            cause
        );
        return Err(MigrateError::DownUnrecorded { id, cause });
    }

    log::info!("Migrated down {}", id);
    Ok(vec![id])
}

#[cfg(test)]
#[path = "down_test.rs"]
mod tests;
