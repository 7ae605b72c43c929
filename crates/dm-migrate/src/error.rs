//! Error types for the migration engine

use crate::changelog::ChangelogError;
use crate::source::SourceError;
use dm_core::MigrationId;
use thiserror::Error;

/// Why a single migration step failed.
#[derive(Error, Debug)]
pub enum StepFailure {
    /// The migration could not be loaded
    #[error(transparent)]
    Load(SourceError),

    /// The operation itself failed
    #[error("{0}")]
    Execution(anyhow::Error),

    /// The operation ran but the changelog could not be updated
    #[error(transparent)]
    Changelog(ChangelogError),
}

impl StepFailure {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StepFailure::Load(_) => ErrorKind::LoadFailure,
            StepFailure::Execution(_) => ErrorKind::ExecutionFailure,
            StepFailure::Changelog(_) => ErrorKind::ChangelogWriteFailure,
        }
    }
}

/// Coarse classification of a [`MigrateError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The migrations source or the changelog store is unavailable
    PrerequisiteMissing,
    /// Listing migrations or reading the changelog failed
    ReadFailure,
    /// A migration could not be loaded
    LoadFailure,
    /// A migration operation failed
    ExecutionFailure,
    /// The changelog could not be updated
    ChangelogWriteFailure,
}

/// Migration engine errors
#[derive(Error, Debug)]
pub enum MigrateError {
    #[error(transparent)]
    Source(#[from] SourceError),

    #[error(transparent)]
    Changelog(#[from] ChangelogError),

    /// `up` stopped at `id`. `migrated` holds what this run applied before it.
    #[error("Could not migrate up {id}: {cause}")]
    Up {
        id: MigrationId,
        cause: StepFailure,
        migrated: Vec<MigrationId>,
    },

    #[error("Could not migrate down {id}: {cause}")]
    Down { id: MigrationId, cause: StepFailure },

    /// The down operation ran but the changelog entry could not be removed,
    /// so the migration is still listed as applied.
    #[error(
        "Could not migrate down {id}: {cause} (the down operation completed; its changelog entry was left in place)"
    )]
    DownUnrecorded {
        id: MigrationId,
        cause: ChangelogError,
    },
}

impl MigrateError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            MigrateError::Source(SourceError::DirectoryNotFound(_)) => {
                ErrorKind::PrerequisiteMissing
            }
            MigrateError::Source(SourceError::Load(_)) => ErrorKind::LoadFailure,
            MigrateError::Source(SourceError::Listing(_)) => ErrorKind::ReadFailure,
            MigrateError::Changelog(ChangelogError::Config(_)) => ErrorKind::PrerequisiteMissing,
            MigrateError::Changelog(ChangelogError::Read(_)) => ErrorKind::ReadFailure,
            MigrateError::Changelog(ChangelogError::Write(_)) => ErrorKind::ChangelogWriteFailure,
            MigrateError::Up { cause, .. } | MigrateError::Down { cause, .. } => cause.kind(),
            MigrateError::DownUnrecorded { .. } => ErrorKind::ChangelogWriteFailure,
        }
    }

    /// Migrations applied by an `up` run before it failed.
    pub fn migrated(&self) -> &[MigrationId] {
        match self {
            MigrateError::Up { migrated, .. } => migrated,
            _ => &[],
        }
    }

    /// The migration being processed when the error occurred, if any
    pub fn migration_id(&self) -> Option<&MigrationId> {
        match self {
            MigrateError::Up { id, .. }
            | MigrateError::Down { id, .. }
            | MigrateError::DownUnrecorded { id, .. } => Some(id),
            _ => None,
        }
    }
}

/// Result type alias for MigrateError
pub type MigrateResult<T> = Result<T, MigrateError>;

#[cfg(test)]
#[path = "error_test.rs"]
mod tests;
