//! dm-migrate - Migration engine for docmigrate
//!
//! Reconciles the available migrations against the changelog, applies
//! pending migrations in order (`up`), reverts the most recently applied one
//! (`down`), and keeps the changelog consistent with what actually ran.
//!
//! The engine is generic over the database handle `D` and the client handle
//! `C` it passes to migrations. The collaborators it depends on are the
//! [`MigrationSource`] and [`ChangelogStore`] traits; DuckDB-backed
//! implementations of both ship in this crate.

pub mod changelog;
pub mod down;
pub mod error;
pub mod invoke;
pub mod migrator;
pub mod source;
pub mod sql_source;
pub mod status;
pub mod unit;
pub mod up;

#[cfg(test)]
pub(crate) mod test_support;

pub use changelog::{ChangelogEntry, ChangelogError, ChangelogStore, DuckDbChangelog};
pub use dm_core::MigrationId;
pub use down::down;
pub use error::{ErrorKind, MigrateError, MigrateResult, StepFailure};
pub use invoke::invoke;
pub use migrator::Migrator;
pub use source::{MigrationListing, MigrationRegistry, MigrationSource, SourceError};
pub use sql_source::{parse_sql_migration, SqlMigrationSource, SqlScript};
pub use status::{status, AppliedAt, StatusItem, PENDING};
pub use unit::{Completion, Handle, MigrationOperation, MigrationUnit};
pub use up::up;
