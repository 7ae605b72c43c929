//! Where migrations come from.

use crate::unit::{Handle, MigrationUnit};
use async_trait::async_trait;
use dm_core::MigrationId;
use std::collections::BTreeMap;
use thiserror::Error;

/// Failure reported by a migration source. Messages are shown verbatim.
#[derive(Error, Debug)]
pub enum SourceError {
    /// The source does not exist (e.g. missing migrations directory)
    #[error("{0}")]
    DirectoryNotFound(String),

    /// The available migrations could not be listed
    #[error("{0}")]
    Listing(String),

    /// A migration could not be loaded
    #[error("{0}")]
    Load(String),
}

/// Lists the available migrations.
#[async_trait]
pub trait MigrationListing: Send + Sync {
    /// Fail when the source is unavailable.
    async fn should_exist(&self) -> Result<(), SourceError>;

    /// Available migration identifiers in ascending order.
    ///
    /// The engine uses this order as-is and never re-sorts it.
    async fn file_names(&self) -> Result<Vec<MigrationId>, SourceError>;
}

/// Loads migrations for database handle `D` and client handle `C`.
#[async_trait]
pub trait MigrationSource<D: ?Sized + Handle, C: ?Sized + Handle>: MigrationListing {
    async fn load_migration(&self, id: &MigrationId) -> Result<MigrationUnit<D, C>, SourceError>;
}

/// Migrations registered in code.
///
/// Identifiers list in string order, which for timestamp-prefixed
/// identifiers is creation order.
pub struct MigrationRegistry<D: ?Sized + Handle, C: ?Sized + Handle> {
    units: BTreeMap<MigrationId, MigrationUnit<D, C>>,
}

impl<D: ?Sized + Handle, C: ?Sized + Handle> MigrationRegistry<D, C> {
    pub fn new() -> Self {
        Self {
            units: BTreeMap::new(),
        }
    }

    /// Register a migration, replacing any earlier one with the same id.
    pub fn register(&mut self, id: MigrationId, unit: MigrationUnit<D, C>) -> &mut Self {
        if self.units.insert(id.clone(), unit).is_some() {
            log::warn!("Replaced previously registered migration {}", id);
        }
        self
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, id: MigrationId, unit: MigrationUnit<D, C>) -> Self {
        self.register(id, unit);
        self
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl<D: ?Sized + Handle, C: ?Sized + Handle> Default for MigrationRegistry<D, C> {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl<D: ?Sized + Handle, C: ?Sized + Handle> MigrationListing for MigrationRegistry<D, C> {
    async fn should_exist(&self) -> Result<(), SourceError> {
        Ok(())
    }

    async fn file_names(&self) -> Result<Vec<MigrationId>, SourceError> {
        Ok(self.units.keys().cloned().collect())
    }
}

#[async_trait]
impl<D: ?Sized + Handle, C: ?Sized + Handle> MigrationSource<D, C> for MigrationRegistry<D, C> {
    async fn load_migration(&self, id: &MigrationId) -> Result<MigrationUnit<D, C>, SourceError> {
        self.units
            .get(id)
            .cloned()
            .ok_or_else(|| SourceError::Load(format!("Cannot find migration {}", id)))
    }
}

#[cfg(test)]
#[path = "source_test.rs"]
mod tests;
