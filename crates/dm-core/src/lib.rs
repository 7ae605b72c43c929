//! dm-core - Core library for docmigrate
//!
//! This crate provides the shared types used across all docmigrate
//! components: configuration parsing, the strongly-typed migration
//! identifier, and the migrations directory (listing and scaffolding).

pub mod config;
pub mod error;
pub mod migration_id;
pub mod migrations_dir;

pub use config::{Config, DatabaseConfig, TargetConfig};
pub use error::{CoreError, CoreResult};
pub use migration_id::MigrationId;
pub use migrations_dir::MigrationsDir;
