//! dm-db - Database abstraction layer for docmigrate
//!
//! This crate provides the `Database` trait that migrations and the changelog
//! run against, its DuckDB implementation, and `DbClient`, the client handle
//! handed to migrations alongside the database handle.

pub mod client;
pub mod duckdb;
pub mod error;
pub mod traits;

pub use client::DbClient;
pub use self::duckdb::DuckDbBackend;
pub use error::{DbError, DbResult};
pub use traits::{Database, SqlValue};
