//! Client handle passed to migrations alongside the database handle.

use crate::duckdb::DuckDbBackend;
use crate::error::{DbError, DbResult};
use ::duckdb::Connection;
use std::sync::Mutex;

/// Owner of the database instance that migrations run against.
///
/// The [`DuckDbBackend`] handed to a migration is one connection; the client
/// can open further connections to the same database (including an
/// in-memory one) for migrations that need more than one.
pub struct DbClient {
    path: String,
    root: Mutex<Connection>,
}

impl DbClient {
    /// Open the database at `path` (`:memory:` for a private in-memory database)
    pub fn open(path: &str) -> DbResult<Self> {
        let conn = if path == ":memory:" {
            Connection::open_in_memory()
        } else {
            Connection::open(path)
        }
        .map_err(|e| DbError::Connection {
            path: path.to_string(),
            message: e.to_string(),
        })?;
        log::debug!("Opened database {}", path);
        Ok(Self {
            path: path.to_string(),
            root: Mutex::new(conn),
        })
    }

    /// Configured database path
    pub fn path(&self) -> &str {
        &self.path
    }

    /// Open a new connection to this client's database
    pub fn database(&self) -> DbResult<DuckDbBackend> {
        let root = self
            .root
            .lock()
            .map_err(|e| DbError::Poisoned(e.to_string()))?;
        let conn = root
            .try_clone()
            .map_err(|e| DbError::Connection {
                path: self.path.clone(),
                message: e.to_string(),
            })?;
        Ok(DuckDbBackend::from_connection(conn))
    }
}

impl std::fmt::Debug for DbClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DbClient").field("path", &self.path).finish()
    }
}

#[cfg(test)]
#[path = "client_test.rs"]
mod tests;
