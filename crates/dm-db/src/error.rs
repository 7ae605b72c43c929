//! Error types for dm-db

use thiserror::Error;

/// Database operation errors
#[derive(Error, Debug)]
pub enum DbError {
    /// The database file could not be opened (D001)
    #[error("[D001] Could not open database {path}: {message}")]
    Connection { path: String, message: String },

    /// A statement failed (D002)
    #[error("[D002] SQL execution failed: {0}")]
    Execution(String),

    /// A statement referenced a missing table or view (D003)
    #[error("[D003] Table or view not found: {0}")]
    RelationNotFound(String),

    /// A statement violated a constraint, e.g. a duplicate primary key (D004)
    #[error("[D004] Constraint violated: {0}")]
    ConstraintViolation(String),

    /// A previous holder of the connection lock panicked (D005)
    #[error("[D005] Database connection lock poisoned: {0}")]
    Poisoned(String),
}

/// Result type alias for DbError
pub type DbResult<T> = Result<T, DbError>;

impl DbError {
    /// Classify a DuckDB error, appending the failing statement when known.
    ///
    /// duckdb::Error carries no structured kind, so the message is matched.
    pub(crate) fn from_duckdb(err: duckdb::Error, sql: Option<&str>) -> Self {
        let msg = err.to_string();
        let detail = match sql {
            Some(sql) => format!("{}: {}", msg, sql),
            None => msg.clone(),
        };
        if msg.contains("Constraint Error") {
            DbError::ConstraintViolation(detail)
        } else if msg.contains("Table with name")
            || msg.contains("View with name")
            || msg.contains("Table or view with name")
            || (msg.contains("Catalog Error") && msg.contains("Table") && msg.contains("not found"))
        {
            DbError::RelationNotFound(detail)
        } else {
            DbError::Execution(detail)
        }
    }
}

impl From<duckdb::Error> for DbError {
    fn from(err: duckdb::Error) -> Self {
        DbError::from_duckdb(err, None)
    }
}
