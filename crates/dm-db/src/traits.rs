//! The database handle seam

use crate::error::DbResult;
use async_trait::async_trait;

/// A scalar bound as a statement parameter or read back from a result row.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SqlValue {
    Null,
    Integer(i64),
    Text(String),
}

impl SqlValue {
    /// Text content, if this is a `Text` value
    pub fn as_text(&self) -> Option<&str> {
        match self {
            SqlValue::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Integer content, if this is an `Integer` value
    pub fn as_integer(&self) -> Option<i64> {
        match self {
            SqlValue::Integer(i) => Some(*i),
            _ => None,
        }
    }
}

impl From<&str> for SqlValue {
    fn from(s: &str) -> Self {
        SqlValue::Text(s.to_string())
    }
}

impl From<String> for SqlValue {
    fn from(s: String) -> Self {
        SqlValue::Text(s)
    }
}

impl From<i64> for SqlValue {
    fn from(i: i64) -> Self {
        SqlValue::Integer(i)
    }
}

/// Database abstraction trait for docmigrate
///
/// This is the database handle passed to every migration operation and to
/// the changelog store. Implementations must be Send + Sync for async
/// operation.
#[async_trait]
pub trait Database: Send + Sync {
    /// Run one statement and return the affected row count
    async fn execute(&self, sql: &str) -> DbResult<usize>;

    /// Run a script of one or more statements
    async fn execute_batch(&self, sql: &str) -> DbResult<()>;

    /// Execute a single statement with positional `?` parameters
    async fn execute_with_params(&self, sql: &str, params: &[SqlValue]) -> DbResult<usize>;

    /// Run a query with positional `?` parameters and return every row
    async fn query_rows(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Vec<SqlValue>>>;

    /// Whether a table or view named `name` exists
    async fn relation_exists(&self, name: &str) -> DbResult<bool>;

    /// Backend name, used in log lines
    fn db_type(&self) -> &'static str;
}
