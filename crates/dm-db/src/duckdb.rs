//! DuckDB connection handed to migrations and the changelog store

use crate::error::{DbError, DbResult};
use crate::traits::{Database, SqlValue};
use async_trait::async_trait;
use duckdb::types::{Value, ValueRef};
use duckdb::Connection;
use std::path::Path;
use std::sync::{Mutex, MutexGuard};

/// A single DuckDB connection
pub struct DuckDbBackend {
    conn: Mutex<Connection>,
}

impl DuckDbBackend {
    /// Open a private in-memory database
    pub fn in_memory() -> DbResult<Self> {
        let conn = Connection::open_in_memory().map_err(|e| DbError::Connection {
            path: ":memory:".to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::from_connection(conn))
    }

    /// Open (or create) the database file at `path`
    pub fn from_path(path: &Path) -> DbResult<Self> {
        let conn = Connection::open(path).map_err(|e| DbError::Connection {
            path: path.display().to_string(),
            message: e.to_string(),
        })?;
        Ok(Self::from_connection(conn))
    }

    /// Open `path`, treating `:memory:` as an in-memory database
    pub fn new(path: &str) -> DbResult<Self> {
        if path == ":memory:" {
            Self::in_memory()
        } else {
            Self::from_path(Path::new(path))
        }
    }

    /// Wrap an already open connection
    pub(crate) fn from_connection(conn: Connection) -> Self {
        Self {
            conn: Mutex::new(conn),
        }
    }

    fn lock(&self) -> DbResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| DbError::Poisoned(e.to_string()))
    }

    /// Run one statement without parameters
    fn execute_sync(&self, sql: &str) -> DbResult<usize> {
        let conn = self.lock()?;
        conn.execute(sql, [])
            .map_err(|e| DbError::from_duckdb(e, Some(sql)))
    }

    /// Run a semicolon-separated script
    fn execute_batch_sync(&self, sql: &str) -> DbResult<()> {
        let conn = self.lock()?;
        conn.execute_batch(sql).map_err(DbError::from)
    }

    /// Execute a parameterized statement synchronously
    fn execute_with_params_sync(&self, sql: &str, params: &[SqlValue]) -> DbResult<usize> {
        let conn = self.lock()?;
        conn.execute(sql, duckdb::params_from_iter(params.iter().map(to_duckdb)))
            .map_err(|e| DbError::from_duckdb(e, Some(sql)))
    }

    /// Query all rows synchronously
    ///
    /// Column count is read per row: DuckDB panics on `stmt.column_count()`
    /// before the statement has executed.
    fn query_rows_sync(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Vec<SqlValue>>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let rows = stmt
            .query_map(
                duckdb::params_from_iter(params.iter().map(to_duckdb)),
                |row| {
                    let width = row.as_ref().column_count();
                    Ok((0..width).map(|i| read_column(row, i)).collect())
                },
            )?
            .collect::<Result<Vec<Vec<SqlValue>>, _>>()?;
        Ok(rows)
    }

    /// Look up `name` (optionally `schema.table`) in information_schema
    fn relation_exists_sync(&self, name: &str) -> DbResult<bool> {
        let (schema, table) = match name.rfind('.') {
            Some(pos) => (&name[..pos], &name[pos + 1..]),
            None => ("main", name),
        };

        let rows = self.query_rows_sync(
            "SELECT COUNT(*) FROM information_schema.tables WHERE table_schema = ? AND table_name = ?",
            &[SqlValue::from(schema), SqlValue::from(table)],
        )?;
        let count = rows
            .first()
            .and_then(|r| r.first())
            .and_then(SqlValue::as_integer)
            .unwrap_or(0);
        Ok(count > 0)
    }
}

fn to_duckdb(value: &SqlValue) -> Value {
    match value {
        SqlValue::Null => Value::Null,
        SqlValue::Integer(i) => Value::BigInt(*i),
        SqlValue::Text(s) => Value::Text(s.clone()),
    }
}

/// Read a column as a [`SqlValue`] according to its DuckDB type.
///
/// VARCHAR columns always come back as `Text`, even when the content looks
/// numeric. Types without a direct mapping fall back to their text form.
fn read_column(row: &duckdb::Row<'_>, idx: usize) -> SqlValue {
    match row.get_ref(idx) {
        Ok(ValueRef::Null) | Err(_) => SqlValue::Null,
        Ok(ValueRef::Text(bytes)) => SqlValue::Text(String::from_utf8_lossy(bytes).into_owned()),
        Ok(ValueRef::Boolean(b)) => SqlValue::Integer(i64::from(b)),
        Ok(ValueRef::TinyInt(n)) => SqlValue::Integer(i64::from(n)),
        Ok(ValueRef::SmallInt(n)) => SqlValue::Integer(i64::from(n)),
        Ok(ValueRef::Int(n)) => SqlValue::Integer(i64::from(n)),
        Ok(ValueRef::BigInt(n)) => SqlValue::Integer(n),
        Ok(ValueRef::UTinyInt(n)) => SqlValue::Integer(i64::from(n)),
        Ok(ValueRef::USmallInt(n)) => SqlValue::Integer(i64::from(n)),
        Ok(ValueRef::UInt(n)) => SqlValue::Integer(i64::from(n)),
        Ok(_) => match row.get::<_, Option<String>>(idx) {
            Ok(Some(s)) => SqlValue::Text(s),
            _ => SqlValue::Null,
        },
    }
}

#[async_trait]
impl Database for DuckDbBackend {
    async fn execute(&self, sql: &str) -> DbResult<usize> {
        self.execute_sync(sql)
    }

    async fn execute_batch(&self, sql: &str) -> DbResult<()> {
        self.execute_batch_sync(sql)
    }

    async fn execute_with_params(&self, sql: &str, params: &[SqlValue]) -> DbResult<usize> {
        self.execute_with_params_sync(sql, params)
    }

    async fn query_rows(&self, sql: &str, params: &[SqlValue]) -> DbResult<Vec<Vec<SqlValue>>> {
        self.query_rows_sync(sql, params)
    }

    async fn relation_exists(&self, name: &str) -> DbResult<bool> {
        self.relation_exists_sync(name)
    }

    fn db_type(&self) -> &'static str {
        "duckdb"
    }
}

#[cfg(test)]
#[path = "duckdb_test.rs"]
mod tests;
