/// SQLite implementation of the store boundary
use super::{ColumnInfo, ExecResult, Store, StoreError};
use crate::config::DbConfig;
use crate::types::{Row, Value};
use rusqlite::types::{ToSqlOutput, ValueRef};
use rusqlite::{params_from_iter, Connection, ToSql};
use std::time::Duration;
use tracing::debug;

/// Store backed by a single rusqlite connection
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open the database described by `config` and apply its pragmas
    pub fn open(config: &DbConfig) -> Result<Self, StoreError> {
        let conn = match &config.path {
            Some(path) => Connection::open(path)?,
            None => Connection::open_in_memory()?,
        };

        conn.busy_timeout(Duration::from_millis(config.busy_timeout_ms))?;
        // journal_mode reports the resulting mode as a row
        conn.pragma_update_and_check(None, "journal_mode", config.journal_mode.as_pragma(), |_| Ok(()))?;
        conn.pragma_update(None, "synchronous", config.synchronous.as_pragma())?;

        debug!(path = ?config.path, journal = config.journal_mode.as_pragma(), "opened sqlite store");
        Ok(Self { conn })
    }

    pub fn open_in_memory() -> Result<Self, StoreError> {
        Self::open(&DbConfig::in_memory())
    }

    /// Wrap an existing connection
    pub fn from_connection(conn: Connection) -> Self {
        Self { conn }
    }
}

impl ToSql for Value {
    fn to_sql(&self) -> rusqlite::Result<ToSqlOutput<'_>> {
        use rusqlite::types::Value as Sql;
        Ok(match self {
            Value::Integer(v) => ToSqlOutput::Owned(Sql::Integer(*v)),
            Value::Unsigned(v) => {
                let v = i64::try_from(*v)
                    .map_err(|e| rusqlite::Error::ToSqlConversionFailure(Box::new(e)))?;
                ToSqlOutput::Owned(Sql::Integer(v))
            }
            Value::Float(v) => ToSqlOutput::Owned(Sql::Real(*v)),
            Value::Text(s) => ToSqlOutput::Borrowed(ValueRef::Text(s.as_bytes())),
            Value::Bool(b) => ToSqlOutput::Owned(Sql::Integer(*b as i64)),
            Value::Bytes(b) => ToSqlOutput::Borrowed(ValueRef::Blob(b)),
            Value::Null => ToSqlOutput::Owned(Sql::Null),
        })
    }
}

fn value_from_ref(raw: ValueRef<'_>) -> Result<Value, StoreError> {
    Ok(match raw {
        ValueRef::Null => Value::Null,
        ValueRef::Integer(v) => Value::Integer(v),
        ValueRef::Real(v) => Value::Float(v),
        ValueRef::Text(t) => Value::Text(
            std::str::from_utf8(t)
                .map_err(|e| StoreError::Conversion(e.to_string()))?
                .to_string(),
        ),
        ValueRef::Blob(b) => Value::Bytes(b.to_vec()),
    })
}

impl Store for SqliteStore {
    fn execute(&mut self, sql: &str, args: &[Value]) -> Result<ExecResult, StoreError> {
        debug!(sql, args = args.len(), "execute");
        let rows_affected = self.conn.execute(sql, params_from_iter(args.iter()))?;
        Ok(ExecResult {
            rows_affected: rows_affected as u64,
            last_insert_id: self.conn.last_insert_rowid(),
        })
    }

    fn query(&mut self, sql: &str, args: &[Value]) -> Result<Vec<Row>, StoreError> {
        debug!(sql, args = args.len(), "query");
        let mut stmt = self.conn.prepare(sql)?;
        let width = stmt.column_count();
        let mut rows = stmt.query(params_from_iter(args.iter()))?;

        let mut out = Vec::new();
        while let Some(row) = rows.next()? {
            let mut values = Vec::with_capacity(width);
            for i in 0..width {
                values.push(value_from_ref(row.get_ref(i)?)?);
            }
            out.push(values);
        }
        Ok(out)
    }

    fn begin(&mut self) -> Result<(), StoreError> {
        if !self.conn.is_autocommit() {
            return Err(StoreError::Transaction("transaction already open".into()));
        }
        self.conn.execute_batch("BEGIN IMMEDIATE;")?;
        Ok(())
    }

    fn commit(&mut self) -> Result<(), StoreError> {
        self.conn.execute_batch("COMMIT;")?;
        Ok(())
    }

    fn rollback(&mut self) -> Result<(), StoreError> {
        if self.conn.is_autocommit() {
            return Ok(());
        }
        self.conn.execute_batch("ROLLBACK;")?;
        Ok(())
    }

    fn table_columns(&mut self, table: &str) -> Result<Vec<ColumnInfo>, StoreError> {
        let mut stmt = self.conn.prepare(&format!("PRAGMA table_info({});", table))?;
        let columns = stmt
            .query_map([], |row| {
                Ok(ColumnInfo {
                    name: row.get(1)?,
                    declared_type: row.get(2)?,
                })
            })?
            .collect::<rusqlite::Result<Vec<_>>>()?;
        Ok(columns)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_execute_and_query() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store
            .execute("CREATE TABLE t (id INTEGER PRIMARY KEY AUTOINCREMENT, name TEXT, data BLOB);", &[])
            .unwrap();

        let res = store
            .execute(
                "INSERT INTO t (name, data) VALUES (?, ?);",
                &[Value::from("a"), Value::Bytes(vec![1, 2])],
            )
            .unwrap();
        assert_eq!(res.rows_affected, 1);
        assert_eq!(res.last_insert_id, 1);

        let rows = store.query("SELECT id, name, data FROM t;", &[]).unwrap();
        assert_eq!(
            rows,
            vec![vec![Value::Integer(1), Value::from("a"), Value::Bytes(vec![1, 2])]]
        );
    }

    #[test]
    fn test_unsigned_overflow_rejected() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.execute("CREATE TABLE t (v INTEGER UNSIGNED);", &[]).unwrap();
        let err = store
            .execute("INSERT INTO t (v) VALUES (?);", &[Value::Unsigned(u64::MAX)])
            .unwrap_err();
        assert!(matches!(err, StoreError::Sqlite(_)));
        store
            .execute("INSERT INTO t (v) VALUES (?);", &[Value::Unsigned(7)])
            .unwrap();
    }

    #[test]
    fn test_table_columns() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        assert!(store.table_columns("missing").unwrap().is_empty());

        store
            .execute("CREATE TABLE t (id INTEGER PRIMARY KEY, flag BOOLEAN, n INTEGER UNSIGNED);", &[])
            .unwrap();
        let cols = store.table_columns("t").unwrap();
        assert_eq!(
            cols,
            vec![
                ColumnInfo::new("id", "INTEGER"),
                ColumnInfo::new("flag", "BOOLEAN"),
                ColumnInfo::new("n", "INTEGER UNSIGNED"),
            ]
        );
    }

    #[test]
    fn test_rollback_discards_changes() {
        let mut store = SqliteStore::open_in_memory().unwrap();
        store.execute("CREATE TABLE t (id INTEGER);", &[]).unwrap();

        store.begin().unwrap();
        assert!(store.begin().is_err());
        store.execute("INSERT INTO t (id) VALUES (1);", &[]).unwrap();
        store.rollback().unwrap();

        assert!(store.query("SELECT id FROM t;", &[]).unwrap().is_empty());
    }

    #[test]
    fn test_file_backed_store() {
        let temp_dir = tempfile::tempdir().unwrap();
        let config = DbConfig::for_file(temp_dir.path().join("store.db"));
        {
            let mut store = SqliteStore::open(&config).unwrap();
            store.execute("CREATE TABLE t (id INTEGER);", &[]).unwrap();
            store.execute("INSERT INTO t (id) VALUES (5);", &[]).unwrap();
        }
        let mut store = SqliteStore::open(&config).unwrap();
        assert_eq!(
            store.query("SELECT id FROM t;", &[]).unwrap(),
            vec![vec![Value::Integer(5)]]
        );
    }
}
