//! Store boundary
//!
//! The relational engine is an external collaborator. Everything rowbind
//! needs from it fits in [`Store`]: statement execution, row queries,
//! explicit transactions and column introspection.

mod sqlite;

pub use sqlite::SqliteStore;

use crate::types::{Row, Value};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("sqlite: {0}")]
    Sqlite(#[from] rusqlite::Error),

    #[error("value conversion: {0}")]
    Conversion(String),

    #[error("transaction: {0}")]
    Transaction(String),
}

/// Outcome of a statement that does not return rows
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ExecResult {
    pub rows_affected: u64,
    pub last_insert_id: i64,
}

/// One introspected column of a live table
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnInfo {
    pub name: String,
    pub declared_type: String,
}

impl ColumnInfo {
    pub fn new(name: impl Into<String>, declared_type: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            declared_type: declared_type.into(),
        }
    }
}

/// A transactional, SQL-capable relational store.
///
/// Implementations are driven by one caller at a time; the database handle
/// serializes all access behind its exclusive lock.
pub trait Store: Send {
    fn execute(&mut self, sql: &str, args: &[Value]) -> Result<ExecResult, StoreError>;

    fn query(&mut self, sql: &str, args: &[Value]) -> Result<Vec<Row>, StoreError>;

    fn begin(&mut self) -> Result<(), StoreError>;

    fn commit(&mut self) -> Result<(), StoreError>;

    fn rollback(&mut self) -> Result<(), StoreError>;

    /// Live columns of `table` in declaration order; empty when the table
    /// does not exist.
    fn table_columns(&mut self, table: &str) -> Result<Vec<ColumnInfo>, StoreError>;
}
