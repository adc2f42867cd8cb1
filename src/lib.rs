//! rowbind - typed records on relational rows
//!
//! ## Features
//! - Canonical CRUD SQL generated once per registered table
//! - Schema migration: in-place column additions, gated atomic rebuilds for
//!   drops, type changes and renames
//! - Grammar-checked filter builder for WHERE / ORDER BY / LIMIT / OFFSET
//! - Self-describing blob codecs for string sequences, timestamps and
//!   arbitrary serializable values
//!
//! ## Layout
//! - `types`: `Value`, `FieldDescriptor`, `Timestamp`
//! - `catalog`: table metadata, SQL generation, registry
//! - `store`: the relational engine boundary and its SQLite implementation
//! - `codec`: blob formats
//! - `filter`: query filters and update assignments
//! - `record`: the `Record` trait and field conversions
//! - `migration`: diff, plan and rebuild
//! - `database`: `Database` and `Table<R>`

pub mod catalog;
pub mod codec;
pub mod config;
pub mod database;
pub mod filter;
pub mod migration;
pub mod record;
pub mod store;
pub mod types;

mod error;

#[cfg(test)]
pub(crate) mod testing;

pub use config::{DbConfig, JournalMode, SynchronousMode};
pub use error::{MapperError, Result};

pub use catalog::{SqlStatements, TableMetadata, TableRegistry};
pub use database::{Database, ReturnedValues, Table};
pub use filter::{Filter, FilterFragment, SqlOperator, UpdateAssignment};
pub use migration::{MigrationOptions, MigrationReport};
pub use record::{Blob, FieldValue, Record};
pub use store::{ColumnInfo, ExecResult, SqliteStore, Store, StoreError};
pub use types::{FieldDescriptor, FieldKind, Row, Timestamp, Value};
