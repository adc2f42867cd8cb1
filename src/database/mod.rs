//! Database Module
//!
//! # Module Structure
//! - `core`: `Database` handle, open/register
//! - `table`: `Table<R>` handle, field lookups and migration
//! - `crud`: insert, update, delete, select, list, select_all
//! - `query`: filtered selects and filtered updates
//!
//! Every operation takes the handle's exclusive store lock for its whole
//! round-trip, so a read-then-write sequence inside one call (secondary
//! auto-increment, rebuilds) never interleaves with another call.

pub mod core;
pub mod crud;
pub mod query;
pub mod table;

pub use self::core::Database;
pub use query::ReturnedValues;
pub use table::Table;
