//! Table catalog: metadata, generated SQL and the per-database registry

mod metadata;
mod registry;
pub mod sql_gen;

pub use metadata::TableMetadata;
pub use registry::TableRegistry;
pub use sql_gen::SqlStatements;
