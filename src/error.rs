//! Error types for rowbind

use crate::codec::CodecError;
use crate::migration::MigrationReport;
use crate::store::StoreError;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, MapperError>;

#[derive(Error, Debug)]
pub enum MapperError {
    /// Bad descriptor set, raised at registration
    #[error("Schema declaration error: {0}")]
    SchemaDeclaration(String),

    /// Migration needs a rebuild but the caller did not allow destructive changes.
    /// Nothing was mutated; the report carries the classification.
    #[error(
        "Migration of '{}' requires destructive changes: changed={:?} dropped={:?} renamed={:?}",
        .0.table, .0.changed, .0.dropped, .0.renamed
    )]
    DestructiveChangeRequired(Box<MigrationReport>),

    #[error("Migration of '{table}' adds NOT NULL column '{column}' without a default")]
    NotNullWithoutDefault { table: String, column: String },

    #[error("Invalid rename: {0}")]
    InvalidRename(String),

    #[error("Store error during {operation} on '{table}': {source}")]
    Store {
        table: String,
        operation: String,
        #[source]
        source: StoreError,
    },

    #[error("Codec error for field '{field}': {source}")]
    Codec {
        field: String,
        #[source]
        source: CodecError,
    },

    /// Filter builder misuse, reported at the offending call
    #[error("Filter grammar violation: {0}")]
    Grammar(String),

    #[error("Invalid argument: {0}")]
    InvalidArgument(String),

    #[error("Type mismatch for field '{field}': expected {expected}, found {found}")]
    TypeMismatch {
        field: String,
        expected: String,
        found: String,
    },

    #[error("Unknown field: {0}")]
    UnknownField(String),

    #[error("Configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl MapperError {
    pub(crate) fn store(table: &str, operation: &str, source: impl Into<StoreError>) -> Self {
        MapperError::Store {
            table: table.to_string(),
            operation: operation.to_string(),
            source: source.into(),
        }
    }

    pub(crate) fn codec(field: &str, source: CodecError) -> Self {
        MapperError::Codec {
            field: field.to_string(),
            source,
        }
    }

    pub(crate) fn mismatch(field: &str, expected: &str, found: &crate::types::Value) -> Self {
        MapperError::TypeMismatch {
            field: field.to_string(),
            expected: expected.to_string(),
            found: found.type_name().to_string(),
        }
    }

    /// True when a migration was refused only because it needs permission
    /// to rebuild the table.
    pub fn is_destructive_change(&self) -> bool {
        matches!(self, MapperError::DestructiveChangeRequired(_))
    }
}

impl From<serde_json::Error> for MapperError {
    fn from(err: serde_json::Error) -> Self {
        MapperError::Config(err.to_string())
    }
}
