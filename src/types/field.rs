/// Field declarations: the per-field metadata a record supplies at registration
use crate::error::{MapperError, Result};
use serde::{Deserialize, Serialize};

/// Storage kind of a record field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FieldKind {
    /// Signed integer
    Int,
    /// Unsigned integer
    Uint,
    /// Text/String
    String,
    /// Boolean
    Bool,
    /// Floating point
    Float,
    /// Sequence stored as a blob
    ArrayBlob,
    /// Nested structure stored as a blob
    StructBlob,
    /// Map stored as a blob
    MapBlob,
    /// Optional nested structure stored as a blob (NULL when absent)
    Pointer,
}

impl FieldKind {
    /// Declared column type used in DDL
    pub fn sql_type(&self) -> &'static str {
        match self {
            FieldKind::Int => "INTEGER",
            FieldKind::Uint => "INTEGER UNSIGNED",
            FieldKind::String => "TEXT",
            FieldKind::Bool => "BOOLEAN",
            FieldKind::Float => "FLOAT",
            FieldKind::ArrayBlob
            | FieldKind::StructBlob
            | FieldKind::MapBlob
            | FieldKind::Pointer => "BLOB",
        }
    }

    pub fn is_blob(&self) -> bool {
        matches!(
            self,
            FieldKind::ArrayBlob | FieldKind::StructBlob | FieldKind::MapBlob | FieldKind::Pointer
        )
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, FieldKind::Int | FieldKind::Uint)
    }
}

/// Normalized metadata for one persisted field
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FieldDescriptor {
    /// Column name the field is persisted under
    pub storage_key: String,
    /// Name of the field on the in-memory record
    pub source: String,
    pub kind: FieldKind,
    pub primary_key: bool,
    pub auto_increment: bool,
    pub unique: bool,
    pub not_null: bool,
    /// Declaration order (position in the registered list)
    pub order: usize,
}

impl FieldDescriptor {
    pub fn new(storage_key: impl Into<String>, kind: FieldKind) -> Self {
        let storage_key = storage_key.into();
        Self {
            source: storage_key.clone(),
            storage_key,
            kind,
            primary_key: false,
            auto_increment: false,
            unique: false,
            not_null: false,
            order: 0,
        }
    }

    /// Parse a compact declaration such as `"id,primary,increment"`.
    ///
    /// The first part is the storage key; the remaining parts are any of
    /// `primary`, `increment`, `unique` and `notnull`.
    pub fn from_tag(tag: &str, source: &str, kind: FieldKind) -> Result<Self> {
        let mut parts = tag.split(',').map(str::trim);
        let key = parts.next().unwrap_or_default();
        if key.is_empty() {
            return Err(MapperError::SchemaDeclaration(format!(
                "empty storage key in tag '{}' for field {}",
                tag, source
            )));
        }

        let mut field = FieldDescriptor::new(key, kind).source(source);
        for part in parts {
            match part {
                "primary" => field.primary_key = true,
                "increment" => field.auto_increment = true,
                "unique" => field.unique = true,
                "notnull" => field.not_null = true,
                other => {
                    return Err(MapperError::SchemaDeclaration(format!(
                        "unknown tag option '{}' for field {}",
                        other, source
                    )))
                }
            }
        }

        Ok(field)
    }

    pub fn source(mut self, name: impl Into<String>) -> Self {
        self.source = name.into();
        self
    }

    pub fn primary_key(mut self) -> Self {
        self.primary_key = true;
        self
    }

    pub fn auto_increment(mut self) -> Self {
        self.auto_increment = true;
        self
    }

    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    pub fn not_null(mut self) -> Self {
        self.not_null = true;
        self
    }

    pub fn sql_type(&self) -> &'static str {
        self.kind.sql_type()
    }
}
