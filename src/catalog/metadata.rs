/// Immutable table metadata built once at registration
use super::sql_gen::SqlStatements;
use crate::error::{MapperError, Result};
use crate::types::{FieldDescriptor, FieldKind};
use std::collections::HashSet;

/// Registered table: ordered fields, key, column orders and cached SQL
#[derive(Debug, Clone)]
pub struct TableMetadata {
    name: String,
    /// All fields in declaration order
    fields: Vec<FieldDescriptor>,
    /// Index of the primary key in `fields`
    primary_key: usize,
    /// Columns bound by INSERT (auto-increment key excluded)
    insert_order: Vec<usize>,
    /// Non-key columns in declaration order
    non_key_order: Vec<usize>,
    statements: SqlStatements,
}

pub(crate) fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

impl TableMetadata {
    /// Validate `descriptors` and build the table metadata.
    ///
    /// The list order is the declaration order; `order` is rewritten to match.
    pub fn register(table: &str, descriptors: Vec<FieldDescriptor>) -> Result<Self> {
        if !is_identifier(table) {
            return Err(MapperError::SchemaDeclaration(format!(
                "table name '{}' is not a plain identifier",
                table
            )));
        }

        let mut fields = descriptors;
        let mut seen = HashSet::with_capacity(fields.len());
        for (order, field) in fields.iter_mut().enumerate() {
            field.order = order;
            if !is_identifier(&field.storage_key) {
                return Err(MapperError::SchemaDeclaration(format!(
                    "storage key '{}' of field {} in {} is not a plain identifier",
                    field.storage_key, field.source, table
                )));
            }
            if !seen.insert(field.storage_key.to_ascii_lowercase()) {
                return Err(MapperError::SchemaDeclaration(format!(
                    "duplicate storage key '{}' in {}",
                    field.storage_key, table
                )));
            }
            validate_kind(table, field)?;
        }

        let keys: Vec<usize> = fields
            .iter()
            .enumerate()
            .filter(|(_, f)| f.primary_key)
            .map(|(i, _)| i)
            .collect();
        let primary_key = match keys.as_slice() {
            [single] => *single,
            [] => {
                return Err(MapperError::SchemaDeclaration(format!(
                    "no primary key defined in {}",
                    table
                )))
            }
            _ => {
                return Err(MapperError::SchemaDeclaration(format!(
                    "multiple primary keys are not allowed in {}",
                    table
                )))
            }
        };

        let non_key_order: Vec<usize> = (0..fields.len()).filter(|i| *i != primary_key).collect();
        let mut insert_order = Vec::with_capacity(fields.len());
        if !fields[primary_key].auto_increment {
            insert_order.push(primary_key);
        }
        insert_order.extend(non_key_order.iter().copied());

        let mut meta = Self {
            name: table.to_string(),
            fields,
            primary_key,
            insert_order,
            non_key_order,
            statements: SqlStatements::default(),
        };
        meta.statements = SqlStatements::generate(&meta);
        Ok(meta)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn fields(&self) -> &[FieldDescriptor] {
        &self.fields
    }

    pub fn primary_key(&self) -> &FieldDescriptor {
        &self.fields[self.primary_key]
    }

    /// Fields bound by INSERT, in placeholder order
    pub fn insert_fields(&self) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        self.insert_order.iter().map(move |i| &self.fields[*i])
    }

    /// Non-key fields in generator order
    pub fn non_key_fields(&self) -> impl Iterator<Item = &FieldDescriptor> + '_ {
        self.non_key_order.iter().map(move |i| &self.fields[*i])
    }

    pub fn has_non_key_fields(&self) -> bool {
        !self.non_key_order.is_empty()
    }

    pub fn statements(&self) -> &SqlStatements {
        &self.statements
    }

    /// Lookup by storage key
    pub fn field(&self, storage_key: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.storage_key == storage_key)
    }

    /// Lookup by record field name
    pub fn field_by_source(&self, source: &str) -> Option<&FieldDescriptor> {
        self.fields.iter().find(|f| f.source == source)
    }
}

fn validate_kind(table: &str, field: &FieldDescriptor) -> Result<()> {
    if field.primary_key {
        if !matches!(field.kind, FieldKind::Int | FieldKind::Uint | FieldKind::String) {
            return Err(MapperError::SchemaDeclaration(format!(
                "unsupported primary key kind {:?} for field {} in {}",
                field.kind, field.source, table
            )));
        }
        if field.auto_increment && field.kind != FieldKind::Int {
            return Err(MapperError::SchemaDeclaration(format!(
                "auto-increment primary key {} in {} must be a signed integer",
                field.source, table
            )));
        }
    } else if field.auto_increment && !field.kind.is_integer() {
        return Err(MapperError::SchemaDeclaration(format!(
            "auto-increment field {} in {} must be an integer, found {:?}",
            field.source, table, field.kind
        )));
    }
    Ok(())
}
