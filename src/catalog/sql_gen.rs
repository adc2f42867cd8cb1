//! Canonical SQL generation
//!
//! ```text
//! CREATE TABLE IF NOT EXISTS T (pk TYPE PRIMARY KEY [AUTOINCREMENT] [UNIQUE] [NOT NULL], col TYPE [UNIQUE] [NOT NULL], ...);
//! INSERT OR REPLACE INTO T (c1, c2) VALUES (?, ?);
//! UPDATE T SET c1 = ?, c2 = ? WHERE pk = ?;
//! SELECT c1, c2 FROM T WHERE pk = ?;
//! DELETE FROM T WHERE pk = ?;
//! SELECT pk FROM T;
//! SELECT pk, c1, c2 FROM T;
//! ```
//!
//! Output is a pure function of the metadata, so statements are generated
//! once at registration and cached.

use super::metadata::TableMetadata;
use crate::types::FieldDescriptor;

/// Cached statement set of one table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SqlStatements {
    pub create_table: String,
    pub insert: String,
    /// Non-key columns by key; selects the key itself when there are none
    pub select: String,
    /// `None` when the table has no non-key columns
    pub update: Option<String>,
    pub delete: String,
    pub list: String,
    /// Key first, then the non-key columns in `select` order
    pub select_all: String,
}

impl SqlStatements {
    pub fn generate(meta: &TableMetadata) -> Self {
        let table = meta.name();
        let pk = &meta.primary_key().storage_key;

        let insert_cols = join_keys(meta.insert_fields(), ", ");
        let placeholders = vec!["?"; meta.insert_fields().count()].join(", ");
        let non_key = join_keys(meta.non_key_fields(), ", ");

        let (select, select_all, update) = if meta.has_non_key_fields() {
            (
                format!("SELECT {} FROM {} WHERE {} = ?;", non_key, table, pk),
                format!("SELECT {}, {} FROM {};", pk, non_key, table),
                Some(format!(
                    "UPDATE {} SET {} = ? WHERE {} = ?;",
                    table,
                    join_keys(meta.non_key_fields(), " = ?, "),
                    pk
                )),
            )
        } else {
            (
                format!("SELECT {} FROM {} WHERE {} = ?;", pk, table, pk),
                format!("SELECT {} FROM {};", pk, table),
                None,
            )
        };

        // an auto-increment key with nothing else to bind
        let insert = if insert_cols.is_empty() {
            format!("INSERT INTO {} DEFAULT VALUES;", table)
        } else {
            format!(
                "INSERT OR REPLACE INTO {} ({}) VALUES ({});",
                table, insert_cols, placeholders
            )
        };

        Self {
            create_table: create_table_sql(meta, table, true),
            insert,
            select,
            update,
            delete: format!("DELETE FROM {} WHERE {} = ?;", table, pk),
            list: format!("SELECT {} FROM {};", pk, table),
            select_all,
        }
    }

    /// `select_all` without its terminating semicolon, for appending clauses
    pub fn select_all_prefix(&self) -> &str {
        self.select_all.trim_end_matches(';')
    }
}

/// CREATE DDL for `meta` under `table_name`.
///
/// Rebuilds pass a temporary name and `if_not_exists = false`.
pub fn create_table_sql(meta: &TableMetadata, table_name: &str, if_not_exists: bool) -> String {
    let pk = meta.primary_key();
    let mut pk_def = format!("{} {} PRIMARY KEY", pk.storage_key, pk.sql_type());
    if pk.auto_increment {
        pk_def.push_str(" AUTOINCREMENT");
    }
    if pk.unique {
        pk_def.push_str(" UNIQUE");
    }
    if pk.not_null {
        pk_def.push_str(" NOT NULL");
    }

    let mut columns = vec![pk_def];
    columns.extend(meta.non_key_fields().map(column_definition));

    format!(
        "CREATE TABLE {}{} ({});",
        if if_not_exists { "IF NOT EXISTS " } else { "" },
        table_name,
        columns.join(", ")
    )
}

/// `name TYPE [UNIQUE] [NOT NULL]` for a non-key column
pub fn column_definition(field: &FieldDescriptor) -> String {
    let mut def = format!("{} {}", field.storage_key, field.sql_type());
    if field.unique {
        def.push_str(" UNIQUE");
    }
    if field.not_null {
        def.push_str(" NOT NULL");
    }
    def
}

fn join_keys<'a>(fields: impl Iterator<Item = &'a FieldDescriptor>, sep: &str) -> String {
    fields
        .map(|f| f.storage_key.as_str())
        .collect::<Vec<_>>()
        .join(sep)
}
