//! Schema migration
//!
//! Compares the live columns of a table with its registered metadata and
//! brings the table in line:
//!
//! 1. a missing table is created from the registered DDL
//! 2. new columns are added in place with `ALTER TABLE ... ADD COLUMN`
//! 3. dropped, retyped or renamed columns need a rebuild: create a temporary
//!    table, copy the surviving columns, drop the original and rename the
//!    copy, all inside one transaction
//!
//! Rebuilds can lose or coerce data, so they only run when the caller sets
//! [`MigrationOptions::allow_destructive`]. Otherwise the classification is
//! returned in [`MapperError::DestructiveChangeRequired`] and nothing runs.

mod rebuild;

pub(crate) use rebuild::migrate;

use crate::catalog::TableMetadata;
use crate::error::{MapperError, Result};
use crate::store::ColumnInfo;
use crate::types::FieldDescriptor;
use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Caller choices for one migration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MigrationOptions {
    /// Permit rebuilds (drops, type changes, renames)
    pub allow_destructive: bool,
    /// Old live column name -> new storage key
    pub renames: BTreeMap<String, String>,
}

impl MigrationOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn allow_destructive(mut self) -> Self {
        self.allow_destructive = true;
        self
    }

    pub fn with_rename(mut self, old: impl Into<String>, new: impl Into<String>) -> Self {
        self.renames.insert(old.into(), new.into());
        self
    }
}

/// What a migration found, and what it did
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MigrationReport {
    pub table: String,
    /// Sorted storage keys
    pub added: Vec<String>,
    /// Sorted live column names
    pub dropped: Vec<String>,
    /// Sorted storage keys whose declared type differs from the live one
    pub changed: Vec<String>,
    /// Old live column name -> new storage key
    pub renamed: BTreeMap<String, String>,
    pub rebuilt: bool,
}

impl MigrationReport {
    fn new(table: &str) -> Self {
        Self {
            table: table.to_string(),
            ..Default::default()
        }
    }

    /// No drift between the live table and the registration
    pub fn is_empty(&self) -> bool {
        self.added.is_empty() && self.dropped.is_empty() && self.changed.is_empty() && self.renamed.is_empty()
    }

    pub fn requires_rebuild(&self) -> bool {
        !self.dropped.is_empty() || !self.changed.is_empty() || !self.renamed.is_empty()
    }
}

/// One column carried over by a rebuild
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ColumnCopy {
    /// Storage key in the rebuilt table
    pub target: String,
    /// Column name in the live table
    pub source: String,
}

#[derive(Debug, Clone, PartialEq)]
pub enum MigrationAction {
    /// The table does not exist yet
    Create,
    /// Nothing to do
    UpToDate,
    /// Additive only
    AddColumns(Vec<FieldDescriptor>),
    /// Create/copy/drop/rename, copying `projection` in declaration order
    Rebuild { projection: Vec<ColumnCopy> },
}

/// Outcome of [`plan`]: the classification and the work needed to apply it
#[derive(Debug, Clone, PartialEq)]
pub struct MigrationPlan {
    pub report: MigrationReport,
    pub action: MigrationAction,
}

fn normalize_identifier(name: &str) -> String {
    name.trim().to_ascii_lowercase()
}

fn normalize_sql_type(type_name: &str) -> String {
    type_name.split_whitespace().collect::<Vec<_>>().join(" ").to_ascii_uppercase()
}

/// Classify the drift between `live` and `meta` and decide what to run.
///
/// Pure: all validation (renames, the destructive gate, NOT NULL additions)
/// happens here, before any statement is issued.
pub fn plan(meta: &TableMetadata, live: &[ColumnInfo], options: &MigrationOptions) -> Result<MigrationPlan> {
    let mut report = MigrationReport::new(meta.name());

    if live.is_empty() {
        report.added = meta.fields().iter().map(|f| f.storage_key.clone()).collect();
        report.added.sort();
        return Ok(MigrationPlan {
            report,
            action: MigrationAction::Create,
        });
    }

    let live_by_key: AHashMap<String, &ColumnInfo> =
        live.iter().map(|c| (normalize_identifier(&c.name), c)).collect();
    let declared_by_key: AHashMap<String, &FieldDescriptor> = meta
        .fields()
        .iter()
        .map(|f| (normalize_identifier(&f.storage_key), f))
        .collect();

    // new key -> old key
    let mut rename_targets: AHashMap<String, String> = AHashMap::with_capacity(options.renames.len());
    for (old, new) in &options.renames {
        let old_key = normalize_identifier(old);
        let new_key = normalize_identifier(new);
        if !live_by_key.contains_key(&old_key) {
            return Err(MapperError::InvalidRename(format!(
                "rename source column {} not found in {}",
                old,
                meta.name()
            )));
        }
        if !declared_by_key.contains_key(&new_key) {
            return Err(MapperError::InvalidRename(format!(
                "rename target column {} is not declared for {}",
                new,
                meta.name()
            )));
        }
        if rename_targets.insert(new_key, old_key).is_some() {
            return Err(MapperError::InvalidRename(format!(
                "column {} is the target of more than one rename",
                new
            )));
        }
    }

    let mut used: AHashSet<String> = AHashSet::with_capacity(live.len());
    let mut projection = Vec::with_capacity(meta.fields().len());
    let mut added_fields = Vec::new();

    for field in meta.fields() {
        let key = normalize_identifier(&field.storage_key);
        let declared_type = normalize_sql_type(field.sql_type());

        let live_column = match rename_targets.get(&key) {
            Some(old_key) => {
                let column = live_by_key[old_key];
                report.renamed.insert(column.name.clone(), field.storage_key.clone());
                used.insert(old_key.clone());
                Some(column)
            }
            None => live_by_key.get(&key).map(|column| {
                used.insert(key.clone());
                *column
            }),
        };

        match live_column {
            Some(column) => {
                if normalize_sql_type(&column.declared_type) != declared_type {
                    report.changed.push(field.storage_key.clone());
                }
                projection.push(ColumnCopy {
                    target: field.storage_key.clone(),
                    source: column.name.clone(),
                });
            }
            None => {
                report.added.push(field.storage_key.clone());
                added_fields.push(field.clone());
            }
        }
    }

    report.dropped = live
        .iter()
        .filter(|c| !used.contains(&normalize_identifier(&c.name)))
        .map(|c| c.name.clone())
        .collect();

    report.added.sort();
    report.dropped.sort();
    report.changed.sort();

    let needs_rebuild = report.requires_rebuild();
    if needs_rebuild && !options.allow_destructive {
        return Err(MapperError::DestructiveChangeRequired(Box::new(report)));
    }

    if let Some(field) = added_fields.iter().find(|f| f.not_null) {
        return Err(MapperError::NotNullWithoutDefault {
            table: meta.name().to_string(),
            column: field.storage_key.clone(),
        });
    }

    let action = if needs_rebuild {
        MigrationAction::Rebuild { projection }
    } else if added_fields.is_empty() {
        MigrationAction::UpToDate
    } else {
        MigrationAction::AddColumns(added_fields)
    };

    Ok(MigrationPlan { report, action })
}
