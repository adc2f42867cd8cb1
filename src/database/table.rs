//! Typed table handle

use super::core::SharedStore;
use crate::catalog::TableMetadata;
use crate::config::DbConfig;
use crate::migration::{self, MigrationOptions, MigrationReport};
use crate::record::{normalize, Record};
use crate::types::{FieldDescriptor, Row, Value};
use crate::{MapperError, Result};
use std::marker::PhantomData;
use std::sync::Arc;

/// Handle to the table a record type was registered against
pub struct Table<R: Record> {
    pub(crate) meta: Arc<TableMetadata>,
    pub(crate) store: SharedStore,
    pub(crate) config: Arc<DbConfig>,
    _record: PhantomData<fn() -> R>,
}

impl<R: Record> Clone for Table<R> {
    fn clone(&self) -> Self {
        Self {
            meta: Arc::clone(&self.meta),
            store: Arc::clone(&self.store),
            config: Arc::clone(&self.config),
            _record: PhantomData,
        }
    }
}

impl<R: Record> Table<R> {
    pub(crate) fn new(meta: Arc<TableMetadata>, store: SharedStore, config: Arc<DbConfig>) -> Self {
        Self {
            meta,
            store,
            config,
            _record: PhantomData,
        }
    }

    pub fn name(&self) -> &str {
        self.meta.name()
    }

    pub fn metadata(&self) -> &TableMetadata {
        &self.meta
    }

    /// Field by storage key
    ///
    /// # Example
    /// ```ignore
    /// let filter = Filter::new().key_cmp(users.field("name")?, SqlOperator::Equal, "bob")?;
    /// ```
    pub fn field(&self, storage_key: &str) -> Result<&FieldDescriptor> {
        self.meta
            .field(storage_key)
            .ok_or_else(|| MapperError::UnknownField(format!("{}.{}", self.name(), storage_key)))
    }

    /// Field by record field name
    pub fn field_by_source(&self, source: &str) -> Result<&FieldDescriptor> {
        self.meta
            .field_by_source(source)
            .ok_or_else(|| MapperError::UnknownField(format!("{}.{}", self.name(), source)))
    }

    /// Bring the live table in line with this registration
    ///
    /// # Example
    /// ```ignore
    /// let report = people.migrate(
    ///     &MigrationOptions::new().allow_destructive().with_rename("age", "years"),
    /// )?;
    /// assert!(report.rebuilt);
    /// ```
    pub fn migrate(&self, options: &MigrationOptions) -> Result<MigrationReport> {
        let mut store = self.store.lock();
        migration::migrate(store.as_mut(), &self.meta, options, &self.config.rebuild_table_infix)
    }

    /// Map a `select_all`-shaped row (key first) onto a fresh record
    pub(crate) fn record_from_row(&self, row: Row) -> Result<R> {
        let mut values = row.into_iter();
        let key = values.next().ok_or_else(|| {
            MapperError::InvalidArgument(format!("empty row returned for {}", self.name()))
        })?;

        let mut record = R::default();
        self.set_key(&mut record, key)?;
        self.fill_non_key(&mut record, values)?;
        Ok(record)
    }

    pub(crate) fn set_key(&self, record: &mut R, key: Value) -> Result<()> {
        let pk = self.meta.primary_key();
        record.set_field(pk, normalize(pk, key)?)
    }

    /// Assign non-key columns in generator order
    pub(crate) fn fill_non_key(&self, record: &mut R, values: impl Iterator<Item = Value>) -> Result<()> {
        for (field, value) in self.meta.non_key_fields().zip(values) {
            record.set_field(field, normalize(field, value)?)?;
        }
        Ok(())
    }
}
