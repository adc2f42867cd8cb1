//! CRUD operations on a typed table

use super::table::Table;
use crate::record::{normalize, Record};
use crate::store::Store;
use crate::types::{FieldDescriptor, Value};
use crate::{MapperError, Result};
use tracing::debug;

impl<R: Record> Table<R> {
    /// Insert `record`, replacing any row with the same key.
    ///
    /// Auto-increment values are written back into `record`: the key from
    /// the engine-assigned row id, secondary columns from `MAX + 1` when the
    /// record still holds zero.
    ///
    /// # Example
    /// ```ignore
    /// let mut user = User { id: 0, name: "bob".into() };
    /// users.insert(&mut user)?;
    /// assert_eq!(user.id, 1);
    /// ```
    pub fn insert(&self, record: &mut R) -> Result<()> {
        let table = self.name();
        let mut store = self.store.lock();

        let mut args = Vec::with_capacity(self.meta.fields().len());
        let mut assigned = Vec::new();
        for field in self.meta.insert_fields() {
            let mut value = record.get_field(field)?;
            if field.auto_increment && value.is_zero() {
                value = next_sequence_value(store.as_mut(), table, field)?;
                assigned.push((field, value.clone()));
            }
            args.push(value);
        }

        let result = store
            .execute(&self.meta.statements().insert, &args)
            .map_err(|e| MapperError::store(table, "insert", e))?;

        // the record only sees sequence values once the row exists
        for (field, value) in assigned {
            record.set_field(field, value)?;
        }
        let pk = self.meta.primary_key();
        if pk.auto_increment {
            record.set_field(pk, Value::Integer(result.last_insert_id))?;
        }
        debug!(table, id = result.last_insert_id, "inserted row");
        Ok(())
    }

    /// Overwrite every non-key column of the row keyed by `record`.
    /// Returns the number of rows changed; a key-only table never changes.
    pub fn update(&self, record: &R) -> Result<u64> {
        let table = self.name();
        let sql = match &self.meta.statements().update {
            Some(sql) => sql,
            None => return Ok(0),
        };

        let mut args = Vec::with_capacity(self.meta.fields().len());
        for field in self.meta.non_key_fields() {
            args.push(record.get_field(field)?);
        }
        args.push(record.get_field(self.meta.primary_key())?);

        let result = self
            .store
            .lock()
            .execute(sql, &args)
            .map_err(|e| MapperError::store(table, "update", e))?;
        Ok(result.rows_affected)
    }

    /// Delete the row with `key`, returning the number of rows removed
    pub fn delete(&self, key: impl Into<Value>) -> Result<u64> {
        let result = self
            .store
            .lock()
            .execute(&self.meta.statements().delete, &[key.into()])
            .map_err(|e| MapperError::store(self.name(), "delete", e))?;
        Ok(result.rows_affected)
    }

    /// Row with `key`, or `None` when there is none
    pub fn select(&self, key: impl Into<Value>) -> Result<Option<R>> {
        let key = key.into();
        let rows = self
            .store
            .lock()
            .query(&self.meta.statements().select, std::slice::from_ref(&key))
            .map_err(|e| MapperError::store(self.name(), "select", e))?;

        let row = match rows.into_iter().next() {
            Some(row) => row,
            None => return Ok(None),
        };

        let mut record = R::default();
        self.set_key(&mut record, key)?;
        if self.meta.has_non_key_fields() {
            self.fill_non_key(&mut record, row.into_iter())?;
        }
        Ok(Some(record))
    }

    /// Every key in the table, in no particular order
    pub fn list(&self) -> Result<Vec<Value>> {
        let pk = self.meta.primary_key();
        let rows = self
            .store
            .lock()
            .query(&self.meta.statements().list, &[])
            .map_err(|e| MapperError::store(self.name(), "list", e))?;

        rows.into_iter()
            .map(|row| normalize(pk, row.into_iter().next().unwrap_or(Value::Null)))
            .collect()
    }

    /// Every row in the table, in no particular order
    pub fn select_all(&self) -> Result<Vec<R>> {
        let rows = self
            .store
            .lock()
            .query(&self.meta.statements().select_all, &[])
            .map_err(|e| MapperError::store(self.name(), "select all", e))?;

        rows.into_iter().map(|row| self.record_from_row(row)).collect()
    }
}

/// `MAX(col) + 1`, under the caller's store lock
fn next_sequence_value(store: &mut dyn Store, table: &str, field: &FieldDescriptor) -> Result<Value> {
    let sql = format!(
        "SELECT COALESCE(MAX({}), 0) + 1 FROM {};",
        field.storage_key, table
    );
    let rows = store
        .query(&sql, &[])
        .map_err(|e| MapperError::store(table, "next sequence value", e))?;
    let next = rows
        .into_iter()
        .next()
        .and_then(|row| row.into_iter().next())
        .unwrap_or(Value::Integer(1));
    normalize(field, next)
}
