/// Table registry for the metadata registered against one database handle
use super::TableMetadata;
use parking_lot::RwLock;
use std::collections::HashMap;
use std::sync::Arc;

/// Registered table metadata, keyed by table name.
///
/// A later registration of the same table name replaces the earlier one,
/// which is how a new record version is staged before `migrate`.
#[derive(Debug, Default)]
pub struct TableRegistry {
    tables: RwLock<HashMap<String, Arc<TableMetadata>>>,
}

impl TableRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record `meta`, returning the registration it replaced
    pub fn register(&self, meta: Arc<TableMetadata>) -> Option<Arc<TableMetadata>> {
        self.tables.write().insert(meta.name().to_string(), meta)
    }

    /// Get table metadata
    pub fn get_table(&self, table_name: &str) -> Option<Arc<TableMetadata>> {
        self.tables.read().get(table_name).cloned()
    }

    /// List all tables, sorted
    pub fn list_tables(&self) -> Vec<String> {
        let mut names: Vec<String> = self.tables.read().keys().cloned().collect();
        names.sort();
        names
    }

    /// Check if table exists
    pub fn table_exists(&self, table_name: &str) -> bool {
        self.tables.read().contains_key(table_name)
    }
}
