//! Database Core - handle structure and initialization

use super::table::Table;
use crate::catalog::{TableMetadata, TableRegistry};
use crate::config::DbConfig;
use crate::record::Record;
use crate::store::{ExecResult, SqliteStore, Store};
use crate::types::{Row, Value};
use crate::{MapperError, Result};
use parking_lot::Mutex;
use std::sync::Arc;
use tracing::{debug, info};

/// The store behind its exclusive lock, shared by the handle and every table
pub(crate) type SharedStore = Arc<Mutex<Box<dyn Store>>>;

/// Database handle
///
/// Owns one store connection and the tables registered against it. Cloning
/// is cheap and shares both.
#[derive(Clone)]
pub struct Database {
    pub(crate) store: SharedStore,
    pub(crate) registry: Arc<TableRegistry>,
    pub(crate) config: Arc<DbConfig>,
}

impl Database {
    /// Open a SQLite database described by `config`
    ///
    /// # Example
    /// ```ignore
    /// let db = Database::open(DbConfig::for_file("app.db"))?;
    /// ```
    pub fn open(config: DbConfig) -> Result<Self> {
        config.validate()?;
        let label = config
            .path
            .as_ref()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| ":memory:".to_string());
        let store = SqliteStore::open(&config).map_err(|e| MapperError::store(&label, "open", e))?;
        info!(database = %label, "opened database");
        Self::with_store(Box::new(store), config)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(DbConfig::in_memory())
    }

    /// Use an already-open store
    pub fn with_store(store: Box<dyn Store>, config: DbConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            store: Arc::new(Mutex::new(store)),
            registry: Arc::new(TableRegistry::new()),
            config: Arc::new(config),
        })
    }

    /// Register `R`, creating its table when `auto_create_tables` is set.
    ///
    /// Registering a table name again replaces the earlier metadata; call
    /// [`Table::migrate`] to bring the live table in line with it.
    ///
    /// # Example
    /// ```ignore
    /// let users = db.register::<User>()?;
    /// ```
    pub fn register<R: Record>(&self) -> Result<Table<R>> {
        let meta = Arc::new(TableMetadata::register(R::table_name(), R::fields())?);

        if self.config.auto_create_tables {
            let mut store = self.store.lock();
            store
                .execute(&meta.statements().create_table, &[])
                .map_err(|e| MapperError::store(meta.name(), "create table", e))?;
            debug!(table = meta.name(), "ensured table exists");
        }

        if self.registry.register(Arc::clone(&meta)).is_some() {
            debug!(table = meta.name(), "replaced earlier registration");
        }

        Ok(Table::new(meta, Arc::clone(&self.store), Arc::clone(&self.config)))
    }

    /// Registered table names, sorted
    pub fn registered_tables(&self) -> Vec<String> {
        self.registry.list_tables()
    }

    pub fn table_metadata(&self, table: &str) -> Option<Arc<TableMetadata>> {
        self.registry.get_table(table)
    }

    pub fn config(&self) -> &DbConfig {
        &self.config
    }

    /// Run a statement outside the mapped tables
    pub fn execute(&self, sql: &str, args: &[Value]) -> Result<ExecResult> {
        self.store
            .lock()
            .execute(sql, args)
            .map_err(|e| MapperError::store("*", "execute", e))
    }

    /// Run a query outside the mapped tables
    pub fn query(&self, sql: &str, args: &[Value]) -> Result<Vec<Row>> {
        self.store
            .lock()
            .query(sql, args)
            .map_err(|e| MapperError::store("*", "query", e))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Account, User};
    use tempfile::TempDir;

    #[test]
    fn test_register_creates_table() {
        let db = Database::open_in_memory().unwrap();
        db.register::<User>().unwrap();
        db.register::<Account>().unwrap();

        assert_eq!(db.registered_tables(), vec!["Account".to_string(), "User".to_string()]);
        let rows = db
            .query("SELECT name FROM sqlite_master WHERE type = 'table' AND name = 'User';", &[])
            .unwrap();
        assert_eq!(rows.len(), 1);
        assert!(db.table_metadata("User").is_some());
    }

    #[test]
    fn test_register_without_auto_create() {
        let db = Database::open(DbConfig::in_memory().with_auto_create(false)).unwrap();
        let users = db.register::<User>().unwrap();
        let rows = db
            .query("SELECT name FROM sqlite_master WHERE name = 'User';", &[])
            .unwrap();
        assert!(rows.is_empty());

        let report = users.migrate(&Default::default()).unwrap();
        assert_eq!(report.added, vec!["id", "name"]);
    }

    #[test]
    fn test_file_database_persists() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("rowbind.db");

        {
            let db = Database::open(DbConfig::for_file(&path)).unwrap();
            let users = db.register::<User>().unwrap();
            let mut user = User::named("carol");
            users.insert(&mut user).unwrap();
        }

        let db = Database::open(DbConfig::for_file(&path)).unwrap();
        let users = db.register::<User>().unwrap();
        let found = users.select(1).unwrap().unwrap();
        assert_eq!(found.name, "carol");
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = DbConfig::in_memory();
        config.rebuild_table_infix = String::new();
        assert!(matches!(Database::open(config), Err(MapperError::Config(_))));
    }
}
