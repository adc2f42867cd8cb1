//! Database configuration
//!
//! Connection pragmas and mapping behaviour, loadable from JSON.

use crate::error::{MapperError, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// SQLite journal mode
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum JournalMode {
    /// Rollback journal, deleted after each transaction
    #[default]
    Delete,
    /// Write-ahead log
    Wal,
    /// Journal kept in memory
    Memory,
}

impl JournalMode {
    pub fn as_pragma(&self) -> &'static str {
        match self {
            JournalMode::Delete => "DELETE",
            JournalMode::Wal => "WAL",
            JournalMode::Memory => "MEMORY",
        }
    }
}

/// SQLite synchronous level
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub enum SynchronousMode {
    Off,
    Normal,
    /// Safest: fsync at every critical moment
    #[default]
    Full,
}

impl SynchronousMode {
    pub fn as_pragma(&self) -> &'static str {
        match self {
            SynchronousMode::Off => "OFF",
            SynchronousMode::Normal => "NORMAL",
            SynchronousMode::Full => "FULL",
        }
    }
}

/// Database configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DbConfig {
    /// Database file; `None` opens a private in-memory database
    pub path: Option<PathBuf>,

    pub journal_mode: JournalMode,

    pub synchronous: SynchronousMode,

    /// How long the engine waits on a locked database file (milliseconds)
    pub busy_timeout_ms: u64,

    /// Run CREATE TABLE IF NOT EXISTS when a record type is registered.
    ///
    /// Disable when schemas are managed exclusively through migrations.
    pub auto_create_tables: bool,

    /// Inserted between the table name and a unique suffix to name the
    /// temporary table of a rebuild
    pub rebuild_table_infix: String,
}

impl Default for DbConfig {
    fn default() -> Self {
        Self {
            path: None,
            journal_mode: JournalMode::default(),
            synchronous: SynchronousMode::default(),
            busy_timeout_ms: 5_000,
            auto_create_tables: true,
            rebuild_table_infix: "__rowbind_tmp_".to_string(),
        }
    }
}

impl DbConfig {
    /// Private in-memory database
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// File-backed database with a write-ahead log
    pub fn for_file<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: Some(path.as_ref().to_path_buf()),
            journal_mode: JournalMode::Wal,
            synchronous: SynchronousMode::Normal,
            ..Default::default()
        }
    }

    /// Fastest settings, no durability
    pub fn for_testing() -> Self {
        Self {
            journal_mode: JournalMode::Memory,
            synchronous: SynchronousMode::Off,
            ..Default::default()
        }
    }

    pub fn with_auto_create(mut self, enabled: bool) -> Self {
        self.auto_create_tables = enabled;
        self
    }

    pub fn with_busy_timeout_ms(mut self, millis: u64) -> Self {
        self.busy_timeout_ms = millis;
        self
    }

    pub fn with_journal_mode(mut self, mode: JournalMode) -> Self {
        self.journal_mode = mode;
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: DbConfig = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_json_str(&raw)
    }

    pub fn validate(&self) -> Result<()> {
        let infix = &self.rebuild_table_infix;
        if infix.is_empty() {
            return Err(MapperError::Config("rebuild_table_infix must not be empty".into()));
        }
        if !infix.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') {
            return Err(MapperError::Config(format!(
                "rebuild_table_infix '{}' must be alphanumeric or '_'",
                infix
            )));
        }
        if self.path.is_none() && self.journal_mode == JournalMode::Wal {
            return Err(MapperError::Config(
                "WAL journal mode requires a database file".into(),
            ));
        }
        Ok(())
    }
}
