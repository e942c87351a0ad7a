//! High-level database interface.

use std::path::PathBuf;

use directories::ProjectDirs;
use safelink_core::OptionStore;
use tracing::info;

use crate::error::{Result, StorageError};
use crate::models::OptionRow;
use crate::pool::ConnectionPool;
use crate::repository::OptionsRepo;

/// Prefix shared by every option this add-on owns.
pub const OPTION_PREFIX: &str = "safe_link_checker_";

/// High-level database interface for Safe Link Checker.
#[derive(Clone)]
pub struct Database {
    pool: ConnectionPool,
}

impl Database {
    /// Create a new database in the default app data directory.
    pub fn new() -> Result<Self> {
        Self::with_path(Self::default_db_path()?)
    }

    /// Create a new database at a specific path.
    pub fn with_path(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();

        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        info!("Opening database at: {:?}", path);
        let pool = ConnectionPool::new(&path)?;

        Ok(Self { pool })
    }

    /// Create an in-memory database (for testing).
    pub fn in_memory() -> Result<Self> {
        let pool = ConnectionPool::in_memory()?;
        Ok(Self { pool })
    }

    /// Get the default database path.
    pub fn default_db_path() -> Result<PathBuf> {
        let proj_dirs = ProjectDirs::from("com", "safelink", "safelink")
            .ok_or_else(|| StorageError::Config("Could not determine app data directory".into()))?;

        Ok(proj_dirs.data_dir().join("safelink.db"))
    }

    /// Get an option value.
    pub fn get_option(&self, name: &str) -> Result<Option<String>> {
        let conn = self.pool.get()?;
        OptionsRepo::get(&conn, name)
    }

    /// Set an option value.
    pub fn set_option(&self, name: &str, value: &str) -> Result<()> {
        let conn = self.pool.get()?;
        OptionsRepo::set(&conn, name, value)
    }

    /// Set an option only if it is absent. Returns whether it was created.
    pub fn add_option(&self, name: &str, value: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        OptionsRepo::add(&conn, name, value)
    }

    /// Delete an option.
    pub fn delete_option(&self, name: &str) -> Result<bool> {
        let conn = self.pool.get()?;
        OptionsRepo::delete(&conn, name)
    }

    /// All options owned by the add-on.
    pub fn plugin_options(&self) -> Result<Vec<OptionRow>> {
        let conn = self.pool.get()?;
        OptionsRepo::get_by_prefix(&conn, OPTION_PREFIX)
    }
}

impl OptionStore for Database {
    fn get_option(&self, name: &str) -> safelink_core::Result<Option<String>> {
        Ok(Database::get_option(self, name)?)
    }

    fn set_option(&self, name: &str, value: &str) -> safelink_core::Result<()> {
        Ok(Database::set_option(self, name, value)?)
    }

    fn add_option(&self, name: &str, value: &str) -> safelink_core::Result<bool> {
        Ok(Database::add_option(self, name, value)?)
    }

    fn delete_option(&self, name: &str) -> safelink_core::Result<bool> {
        Ok(Database::delete_option(self, name)?)
    }
}
