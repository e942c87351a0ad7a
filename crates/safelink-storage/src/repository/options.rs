//! Options repository.

use rusqlite::{params, Connection, OptionalExtension};

use crate::error::Result;
use crate::models::OptionRow;

/// Repository for option operations.
pub struct OptionsRepo;

impl OptionsRepo {
    /// Get an option value.
    pub fn get(conn: &Connection, name: &str) -> Result<Option<String>> {
        let value = conn
            .query_row(
                "SELECT option_value FROM options WHERE option_name = ?1",
                [name],
                |row| row.get(0),
            )
            .optional()?;

        Ok(value)
    }

    /// Set an option value (insert or update).
    pub fn set(conn: &Connection, name: &str, value: &str) -> Result<()> {
        conn.execute(
            "INSERT INTO options (option_name, option_value) VALUES (?1, ?2)
             ON CONFLICT(option_name) DO UPDATE SET option_value = ?2, updated_at = datetime('now')",
            params![name, value],
        )?;

        Ok(())
    }

    /// Insert an option only if it does not exist yet. Returns whether a row
    /// was inserted.
    pub fn add(conn: &Connection, name: &str, value: &str) -> Result<bool> {
        let inserted = conn.execute(
            "INSERT INTO options (option_name, option_value) VALUES (?1, ?2)
             ON CONFLICT(option_name) DO NOTHING",
            params![name, value],
        )?;

        Ok(inserted > 0)
    }

    /// Delete an option.
    pub fn delete(conn: &Connection, name: &str) -> Result<bool> {
        let deleted = conn.execute("DELETE FROM options WHERE option_name = ?1", [name])?;
        Ok(deleted > 0)
    }

    /// Get all options, ordered by name.
    pub fn get_all(conn: &Connection) -> Result<Vec<OptionRow>> {
        let mut stmt = conn.prepare(
            "SELECT option_name, option_value, autoload, updated_at FROM options ORDER BY option_name",
        )?;

        let rows = stmt
            .query_map([], |row| {
                Ok(OptionRow {
                    name: row.get(0)?,
                    value: row.get(1)?,
                    autoload: row.get::<_, i64>(2)? != 0,
                    updated_at: row.get(3)?,
                })
            })?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        Ok(rows)
    }

    /// Get all options whose name starts with `prefix`.
    pub fn get_by_prefix(conn: &Connection, prefix: &str) -> Result<Vec<OptionRow>> {
        Ok(Self::get_all(conn)?
            .into_iter()
            .filter(|row| row.name.starts_with(prefix))
            .collect())
    }
}
