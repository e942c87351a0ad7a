//! Safe Link Checker Storage - SQLite options table.
//!
//! Persists the add-on's settings the way a publishing host keeps its
//! options: one flat `options` table of string names and string values.
//! [`Database`] implements [`safelink_core::OptionStore`], so it plugs
//! straight into [`safelink_core::SafeLinkChecker`].
//!
//! # Example
//!
//! ```no_run
//! use safelink_storage::Database;
//!
//! let db = Database::in_memory().unwrap();
//! db.set_option("safe_link_checker_url", "https://safe.example/check").unwrap();
//! ```

mod database;
pub mod error;
pub mod models;
mod pool;
pub mod repository;
mod schema;

pub use database::{Database, OPTION_PREFIX};
pub use error::{Result, StorageError};
pub use models::OptionRow;
pub use pool::ConnectionPool;
