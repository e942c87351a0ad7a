//! Option store seam.
//!
//! Settings live in the host's generic key-value options table. The core only
//! sees this trait; `safelink-storage` provides the SQLite implementation and
//! [`MemoryOptionStore`] covers tests and dry runs.

use std::collections::BTreeMap;
use std::sync::{PoisonError, RwLock};

use crate::error::Result;

/// Flat string-keyed persistent options.
pub trait OptionStore {
    /// Reads an option, `None` when it has never been written.
    fn get_option(&self, name: &str) -> Result<Option<String>>;

    /// Inserts or replaces an option.
    fn set_option(&self, name: &str, value: &str) -> Result<()>;

    /// Stores an option only if it is absent. Returns whether this call
    /// created it.
    ///
    /// The check and the write are one atomic step, so of several
    /// concurrent callers exactly one sees `true`.
    fn add_option(&self, name: &str, value: &str) -> Result<bool>;

    /// Removes an option. Returns whether it existed.
    fn delete_option(&self, name: &str) -> Result<bool>;

    /// Reads an option, falling back to `default` when absent.
    fn get_option_or(&self, name: &str, default: &str) -> Result<String> {
        Ok(self
            .get_option(name)?
            .unwrap_or_else(|| default.to_string()))
    }
}

impl<S: OptionStore + ?Sized> OptionStore for std::sync::Arc<S> {
    fn get_option(&self, name: &str) -> Result<Option<String>> {
        (**self).get_option(name)
    }

    fn set_option(&self, name: &str, value: &str) -> Result<()> {
        (**self).set_option(name, value)
    }

    fn add_option(&self, name: &str, value: &str) -> Result<bool> {
        (**self).add_option(name, value)
    }

    fn delete_option(&self, name: &str) -> Result<bool> {
        (**self).delete_option(name)
    }
}

/// In-process option store.
#[derive(Debug, Default)]
pub struct MemoryOptionStore {
    options: RwLock<BTreeMap<String, String>>,
}

impl MemoryOptionStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored options.
    pub fn len(&self) -> usize {
        self.options
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    /// Whether nothing has been stored yet.
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl OptionStore for MemoryOptionStore {
    fn get_option(&self, name: &str) -> Result<Option<String>> {
        let options = self.options.read().unwrap_or_else(PoisonError::into_inner);
        Ok(options.get(name).cloned())
    }

    fn set_option(&self, name: &str, value: &str) -> Result<()> {
        let mut options = self.options.write().unwrap_or_else(PoisonError::into_inner);
        options.insert(name.to_string(), value.to_string());
        Ok(())
    }

    fn add_option(&self, name: &str, value: &str) -> Result<bool> {
        let mut options = self.options.write().unwrap_or_else(PoisonError::into_inner);
        if options.contains_key(name) {
            return Ok(false);
        }
        options.insert(name.to_string(), value.to_string());
        Ok(true)
    }

    fn delete_option(&self, name: &str) -> Result<bool> {
        let mut options = self.options.write().unwrap_or_else(PoisonError::into_inner);
        Ok(options.remove(name).is_some())
    }
}
