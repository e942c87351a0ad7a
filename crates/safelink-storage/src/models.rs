//! Database models.

use serde::{Deserialize, Serialize};

/// One row of the options table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionRow {
    pub name: String,
    pub value: String,
    /// Loaded eagerly by hosts that preload options.
    pub autoload: bool,
    pub updated_at: String,
}
