//! Core error types.

use thiserror::Error;

/// Errors that can occur in core operations.
#[derive(Debug, Error)]
pub enum CoreError {
    /// The backing option store failed.
    #[error("option store error: {0}")]
    Store(#[source] Box<dyn std::error::Error + Send + Sync>),
}

impl CoreError {
    /// Wraps a backend error raised by an [`OptionStore`](crate::store::OptionStore).
    pub fn store(err: impl std::error::Error + Send + Sync + 'static) -> Self {
        CoreError::Store(Box::new(err))
    }
}

/// Result type for core operations.
pub type Result<T> = std::result::Result<T, CoreError>;
