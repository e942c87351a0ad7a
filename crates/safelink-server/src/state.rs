//! Application state for the HTTP host.

use std::sync::{Arc, RwLock};

use safelink_core::hooks::HookRegistry;
use safelink_core::nonce::NonceIssuer;
use safelink_core::SafeLinkChecker;
use safelink_storage::{Database, StorageError};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    /// Database connection.
    pub db: Arc<Database>,
    /// The plugin, already activated against `hooks`.
    pub plugin: Arc<SafeLinkChecker<Database>>,
    /// Filters run on every render.
    pub hooks: Arc<RwLock<HookRegistry>>,
    /// Host name used when a render request does not name one.
    pub site_host: String,
}

impl AppState {
    /// Creates the state and activates the plugin.
    pub fn new(db: Database, site_host: impl Into<String>) -> Self {
        Self::with_nonce_issuer(db, site_host, NonceIssuer::new())
    }

    /// Creates the state with a given nonce issuer.
    pub fn with_nonce_issuer(
        db: Database,
        site_host: impl Into<String>,
        nonces: NonceIssuer,
    ) -> Self {
        let db = Arc::new(db);
        let plugin = Arc::new(SafeLinkChecker::with_nonce_issuer(Arc::clone(&db), nonces));

        let mut registry = HookRegistry::new();
        plugin.activate(&mut registry);

        Self {
            db,
            plugin,
            hooks: Arc::new(RwLock::new(registry)),
            site_host: site_host.into(),
        }
    }

    /// Creates application state backed by an in-memory database.
    pub fn in_memory(site_host: impl Into<String>) -> Result<Self, StorageError> {
        Ok(Self::new(Database::in_memory()?, site_host))
    }
}
