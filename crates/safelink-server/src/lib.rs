//! Safe Link Checker Server - the HTTP host.
//!
//! Plays the publishing platform's part: it owns the hook registry, runs the
//! content filter on render, serves the settings page and takes the form
//! submission.
//!
//! ## Endpoints
//!
//! - `POST /api/render` - Run the content filter over a rendered body
//! - `GET /api/settings` - Current settings and the admin API nonce
//! - `POST /api/notices` - One-shot welcome notice
//! - `POST /api/activate` - Register the content filter
//! - `POST /api/deactivate` - Unregister the content filter
//!
//! The notice and lifecycle calls need `?_wpnonce=<admin_nonce>`. Only
//! `/api/render` answers cross-origin requests.
//! - `GET /admin/settings` - Settings page
//! - `POST /admin/post` - Settings form submission
//!
//! ## Example
//!
//! ```no_run
//! use safelink_server::{Server, ServerConfig};
//!
//! #[tokio::main]
//! async fn main() {
//!     let server = Server::new(ServerConfig::default()).await.unwrap();
//!     server.run().await.unwrap();
//! }
//! ```

pub mod error;
mod handlers;
pub mod models;
pub mod state;

use std::net::SocketAddr;

use axum::http::Method;
use axum::routing::{get, post};
use axum::Router;
use socket2::{Domain, Protocol, Socket, Type};
use thiserror::Error;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::info;

use safelink_storage::Database;

pub use error::{ApiError, Result};
pub use handlers::{ADMIN_POST_PATH, SETTINGS_PAGE_PATH};
pub use state::AppState;

/// Default server port.
pub const DEFAULT_PORT: u16 = 48766;

/// Default server host (localhost only).
pub const DEFAULT_HOST: &str = "127.0.0.1";

/// Site host used when none is configured.
pub const DEFAULT_SITE_HOST: &str = "localhost";

/// Server configuration.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Host to bind to (default: 127.0.0.1).
    pub host: String,
    /// Port to bind to (default: 48766).
    pub port: u16,
    /// Database path (None = in-memory).
    pub db_path: Option<String>,
    /// Host name whose links count as internal.
    pub site_host: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            host: DEFAULT_HOST.to_string(),
            port: DEFAULT_PORT,
            db_path: None,
            site_host: DEFAULT_SITE_HOST.to_string(),
        }
    }
}

impl ServerConfig {
    /// Creates a config with a specific database path.
    pub fn with_db_path(path: impl Into<String>) -> Self {
        Self {
            db_path: Some(path.into()),
            ..Self::default()
        }
    }

    /// Sets the bind host.
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Sets the port.
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    /// Sets the site host.
    pub fn with_site_host(mut self, site_host: impl Into<String>) -> Self {
        self.site_host = site_host.into();
        self
    }
}

/// Server error types.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Failed to bind to address.
    #[error("failed to bind to {0}: {1}")]
    BindError(SocketAddr, std::io::Error),

    /// Database error.
    #[error("database error: {0}")]
    Database(#[from] safelink_storage::StorageError),

    /// Server runtime error.
    #[error("server error: {0}")]
    Runtime(String),
}

/// Builds the router over the given state.
pub fn router(state: AppState) -> Router {
    // The render endpoint is called from the site's own pages
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::POST])
        .allow_headers(Any);

    let render: Router<AppState> = Router::new()
        .route("/api/render", post(handlers::render_content))
        .layer(cors);

    Router::new()
        .merge(render)
        .route("/api/settings", get(handlers::get_settings))
        .route("/api/notices", post(handlers::take_notices))
        .route("/api/activate", post(handlers::activate))
        .route("/api/deactivate", post(handlers::deactivate))
        .route(SETTINGS_PAGE_PATH, get(handlers::settings_page))
        .route(ADMIN_POST_PATH, post(handlers::admin_post))
        .with_state(state)
}

/// The HTTP server.
pub struct Server {
    router: Router,
    addr: SocketAddr,
}

impl Server {
    /// Creates a new server with the given configuration.
    pub async fn new(config: ServerConfig) -> std::result::Result<Self, ServerError> {
        let db = if let Some(ref path) = config.db_path {
            Database::with_path(path)?
        } else {
            Database::in_memory()?
        };

        Self::with_database(config, db)
    }

    /// Creates a server with an existing database.
    pub fn with_database(
        config: ServerConfig,
        db: Database,
    ) -> std::result::Result<Self, ServerError> {
        let state = AppState::new(db, config.site_host.clone());
        Self::with_state(config, state)
    }

    /// Creates a server with custom application state.
    pub fn with_state(
        config: ServerConfig,
        state: AppState,
    ) -> std::result::Result<Self, ServerError> {
        let router = router(state).layer(TraceLayer::new_for_http());

        let addr = format!("{}:{}", config.host, config.port)
            .parse()
            .map_err(|e| ServerError::Runtime(format!("invalid address: {}", e)))?;

        Ok(Self { router, addr })
    }

    /// Returns the server address.
    pub fn addr(&self) -> SocketAddr {
        self.addr
    }

    /// Runs the server until shutdown.
    pub async fn run(self) -> std::result::Result<(), ServerError> {
        info!("Starting Safe Link Checker on {}", self.addr);

        let domain = if self.addr.is_ipv4() {
            Domain::IPV4
        } else {
            Domain::IPV6
        };
        let socket = Socket::new(domain, Type::STREAM, Some(Protocol::TCP))
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        // Allow quick restarts while old sockets sit in TIME_WAIT
        socket
            .set_reuse_address(true)
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        socket
            .bind(&self.addr.into())
            .map_err(|e| ServerError::BindError(self.addr, e))?;
        socket
            .listen(128)
            .map_err(|e| ServerError::BindError(self.addr, e))?;
        socket
            .set_nonblocking(true)
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        let std_listener: std::net::TcpListener = socket.into();
        let listener = tokio::net::TcpListener::from_std(std_listener)
            .map_err(|e| ServerError::BindError(self.addr, e))?;

        axum::serve(listener, self.router)
            .await
            .map_err(|e| ServerError::Runtime(e.to_string()))?;

        Ok(())
    }

    /// Returns the router for testing.
    pub fn router(&self) -> Router {
        self.router.clone()
    }
}
