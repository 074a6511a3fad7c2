// crates/runboard-server/src/server.rs
// ============================================================================
// Module: Runboard Server
// Description: HTTP server assembly and lifecycle.
// Purpose: Build the repository, audit sink, and router from configuration.
// Dependencies: axum, runboard-config, runboard-core, runboard-store-sqlite, tokio
// ============================================================================

//! ## Overview
//! [`RunboardServer`] is built either from a validated [`RunboardConfig`] or
//! from explicit [`ServerParts`]. Serving binds a TCP listener and hands
//! connections to the axum router with peer addresses attached.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::net::SocketAddr;
use std::path::Path;
use std::sync::Arc;

use axum::Router;
use runboard_config::AuditConfig;
use runboard_config::CollectionConfig;
use runboard_config::RunboardConfig;
use runboard_config::StoreConfig;
use runboard_config::StoreType;
use runboard_core::CollectionSelection;
use runboard_core::InMemoryRunRepository;
use runboard_core::SharedRunRepository;
use runboard_store_sqlite::SqliteRunRepository;
use thiserror::Error;
use tokio::net::TcpListener;

use crate::audit::AuditSink;
use crate::audit::FileAuditSink;
use crate::audit::NoopAuditSink;
use crate::audit::StartupAuditEvent;
use crate::audit::StderrAuditSink;
use crate::routes::ServerState;
use crate::routes::build_router;

// ============================================================================
// SECTION: Selection
// ============================================================================

/// Source of the collection selection applied to each request.
#[derive(Debug, Clone)]
pub enum SelectionSource {
    /// Configured names, overridden by `RUNBOARD_DB`/`RUNBOARD_COLLECTION`
    /// at request time.
    Environment(CollectionConfig),
    /// A fixed selection that ignores the environment.
    Fixed(CollectionSelection),
}

impl SelectionSource {
    /// Resolves the selection for one request.
    #[must_use]
    pub fn resolve(&self) -> CollectionSelection {
        match self {
            Self::Environment(config) => config.resolve_selection(),
            Self::Fixed(selection) => selection.clone(),
        }
    }
}

// ============================================================================
// SECTION: Server
// ============================================================================

/// Components a server is assembled from.
pub struct ServerParts {
    /// Socket address to bind.
    pub bind: SocketAddr,
    /// Maximum request body size in bytes.
    pub max_body_bytes: usize,
    /// Repository serving reads.
    pub repository: SharedRunRepository,
    /// Per-request collection selection.
    pub selection: SelectionSource,
    /// Audit sink for request and startup events.
    pub audit: Arc<dyn AuditSink>,
}

/// Runboard HTTP server instance.
pub struct RunboardServer {
    /// Configured bind address.
    bind: SocketAddr,
    /// Maximum request body size in bytes.
    max_body_bytes: usize,
    /// Handler state.
    state: Arc<ServerState>,
}

impl RunboardServer {
    /// Builds a server from configuration.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError`] when the configuration is invalid or the
    /// store or audit sink cannot be opened.
    pub fn from_config(mut config: RunboardConfig) -> Result<Self, ServerError> {
        config.validate().map_err(|err| ServerError::Config(err.to_string()))?;
        let bind = config.server.bind_addr().map_err(|err| ServerError::Config(err.to_string()))?;
        let repository = build_repository(&config.store)?;
        let audit = build_audit_sink(&config.audit)?;
        Ok(Self::from_parts(ServerParts {
            bind,
            max_body_bytes: config.server.max_body_bytes,
            repository,
            selection: SelectionSource::Environment(config.collection),
            audit,
        }))
    }

    /// Builds a server from explicit parts.
    #[must_use]
    pub fn from_parts(parts: ServerParts) -> Self {
        Self {
            bind: parts.bind,
            max_body_bytes: parts.max_body_bytes,
            state: Arc::new(ServerState {
                repository: parts.repository,
                selection: parts.selection,
                audit: parts.audit,
            }),
        }
    }

    /// Returns the configured bind address.
    #[must_use]
    pub const fn bind_addr(&self) -> SocketAddr {
        self.bind
    }

    /// Returns the API router.
    #[must_use]
    pub fn router(&self) -> Router {
        build_router(Arc::clone(&self.state), self.max_body_bytes)
    }

    /// Binds the configured address and serves until the server fails.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when binding or serving fails.
    pub async fn serve(self) -> Result<(), ServerError> {
        let listener = TcpListener::bind(self.bind)
            .await
            .map_err(|err| ServerError::Transport(format!("http bind failed: {err}")))?;
        self.serve_listener(listener).await
    }

    /// Serves on an already bound listener.
    ///
    /// # Errors
    ///
    /// Returns [`ServerError::Transport`] when serving fails.
    pub async fn serve_listener(self, listener: TcpListener) -> Result<(), ServerError> {
        let local_addr = listener
            .local_addr()
            .map_err(|err| ServerError::Transport(format!("listener address: {err}")))?;
        let selection = self.state.selection.resolve();
        self.state.audit.record_startup(&StartupAuditEvent::new(
            local_addr.to_string(),
            selection.database,
            selection.collection,
        ));
        let app = self.router();
        axum::serve(listener, app.into_make_service_with_connect_info::<SocketAddr>())
            .await
            .map_err(|_| ServerError::Transport("http server failed".to_string()))
    }
}

/// Builds the run repository from store configuration.
fn build_repository(config: &StoreConfig) -> Result<SharedRunRepository, ServerError> {
    let repository = match config.store_type {
        StoreType::Memory => SharedRunRepository::from_repository(InMemoryRunRepository::new()),
        StoreType::Sqlite => {
            let store = SqliteRunRepository::new(config.sqlite_config())
                .map_err(|err| ServerError::Init(err.to_string()))?;
            SharedRunRepository::from_repository(store)
        }
    };
    Ok(repository)
}

/// Builds the audit sink from audit configuration.
fn build_audit_sink(config: &AuditConfig) -> Result<Arc<dyn AuditSink>, ServerError> {
    if !config.enabled {
        return Ok(Arc::new(NoopAuditSink));
    }
    match &config.path {
        Some(path) => {
            let sink = FileAuditSink::new(Path::new(path.trim()))
                .map_err(|err| ServerError::Init(format!("audit log: {err}")))?;
            Ok(Arc::new(sink))
        }
        None => Ok(Arc::new(StderrAuditSink)),
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Server errors.
#[derive(Debug, Error)]
pub enum ServerError {
    /// Configuration errors.
    #[error("config error: {0}")]
    Config(String),
    /// Initialization errors.
    #[error("init error: {0}")]
    Init(String),
    /// Transport errors.
    #[error("transport error: {0}")]
    Transport(String),
}
