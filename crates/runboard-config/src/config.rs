// crates/runboard-config/src/config.rs
// ============================================================================
// Module: Runboard Configuration
// Description: Configuration loading and validation for Runboard.
// Purpose: Provide strict, fail-closed config parsing with hard limits.
// Dependencies: runboard-core, runboard-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! Configuration is loaded from a TOML file with strict size and path limits.
//! When neither a path nor `RUNBOARD_CONFIG` is given and `runboard.toml` is
//! absent from the working directory, defaults apply. Any other missing or
//! invalid configuration fails closed.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::env;
use std::fs;
use std::net::SocketAddr;
use std::path::Path;
use std::path::PathBuf;

use runboard_core::CollectionSelection;
use runboard_core::repository::DEFAULT_COLLECTION;
use runboard_core::repository::DEFAULT_DATABASE;
use runboard_store_sqlite::SqliteStoreConfig;
use runboard_store_sqlite::SqliteStoreMode;
use runboard_store_sqlite::SqliteSyncMode;
use serde::Deserialize;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default configuration filename when no path is specified.
const DEFAULT_CONFIG_NAME: &str = "runboard.toml";
/// Environment variable used to override the config path.
pub const CONFIG_ENV_VAR: &str = "RUNBOARD_CONFIG";
/// Environment variable overriding the database name per request.
pub const DATABASE_ENV_VAR: &str = "RUNBOARD_DB";
/// Environment variable overriding the collection name per request.
pub const COLLECTION_ENV_VAR: &str = "RUNBOARD_COLLECTION";
/// Maximum configuration file size in bytes.
pub(crate) const MAX_CONFIG_FILE_SIZE: usize = 1024 * 1024;
/// Maximum length of a single path component.
pub(crate) const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
pub(crate) const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum database or collection name length.
pub(crate) const MAX_NAME_LENGTH: usize = 255;
/// Maximum busy timeout in milliseconds.
pub(crate) const MAX_BUSY_TIMEOUT_MS: u64 = 600_000;
/// Default HTTP bind address.
const DEFAULT_BIND: &str = "127.0.0.1:8080";

// ============================================================================
// SECTION: Config Model
// ============================================================================

/// Top-level Runboard configuration.
///
/// # Invariants
/// - [`RunboardConfig::validate`] has succeeded for values returned by
///   [`RunboardConfig::load`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct RunboardConfig {
    /// HTTP server settings.
    #[serde(default)]
    pub server: ServerConfig,
    /// Default collection selection.
    #[serde(default)]
    pub collection: CollectionConfig,
    /// Document store backend.
    #[serde(default)]
    pub store: StoreConfig,
    /// Audit logging settings.
    #[serde(default)]
    pub audit: AuditConfig,
}

impl RunboardConfig {
    /// Loads configuration from disk using the default resolution rules.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when loading or validation fails.
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        let (resolved, explicit) = resolve_path(path)?;
        validate_path(&resolved)?;
        if !explicit && !resolved.exists() {
            let mut config = Self::default();
            config.validate()?;
            return Ok(config);
        }
        let bytes = fs::read(&resolved).map_err(|err| ConfigError::Io(err.to_string()))?;
        if bytes.len() > MAX_CONFIG_FILE_SIZE {
            return Err(ConfigError::Invalid("config file exceeds size limit".to_string()));
        }
        let content = std::str::from_utf8(&bytes)
            .map_err(|_| ConfigError::Invalid("config file must be utf-8".to_string()))?;
        Self::parse(content)
    }

    /// Parses and validates configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when parsing or validation fails.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let mut config: Self =
            toml::from_str(content).map_err(|err| ConfigError::Parse(err.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Validates the configuration for internal consistency.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError`] when configuration is invalid.
    pub fn validate(&mut self) -> Result<(), ConfigError> {
        self.server.validate()?;
        self.collection.validate()?;
        self.store.validate()?;
        self.audit.validate()?;
        Ok(())
    }
}

/// HTTP server configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ServerConfig {
    /// Socket address to bind.
    #[serde(default = "default_bind")]
    pub bind: String,
    /// Maximum request body size in bytes.
    #[serde(default = "default_max_body_bytes")]
    pub max_body_bytes: usize,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_body_bytes: default_max_body_bytes(),
        }
    }
}

impl ServerConfig {
    /// Returns the parsed bind address.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] when `bind` is not a socket address.
    pub fn bind_addr(&self) -> Result<SocketAddr, ConfigError> {
        self.bind
            .trim()
            .parse()
            .map_err(|_| ConfigError::Invalid(format!("invalid server.bind: {}", self.bind)))
    }

    /// Validates server configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.bind.trim().is_empty() {
            return Err(ConfigError::Invalid("server.bind must be non-empty".to_string()));
        }
        self.bind_addr()?;
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid(
                "server.max_body_bytes must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

/// Default database/collection names.
///
/// # Invariants
/// - Both names are non-empty after validation.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CollectionConfig {
    /// Database name used when `RUNBOARD_DB` is unset or empty.
    #[serde(default = "default_database")]
    pub database: String,
    /// Collection name used when `RUNBOARD_COLLECTION` is unset or empty.
    #[serde(default = "default_collection")]
    pub collection: String,
}

impl Default for CollectionConfig {
    fn default() -> Self {
        Self {
            database: default_database(),
            collection: default_collection(),
        }
    }
}

impl CollectionConfig {
    /// Returns the configured selection without environment overrides.
    #[must_use]
    pub fn selection(&self) -> CollectionSelection {
        CollectionSelection::new(self.database.clone(), self.collection.clone())
    }

    /// Resolves the selection against the current process environment.
    ///
    /// Called per request so environment changes apply without restart.
    #[must_use]
    pub fn resolve_selection(&self) -> CollectionSelection {
        self.resolve_selection_with(|name| env::var(name).ok())
    }

    /// Resolves the selection using `lookup` for environment values.
    ///
    /// Unset or empty values fall back to the configured names.
    #[must_use]
    pub fn resolve_selection_with<F>(&self, lookup: F) -> CollectionSelection
    where
        F: Fn(&str) -> Option<String>,
    {
        let non_empty = |name: &str| lookup(name).filter(|value| !value.is_empty());
        CollectionSelection::new(
            non_empty(DATABASE_ENV_VAR).unwrap_or_else(|| self.database.clone()),
            non_empty(COLLECTION_ENV_VAR).unwrap_or_else(|| self.collection.clone()),
        )
    }

    /// Validates collection names.
    fn validate(&self) -> Result<(), ConfigError> {
        validate_name("collection.database", &self.database)?;
        validate_name("collection.collection", &self.collection)
    }
}

/// Document store backend selection.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum StoreType {
    /// `SQLite` files under `store.root`.
    #[default]
    Sqlite,
    /// Process-local in-memory collections.
    Memory,
}

/// Document store configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct StoreConfig {
    /// Backend type.
    #[serde(rename = "type", default)]
    pub store_type: StoreType,
    /// Root directory for `SQLite` database files.
    #[serde(default = "default_store_root")]
    pub root: String,
    /// `SQLite` busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            store_type: StoreType::default(),
            root: default_store_root(),
            busy_timeout_ms: default_busy_timeout_ms(),
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

impl StoreConfig {
    /// Builds the `SQLite` store configuration.
    #[must_use]
    pub fn sqlite_config(&self) -> SqliteStoreConfig {
        SqliteStoreConfig {
            root: PathBuf::from(self.root.trim()),
            busy_timeout_ms: self.busy_timeout_ms,
            journal_mode: self.journal_mode,
            sync_mode: self.sync_mode,
        }
    }

    /// Validates store configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if self.store_type == StoreType::Sqlite {
            validate_path_string("store.root", &self.root)?;
        }
        if self.busy_timeout_ms == 0 || self.busy_timeout_ms > MAX_BUSY_TIMEOUT_MS {
            return Err(ConfigError::Invalid(format!(
                "store.busy_timeout_ms must be between 1 and {MAX_BUSY_TIMEOUT_MS}"
            )));
        }
        Ok(())
    }
}

/// Audit logging configuration.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AuditConfig {
    /// Enable structured audit logging.
    #[serde(default = "default_audit_enabled")]
    pub enabled: bool,
    /// Optional audit log path (JSON lines); stderr when absent.
    #[serde(default)]
    pub path: Option<String>,
}

impl Default for AuditConfig {
    fn default() -> Self {
        Self {
            enabled: default_audit_enabled(),
            path: None,
        }
    }
}

impl AuditConfig {
    /// Validates audit configuration.
    fn validate(&self) -> Result<(), ConfigError> {
        if let Some(path) = &self.path {
            validate_path_string("audit.path", path)?;
        }
        Ok(())
    }
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// Configuration loading or validation errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// I/O failure while reading configuration.
    #[error("config io error: {0}")]
    Io(String),
    /// TOML parsing error.
    #[error("config parse error: {0}")]
    Parse(String),
    /// Invalid configuration data.
    #[error("invalid config: {0}")]
    Invalid(String),
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Resolves the config path from CLI or environment defaults.
///
/// The flag is `true` when the path was given explicitly.
fn resolve_path(path: Option<&Path>) -> Result<(PathBuf, bool), ConfigError> {
    if let Some(path) = path {
        return Ok((path.to_path_buf(), true));
    }
    if let Ok(env_path) = env::var(CONFIG_ENV_VAR)
        && !env_path.is_empty()
    {
        if env_path.len() > MAX_TOTAL_PATH_LENGTH {
            return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
        }
        return Ok((PathBuf::from(env_path), true));
    }
    Ok((PathBuf::from(DEFAULT_CONFIG_NAME), false))
}

/// Validates the resolved path against security limits.
fn validate_path(path: &Path) -> Result<(), ConfigError> {
    let text = path.to_string_lossy();
    if text.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid("config path exceeds max length".to_string()));
    }
    for component in path.components() {
        let value = component.as_os_str().to_string_lossy();
        if value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid("config path component too long".to_string()));
        }
    }
    Ok(())
}

/// Validates a path string against length constraints.
fn validate_path_string(field: &str, value: &str) -> Result<(), ConfigError> {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if trimmed.len() > MAX_TOTAL_PATH_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds max length")));
    }
    for component in Path::new(trimmed).components() {
        let component_value = component.as_os_str().to_string_lossy();
        if component_value.len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(ConfigError::Invalid(format!("{field} path component too long")));
        }
    }
    Ok(())
}

/// Validates a database or collection name.
fn validate_name(field: &str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::Invalid(format!("{field} must be non-empty")));
    }
    if value.len() > MAX_NAME_LENGTH {
        return Err(ConfigError::Invalid(format!("{field} exceeds {MAX_NAME_LENGTH} bytes")));
    }
    Ok(())
}

/// Default bind address.
fn default_bind() -> String {
    DEFAULT_BIND.to_string()
}

/// Default maximum request body size.
pub(crate) const fn default_max_body_bytes() -> usize {
    1024 * 1024
}

/// Default database name.
fn default_database() -> String {
    DEFAULT_DATABASE.to_string()
}

/// Default collection name.
fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

/// Default `SQLite` root directory.
fn default_store_root() -> String {
    "data".to_string()
}

/// Default busy timeout in milliseconds.
pub(crate) const fn default_busy_timeout_ms() -> u64 {
    5_000
}

/// Audit logging is on by default.
pub(crate) const fn default_audit_enabled() -> bool {
    true
}
