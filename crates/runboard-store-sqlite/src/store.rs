// crates/runboard-store-sqlite/src/store.rs
// ============================================================================
// Module: SQLite Run Repository
// Description: RunRepository over per-database SQLite document tables.
// Purpose: Serve whole-collection reads from durable local storage.
// Dependencies: runboard-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`SqliteRunRepository`] maps a database name to `<root>/<database>.sqlite3`
//! and a collection to the rows of the `documents` table tagged with that
//! collection name. Reads open a fresh read-only connection per call and
//! return documents in insertion order. A database file that does not exist
//! reads as an empty collection.
//!
//! Documents are stored verbatim; the `run_id` column is an index copied from
//! the document at insert time.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::path::Path;
use std::path::PathBuf;
use std::time::Duration;

use rusqlite::Connection;
use rusqlite::OpenFlags;
use rusqlite::OptionalExtension;
use rusqlite::params;
use runboard_core::CollectionSelection;
use runboard_core::RepositoryError;
use runboard_core::RunRepository;
use runboard_core::repository::document_run_id;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// `SQLite` schema version for the store.
const SCHEMA_VERSION: i64 = 1;
/// Default busy timeout (ms).
const DEFAULT_BUSY_TIMEOUT_MS: u64 = 5_000;
/// Maximum length of a single path component.
const MAX_PATH_COMPONENT_LENGTH: usize = 255;
/// Maximum total path length.
const MAX_TOTAL_PATH_LENGTH: usize = 4096;
/// Maximum database name length.
const MAX_DATABASE_NAME_LENGTH: usize = 64;
/// Maximum collection name length.
const MAX_COLLECTION_NAME_LENGTH: usize = 255;
/// File extension for database files.
const DATABASE_FILE_EXTENSION: &str = "sqlite3";
/// Maximum serialized size of a single stored document.
pub const MAX_DOCUMENT_BYTES: usize = 16 * 1024 * 1024;

// ============================================================================
// SECTION: Config
// ============================================================================

/// `SQLite` journal mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `journal_mode` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteStoreMode {
    /// WAL journal mode.
    #[default]
    Wal,
    /// Delete journal mode.
    Delete,
}

impl SqliteStoreMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Wal => "wal",
            Self::Delete => "delete",
        }
    }
}

/// `SQLite` sync mode configuration.
///
/// # Invariants
/// - Values map 1:1 to `SQLite` `synchronous` pragma settings.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum SqliteSyncMode {
    /// Full synchronous mode.
    #[default]
    Full,
    /// Normal synchronous mode.
    Normal,
}

impl SqliteSyncMode {
    /// Returns the `SQLite` pragma value.
    #[must_use]
    pub const fn pragma_value(self) -> &'static str {
        match self {
            Self::Full => "full",
            Self::Normal => "normal",
        }
    }
}

/// Configuration for the `SQLite` run repository.
///
/// # Invariants
/// - `root` must resolve to a directory (not a file).
/// - `busy_timeout_ms` is interpreted as milliseconds.
#[derive(Debug, Clone, Deserialize)]
pub struct SqliteStoreConfig {
    /// Directory holding one database file per database name.
    pub root: PathBuf,
    /// Busy timeout in milliseconds.
    #[serde(default = "default_busy_timeout_ms")]
    pub busy_timeout_ms: u64,
    /// `SQLite` journal mode used by writers.
    #[serde(default)]
    pub journal_mode: SqliteStoreMode,
    /// `SQLite` sync mode used by writers.
    #[serde(default)]
    pub sync_mode: SqliteSyncMode,
}

impl SqliteStoreConfig {
    /// Creates a config rooted at `root` with default tuning.
    #[must_use]
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            busy_timeout_ms: DEFAULT_BUSY_TIMEOUT_MS,
            journal_mode: SqliteStoreMode::default(),
            sync_mode: SqliteSyncMode::default(),
        }
    }
}

/// Default busy timeout for serde.
const fn default_busy_timeout_ms() -> u64 {
    DEFAULT_BUSY_TIMEOUT_MS
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// `SQLite` store errors.
///
/// # Invariants
/// - Error messages avoid embedding stored document payloads.
#[derive(Debug, Error, Clone)]
pub enum SqliteStoreError {
    /// Store I/O error, including failures to open a database file.
    #[error("sqlite store io error: {0}")]
    Io(String),
    /// `SQLite` engine error.
    #[error("sqlite store db error: {0}")]
    Db(String),
    /// Stored document is not valid JSON.
    #[error("sqlite store corruption: {0}")]
    Corrupt(String),
    /// Store schema version mismatch.
    #[error("sqlite store version mismatch: {0}")]
    VersionMismatch(String),
    /// Invalid database name, collection name, or path.
    #[error("sqlite store invalid data: {0}")]
    Invalid(String),
    /// Document exceeded the size limit.
    #[error("sqlite store payload too large: {actual_bytes} bytes (max {max_bytes})")]
    TooLarge {
        /// Maximum allowed bytes.
        max_bytes: usize,
        /// Actual payload size in bytes.
        actual_bytes: usize,
    },
}

impl From<SqliteStoreError> for RepositoryError {
    fn from(error: SqliteStoreError) -> Self {
        match error {
            SqliteStoreError::Io(message) => Self::Connection(message),
            SqliteStoreError::VersionMismatch(message) => {
                Self::Connection(format!("version mismatch: {message}"))
            }
            SqliteStoreError::Db(message) | SqliteStoreError::Invalid(message) => {
                Self::Query(message)
            }
            SqliteStoreError::Corrupt(message) => Self::Serialization(message),
            SqliteStoreError::TooLarge {
                max_bytes,
                actual_bytes,
            } => Self::Serialization(format!(
                "document exceeds size limit: {actual_bytes} bytes (max {max_bytes})"
            )),
        }
    }
}

// ============================================================================
// SECTION: Store
// ============================================================================

/// `SQLite`-backed run repository.
///
/// # Invariants
/// - Reads never create files or tables.
/// - Documents within a collection are returned in insertion order.
#[derive(Debug, Clone)]
pub struct SqliteRunRepository {
    /// Store configuration.
    config: SqliteStoreConfig,
}

impl SqliteRunRepository {
    /// Opens a repository rooted at the configured directory.
    ///
    /// The root directory is created when missing.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the root path is invalid or cannot
    /// be created.
    pub fn new(config: SqliteStoreConfig) -> Result<Self, SqliteStoreError> {
        validate_root_path(&config.root)?;
        std::fs::create_dir_all(&config.root).map_err(|err| SqliteStoreError::Io(err.to_string()))?;
        Ok(Self {
            config,
        })
    }

    /// Returns the store configuration.
    #[must_use]
    pub const fn config(&self) -> &SqliteStoreConfig {
        &self.config
    }

    /// Returns the database file path for a database name.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError::Invalid`] when the name is not a safe file stem.
    pub fn database_path(&self, database: &str) -> Result<PathBuf, SqliteStoreError> {
        validate_database_name(database)?;
        Ok(self.config.root.join(format!("{database}.{DATABASE_FILE_EXTENSION}")))
    }

    /// Reads every document in a collection, in insertion order.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be read or a
    /// stored document is not valid JSON.
    pub fn load_documents(
        &self,
        selection: &CollectionSelection,
    ) -> Result<Vec<Value>, SqliteStoreError> {
        validate_collection_name(&selection.collection)?;
        let Some(connection) = self.open_reader(&selection.database)? else {
            return Ok(Vec::new());
        };
        let mut statement = connection
            .prepare("SELECT document_json FROM documents WHERE collection = ?1 ORDER BY seq")
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let rows = statement
            .query_map(params![selection.collection], |row| row.get::<_, String>(0))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        let mut documents = Vec::new();
        for row in rows {
            let raw = row.map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            documents.push(decode_document(&raw)?);
        }
        Ok(documents)
    }

    /// Reads the first document in a collection with a matching `run_id`.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when the database cannot be read or the
    /// stored document is not valid JSON.
    pub fn load_document_by_run_id(
        &self,
        selection: &CollectionSelection,
        run_id: &str,
    ) -> Result<Option<Value>, SqliteStoreError> {
        validate_collection_name(&selection.collection)?;
        let Some(connection) = self.open_reader(&selection.database)? else {
            return Ok(None);
        };
        let raw: Option<String> = connection
            .query_row(
                "SELECT document_json FROM documents WHERE collection = ?1 AND run_id = ?2 ORDER \
                 BY seq LIMIT 1",
                params![selection.collection, run_id],
                |row| row.get(0),
            )
            .optional()
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        raw.as_deref().map(decode_document).transpose()
    }

    /// Appends documents to a collection, creating the database if needed.
    ///
    /// All documents are written in one transaction; returns the number written.
    ///
    /// # Errors
    ///
    /// Returns [`SqliteStoreError`] when names are invalid, a document is too
    /// large, or the write fails.
    pub fn append_documents(
        &self,
        selection: &CollectionSelection,
        documents: &[Value],
    ) -> Result<usize, SqliteStoreError> {
        validate_collection_name(&selection.collection)?;
        let path = self.database_path(&selection.database)?;
        let mut connection = open_writer(&path, &self.config)?;
        initialize_schema(&mut connection)?;
        let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        {
            let mut statement = tx
                .prepare(
                    "INSERT INTO documents (collection, run_id, document_json) VALUES (?1, ?2, ?3)",
                )
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            for document in documents {
                let encoded = serde_json::to_string(document)
                    .map_err(|err| SqliteStoreError::Invalid(err.to_string()))?;
                enforce_document_size(encoded.len())?;
                statement
                    .execute(params![selection.collection, document_run_id(document), encoded])
                    .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            }
        }
        tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        Ok(documents.len())
    }

    /// Opens a read-only connection, or `None` when the database does not exist.
    fn open_reader(&self, database: &str) -> Result<Option<Connection>, SqliteStoreError> {
        let path = self.database_path(database)?;
        if !path.is_file() {
            return Ok(None);
        }
        let flags = OpenFlags::SQLITE_OPEN_READ_ONLY | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
        let connection = Connection::open_with_flags(&path, flags)
            .map_err(|err| SqliteStoreError::Io(err.to_string()))?;
        connection
            .busy_timeout(Duration::from_millis(self.config.busy_timeout_ms))
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        if !verify_schema(&connection)? {
            return Ok(None);
        }
        Ok(Some(connection))
    }
}

impl RunRepository for SqliteRunRepository {
    fn fetch_all(&self, selection: &CollectionSelection) -> Result<Vec<Value>, RepositoryError> {
        Ok(self.load_documents(selection)?)
    }

    fn find_by_run_id(
        &self,
        selection: &CollectionSelection,
        run_id: &str,
    ) -> Result<Option<Value>, RepositoryError> {
        Ok(self.load_document_by_run_id(selection, run_id)?)
    }
}

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Validates the store root for safety limits.
fn validate_root_path(path: &Path) -> Result<(), SqliteStoreError> {
    if path.as_os_str().is_empty() {
        return Err(SqliteStoreError::Invalid("store root must not be empty".to_string()));
    }
    if path.display().to_string().len() > MAX_TOTAL_PATH_LENGTH {
        return Err(SqliteStoreError::Invalid("store root exceeds length limit".to_string()));
    }
    for component in path.components() {
        if component.as_os_str().len() > MAX_PATH_COMPONENT_LENGTH {
            return Err(SqliteStoreError::Invalid(
                "store root contains an overlong component".to_string(),
            ));
        }
    }
    if path.exists() && !path.is_dir() {
        return Err(SqliteStoreError::Invalid(
            "store root must be a directory, not a file".to_string(),
        ));
    }
    Ok(())
}

/// Validates a database name used as a file stem.
fn validate_database_name(database: &str) -> Result<(), SqliteStoreError> {
    if database.is_empty() {
        return Err(SqliteStoreError::Invalid("database name must not be empty".to_string()));
    }
    if database.len() > MAX_DATABASE_NAME_LENGTH {
        return Err(SqliteStoreError::Invalid(format!(
            "database name exceeds {MAX_DATABASE_NAME_LENGTH} bytes"
        )));
    }
    if !database.chars().all(|ch| ch.is_ascii_alphanumeric() || ch == '_' || ch == '-') {
        return Err(SqliteStoreError::Invalid(format!(
            "database name contains unsupported characters: {database}"
        )));
    }
    Ok(())
}

/// Validates a collection name.
fn validate_collection_name(collection: &str) -> Result<(), SqliteStoreError> {
    if collection.is_empty() {
        return Err(SqliteStoreError::Invalid("collection name must not be empty".to_string()));
    }
    if collection.len() > MAX_COLLECTION_NAME_LENGTH {
        return Err(SqliteStoreError::Invalid(format!(
            "collection name exceeds {MAX_COLLECTION_NAME_LENGTH} bytes"
        )));
    }
    if collection.contains('\0') {
        return Err(SqliteStoreError::Invalid("collection name contains NUL".to_string()));
    }
    Ok(())
}

/// Rejects documents above [`MAX_DOCUMENT_BYTES`].
const fn enforce_document_size(actual_bytes: usize) -> Result<(), SqliteStoreError> {
    if actual_bytes > MAX_DOCUMENT_BYTES {
        return Err(SqliteStoreError::TooLarge {
            max_bytes: MAX_DOCUMENT_BYTES,
            actual_bytes,
        });
    }
    Ok(())
}

/// Decodes a stored document.
fn decode_document(raw: &str) -> Result<Value, SqliteStoreError> {
    enforce_document_size(raw.len())?;
    serde_json::from_str(raw).map_err(|err| SqliteStoreError::Corrupt(err.to_string()))
}

/// Opens a read-write connection, creating the file when missing.
fn open_writer(path: &Path, config: &SqliteStoreConfig) -> Result<Connection, SqliteStoreError> {
    let flags = OpenFlags::SQLITE_OPEN_READ_WRITE
        | OpenFlags::SQLITE_OPEN_CREATE
        | OpenFlags::SQLITE_OPEN_FULL_MUTEX;
    let connection = Connection::open_with_flags(path, flags)
        .map_err(|err| SqliteStoreError::Io(err.to_string()))?;
    apply_pragmas(&connection, config)?;
    Ok(connection)
}

/// Applies writer pragmas.
fn apply_pragmas(
    connection: &Connection,
    config: &SqliteStoreConfig,
) -> Result<(), SqliteStoreError> {
    connection
        .execute_batch(&format!("PRAGMA journal_mode = {};", config.journal_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .execute_batch(&format!("PRAGMA synchronous = {};", config.sync_mode.pragma_value()))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    connection
        .busy_timeout(Duration::from_millis(config.busy_timeout_ms))
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    Ok(())
}

/// Initializes the schema or validates the existing version.
fn initialize_schema(connection: &mut Connection) -> Result<(), SqliteStoreError> {
    let tx = connection.transaction().map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    tx.execute_batch("CREATE TABLE IF NOT EXISTS store_meta (version INTEGER NOT NULL);")
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    let version: Option<i64> = tx
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => {
            tx.execute("INSERT INTO store_meta (version) VALUES (?1)", params![SCHEMA_VERSION])
                .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
            tx.execute_batch(
                "CREATE TABLE IF NOT EXISTS documents (
                    seq INTEGER PRIMARY KEY AUTOINCREMENT,
                    collection TEXT NOT NULL,
                    run_id TEXT,
                    document_json TEXT NOT NULL
                );
                CREATE INDEX IF NOT EXISTS idx_documents_collection
                    ON documents (collection, seq);
                CREATE INDEX IF NOT EXISTS idx_documents_run_id
                    ON documents (collection, run_id);",
            )
            .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
        }
        Some(SCHEMA_VERSION) => {}
        Some(other) => {
            return Err(SqliteStoreError::VersionMismatch(format!(
                "expected {SCHEMA_VERSION}, found {other}"
            )));
        }
    }
    tx.commit().map_err(|err| SqliteStoreError::Db(err.to_string()))
}

/// Checks the schema of a read-only connection.
///
/// Returns `false` when the file holds no store tables yet.
fn verify_schema(connection: &Connection) -> Result<bool, SqliteStoreError> {
    let has_meta: Option<i64> = connection
        .query_row(
            "SELECT 1 FROM sqlite_master WHERE type = 'table' AND name = 'store_meta'",
            params![],
            |row| row.get(0),
        )
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    if has_meta.is_none() {
        return Ok(false);
    }
    let version: Option<i64> = connection
        .query_row("SELECT version FROM store_meta LIMIT 1", params![], |row| row.get(0))
        .optional()
        .map_err(|err| SqliteStoreError::Db(err.to_string()))?;
    match version {
        None => Ok(false),
        Some(SCHEMA_VERSION) => Ok(true),
        Some(other) => Err(SqliteStoreError::VersionMismatch(format!(
            "expected {SCHEMA_VERSION}, found {other}"
        ))),
    }
}

#[cfg(test)]
mod tests {
    use runboard_core::RepositoryError;

    use super::MAX_DOCUMENT_BYTES;
    use super::SqliteStoreError;
    use super::validate_collection_name;
    use super::validate_database_name;

    #[test]
    fn database_names_are_restricted_to_file_stems() {
        assert!(validate_database_name("mlflow").is_ok());
        assert!(validate_database_name("ml-flow_2").is_ok());
        for name in ["", "../etc", "a/b", "a.b", "name with space", "x".repeat(65).as_str()] {
            assert!(validate_database_name(name).is_err(), "accepted {name:?}");
        }
    }

    #[test]
    fn collection_names_reject_empty_and_nul() {
        assert!(validate_collection_name("model_runs").is_ok());
        assert!(validate_collection_name("runs.archive").is_ok());
        assert!(validate_collection_name("").is_err());
        assert!(validate_collection_name("a\0b").is_err());
    }

    #[test]
    fn store_errors_map_to_repository_kinds() {
        assert!(matches!(
            RepositoryError::from(SqliteStoreError::Io("denied".to_string())),
            RepositoryError::Connection(message) if message == "denied"
        ));
        assert!(matches!(
            RepositoryError::from(SqliteStoreError::Db("locked".to_string())),
            RepositoryError::Query(_)
        ));
        assert!(matches!(
            RepositoryError::from(SqliteStoreError::Corrupt("bad json".to_string())),
            RepositoryError::Serialization(_)
        ));
        assert!(matches!(
            RepositoryError::from(SqliteStoreError::TooLarge {
                max_bytes: MAX_DOCUMENT_BYTES,
                actual_bytes: MAX_DOCUMENT_BYTES + 1,
            }),
            RepositoryError::Serialization(_)
        ));
    }
}
