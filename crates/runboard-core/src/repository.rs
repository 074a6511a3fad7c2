// crates/runboard-core/src/repository.rs
// ============================================================================
// Module: Run Repository
// Description: Read interface over a document collection of run records.
// Purpose: Decouple the HTTP layer from the backing document store.
// Dependencies: serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! [`RunRepository`] returns every stored document of a selected
//! database/collection pair: unfiltered, unsorted, and unpaginated, in the
//! order the store holds them. Documents are returned as raw JSON so the
//! endpoint can pass them through untouched.
//!
//! [`InMemoryRunRepository`] backs tests and the `memory` store type;
//! durable backends live in separate crates.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;
use std::sync::Mutex;

use serde::Deserialize;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Default database name.
pub const DEFAULT_DATABASE: &str = "mlflow";
/// Default collection name.
pub const DEFAULT_COLLECTION: &str = "model_runs";

// ============================================================================
// SECTION: Types
// ============================================================================

/// Database/collection pair a read is served from.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct CollectionSelection {
    /// Database name.
    pub database: String,
    /// Collection name.
    pub collection: String,
}

impl CollectionSelection {
    /// Creates a selection from database and collection names.
    #[must_use]
    pub fn new(database: impl Into<String>, collection: impl Into<String>) -> Self {
        Self {
            database: database.into(),
            collection: collection.into(),
        }
    }
}

impl Default for CollectionSelection {
    fn default() -> Self {
        Self::new(DEFAULT_DATABASE, DEFAULT_COLLECTION)
    }
}

impl fmt::Display for CollectionSelection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.database, self.collection)
    }
}

/// Repository errors.
///
/// # Invariants
/// - Payloads carry the underlying error text and are never empty.
#[derive(Debug, Error)]
pub enum RepositoryError {
    /// The store could not be reached or opened.
    #[error("run repository connection error: {0}")]
    Connection(String),
    /// The store rejected or failed the read.
    #[error("run repository query error: {0}")]
    Query(String),
    /// A stored document could not be decoded or encoded.
    #[error("run repository serialization error: {0}")]
    Serialization(String),
}

// ============================================================================
// SECTION: Repository Interface
// ============================================================================

/// Read access to stored run documents.
pub trait RunRepository {
    /// Returns every document in the selected collection, in stored order.
    ///
    /// A collection that does not exist yields an empty list.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] when the store cannot be read.
    fn fetch_all(&self, selection: &CollectionSelection) -> Result<Vec<Value>, RepositoryError>;

    /// Returns the first document whose `run_id` matches.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError`] when the store cannot be read.
    fn find_by_run_id(
        &self,
        selection: &CollectionSelection,
        run_id: &str,
    ) -> Result<Option<Value>, RepositoryError> {
        Ok(self
            .fetch_all(selection)?
            .into_iter()
            .find(|document| document_run_id(document) == Some(run_id)))
    }
}

/// Returns the `run_id` string field of a document.
#[must_use]
pub fn document_run_id(document: &Value) -> Option<&str> {
    document.get("run_id").and_then(Value::as_str)
}

// ============================================================================
// SECTION: In-Memory Repository
// ============================================================================

/// In-memory run repository for tests and local demos.
#[derive(Debug, Default, Clone)]
pub struct InMemoryRunRepository {
    /// Documents per collection, in insertion order.
    collections: Arc<Mutex<BTreeMap<CollectionSelection, Vec<Value>>>>,
}

impl InMemoryRunRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends documents to a collection.
    ///
    /// # Errors
    ///
    /// Returns [`RepositoryError::Connection`] when the repository lock is poisoned.
    pub fn insert_many(
        &self,
        selection: &CollectionSelection,
        documents: impl IntoIterator<Item = Value>,
    ) -> Result<(), RepositoryError> {
        self.collections
            .lock()
            .map_err(|_| RepositoryError::Connection("run repository mutex poisoned".to_string()))?
            .entry(selection.clone())
            .or_default()
            .extend(documents);
        Ok(())
    }
}

impl RunRepository for InMemoryRunRepository {
    fn fetch_all(&self, selection: &CollectionSelection) -> Result<Vec<Value>, RepositoryError> {
        let guard = self
            .collections
            .lock()
            .map_err(|_| RepositoryError::Connection("run repository mutex poisoned".to_string()))?;
        Ok(guard.get(selection).cloned().unwrap_or_default())
    }
}

// ============================================================================
// SECTION: Shared Repository Wrapper
// ============================================================================

/// Shared run repository backed by an `Arc` trait object.
#[derive(Clone)]
pub struct SharedRunRepository {
    /// Inner repository implementation.
    inner: Arc<dyn RunRepository + Send + Sync>,
}

impl SharedRunRepository {
    /// Wraps a repository in a shared, clonable wrapper.
    #[must_use]
    pub fn from_repository(repository: impl RunRepository + Send + Sync + 'static) -> Self {
        Self {
            inner: Arc::new(repository),
        }
    }

    /// Wraps an existing shared repository.
    #[must_use]
    pub const fn new(repository: Arc<dyn RunRepository + Send + Sync>) -> Self {
        Self {
            inner: repository,
        }
    }
}

impl RunRepository for SharedRunRepository {
    fn fetch_all(&self, selection: &CollectionSelection) -> Result<Vec<Value>, RepositoryError> {
        self.inner.fetch_all(selection)
    }

    fn find_by_run_id(
        &self,
        selection: &CollectionSelection,
        run_id: &str,
    ) -> Result<Option<Value>, RepositoryError> {
        self.inner.find_by_run_id(selection, run_id)
    }
}
