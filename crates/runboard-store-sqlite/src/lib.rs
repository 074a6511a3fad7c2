// crates/runboard-store-sqlite/src/lib.rs
// ============================================================================
// Module: Runboard SQLite Store
// Description: SQLite-backed document collections for run records.
// Purpose: Durable RunRepository implementation.
// Dependencies: runboard-core, rusqlite, serde, serde_json, thiserror
// ============================================================================

//! ## Overview
//! Each logical database is one `SQLite` file under a configured root
//! directory. Collections are rows of raw JSON documents keyed by insertion
//! sequence, so reads return documents exactly as they were stored.

pub mod store;

pub use store::MAX_DOCUMENT_BYTES;
pub use store::SqliteRunRepository;
pub use store::SqliteStoreConfig;
pub use store::SqliteStoreError;
pub use store::SqliteStoreMode;
pub use store::SqliteSyncMode;
