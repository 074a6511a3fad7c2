// crates/runboard-server/src/audit.rs
// ============================================================================
// Module: Runboard Audit Logging
// Description: Structured audit events for API request handling.
// Purpose: Emit JSON-lines request and startup records.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Audit events are serialized as one JSON object per line. Sinks write to
//! stderr, to an append-only file, or nowhere. Write failures are dropped so
//! logging never fails a request.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::OpenOptions;
use std::io;
use std::io::Write;
use std::path::Path;
use std::sync::Mutex;
use std::time::SystemTime;
use std::time::UNIX_EPOCH;

use serde::Serialize;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Outcome classification for a handled request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum RequestOutcome {
    /// Request served successfully.
    Ok,
    /// Requested run was not found.
    NotFound,
    /// Request parameters were rejected.
    BadRequest,
    /// Repository read failed.
    Error,
}

/// Request audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct RequestAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Matched route template.
    pub route: &'static str,
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
    /// Database the request read from.
    pub database: Option<String>,
    /// Collection the request read from.
    pub collection: Option<String>,
    /// Request outcome.
    pub outcome: RequestOutcome,
    /// HTTP status code returned.
    pub status: u16,
    /// Number of records returned on success.
    pub record_count: Option<usize>,
    /// Error detail on failure.
    pub error: Option<String>,
}

/// Inputs required to construct a request audit event.
pub struct RequestAuditEventParams {
    /// Matched route template.
    pub route: &'static str,
    /// Peer IP address when available.
    pub peer_ip: Option<String>,
    /// Database the request read from.
    pub database: Option<String>,
    /// Collection the request read from.
    pub collection: Option<String>,
    /// Request outcome.
    pub outcome: RequestOutcome,
    /// HTTP status code returned.
    pub status: u16,
    /// Number of records returned on success.
    pub record_count: Option<usize>,
    /// Error detail on failure.
    pub error: Option<String>,
}

impl RequestAuditEvent {
    /// Creates a new request audit event with a consistent timestamp.
    #[must_use]
    pub fn new(params: RequestAuditEventParams) -> Self {
        Self {
            event: "runboard_request",
            timestamp_ms: now_ms(),
            route: params.route,
            peer_ip: params.peer_ip,
            database: params.database,
            collection: params.collection,
            outcome: params.outcome,
            status: params.status,
            record_count: params.record_count,
            error: params.error,
        }
    }
}

/// Server startup audit event payload.
#[derive(Debug, Clone, Serialize)]
pub struct StartupAuditEvent {
    /// Event identifier.
    pub event: &'static str,
    /// Event timestamp (milliseconds since epoch).
    pub timestamp_ms: u128,
    /// Bound socket address.
    pub bind: String,
    /// Database selected at startup.
    pub database: String,
    /// Collection selected at startup.
    pub collection: String,
}

impl StartupAuditEvent {
    /// Creates a new startup audit event with a consistent timestamp.
    #[must_use]
    pub fn new(bind: String, database: String, collection: String) -> Self {
        Self {
            event: "runboard_startup",
            timestamp_ms: now_ms(),
            bind,
            database,
            collection,
        }
    }
}

/// Returns milliseconds since the Unix epoch.
fn now_ms() -> u128 {
    SystemTime::now().duration_since(UNIX_EPOCH).unwrap_or_default().as_millis()
}

// ============================================================================
// SECTION: Trait
// ============================================================================

/// Audit sink for server events.
pub trait AuditSink: Send + Sync {
    /// Record a request audit event.
    fn record(&self, event: &RequestAuditEvent);

    /// Record a startup audit event.
    fn record_startup(&self, _event: &StartupAuditEvent) {}
}

/// Audit sink that logs JSON lines to stderr.
pub struct StderrAuditSink;

impl AuditSink for StderrAuditSink {
    fn record(&self, event: &RequestAuditEvent) {
        write_stderr_json(event);
    }

    fn record_startup(&self, event: &StartupAuditEvent) {
        write_stderr_json(event);
    }
}

/// Writes a serialized event line to stderr.
fn write_stderr_json<T: Serialize>(event: &T) {
    if let Ok(payload) = serde_json::to_string(event) {
        let _ = writeln!(std::io::stderr(), "{payload}");
    }
}

/// Audit sink that logs JSON lines to a file.
pub struct FileAuditSink {
    /// File handle used for append-only logging.
    file: Mutex<std::fs::File>,
}

impl FileAuditSink {
    /// Opens the audit log file in append mode.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be opened.
    pub fn new(path: &Path) -> io::Result<Self> {
        let file = OpenOptions::new().create(true).append(true).open(path)?;
        Ok(Self {
            file: Mutex::new(file),
        })
    }

    /// Appends a serialized event line.
    fn append<T: Serialize>(&self, event: &T) {
        if let Ok(payload) = serde_json::to_string(event)
            && let Ok(mut file) = self.file.lock()
        {
            let _ = writeln!(file, "{payload}");
            let _ = file.flush();
        }
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, event: &RequestAuditEvent) {
        self.append(event);
    }

    fn record_startup(&self, event: &StartupAuditEvent) {
        self.append(event);
    }
}

/// No-op audit sink.
pub struct NoopAuditSink;

impl AuditSink for NoopAuditSink {
    fn record(&self, _event: &RequestAuditEvent) {}
}
