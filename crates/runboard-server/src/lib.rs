// crates/runboard-server/src/lib.rs
// ============================================================================
// Module: Runboard Server Library
// Description: HTTP API serving stored training runs.
// Purpose: Expose the run collection to dashboard clients.
// Dependencies: axum, runboard-config, runboard-core, tokio
// ============================================================================

//! ## Overview
//! `runboard-server` exposes a read-only JSON API over a run record
//! collection. Every handler resolves the collection selection at request
//! time, reads through a [`runboard_core::RunRepository`] on the blocking
//! pool, and reports an audit event per request.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod audit;
pub mod routes;
pub mod server;


// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use audit::AuditSink;
pub use audit::FileAuditSink;
pub use audit::NoopAuditSink;
pub use audit::RequestAuditEvent;
pub use audit::RequestOutcome;
pub use audit::StartupAuditEvent;
pub use audit::StderrAuditSink;
pub use server::RunboardServer;
pub use server::SelectionSource;
pub use server::ServerError;
pub use server::ServerParts;
