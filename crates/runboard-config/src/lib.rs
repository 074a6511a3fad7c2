// crates/runboard-config/src/lib.rs
// ============================================================================
// Module: Runboard Config Library
// Description: Canonical config model and validation.
// Purpose: Single source of truth for runboard.toml semantics.
// Dependencies: runboard-core, runboard-store-sqlite, serde, toml
// ============================================================================

//! ## Overview
//! `runboard-config` defines the configuration model for the Runboard server
//! and CLI. Loading is strict and fail-closed; the collection selection is
//! resolved against the environment on every call so operators can repoint
//! the server without a restart.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod config;

// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use config::*;
