// crates/runboard-core/src/lib.rs
// ============================================================================
// Module: Runboard Core Library
// Description: Run record model, repository seam, and pure view arithmetic.
// Purpose: Single source of truth for how stored runs are read and summarized.
// Dependencies: serde, serde_json, thiserror, time
// ============================================================================

//! ## Overview
//! `runboard-core` defines the [`RunRecord`] view over externally managed
//! training run documents, the [`RunRepository`] interface used by the HTTP
//! layer to read a whole collection, and the stateless aggregation and
//! formatting functions the dashboard views are built from.
//!
//! Invariants:
//! - Stored documents are never validated or rewritten; absent fields default
//!   at display time.
//! - Aggregations treat absent metrics as zero.

// ============================================================================
// SECTION: Modules
// ============================================================================

pub mod aggregate;
pub mod footprint;
pub mod format;
pub mod overview;
pub mod record;
pub mod repository;


// ============================================================================
// SECTION: Re-Exports
// ============================================================================

pub use aggregate::average_duration_ms;
pub use aggregate::count_matching;
pub use aggregate::count_successful;
pub use aggregate::sum_metric;
pub use aggregate::total_elapsed_ms;
pub use footprint::Footprint;
pub use format::format_duration;
pub use format::format_elapsed_ms;
pub use format::format_percent;
pub use format::format_scientific;
pub use format::format_timestamp;
pub use format::format_timestamp_with_offset;
pub use overview::ChartPoint;
pub use overview::OverviewSummary;
pub use overview::RunCard;
pub use overview::RunRow;
pub use overview::TestMetrics;
pub use record::NotificationResponse;
pub use record::RunRecord;
pub use repository::CollectionSelection;
pub use repository::InMemoryRunRepository;
pub use repository::RepositoryError;
pub use repository::RunRepository;
pub use repository::SharedRunRepository;
