// crates/runboard-client/src/view.rs
// ============================================================================
// Module: Dashboard View
// Description: Render-state selection for dashboard screens.
// Purpose: Pick loading, error, empty, or populated output from a snapshot.
// Dependencies: runboard-core
// ============================================================================

//! ## Overview
//! Dashboard screens show exactly one of four states. Loading wins over an
//! error, an error wins over an empty collection, and only a settled,
//! error-free, non-empty feed renders its records.

// ============================================================================
// SECTION: Imports
// ============================================================================

use runboard_core::RunRecord;

use crate::feed::FeedSnapshot;

// ============================================================================
// SECTION: View
// ============================================================================

/// What a dashboard screen renders for a feed snapshot.
#[derive(Debug, Clone, PartialEq)]
pub enum DashboardView {
    /// A request is in flight.
    Loading,
    /// The last applied request failed with this message.
    Error(String),
    /// The collection holds no runs.
    Empty,
    /// Runs to render, in stored order.
    Ready(Vec<RunRecord>),
}

impl DashboardView {
    /// Selects the view for `snapshot`.
    #[must_use]
    pub fn from_snapshot(snapshot: &FeedSnapshot) -> Self {
        if snapshot.loading {
            return Self::Loading;
        }
        if let Some(error) = &snapshot.error {
            return Self::Error(error.clone());
        }
        if snapshot.records.is_empty() {
            return Self::Empty;
        }
        Self::Ready(snapshot.records.clone())
    }

    /// Returns true when records are ready to render.
    #[must_use]
    pub const fn is_ready(&self) -> bool {
        matches!(self, Self::Ready(_))
    }
}
