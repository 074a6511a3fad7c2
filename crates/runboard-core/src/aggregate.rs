// crates/runboard-core/src/aggregate.rs
// ============================================================================
// Module: Run Aggregation
// Description: Pure reductions over a fetched array of run records.
// Purpose: Compute totals, counts, and averages for dashboard summaries.
// Dependencies: crate::record
// ============================================================================

//! ## Overview
//! Stateless reductions over `&[RunRecord]`. Absent metrics and timestamps
//! count as zero. The only division, [`average_duration_ms`], returns `None`
//! for an empty slice instead of a non-finite value.

// ============================================================================
// SECTION: Imports
// ============================================================================

use crate::record::RunRecord;

// ============================================================================
// SECTION: Reductions
// ============================================================================

/// Sums a metric across records, treating absent values as zero.
#[must_use]
pub fn sum_metric(records: &[RunRecord], name: &str) -> f64 {
    records.iter().map(|record| record.metric_or_zero(name)).sum()
}

/// Counts records matching a predicate.
#[must_use]
pub fn count_matching<F>(records: &[RunRecord], predicate: F) -> usize
where
    F: Fn(&RunRecord) -> bool,
{
    records.iter().filter(|record| predicate(record)).count()
}

/// Counts records whose status marks a successful run.
#[must_use]
pub fn count_successful(records: &[RunRecord]) -> usize {
    count_matching(records, RunRecord::is_successful)
}

/// Sums elapsed time across records in milliseconds.
#[allow(clippy::cast_precision_loss, reason = "Durations are summed as display values.")]
#[must_use]
pub fn total_elapsed_ms(records: &[RunRecord]) -> f64 {
    records.iter().map(|record| record.elapsed_ms() as f64).sum()
}

/// Returns the mean elapsed time in milliseconds, or `None` with no records.
#[allow(clippy::cast_precision_loss, reason = "Record counts are far below 2^52.")]
#[must_use]
pub fn average_duration_ms(records: &[RunRecord]) -> Option<f64> {
    if records.is_empty() {
        return None;
    }
    Some(total_elapsed_ms(records) / records.len() as f64)
}
