// crates/runboard-core/src/overview.rs
// ============================================================================
// Module: Dashboard View Data
// Description: Summary cards, chart series, table rows, and run cards.
// Purpose: Derive every dashboard value from a fetched run array.
// Dependencies: crate::aggregate, crate::format, crate::record, serde
// ============================================================================

//! ## Overview
//! Pure projections from `&[RunRecord]` to the values the dashboard shows.
//! Layout and styling live elsewhere; these types carry display-ready data
//! with the `Unknown` / `N/A` / zero fallbacks already applied.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Serialize;

use crate::aggregate::average_duration_ms;
use crate::aggregate::count_successful;
use crate::aggregate::sum_metric;
use crate::format::NOT_AVAILABLE;
use crate::format::format_duration;
use crate::format::format_elapsed_ms;
use crate::format::format_percent;
use crate::format::format_scientific;
use crate::format::format_timestamp;
use crate::record::GPU_CARBON_KG;
use crate::record::GPU_ENERGY_KWH;
use crate::record::RunRecord;
use crate::record::TEST_F1_SCORE;
use crate::record::TEST_PRECISION_SCORE;
use crate::record::TEST_RECALL_SCORE;
use crate::record::UNKNOWN_LABEL;

// ============================================================================
// SECTION: Summary Cards
// ============================================================================

/// Totals shown on the overview cards.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OverviewSummary {
    /// Number of runs in the collection.
    pub total_runs: usize,
    /// Runs with a `FINISHED` status.
    pub successful_runs: usize,
    /// Runs with any other status.
    pub failed_runs: usize,
    /// Total GPU energy in kilowatt-hours.
    pub total_energy_kwh: f64,
    /// Total GPU carbon emissions in kilograms.
    pub total_carbon_kg: f64,
    /// Mean training duration in milliseconds; `None` with no runs.
    pub average_duration_ms: Option<f64>,
}

impl OverviewSummary {
    /// Computes the overview totals for a run array.
    #[must_use]
    pub fn from_records(records: &[RunRecord]) -> Self {
        let total_runs = records.len();
        let successful_runs = count_successful(records);
        Self {
            total_runs,
            successful_runs,
            failed_runs: total_runs - successful_runs,
            total_energy_kwh: sum_metric(records, GPU_ENERGY_KWH),
            total_carbon_kg: sum_metric(records, GPU_CARBON_KG),
            average_duration_ms: average_duration_ms(records),
        }
    }

    /// Returns the average duration label, or `N/A` with no runs.
    #[must_use]
    pub fn average_duration_label(&self) -> String {
        self.average_duration_ms.map_or_else(|| NOT_AVAILABLE.to_string(), format_elapsed_ms)
    }
}

// ============================================================================
// SECTION: Chart Series
// ============================================================================

/// One bar-chart point: energy and carbon for a run.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    /// Run display name.
    pub name: String,
    /// GPU energy in kilowatt-hours.
    pub energy: f64,
    /// GPU carbon emissions in kilograms.
    pub carbon: f64,
    /// Abbreviated run identifier used as the axis label.
    pub run_id: String,
}

impl ChartPoint {
    /// Builds the chart series, one point per record in input order.
    #[must_use]
    pub fn series(records: &[RunRecord]) -> Vec<Self> {
        records.iter().map(Self::from_record).collect()
    }

    /// Builds a chart point for a single record.
    #[must_use]
    pub fn from_record(record: &RunRecord) -> Self {
        Self {
            name: record.display_name().to_string(),
            energy: record.metric_or_zero(GPU_ENERGY_KWH),
            carbon: record.metric_or_zero(GPU_CARBON_KG),
            run_id: record.short_run_id().unwrap_or_else(|| UNKNOWN_LABEL.to_string()),
        }
    }
}

// ============================================================================
// SECTION: Table Rows
// ============================================================================

/// One row of the training runs table.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunRow {
    /// Abbreviated run identifier (empty when absent).
    pub run_id: String,
    /// Run display name.
    pub model: String,
    /// Status label.
    pub status: String,
    /// Whether the status marks success.
    pub successful: bool,
    /// Formatted duration.
    pub duration: String,
    /// Energy in exponential notation.
    pub energy_kwh: String,
    /// Carbon in exponential notation.
    pub carbon_kg: String,
    /// Test F1 as a percentage, or `N/A`.
    pub f1_score: String,
}

impl RunRow {
    /// Builds table rows, one per record in input order.
    #[must_use]
    pub fn table(records: &[RunRecord]) -> Vec<Self> {
        records.iter().map(Self::from_record).collect()
    }

    /// Builds a table row for a single record.
    #[must_use]
    pub fn from_record(record: &RunRecord) -> Self {
        Self {
            run_id: record.short_run_id().unwrap_or_default(),
            model: record.display_name().to_string(),
            status: record.status_label().to_string(),
            successful: record.is_successful(),
            duration: format_duration(record.start_time.unwrap_or(0), record.end_time.unwrap_or(0)),
            energy_kwh: format_scientific(record.metric_or_zero(GPU_ENERGY_KWH)),
            carbon_kg: format_scientific(record.metric_or_zero(GPU_CARBON_KG)),
            f1_score: reported_score(record, TEST_F1_SCORE)
                .map_or_else(|| NOT_AVAILABLE.to_string(), format_percent),
        }
    }
}

// ============================================================================
// SECTION: Run Cards
// ============================================================================

/// Test-set quality metrics shown on a run card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct TestMetrics {
    /// F1 score percentage.
    pub f1_score: String,
    /// Precision percentage.
    pub precision: String,
    /// Recall percentage.
    pub recall: String,
}

/// Detailed per-run card.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RunCard {
    /// Full run identifier (empty when absent).
    pub run_id: String,
    /// Run display name.
    pub name: String,
    /// Status label.
    pub status: String,
    /// Whether the status marks success.
    pub successful: bool,
    /// Formatted duration.
    pub duration: String,
    /// Energy in exponential notation.
    pub energy_kwh: String,
    /// Carbon in exponential notation.
    pub carbon_kg: String,
    /// Test metrics; present only when a non-zero F1 score was reported.
    pub test_metrics: Option<TestMetrics>,
    /// Formatted start timestamp.
    pub created: String,
}

impl RunCard {
    /// Builds a run card for a single record.
    #[must_use]
    pub fn from_record(record: &RunRecord) -> Self {
        let test_metrics = reported_score(record, TEST_F1_SCORE).map(|f1| TestMetrics {
            f1_score: format_percent(f1),
            precision: format_percent(record.metric_or_zero(TEST_PRECISION_SCORE)),
            recall: format_percent(record.metric_or_zero(TEST_RECALL_SCORE)),
        });
        Self {
            run_id: record.run_id.clone().unwrap_or_default(),
            name: record.display_name().to_string(),
            status: record.status_label().to_string(),
            successful: record.is_successful(),
            duration: format_duration(record.start_time.unwrap_or(0), record.end_time.unwrap_or(0)),
            energy_kwh: format_scientific(record.metric_or_zero(GPU_ENERGY_KWH)),
            carbon_kg: format_scientific(record.metric_or_zero(GPU_CARBON_KG)),
            test_metrics,
            created: format_timestamp(record.start_time.unwrap_or(0)),
        }
    }
}

/// Returns a score only when it was reported with a non-zero value.
fn reported_score(record: &RunRecord, name: &str) -> Option<f64> {
    record.metric(name).filter(|score| *score != 0.0 && !score.is_nan())
}
