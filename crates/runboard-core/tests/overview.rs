// crates/runboard-core/tests/overview.rs
// ============================================================================
// Module: Dashboard View Data Tests
// Description: Summary cards, chart points, table rows, and run cards.
// Purpose: Pin the display values and fallbacks derived from run arrays.
// Dependencies: runboard-core, serde_json
// ============================================================================

//! ## Overview
//! Builds view data from representative run arrays and checks the fallbacks
//! (`Unknown`, `N/A`, zero) applied to sparse documents.

#![allow(
    clippy::panic,
    clippy::print_stdout,
    clippy::print_stderr,
    clippy::unwrap_used,
    clippy::expect_used,
    clippy::use_debug,
    clippy::dbg_macro,
    clippy::panic_in_result_fn,
    clippy::unwrap_in_result,
    clippy::float_cmp,
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use runboard_core::ChartPoint;
use runboard_core::OverviewSummary;
use runboard_core::RunCard;
use runboard_core::RunRecord;
use runboard_core::RunRow;
use runboard_core::TestMetrics;
use serde_json::json;

// ============================================================================
// SECTION: Helpers
// ============================================================================

/// Builds a finished and a failed run.
fn sample_runs() -> Vec<RunRecord> {
    vec![
        RunRecord::from_document(json!({
            "run_id": "a1b2c3d4e5f6",
            "start_time": 1_700_000_000_000_i64,
            "end_time": 1_700_000_061_000_i64,
            "status": "FINISHED",
            "metrics": {
                "gpu_energy_kwh": 0.002,
                "gpu_carbon_kg": 0.0008,
                "test_f1_score": 0.9123,
                "test_precision_score": 0.9,
                "test_recall_score": 0.925
            },
            "tags": {"mlflow.runName": "rf-tuned"}
        })),
        RunRecord::from_document(json!({
            "run_id": "ffff0000",
            "start_time": 1_700_000_000_000_i64,
            "end_time": 1_700_000_119_000_i64,
            "status": "FAILED",
            "metrics": {"gpu_energy_kwh": 0.001}
        })),
    ]
}

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn summary_totals_runs_energy_and_duration() {
    let summary = OverviewSummary::from_records(&sample_runs());
    assert_eq!(summary.total_runs, 2);
    assert_eq!(summary.successful_runs, 1);
    assert_eq!(summary.failed_runs, 1);
    assert!((summary.total_energy_kwh - 0.003).abs() < 1e-12);
    assert!((summary.total_carbon_kg - 0.0008).abs() < 1e-12);
    assert_eq!(summary.average_duration_ms, Some(90_000.0));
    assert_eq!(summary.average_duration_label(), "1m 30s");
}

#[test]
fn summary_of_no_runs_guards_average() {
    let summary = OverviewSummary::from_records(&[]);
    assert_eq!(summary.total_runs, 0);
    assert_eq!(summary.failed_runs, 0);
    assert_eq!(summary.average_duration_ms, None);
    assert_eq!(summary.average_duration_label(), "N/A");
}

#[test]
fn chart_series_preserves_order_and_fallbacks() {
    let series = ChartPoint::series(&sample_runs());
    assert_eq!(series.len(), 2);
    assert_eq!(series[0].name, "rf-tuned");
    assert_eq!(series[0].run_id, "a1b2c3d4");
    assert_eq!(series[1].name, "Unknown");
    assert_eq!(series[1].carbon, 0.0);
    let anonymous = ChartPoint::from_record(&RunRecord::default());
    assert_eq!(anonymous.run_id, "Unknown");
}

#[test]
fn table_rows_format_every_column() {
    let rows = RunRow::table(&sample_runs());
    assert_eq!(
        rows[0],
        RunRow {
            run_id: "a1b2c3d4".to_string(),
            model: "rf-tuned".to_string(),
            status: "FINISHED".to_string(),
            successful: true,
            duration: "1m 1s".to_string(),
            energy_kwh: "2.00e-3".to_string(),
            carbon_kg: "8.00e-4".to_string(),
            f1_score: "91.23%".to_string(),
        }
    );
    assert_eq!(rows[1].status, "FAILED");
    assert!(!rows[1].successful);
    assert_eq!(rows[1].duration, "1m 59s");
    assert_eq!(rows[1].carbon_kg, "0.00e+0");
    assert_eq!(rows[1].f1_score, "N/A");
}

#[test]
fn zero_f1_score_renders_as_not_available() {
    let record = RunRecord::from_document(json!({"metrics": {"test_f1_score": 0.0}}));
    assert_eq!(RunRow::from_record(&record).f1_score, "N/A");
    assert_eq!(RunCard::from_record(&record).test_metrics, None);
}

#[test]
fn run_card_includes_test_metrics_when_reported() {
    let runs = sample_runs();
    let card = RunCard::from_record(&runs[0]);
    assert_eq!(card.run_id, "a1b2c3d4e5f6");
    assert_eq!(card.name, "rf-tuned");
    assert_eq!(card.duration, "1m 1s");
    assert_eq!(
        card.test_metrics,
        Some(TestMetrics {
            f1_score: "91.23%".to_string(),
            precision: "90.00%".to_string(),
            recall: "92.50%".to_string(),
        })
    );
    assert_eq!(card.created, "11/14/2023, 10:13:20 PM");

    let failed = RunCard::from_record(&runs[1]);
    assert_eq!(failed.test_metrics, None);
    assert_eq!(failed.status, "FAILED");
}

#[test]
fn run_card_for_empty_record_uses_fallbacks() {
    let card = RunCard::from_record(&RunRecord::default());
    assert_eq!(card.run_id, "");
    assert_eq!(card.name, "Unknown");
    assert_eq!(card.status, "Unknown");
    assert_eq!(card.duration, "0s");
    assert_eq!(card.energy_kwh, "0.00e+0");
    assert_eq!(card.created, "1/1/1970, 12:00:00 AM");
}
