// crates/runboard-core/tests/record_decoding.rs
// ============================================================================
// Module: Run Record Decoding Tests
// Description: Lenient decoding of stored run documents.
// Purpose: Ensure mistyped or missing fields never reject a document.
// Dependencies: runboard-core, serde_json
// ============================================================================

//! ## Overview
//! Stored documents come from an external pipeline; these tests pin how the
//! record view tolerates sparse and malformed shapes.

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
    reason = "Test-only output and panic-based assertions are permitted."
)]

// ============================================================================
// SECTION: Imports
// ============================================================================

use runboard_core::NotificationResponse;
use runboard_core::RunRecord;
use runboard_core::record::GPU_ENERGY_KWH;
use runboard_core::record::RUN_NAME_TAG;
use runboard_core::record::UNKNOWN_LABEL;
use serde_json::json;

// ============================================================================
// SECTION: Tests
// ============================================================================

#[test]
fn decodes_full_tracking_document() {
    let record = RunRecord::from_document(json!({
        "_id": {"$oid": "65f0c0ffee"},
        "run_id": "0123456789abcdef",
        "start_time": 1_700_000_000_000_i64,
        "end_time": 1_700_000_061_000_i64,
        "status": "FINISHED",
        "artifact_uri": "s3://bucket/runs/0123",
        "params": {"lr": "0.01", "epochs": "10"},
        "metrics": {"gpu_energy_kwh": 0.002, "gpu_carbon_kg": 0.0008, "test_f1_score": 0.91},
        "tags": {"mlflow.runName": "xgb-baseline", "mlflow.user": "trainer"},
        "lambda_response": {"message": "ok", "gpu_energy": 0.002, "carbon": 0.0008},
        "lambda_status": "sent",
        "sent_at": {"$date": "2024-03-01T10:00:00Z"}
    }));
    assert_eq!(record.document_id, Some(json!({"$oid": "65f0c0ffee"})));
    assert_eq!(record.run_id.as_deref(), Some("0123456789abcdef"));
    assert_eq!(record.elapsed_ms(), 61_000);
    assert!(record.is_successful());
    assert_eq!(record.params.get("epochs").map(String::as_str), Some("10"));
    assert_eq!(record.metric(GPU_ENERGY_KWH), Some(0.002));
    assert_eq!(record.display_name(), "xgb-baseline");
    assert_eq!(record.short_run_id().as_deref(), Some("01234567"));
    assert_eq!(
        record.notification_response,
        Some(NotificationResponse {
            message: Some("ok".to_string()),
            gpu_energy: Some(0.002),
            carbon: Some(0.0008),
        })
    );
    assert_eq!(record.notification_status.as_deref(), Some("sent"));
    assert!(record.extra.is_empty());
}

#[test]
fn mistyped_fields_decode_as_absent() {
    let record = RunRecord::from_document(json!({
        "run_id": 42,
        "start_time": "yesterday",
        "end_time": null,
        "status": ["FINISHED"],
        "metrics": {"gpu_energy_kwh": "lots", "gpu_carbon_kg": 0.5},
        "tags": {"mlflow.runName": 7, "team": "vision"},
        "lambda_response": "timeout"
    }));
    assert_eq!(record.run_id, None);
    assert_eq!(record.start_time, None);
    assert_eq!(record.end_time, None);
    assert_eq!(record.status, None);
    assert_eq!(record.metric(GPU_ENERGY_KWH), None);
    assert_eq!(record.metric("gpu_carbon_kg"), Some(0.5));
    assert_eq!(record.tag(RUN_NAME_TAG), None);
    assert_eq!(record.tag("team"), Some("vision"));
    assert_eq!(record.notification_response, None);
}

#[test]
fn absent_fields_fall_back_to_display_defaults() {
    let record = RunRecord::from_document(json!({}));
    assert_eq!(record.display_name(), UNKNOWN_LABEL);
    assert_eq!(record.status_label(), UNKNOWN_LABEL);
    assert!(!record.is_successful());
    assert_eq!(record.elapsed_ms(), 0);
    assert_eq!(record.short_run_id(), None);
    assert_eq!(record.metric_or_zero(GPU_ENERGY_KWH), 0.0);
}

#[test]
fn non_object_document_decodes_as_empty_record() {
    assert_eq!(RunRecord::from_document(json!("not a run")), RunRecord::default());
    assert_eq!(RunRecord::from_document(json!([1, 2, 3])), RunRecord::default());
}

#[test]
fn unknown_fields_round_trip_through_extra() {
    let document = json!({
        "run_id": "abc",
        "experiment_id": "7",
        "lifecycle_stage": "active"
    });
    let record = RunRecord::from_document(document.clone());
    assert_eq!(record.extra.get("experiment_id"), Some(&json!("7")));
    let encoded = serde_json::to_value(&record).unwrap();
    assert_eq!(encoded.get("experiment_id"), Some(&json!("7")));
    assert_eq!(encoded.get("lifecycle_stage"), Some(&json!("active")));
    assert_eq!(encoded.get("run_id"), Some(&json!("abc")));
}

#[test]
fn float_timestamps_are_floored() {
    let record = RunRecord::from_document(json!({"start_time": 1000.7, "end_time": 2500.2}));
    assert_eq!(record.start_time, Some(1000));
    assert_eq!(record.end_time, Some(2500));
}

#[test]
fn short_run_id_respects_character_boundaries() {
    let record = RunRecord::from_document(json!({"run_id": "ééééééééé"}));
    assert_eq!(record.short_run_id().as_deref(), Some("éééééééé"));
    let short = RunRecord::from_document(json!({"run_id": "abc"}));
    assert_eq!(short.short_run_id().as_deref(), Some("abc"));
}
