// crates/runboard-core/src/record.rs
// ============================================================================
// Module: Run Record Model
// Description: Lenient typed view over a stored training run document.
// Purpose: Decode externally managed documents without enforcing a shape.
// Dependencies: serde, serde_json
// ============================================================================

//! ## Overview
//! Run documents are written by an external training pipeline and read here
//! as-is. [`RunRecord`] decodes every field leniently: absent, `null`, or
//! mistyped values decode as absent instead of failing the whole record, and
//! unknown fields are preserved in [`RunRecord::extra`].
//!
//! Security posture: document contents are untrusted display data.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::BTreeMap;

use serde::Deserialize;
use serde::Deserializer;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;

// ============================================================================
// SECTION: Well-Known Names
// ============================================================================

/// Status label treated as a successful run.
pub const FINISHED_STATUS: &str = "FINISHED";
/// Metric carrying GPU energy use in kilowatt-hours.
pub const GPU_ENERGY_KWH: &str = "gpu_energy_kwh";
/// Metric carrying GPU carbon emissions in kilograms.
pub const GPU_CARBON_KG: &str = "gpu_carbon_kg";
/// Metric carrying the test-set F1 score (0..1).
pub const TEST_F1_SCORE: &str = "test_f1_score";
/// Metric carrying the test-set precision (0..1).
pub const TEST_PRECISION_SCORE: &str = "test_precision_score";
/// Metric carrying the test-set recall (0..1).
pub const TEST_RECALL_SCORE: &str = "test_recall_score";
/// Metric carrying the training-set F1 score (0..1).
pub const TRAIN_F1_SCORE: &str = "train_f1_score";
/// Metric carrying the training-set precision (0..1).
pub const TRAIN_PRECISION_SCORE: &str = "train_precision_score";
/// Metric carrying the training-set recall (0..1).
pub const TRAIN_RECALL_SCORE: &str = "train_recall_score";
/// Tag carrying the human-readable run name.
pub const RUN_NAME_TAG: &str = "mlflow.runName";
/// Tag carrying the user that launched the run.
pub const RUN_USER_TAG: &str = "mlflow.user";
/// Tag carrying the source commit of the run.
pub const SOURCE_COMMIT_TAG: &str = "mlflow.source.git.commit";
/// Fallback label for absent names and statuses.
pub const UNKNOWN_LABEL: &str = "Unknown";
/// Number of characters shown for abbreviated run identifiers.
pub const SHORT_RUN_ID_LEN: usize = 8;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Response payload recorded by the upstream notification step.
///
/// # Invariants
/// - All fields are optional; the step may record partial payloads.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NotificationResponse {
    /// Notification message text.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
    /// Energy value echoed by the notification step.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub gpu_energy: Option<f64>,
    /// Carbon value echoed by the notification step.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub carbon: Option<f64>,
}

/// One stored training run document.
///
/// # Invariants
/// - Decoding never fails for a JSON object; mistyped fields become absent.
/// - `metrics` holds only numeric entries, `tags` and `params` only strings.
/// - Unknown top-level fields round-trip through `extra`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RunRecord {
    /// Store-assigned document identifier, passed through untouched.
    #[serde(
        rename = "_id",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub document_id: Option<Value>,
    /// Opaque run identifier.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub run_id: Option<String>,
    /// Run start time in epoch milliseconds.
    #[serde(default, deserialize_with = "lenient_millis", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<i64>,
    /// Run end time in epoch milliseconds.
    #[serde(default, deserialize_with = "lenient_millis", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<i64>,
    /// Free-text status label.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    /// Artifact location recorded by the tracking server.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub artifact_uri: Option<String>,
    /// Hyperparameters as strings.
    #[serde(default, deserialize_with = "string_map")]
    pub params: BTreeMap<String, String>,
    /// Numeric metrics by name.
    #[serde(default, deserialize_with = "number_map")]
    pub metrics: BTreeMap<String, f64>,
    /// String tags by name.
    #[serde(default, deserialize_with = "string_map")]
    pub tags: BTreeMap<String, String>,
    /// Upstream notification response, when the run was forwarded.
    #[serde(
        rename = "lambda_response",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub notification_response: Option<NotificationResponse>,
    /// Upstream notification status label.
    #[serde(
        rename = "lambda_status",
        default,
        deserialize_with = "lenient",
        skip_serializing_if = "Option::is_none"
    )]
    pub notification_status: Option<String>,
    /// Time the run was forwarded, in whatever shape the store recorded.
    #[serde(default, deserialize_with = "lenient", skip_serializing_if = "Option::is_none")]
    pub sent_at: Option<Value>,
    /// Remaining top-level fields, preserved verbatim.
    #[serde(flatten)]
    pub extra: BTreeMap<String, Value>,
}

impl RunRecord {
    /// Decodes a stored document, falling back to an empty record for
    /// non-object documents.
    #[must_use]
    pub fn from_document(document: Value) -> Self {
        serde_json::from_value(document).unwrap_or_default()
    }

    /// Returns a metric value when present.
    #[must_use]
    pub fn metric(&self, name: &str) -> Option<f64> {
        self.metrics.get(name).copied()
    }

    /// Returns a metric value, treating absent as zero.
    #[must_use]
    pub fn metric_or_zero(&self, name: &str) -> f64 {
        self.metric(name).unwrap_or(0.0)
    }

    /// Returns a tag value when present.
    #[must_use]
    pub fn tag(&self, name: &str) -> Option<&str> {
        self.tags.get(name).map(String::as_str)
    }

    /// Returns the display name of the run.
    #[must_use]
    pub fn display_name(&self) -> &str {
        self.tag(RUN_NAME_TAG).filter(|name| !name.is_empty()).unwrap_or(UNKNOWN_LABEL)
    }

    /// Returns the status label, or `Unknown` when absent.
    #[must_use]
    pub fn status_label(&self) -> &str {
        self.status.as_deref().filter(|status| !status.is_empty()).unwrap_or(UNKNOWN_LABEL)
    }

    /// Returns true when the run finished successfully.
    #[must_use]
    pub fn is_successful(&self) -> bool {
        self.status.as_deref() == Some(FINISHED_STATUS)
    }

    /// Returns the elapsed time in milliseconds, treating absent bounds as zero.
    #[must_use]
    pub fn elapsed_ms(&self) -> i64 {
        self.end_time.unwrap_or(0).saturating_sub(self.start_time.unwrap_or(0))
    }

    /// Returns the first [`SHORT_RUN_ID_LEN`] characters of the run identifier.
    #[must_use]
    pub fn short_run_id(&self) -> Option<String> {
        self.run_id
            .as_deref()
            .filter(|run_id| !run_id.is_empty())
            .map(|run_id| run_id.chars().take(SHORT_RUN_ID_LEN).collect())
    }
}

// ============================================================================
// SECTION: Lenient Decoding
// ============================================================================

/// Decodes any value, mapping a shape mismatch to `None`.
fn lenient<'de, D, T>(deserializer: D) -> Result<Option<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let value = Value::deserialize(deserializer)?;
    if value.is_null() {
        return Ok(None);
    }
    Ok(serde_json::from_value(value).ok())
}

/// Decodes an epoch-millisecond timestamp from an integer or float.
fn lenient_millis<'de, D>(deserializer: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    Ok(millis_from_value(&value))
}

/// Converts a JSON number into epoch milliseconds.
#[allow(
    clippy::cast_possible_truncation,
    reason = "Float timestamps are floored; out-of-range values saturate."
)]
pub(crate) fn millis_from_value(value: &Value) -> Option<i64> {
    let number = value.as_number()?;
    if let Some(millis) = number.as_i64() {
        return Some(millis);
    }
    number.as_f64().filter(|millis| millis.is_finite()).map(|millis| millis.floor() as i64)
}

/// Decodes a map keeping only numeric entries.
fn number_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Object(entries) = value else {
        return Ok(BTreeMap::new());
    };
    Ok(entries.into_iter().filter_map(|(key, value)| value.as_f64().map(|v| (key, v))).collect())
}

/// Decodes a map keeping only string entries.
fn string_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Value::deserialize(deserializer)?;
    let Value::Object(entries) = value else {
        return Ok(BTreeMap::new());
    };
    Ok(entries
        .into_iter()
        .filter_map(|(key, value)| match value {
            Value::String(text) => Some((key, text)),
            _ => None,
        })
        .collect())
}
