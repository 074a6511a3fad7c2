// crates/runboard-core/src/footprint.rs
// ============================================================================
// Module: Run Footprints
// Description: Energy and carbon projection of a run record.
// Purpose: Compact per-run resource view served by the footprints route.
// Dependencies: crate::record, serde
// ============================================================================

//! ## Overview
//! A [`Footprint`] lifts the GPU energy and carbon metrics out of a run's
//! metrics map next to its identity, bounds, and status. Absent metrics read
//! as `0.0` and an absent status as `unknown`.

// ============================================================================
// SECTION: Imports
// ============================================================================

use serde::Deserialize;
use serde::Serialize;

use crate::record::GPU_CARBON_KG;
use crate::record::GPU_ENERGY_KWH;
use crate::record::RunRecord;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Status reported for runs without a status field.
pub const UNKNOWN_STATUS: &str = "unknown";
/// Default page size for footprint listings.
pub const DEFAULT_FOOTPRINT_LIMIT: usize = 100;
/// Largest accepted page size for footprint listings.
pub const MAX_FOOTPRINT_LIMIT: usize = 1_000;

// ============================================================================
// SECTION: Types
// ============================================================================

/// Resource footprint of a single run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Footprint {
    /// Run identifier, when stored.
    pub run_id: Option<String>,
    /// GPU energy in kilowatt-hours.
    pub gpu_energy_kwh: f64,
    /// GPU carbon emissions in kilograms.
    pub gpu_carbon_kg: f64,
    /// Start time in epoch milliseconds.
    pub start_time: Option<i64>,
    /// End time in epoch milliseconds.
    pub end_time: Option<i64>,
    /// Run status.
    pub status: String,
}

impl Footprint {
    /// Projects a record onto its footprint.
    #[must_use]
    pub fn from_record(record: &RunRecord) -> Self {
        Self {
            run_id: record.run_id.clone(),
            gpu_energy_kwh: record.metric_or_zero(GPU_ENERGY_KWH),
            gpu_carbon_kg: record.metric_or_zero(GPU_CARBON_KG),
            start_time: record.start_time,
            end_time: record.end_time,
            status: record.status.clone().unwrap_or_else(|| UNKNOWN_STATUS.to_string()),
        }
    }

    /// Projects one page of records, skipping `skip` and keeping at most `limit`.
    #[must_use]
    pub fn page(records: &[RunRecord], skip: usize, limit: usize) -> Vec<Self> {
        records.iter().skip(skip).take(limit).map(Self::from_record).collect()
    }
}
