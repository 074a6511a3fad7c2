// crates/runboard-core/src/format.rs
// ============================================================================
// Module: Display Formatting
// Description: Duration, timestamp, percentage, and scientific formatting.
// Purpose: Render run measurements as dashboard strings.
// Dependencies: time
// ============================================================================

//! ## Overview
//! Formatters used by every dashboard view:
//! - durations bucketed as `59s`, `1m 1s`, `1h 1m 1s`;
//! - epoch milliseconds as an en-US style date-time (`1/2/2024, 3:04:05 PM`);
//! - fractions as two-decimal percentages and values in `1.23e-3` notation.

// ============================================================================
// SECTION: Imports
// ============================================================================

use time::OffsetDateTime;
use time::UtcOffset;
use time::macros::format_description;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Label for timestamps outside the representable range.
pub const INVALID_DATE: &str = "Invalid Date";
/// Label for values that cannot be displayed.
pub const NOT_AVAILABLE: &str = "N/A";
/// Nanoseconds per millisecond.
const NANOS_PER_MILLI: i128 = 1_000_000;

// ============================================================================
// SECTION: Durations
// ============================================================================

/// Formats the time between two epoch-millisecond instants.
#[must_use]
pub fn format_duration(start_ms: i64, end_ms: i64) -> String {
    let seconds = end_ms.saturating_sub(start_ms).div_euclid(1_000);
    format_seconds(seconds)
}

/// Formats a fractional elapsed time in milliseconds.
///
/// Non-finite input renders as `N/A`.
#[allow(clippy::cast_possible_truncation, reason = "Float-to-int casts saturate.")]
#[must_use]
pub fn format_elapsed_ms(elapsed_ms: f64) -> String {
    if !elapsed_ms.is_finite() {
        return NOT_AVAILABLE.to_string();
    }
    format_seconds((elapsed_ms / 1_000.0).floor() as i64)
}

/// Buckets whole seconds into `s`, `m s`, or `h m s`.
pub(crate) fn format_seconds(seconds: i64) -> String {
    if seconds < 60 {
        return format!("{seconds}s");
    }
    let minutes = seconds / 60;
    let remaining_seconds = seconds % 60;
    if minutes < 60 {
        return format!("{minutes}m {remaining_seconds}s");
    }
    let hours = minutes / 60;
    let remaining_minutes = minutes % 60;
    format!("{hours}h {remaining_minutes}m {remaining_seconds}s")
}

// ============================================================================
// SECTION: Timestamps
// ============================================================================

/// Formats epoch milliseconds as a UTC date-time string.
#[must_use]
pub fn format_timestamp(epoch_ms: i64) -> String {
    format_timestamp_with_offset(epoch_ms, UtcOffset::UTC)
}

/// Formats epoch milliseconds as a date-time string at the given offset.
#[must_use]
pub fn format_timestamp_with_offset(epoch_ms: i64, offset: UtcOffset) -> String {
    let nanos = i128::from(epoch_ms) * NANOS_PER_MILLI;
    let Ok(utc) = OffsetDateTime::from_unix_timestamp_nanos(nanos) else {
        return INVALID_DATE.to_string();
    };
    let Some(local) = utc.checked_to_offset(offset) else {
        return INVALID_DATE.to_string();
    };
    local
        .format(format_description!(
            "[month padding:none]/[day padding:none]/[year], [hour repr:12 padding:none]:[minute]:[second] [period]"
        ))
        .unwrap_or_else(|_| INVALID_DATE.to_string())
}

// ============================================================================
// SECTION: Numbers
// ============================================================================

/// Formats a 0..1 fraction as a percentage with two decimals.
#[must_use]
pub fn format_percent(fraction: f64) -> String {
    format!("{:.2}%", fraction * 100.0)
}

/// Formats a value in exponential notation with two fraction digits.
///
/// Positive exponents carry an explicit sign (`1.50e+3`).
#[must_use]
pub fn format_scientific(value: f64) -> String {
    if value.is_nan() {
        return "NaN".to_string();
    }
    if value.is_infinite() {
        return if value > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() };
    }
    let formatted = format!("{value:.2e}");
    match formatted.split_once('e') {
        Some((mantissa, exponent)) if !exponent.starts_with('-') => {
            format!("{mantissa}e+{exponent}")
        }
        _ => formatted,
    }
}
