// crates/runboard-cli/src/messages.rs
// ============================================================================
// Module: CLI Message Catalog
// Description: Keyed templates for every user-facing CLI string.
// Purpose: Keep CLI wording in one place with named placeholders.
// Dependencies: Standard library collections.
// ============================================================================

//! ## Overview
//! CLI output is routed through the `t!` macro, which looks up a
//! template by key and substitutes `{name}` placeholders.
//!
//! ## Invariants
//! - The catalog is built once and read-only thereafter.
//! - Missing keys render as the key itself.

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::collections::HashMap;
use std::sync::OnceLock;

// ============================================================================
// SECTION: Types
// ============================================================================

/// A formatted argument captured by the `t!` macro.
#[derive(Clone)]
pub struct MessageArg {
    /// Placeholder name without braces.
    pub key: &'static str,
    /// Preformatted substitution value.
    pub value: String,
}

impl MessageArg {
    /// Constructs a new [`MessageArg`].
    pub fn new(key: &'static str, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

// ============================================================================
// SECTION: Catalog
// ============================================================================

/// Catalog entries.
pub const CATALOG: &[(&str, &str)] = &[
    ("main.version", "runboard {version}"),
    ("output.stream.stdout", "stdout"),
    ("output.stream.stderr", "stderr"),
    ("output.stream.unknown", "output"),
    ("output.write_failed", "Failed to write to {stream}: {error}"),
    ("output.json_failed", "Failed to serialize output: {error}"),
    ("config.load_failed", "Failed to load config: {error}"),
    ("config.validate.ok", "Config valid."),
    ("serve.init_failed", "Failed to initialize Runboard server: {error}"),
    ("serve.failed", "Runboard server failed: {error}"),
    ("runs.client_failed", "Failed to create API client: {error}"),
    ("runs.fetch_failed", "Failed to fetch model runs from {url}: {error}"),
    ("runs.list.empty", "No model runs found."),
    ("runs.list.header", "RUN ID\tMODEL\tSTATUS\tDURATION\tENERGY (kWh)\tCO2 (kg)\tF1"),
    ("runs.summary.total", "Total runs: {total} ({successful} successful, {failed} failed)"),
    ("runs.summary.energy", "Total energy: {energy} kWh"),
    ("runs.summary.carbon", "Total carbon: {carbon} kg"),
    ("runs.summary.duration", "Average duration: {duration}"),
    ("import.store_type", "Import requires store.type = \"sqlite\"."),
    ("import.read_failed", "Failed to read {path}: {error}"),
    (
        "import.too_large",
        "Refusing to read {path} because it is {size} bytes (limit {limit}).",
    ),
    ("import.parse_failed", "Failed to parse {path}: {error}"),
    ("import.not_array", "Expected a JSON array of run documents in {path}."),
    ("import.not_object", "Entry {index} in {path} is not a JSON object."),
    ("import.store_failed", "Failed to open run store: {error}"),
    ("import.append_failed", "Failed to import runs: {error}"),
    ("import.ok", "Imported {count} runs into {database}/{collection}."),
];

/// Returns the catalog as a lookup map.
fn catalog() -> &'static HashMap<&'static str, &'static str> {
    static CATALOG_MAP: OnceLock<HashMap<&'static str, &'static str>> = OnceLock::new();
    CATALOG_MAP.get_or_init(|| CATALOG.iter().copied().collect())
}

// ============================================================================
// SECTION: Translation
// ============================================================================

/// Renders `key` with `args` substituted into its placeholders.
#[must_use]
pub fn translate(key: &str, args: Vec<MessageArg>) -> String {
    let template = catalog().get(key).copied().unwrap_or(key);
    let mut result = template.to_string();
    for arg in args {
        let placeholder = format!("{{{}}}", arg.key);
        result = result.replace(&placeholder, &arg.value);
    }
    result
}

// ============================================================================
// SECTION: Macro
// ============================================================================

/// Formats a catalog message from a key and named arguments.
macro_rules! t {
    ($key:literal $(, $name:ident = $value:expr )* $(,)?) => {{
        let args = ::std::vec![
            $(
                $crate::messages::MessageArg::new(stringify!($name), $value.to_string()),
            )*
        ];
        $crate::messages::translate($key, args)
    }};
}
