//! Config load validation tests for runboard-config.
// crates/runboard-config/tests/load_validation.rs
// =============================================================================
// Module: Config Load Validation Tests
// Description: Validate config loading guards (path, size, encoding).
// Purpose: Ensure config input handling is strict and fail-closed.
// =============================================================================

#![allow(
    clippy::use_debug,
    reason = "Failure messages include debug renderings of config sections."
)]

use std::io::Write;
use std::path::Path;

use runboard_config::ConfigError;
use runboard_config::RunboardConfig;
use runboard_config::StoreType;
use tempfile::NamedTempFile;
use tempfile::TempDir;

/// Result type for fallible test bodies.
type TestResult = Result<(), String>;

/// Asserts that a load failed with a message containing `needle`.
fn assert_invalid(result: Result<RunboardConfig, ConfigError>, needle: &str) -> TestResult {
    match result {
        Err(error) => {
            let message = error.to_string();
            if message.contains(needle) {
                Ok(())
            } else {
                Err(format!("error {message} did not contain {needle}"))
            }
        }
        Ok(_) => Err("expected invalid config load".to_string()),
    }
}

/// Writes config text to a temp file.
fn write_config(content: &str) -> Result<NamedTempFile, String> {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(content.as_bytes()).map_err(|err| err.to_string())?;
    Ok(file)
}

#[test]
fn load_rejects_path_too_long() -> TestResult {
    let long_path = "a".repeat(5_000);
    assert_invalid(RunboardConfig::load(Some(Path::new(&long_path))), "config path exceeds max length")
}

#[test]
fn load_rejects_path_component_too_long() -> TestResult {
    let long_component = "a".repeat(300);
    assert_invalid(
        RunboardConfig::load(Some(Path::new(&long_component))),
        "config path component too long",
    )
}

#[test]
fn load_rejects_oversized_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    let payload = vec![b'#'; 1_048_577];
    file.write_all(&payload).map_err(|err| err.to_string())?;
    assert_invalid(RunboardConfig::load(Some(file.path())), "config file exceeds size limit")
}

#[test]
fn load_rejects_non_utf8_file() -> TestResult {
    let mut file = NamedTempFile::new().map_err(|err| err.to_string())?;
    file.write_all(&[0xFF, 0xFE, 0xFF]).map_err(|err| err.to_string())?;
    assert_invalid(RunboardConfig::load(Some(file.path())), "config file must be utf-8")
}

#[test]
fn load_rejects_missing_explicit_file() -> TestResult {
    let dir = TempDir::new().map_err(|err| err.to_string())?;
    let missing = dir.path().join("absent.toml");
    assert_invalid(RunboardConfig::load(Some(&missing)), "config io error")
}

#[test]
fn load_rejects_unknown_fields() -> TestResult {
    let file = write_config("[server]\nbind = \"127.0.0.1:9000\"\nworkers = 4\n")?;
    assert_invalid(RunboardConfig::load(Some(file.path())), "config parse error")
}

#[test]
fn load_reads_full_config() -> TestResult {
    let file = write_config(
        r#"
[server]
bind = "0.0.0.0:9090"
max_body_bytes = 4096

[collection]
database = "tracking"
collection = "runs"

[store]
type = "memory"
busy_timeout_ms = 250

[audit]
enabled = false
path = "audit.jsonl"
"#,
    )?;
    let config = RunboardConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    let bind = config.server.bind_addr().map_err(|err| err.to_string())?;
    if bind.port() != 9090 || config.server.max_body_bytes != 4096 {
        return Err(format!("unexpected server config: {:?}", config.server));
    }
    if config.collection.database != "tracking" || config.collection.collection != "runs" {
        return Err(format!("unexpected collection config: {:?}", config.collection));
    }
    if config.store.store_type != StoreType::Memory || config.store.busy_timeout_ms != 250 {
        return Err(format!("unexpected store config: {:?}", config.store));
    }
    if config.audit.enabled || config.audit.path.as_deref() != Some("audit.jsonl") {
        return Err(format!("unexpected audit config: {:?}", config.audit));
    }
    Ok(())
}

#[test]
fn empty_file_yields_defaults() -> TestResult {
    let file = write_config("")?;
    let config = RunboardConfig::load(Some(file.path())).map_err(|err| err.to_string())?;
    if config.server.bind != "127.0.0.1:8080" {
        return Err(format!("unexpected default bind {}", config.server.bind));
    }
    let selection = config.collection.selection();
    if selection.database != "mlflow" || selection.collection != "model_runs" {
        return Err(format!("unexpected default selection {selection}"));
    }
    if config.store.store_type != StoreType::Sqlite || config.store.root != "data" {
        return Err(format!("unexpected default store {:?}", config.store));
    }
    if !config.audit.enabled {
        return Err("audit should default to enabled".to_string());
    }
    Ok(())
}
