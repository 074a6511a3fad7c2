// crates/runboard-cli/src/main.rs
// ============================================================================
// Module: Runboard CLI Entry Point
// Description: Command dispatcher for serving, inspecting, and importing runs.
// Purpose: Provide a small operator CLI over the Runboard crates.
// Dependencies: clap, runboard-client, runboard-config, runboard-server, serde, tokio
// ============================================================================

//! ## Overview
//! `runboard` starts the API server, validates configuration, prints run
//! tables and overview totals fetched from a running server, and imports
//! run documents into the SQLite store. User-facing strings go through the
//! message catalog. Input files are untrusted and read with a size limit.

// ============================================================================
// SECTION: Modules
// ============================================================================

#[macro_use]
mod messages;

// ============================================================================
// SECTION: Imports
// ============================================================================

use std::fs::File;
use std::io::Read;
use std::io::Write;
use std::path::Path;
use std::path::PathBuf;
use std::process::ExitCode;

use clap::ArgAction;
use clap::Args;
use clap::CommandFactory;
use clap::Parser;
use clap::Subcommand;
use clap::ValueEnum;
use runboard_client::ClientConfig;
use runboard_client::RunFeedClient;
use runboard_config::RunboardConfig;
use runboard_config::StoreType;
use runboard_core::CollectionSelection;
use runboard_core::OverviewSummary;
use runboard_core::RunRecord;
use runboard_core::RunRow;
use runboard_core::format_scientific;
use runboard_server::RunboardServer;
use runboard_store_sqlite::SqliteRunRepository;
use serde::Serialize;
use serde_json::Value;
use thiserror::Error;

// ============================================================================
// SECTION: Constants
// ============================================================================

/// Maximum size of an import file.
const MAX_IMPORT_BYTES: usize = 64 * 1024 * 1024;

// ============================================================================
// SECTION: CLI Types
// ============================================================================

/// Top-level CLI definition.
#[derive(Parser, Debug)]
#[command(name = "runboard", disable_help_subcommand = true, disable_version_flag = true)]
struct Cli {
    /// Print version information and exit.
    #[arg(long = "version", action = ArgAction::SetTrue, global = true)]
    show_version: bool,
    /// Selected subcommand to execute.
    #[command(subcommand)]
    command: Option<Commands>,
}

/// Supported CLI subcommands.
#[derive(Subcommand, Debug)]
enum Commands {
    /// Start the Runboard HTTP server.
    Serve(ConfigArgs),
    /// Configuration utilities.
    Config {
        /// Selected config subcommand.
        #[command(subcommand)]
        command: ConfigCommand,
    },
    /// Inspect runs served by a running Runboard server.
    Runs {
        /// Selected runs subcommand.
        #[command(subcommand)]
        command: RunsCommand,
    },
    /// Append run documents from a JSON file to the SQLite store.
    Import(ImportCommand),
}

/// Config file selection shared by several commands.
#[derive(Args, Debug)]
struct ConfigArgs {
    /// Optional config file path (defaults to runboard.toml or `RUNBOARD_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
}

/// Config subcommands.
#[derive(Subcommand, Debug)]
enum ConfigCommand {
    /// Validate a config file.
    Validate(ConfigArgs),
}

/// Runs subcommands.
#[derive(Subcommand, Debug)]
enum RunsCommand {
    /// Print one table row per run.
    List(RunsArgs),
    /// Print the overview totals.
    Summary(RunsArgs),
}

/// Arguments for commands that read from a running server.
#[derive(Args, Debug)]
struct RunsArgs {
    /// Server base URL.
    #[arg(long, value_name = "URL", default_value = "http://127.0.0.1:8080")]
    url: String,
    /// Output format.
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
}

/// Output formats for run inspection.
#[derive(ValueEnum, Clone, Copy, Debug, PartialEq, Eq)]
enum OutputFormat {
    /// Human-readable text.
    Text,
    /// Pretty-printed JSON.
    Json,
}

/// Arguments for run import.
#[derive(Args, Debug)]
struct ImportCommand {
    /// Optional config file path (defaults to runboard.toml or `RUNBOARD_CONFIG`).
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,
    /// JSON file holding an array of run documents.
    #[arg(long, value_name = "PATH")]
    file: PathBuf,
    /// Database override.
    #[arg(long, value_name = "NAME")]
    database: Option<String>,
    /// Collection override.
    #[arg(long, value_name = "NAME")]
    collection: Option<String>,
}

// ============================================================================
// SECTION: Errors
// ============================================================================

/// CLI error wrapper for catalog messages.
#[derive(Debug, Error)]
#[error("{message}")]
struct CliError {
    /// Human-readable error message.
    message: String,
}

impl CliError {
    /// Constructs a new [`CliError`] from a catalog message.
    const fn new(message: String) -> Self {
        Self {
            message,
        }
    }
}

/// CLI result alias for fallible operations.
type CliResult<T> = Result<T, CliError>;

// ============================================================================
// SECTION: Entry Point
// ============================================================================

/// CLI entry point returning an exit code.
#[tokio::main(flavor = "multi_thread")]
async fn main() -> ExitCode {
    match run().await {
        Ok(code) => code,
        Err(err) => emit_error(&err.to_string()),
    }
}

/// Executes the CLI command dispatcher.
async fn run() -> CliResult<ExitCode> {
    let cli = Cli::parse();
    if cli.show_version {
        let version = env!("CARGO_PKG_VERSION");
        write_stdout_line(&t!("main.version", version = version))
            .map_err(|err| CliError::new(output_error("stdout", &err)))?;
        return Ok(ExitCode::SUCCESS);
    }

    let Some(command) = cli.command else {
        show_help()?;
        return Ok(ExitCode::SUCCESS);
    };

    match command {
        Commands::Serve(args) => command_serve(args).await,
        Commands::Config {
            command,
        } => command_config(command),
        Commands::Runs {
            command,
        } => command_runs(command).await,
        Commands::Import(command) => command_import(&command),
    }
}

/// Emits the top-level help message for the CLI.
fn show_help() -> CliResult<()> {
    let mut command = Cli::command();
    command.print_help().map_err(|err| CliError::new(output_error("stdout", &err)))?;
    write_stdout_line("").map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(())
}

// ============================================================================
// SECTION: Serve Command
// ============================================================================

/// Executes the `serve` command.
async fn command_serve(args: ConfigArgs) -> CliResult<ExitCode> {
    let config = RunboardConfig::load(args.config.as_deref())
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    let server = tokio::task::spawn_blocking(move || RunboardServer::from_config(config))
        .await
        .map_err(|err| {
            CliError::new(t!("serve.init_failed", error = format!("init join failed: {err}")))
        })?
        .map_err(|err| CliError::new(t!("serve.init_failed", error = err)))?;
    server.serve().await.map_err(|err| CliError::new(t!("serve.failed", error = err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Config Commands
// ============================================================================

/// Dispatches config subcommands.
fn command_config(command: ConfigCommand) -> CliResult<ExitCode> {
    match command {
        ConfigCommand::Validate(args) => command_config_validate(&args),
    }
}

/// Executes the config validation command.
fn command_config_validate(args: &ConfigArgs) -> CliResult<ExitCode> {
    let _config = RunboardConfig::load(args.config.as_deref())
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    write_stdout_line(&t!("config.validate.ok"))
        .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

// ============================================================================
// SECTION: Runs Commands
// ============================================================================

/// Dispatches runs subcommands.
async fn command_runs(command: RunsCommand) -> CliResult<ExitCode> {
    match command {
        RunsCommand::List(args) => {
            let records = fetch_records(&args.url).await?;
            let rows = RunRow::table(&records);
            match args.format {
                OutputFormat::Json => write_json(&rows)?,
                OutputFormat::Text => write_lines(&render_table(&rows))?,
            }
        }
        RunsCommand::Summary(args) => {
            let records = fetch_records(&args.url).await?;
            let summary = OverviewSummary::from_records(&records);
            match args.format {
                OutputFormat::Json => write_json(&summary)?,
                OutputFormat::Text => write_lines(&render_summary(&summary))?,
            }
        }
    }
    Ok(ExitCode::SUCCESS)
}

/// Fetches and decodes every run from the server at `url`.
async fn fetch_records(url: &str) -> CliResult<Vec<RunRecord>> {
    let client = RunFeedClient::new(&ClientConfig::new(url))
        .map_err(|err| CliError::new(t!("runs.client_failed", error = err)))?;
    let documents = client
        .fetch_runs()
        .await
        .map_err(|err| CliError::new(t!("runs.fetch_failed", url = url, error = err)))?;
    Ok(documents.into_iter().map(RunRecord::from_document).collect())
}

/// Renders table rows as tab-separated lines.
fn render_table(rows: &[RunRow]) -> Vec<String> {
    if rows.is_empty() {
        return vec![t!("runs.list.empty")];
    }
    let mut lines = Vec::with_capacity(rows.len() + 1);
    lines.push(t!("runs.list.header"));
    for row in rows {
        lines.push(
            [
                row.run_id.as_str(),
                row.model.as_str(),
                row.status.as_str(),
                row.duration.as_str(),
                row.energy_kwh.as_str(),
                row.carbon_kg.as_str(),
                row.f1_score.as_str(),
            ]
            .join("\t"),
        );
    }
    lines
}

/// Renders the overview totals as text lines.
fn render_summary(summary: &OverviewSummary) -> Vec<String> {
    vec![
        t!(
            "runs.summary.total",
            total = summary.total_runs,
            successful = summary.successful_runs,
            failed = summary.failed_runs
        ),
        t!("runs.summary.energy", energy = format_scientific(summary.total_energy_kwh)),
        t!("runs.summary.carbon", carbon = format_scientific(summary.total_carbon_kg)),
        t!("runs.summary.duration", duration = summary.average_duration_label()),
    ]
}

// ============================================================================
// SECTION: Import Command
// ============================================================================

/// Executes the `import` command.
fn command_import(command: &ImportCommand) -> CliResult<ExitCode> {
    let config = RunboardConfig::load(command.config.as_deref())
        .map_err(|err| CliError::new(t!("config.load_failed", error = err)))?;
    if config.store.store_type != StoreType::Sqlite {
        return Err(CliError::new(t!("import.store_type")));
    }
    let selection = import_selection(
        config.collection.resolve_selection(),
        command.database.as_deref(),
        command.collection.as_deref(),
    );
    let documents = read_documents(&command.file)?;
    let store = SqliteRunRepository::new(config.store.sqlite_config())
        .map_err(|err| CliError::new(t!("import.store_failed", error = err)))?;
    let count = store
        .append_documents(&selection, &documents)
        .map_err(|err| CliError::new(t!("import.append_failed", error = err)))?;
    write_stdout_line(&t!(
        "import.ok",
        count = count,
        database = selection.database,
        collection = selection.collection
    ))
    .map_err(|err| CliError::new(output_error("stdout", &err)))?;
    Ok(ExitCode::SUCCESS)
}

/// Applies command-line overrides to the configured selection.
fn import_selection(
    base: CollectionSelection,
    database: Option<&str>,
    collection: Option<&str>,
) -> CollectionSelection {
    let pick = |value: Option<&str>, fallback: String| {
        value.map(str::trim).filter(|value| !value.is_empty()).map_or(fallback, str::to_string)
    };
    CollectionSelection::new(pick(database, base.database), pick(collection, base.collection))
}

/// Reads a JSON array of run documents from `path`.
fn read_documents(path: &Path) -> CliResult<Vec<Value>> {
    let display = path.display();
    let bytes = read_bytes_with_limit(path, MAX_IMPORT_BYTES)?;
    let value: Value = serde_json::from_slice(&bytes)
        .map_err(|err| CliError::new(t!("import.parse_failed", path = display, error = err)))?;
    let Value::Array(documents) = value else {
        return Err(CliError::new(t!("import.not_array", path = display)));
    };
    if let Some(index) = documents.iter().position(|document| !document.is_object()) {
        return Err(CliError::new(t!("import.not_object", index = index, path = display)));
    }
    Ok(documents)
}

/// Reads a file while enforcing a byte limit.
fn read_bytes_with_limit(path: &Path, max_bytes: usize) -> CliResult<Vec<u8>> {
    let display = path.display();
    let read_error = |err: std::io::Error| {
        CliError::new(t!("import.read_failed", path = display, error = err))
    };
    let file = File::open(path).map_err(read_error)?;
    let size = file.metadata().map_err(read_error)?.len();
    let limit = u64::try_from(max_bytes).unwrap_or(u64::MAX);
    if size > limit {
        return Err(CliError::new(t!(
            "import.too_large",
            path = display,
            size = size,
            limit = max_bytes
        )));
    }
    let mut bytes = Vec::new();
    file.take(limit.saturating_add(1)).read_to_end(&mut bytes).map_err(read_error)?;
    if bytes.len() > max_bytes {
        return Err(CliError::new(t!(
            "import.too_large",
            path = display,
            size = bytes.len(),
            limit = max_bytes
        )));
    }
    Ok(bytes)
}

// ============================================================================
// SECTION: Output Helpers
// ============================================================================

/// Writes a single line to stdout.
fn write_stdout_line(message: &str) -> std::io::Result<()> {
    let mut stdout = std::io::stdout();
    writeln!(&mut stdout, "{message}")
}

/// Writes each line to stdout.
fn write_lines(lines: &[String]) -> CliResult<()> {
    for line in lines {
        write_stdout_line(line).map_err(|err| CliError::new(output_error("stdout", &err)))?;
    }
    Ok(())
}

/// Writes a value as pretty-printed JSON to stdout.
fn write_json<T: Serialize>(value: &T) -> CliResult<()> {
    let rendered = serde_json::to_string_pretty(value)
        .map_err(|err| CliError::new(t!("output.json_failed", error = err)))?;
    write_stdout_line(&rendered).map_err(|err| CliError::new(output_error("stdout", &err)))
}

/// Writes a single line to stderr.
fn write_stderr_line(message: &str) -> std::io::Result<()> {
    let mut stderr = std::io::stderr();
    writeln!(&mut stderr, "{message}")
}

/// Formats an output failure for the given stream.
fn output_error(stream: &str, error: &std::io::Error) -> String {
    let stream_label = match stream {
        "stdout" => t!("output.stream.stdout"),
        "stderr" => t!("output.stream.stderr"),
        _ => t!("output.stream.unknown"),
    };
    t!("output.write_failed", stream = stream_label, error = error)
}

/// Emits an error message to stderr and returns a failure exit code.
fn emit_error(message: &str) -> ExitCode {
    let _ = write_stderr_line(message);
    ExitCode::FAILURE
}
