//! Logging initialization and configuration.
//!
//! Uses the `tracing` ecosystem with two outputs: a console layer on stderr
//! and, when configured, an append-only telemetry file. All stage workers
//! log concurrently; the file layer serializes their lines through a single
//! mutex-guarded handle.

use std::fs::{File, OpenOptions};
use std::path::Path;
use std::sync::Mutex;

use anyhow::Context;
use tracing_subscriber::fmt::format::{DefaultFields, Format};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Initialize the logging subsystem.
///
/// # Arguments
///
/// * `verbose` - If true, enables DEBUG level logging; otherwise INFO level.
/// * `json_format` - If true, console output is structured JSON.
/// * `log_file` - Optional telemetry log, opened in append mode.
///
/// # Notes
///
/// - Console output goes to stderr (stdout is reserved for data output)
/// - The RUST_LOG environment variable can override the log level
pub fn init(verbose: bool, json_format: bool, log_file: Option<&Path>) -> anyhow::Result<()> {
    // Build the filter, respecting RUST_LOG if set
    let default_level = if verbose { "debug" } else { "info" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));

    let file = log_file.map(open_log_file).transpose()?;

    if json_format {
        // JSON format for machine parsing
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .with(file.map(file_layer))
            .init();
    } else {
        // Pretty format for humans
        tracing_subscriber::registry()
            .with(filter)
            .with(
                fmt::layer()
                    .with_target(false)
                    .with_writer(std::io::stderr)
                    .with_ansi(true),
            )
            .with(file.map(file_layer))
            .init();
    }
    Ok(())
}

/// Open the telemetry log for appending, creating it if needed.
fn open_log_file(path: &Path) -> anyhow::Result<File> {
    OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))
}

/// Plain-text file layer; every task writes through the same mutex.
fn file_layer<S>(file: File) -> fmt::Layer<S, DefaultFields, Format, Mutex<File>> {
    fmt::layer()
        .with_ansi(false)
        .with_target(false)
        .with_writer(Mutex::new(file))
}

/// Initialize logging with settings from Config.
pub fn init_from_config(
    config: &graypipe_core::Config,
    verbose_override: bool,
    json_logs_override: bool,
    log_file: Option<&Path>,
) -> anyhow::Result<()> {
    let verbose =
        verbose_override || config.logging.level == "debug" || config.logging.level == "trace";
    let json_format = json_logs_override || config.logging.format == "json";
    init(verbose, json_format, log_file)
}
