// ============================================================================
// bagcheck-cli/src/logging.rs
// ============================================================================
//
// LOGGING SETUP: Console and Optional File Logging
//
// Without `--log-dir`, records go to stderr through `env_logger`, which also
// honours RUST_LOG. With `--log-dir`, `fern` sends every record both to
// stderr and to `bagcheck_validate_run_<YYYYMMDD_HHMMSS>.log`.
//
// Levels:
// - default: info
// - --verbose: debug
// - --quiet: warn

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use anyhow::Context;
use log::LevelFilter;

use crate::error::CliResult;

/// Returns the current local timestamp formatted as "YYYYMMDD_HHMMSS".
pub fn get_timestamp() -> String {
    chrono::Local::now().format("%Y%m%d_%H%M%S").to_string()
}

/// Log level implied by the verbosity flags.
pub fn level_for(verbose: bool, quiet: bool) -> LevelFilter {
    if verbose {
        LevelFilter::Debug
    } else if quiet {
        LevelFilter::Warn
    } else {
        LevelFilter::Info
    }
}

/// Installs the global logger. Returns the log file path when one is written.
pub fn init_logging(level: LevelFilter, log_dir: Option<&Path>) -> CliResult<Option<PathBuf>> {
    let Some(dir) = log_dir else {
        env_logger::Builder::new()
            .filter_level(level)
            .parse_default_env()
            .format(|buf, record| {
                writeln!(buf, "[{:<5}] {}", record.level(), record.args())
            })
            .try_init()
            .context("Failed to initialise logging")?;
        return Ok(None);
    };

    fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    let log_path = dir.join(format!("bagcheck_validate_run_{}.log", get_timestamp()));
    let log_file = fern::log_file(&log_path)
        .with_context(|| format!("Failed to open log file {}", log_path.display()))?;

    fern::Dispatch::new()
        .level(level)
        .chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!("[{:<5}] {}", record.level(), message))
                })
                .chain(std::io::stderr()),
        )
        .chain(
            fern::Dispatch::new()
                .format(|out, message, record| {
                    out.finish(format_args!(
                        "{} [{:<5}] {}: {}",
                        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
                        record.level(),
                        record.target(),
                        message
                    ))
                })
                .chain(log_file),
        )
        .apply()
        .context("Failed to initialise logging")?;
    Ok(Some(log_path))
}
