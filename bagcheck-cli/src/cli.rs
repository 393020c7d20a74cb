// bagcheck-cli/src/cli.rs
//
// Defines the command-line argument structures using clap.

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

// --- CLI Argument Definition ---

#[derive(Parser, Debug)]
#[command(
    author,
    version, // Reads from Cargo.toml via "cargo" feature in clap
    about = "Bagcheck: BagIt preservation package validator",
    long_about = "Validates checksum manifests, Payload-Oxum, role derivatives and sidecar \
                  metadata of BagIt packages, and optionally repairs their control files."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Show debug output
    #[arg(short, long, global = true, default_value_t = false)]
    pub verbose: bool,

    /// Only show warnings and errors
    #[arg(short, long, global = true, default_value_t = false, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Also write the run log to a timestamped file in this directory
    #[arg(long, global = true, value_name = "LOG_DIR")]
    pub log_dir: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Validates a bag, or every bag in a directory
    Validate(ValidateArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ValidateArgs {
    /// A bag root, or a directory whose immediate children are bags
    #[arg(required = true, value_name = "BAG_OR_DIR")]
    pub target: PathBuf,

    /// Rewrite manifests, tag manifest and Payload-Oxum for changed payload files
    #[arg(long, default_value_t = false)]
    pub repair: bool,

    /// Write findings to this file (CSV, or JSON if the name ends in .json)
    #[arg(long, value_name = "REPORT_PATH")]
    pub report: Option<PathBuf>,

    // --- Concurrency ---
    /// Bags validated concurrently (defaults to the number of CPUs)
    #[arg(short = 'j', long, value_name = "N", env = "BAGCHECK_JOBS",
          value_parser = clap::value_parser!(u16).range(1..))]
    pub jobs: Option<u16>,

    /// Files hashed concurrently within one bag (defaults to the number of CPUs)
    #[arg(long, value_name = "N", env = "BAGCHECK_HASH_JOBS",
          value_parser = clap::value_parser!(u16).range(1..))]
    pub hash_jobs: Option<u16>,

    // --- Retries ---
    /// Attempts for control-file writes that fail transiently
    #[arg(long, value_name = "N", value_parser = clap::value_parser!(u16).range(1..))]
    pub retries: Option<u16>,

    /// Pause between retry attempts, in milliseconds
    #[arg(long, value_name = "MS")]
    pub retry_delay_ms: Option<u64>,

    // --- Checks ---
    /// Skip sidecar metadata cross-checks even if ffprobe is available
    #[arg(long, default_value_t = false)]
    pub no_metadata: bool,

    /// Group v01/v02 versions of one object into the same asset
    #[arg(long, default_value_t = false)]
    pub fold_versions: bool,

    /// Allowed difference between sidecar and inspected durations
    #[arg(long, value_name = "MS")]
    pub duration_tolerance_ms: Option<u64>,
}
