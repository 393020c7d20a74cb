// bagcheck-cli/src/main.rs
//
// Entry point for the `bagcheck` binary: parse arguments, set up logging,
// dispatch the command, and turn the outcome into an exit code.

use std::process::ExitCode;

use bagcheck_cli::logging::{init_logging, level_for};
use bagcheck_cli::{Cli, Commands, RunStatus, run_validate};
use clap::Parser;

fn main() -> ExitCode {
    let cli = Cli::parse();

    match init_logging(level_for(cli.verbose, cli.quiet), cli.log_dir.as_deref()) {
        Ok(Some(path)) => log::info!("Logging to {}", path.display()),
        Ok(None) => {}
        Err(e) => {
            eprintln!("Error: {e:#}");
            return RunStatus::RunError.into();
        }
    }

    let result = match &cli.command {
        Commands::Validate(args) => run_validate(args),
    };

    match result {
        Ok(status) => status.into(),
        Err(e) => {
            log::error!("{e:#}");
            RunStatus::RunError.into()
        }
    }
}
