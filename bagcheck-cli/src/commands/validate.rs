// ============================================================================
// bagcheck-cli/src/commands/validate.rs
// ============================================================================
//
// VALIDATE COMMAND: Validate (and Optionally Repair) Bags
//
// 1. Build the core configuration once from the arguments
// 2. Detect ffprobe for sidecar metadata checks (skipped if unavailable)
// 3. Run the core over every bag under the target; Ctrl-C stops it between
//    bags, a second Ctrl-C exits immediately
// 4. Print a per-bag summary and export findings if requested
// 5. Map the summary to an exit status

use anyhow::Context;
use log::{info, warn};

use bagcheck_core::config::CoreConfigBuilder;
use bagcheck_core::{
    CancellationToken, CoreConfig, FfprobeInspector, MediaInspector, RetryPolicy, RunOptions,
    RunSummary, run, write_report,
};

use crate::cli::ValidateArgs;
use crate::error::{CliResult, RunStatus};

/// Builds the core configuration from command-line overrides.
pub fn build_config(args: &ValidateArgs) -> CliResult<CoreConfig> {
    let mut builder = CoreConfigBuilder::new().fold_version_into_core_id(args.fold_versions);
    if let Some(jobs) = args.jobs {
        builder = builder.bag_workers(usize::from(jobs));
    }
    if let Some(jobs) = args.hash_jobs {
        builder = builder.hash_workers(usize::from(jobs));
    }
    if args.retries.is_some() || args.retry_delay_ms.is_some() {
        let defaults = RetryPolicy::default();
        builder = builder.retry(RetryPolicy {
            max_attempts: args.retries.map_or(defaults.max_attempts, usize::from),
            backoff_ms: args.retry_delay_ms.unwrap_or(defaults.backoff_ms),
        });
    }
    if let Some(tolerance) = args.duration_tolerance_ms {
        builder = builder.duration_tolerance_ms(tolerance);
    }
    let config = builder.build();
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

/// The media inspector for this run, if metadata checks can run at all.
fn detect_inspector(args: &ValidateArgs) -> Option<FfprobeInspector> {
    if args.no_metadata {
        info!("Sidecar metadata checks disabled");
        return None;
    }
    match FfprobeInspector::detect() {
        Ok(inspector) => Some(inspector),
        Err(e) => {
            warn!("Sidecar metadata checks skipped: {e}");
            None
        }
    }
}

/// Records an interrupt on the run token. Returns false when the run was
/// already cancelled, i.e. this is a repeated interrupt.
fn interrupt(token: &CancellationToken) -> bool {
    if token.is_cancelled() {
        return false;
    }
    token.cancel();
    warn!("Interrupt received; finishing bags in progress (press Ctrl-C again to exit now)");
    true
}

/// Hooks Ctrl-C and SIGTERM to the run token. A run without a handler
/// still works; it just cannot be stopped gracefully.
fn install_interrupt_handler(token: &CancellationToken) {
    let token = token.clone();
    let result = ctrlc::set_handler(move || {
        if !interrupt(&token) {
            std::process::exit(130);
        }
    });
    if let Err(e) = result {
        warn!("Could not install interrupt handler: {e}");
    }
}

/// Formats the per-bag summary table printed after a run.
pub fn format_summary(summary: &RunSummary) -> String {
    let mut lines = Vec::new();
    lines.push("=".repeat(80));
    lines.push("RUN SUMMARY".to_string());
    lines.push("=".repeat(80));
    for outcome in &summary.bags {
        let report = &outcome.report;
        let icon = if report.passed() { "✅" } else { "❌" };
        let repair = outcome
            .repair
            .as_ref()
            .map(|r| format!("  [repair: {}]", r.state))
            .unwrap_or_default();
        lines.push(format!(
            "{} {:<6} {:<40} {:>3} error(s) {:>3} warning(s){}",
            icon,
            report.verdict(),
            report.bag_id(),
            report.errors().len(),
            report.warnings().len(),
            repair
        ));
    }
    for path in &summary.skipped {
        lines.push(format!("⏭️  SKIPPED {}", path.display()));
    }
    lines.push("-".repeat(80));
    lines.push(format!(
        "{} bag(s): {} passed, {} failed, {} skipped",
        summary.bags.len() + summary.skipped.len(),
        summary.passed_count(),
        summary.failed_count(),
        summary.skipped.len()
    ));
    lines.join("\n")
}

/// Runs the `validate` command.
pub fn run_validate(args: &ValidateArgs) -> CliResult<RunStatus> {
    let config = build_config(args)?;
    let inspector = detect_inspector(args);
    let token = CancellationToken::new();
    install_interrupt_handler(&token);

    let summary = run(
        &args.target,
        &config,
        RunOptions {
            repair: args.repair,
        },
        inspector.as_ref().map(|i| i as &dyn MediaInspector),
        &token,
    )
    .with_context(|| format!("Failed to validate {}", args.target.display()))?;

    println!("{}", format_summary(&summary));

    if let Some(report_path) = &args.report {
        write_report(&summary, report_path, &config.retry)
            .with_context(|| format!("Failed to write report {}", report_path.display()))?;
    }

    Ok(RunStatus::from_summary(&summary))
}
