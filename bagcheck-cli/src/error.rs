// ============================================================================
// bagcheck-cli/src/error.rs
// ============================================================================
//
// CLI ERROR HANDLING: Result Alias and Exit Codes
//
// Run-level failures travel as `anyhow::Error` with context attached at the
// call site. Bag-level problems never get here: the core turns them into
// findings, and they only influence the exit code through the verdicts.
//
// Exit codes:
// - 0: every bag PASSED
// - 1: at least one bag FAILED
// - 2: run-level error (missing target, bad configuration, report not
//      written) or a cancelled run

use std::process::ExitCode;

use bagcheck_core::RunSummary;

/// Result type for CLI operations.
pub type CliResult<T> = anyhow::Result<T>;

/// How a run ended, as far as the shell is concerned.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunStatus {
    AllPassed,
    SomeFailed,
    RunError,
}

impl RunStatus {
    pub fn from_summary(summary: &RunSummary) -> Self {
        if summary.was_cancelled() {
            RunStatus::RunError
        } else if summary.all_passed() {
            RunStatus::AllPassed
        } else {
            RunStatus::SomeFailed
        }
    }

    pub fn code(self) -> u8 {
        match self {
            RunStatus::AllPassed => 0,
            RunStatus::SomeFailed => 1,
            RunStatus::RunError => 2,
        }
    }
}

impl From<RunStatus> for ExitCode {
    fn from(status: RunStatus) -> Self {
        ExitCode::from(status.code())
    }
}
