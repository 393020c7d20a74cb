// ============================================================================
// bagcheck-core/src/error.rs
// ============================================================================
//
// ERROR HANDLING: Error Types for the Bagcheck Core Library
//
// Every fallible operation in the core returns `CoreResult<T>`. Errors that
// are local to one bag are converted into findings by the run orchestration
// (see `runner`), so only run-level problems reach the caller as `Err`.

use std::io;
use std::path::PathBuf;

use thiserror::Error;

/// Errors produced by the bagcheck core library.
#[derive(Error, Debug)]
pub enum CoreError {
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("Directory traversal error: {0}")]
    Walkdir(#[from] walkdir::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    /// A control file line that does not follow its grammar.
    #[error("{file}:{line}: malformed line: {text:?}")]
    Parse {
        file: String,
        line: usize,
        text: String,
    },

    #[error("Control file missing: {0}")]
    MissingControlFile(PathBuf),

    #[error("Bag not found: {0}")]
    BagNotFound(PathBuf),

    #[error("Not a bag: {0}")]
    NotABag(PathBuf),

    #[error("Invalid configuration: {0}")]
    Config(String),

    #[error("Gave up after {attempts} attempt(s) on {operation}: {source}")]
    RetryExhausted {
        operation: String,
        attempts: usize,
        #[source]
        source: io::Error,
    },

    #[error("Media inspection failed for {path}: {message}")]
    Inspection { path: PathBuf, message: String },

    #[error("Required external dependency not found: {0}")]
    DependencyNotFound(String),

    #[error("Run cancelled")]
    Cancelled,

    #[error("Operation failed: {0}")]
    OperationFailed(String),
}

impl CoreError {
    /// Whether retrying the failed operation might succeed.
    ///
    /// Only raw IO errors are ever transient; everything else (including an
    /// already-exhausted retry) is permanent.
    pub fn is_transient(&self) -> bool {
        match self {
            CoreError::Io(e) => is_transient_io(e),
            _ => false,
        }
    }
}

/// Raw OS codes treated as transient: EBUSY and EAGAIN.
#[cfg(not(windows))]
const TRANSIENT_OS_CODES: &[i32] = &[16, 11];

/// Raw OS codes treated as transient: sharing and lock violations.
#[cfg(windows)]
const TRANSIENT_OS_CODES: &[i32] = &[32, 33];

/// Classifies an IO error as transient (busy, interrupted, timed out).
pub fn is_transient_io(err: &io::Error) -> bool {
    match err.kind() {
        io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock | io::ErrorKind::TimedOut => true,
        _ => err
            .raw_os_error()
            .is_some_and(|code| TRANSIENT_OS_CODES.contains(&code)),
    }
}

/// Result type for bagcheck core operations.
pub type CoreResult<T> = std::result::Result<T, CoreError>;
