//! Bounded retry for filesystem operations that can transiently fail.
//!
//! A single `RetryPolicy` value is carried in `CoreConfig` and used by every
//! control-file write and rename, so there is exactly one place that decides
//! how long a busy directory is waited on.

use std::io;
use std::thread;
use std::time::Duration;

use log::{debug, warn};
use serde::{Deserialize, Serialize};

use crate::error::{CoreError, CoreResult, is_transient_io};

/// Computes the delay before a given retry attempt.
pub trait BackoffPolicy {
    /// Delay to sleep before `attempt` (1-based; attempt 1 is the first retry).
    fn delay_for_attempt(&self, attempt: usize) -> Duration;
}

/// Maximum attempts plus a fixed backoff between them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetryPolicy {
    /// Total attempts including the first one. Always at least 1.
    pub max_attempts: usize,
    /// Fixed sleep between attempts, in milliseconds.
    pub backoff_ms: u64,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_attempts: 4,
            backoff_ms: 100,
        }
    }
}

impl BackoffPolicy for RetryPolicy {
    fn delay_for_attempt(&self, _attempt: usize) -> Duration {
        Duration::from_millis(self.backoff_ms)
    }
}

impl RetryPolicy {
    /// A policy that never retries.
    pub fn none() -> Self {
        Self {
            max_attempts: 1,
            backoff_ms: 0,
        }
    }

    /// Runs `op`, retrying transient IO errors until the attempt budget is spent.
    ///
    /// Permanent errors are returned immediately as `CoreError::Io`. When the
    /// budget runs out on a transient error the result is
    /// `CoreError::RetryExhausted`, which callers treat as fatal for the bag.
    pub fn run<T, F>(&self, operation: &str, mut op: F) -> CoreResult<T>
    where
        F: FnMut() -> io::Result<T>,
    {
        let max_attempts = self.max_attempts.max(1);
        let mut attempt = 1;
        loop {
            match op() {
                Ok(value) => {
                    if attempt > 1 {
                        debug!("{} succeeded on attempt {}", operation, attempt);
                    }
                    return Ok(value);
                }
                Err(err) if is_transient_io(&err) => {
                    if attempt >= max_attempts {
                        warn!(
                            "{} still failing after {} attempt(s): {}",
                            operation, attempt, err
                        );
                        return Err(CoreError::RetryExhausted {
                            operation: operation.to_string(),
                            attempts: attempt,
                            source: err,
                        });
                    }
                    let delay = self.delay_for_attempt(attempt);
                    debug!(
                        "{} hit transient error ({}), retrying in {:?}",
                        operation, err, delay
                    );
                    thread::sleep(delay);
                    attempt += 1;
                }
                Err(err) => return Err(CoreError::Io(err)),
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::Cell;

    fn quick(max_attempts: usize) -> RetryPolicy {
        RetryPolicy {
            max_attempts,
            backoff_ms: 0,
        }
    }

    #[test]
    fn transient_error_is_retried_until_success() {
        let calls = Cell::new(0);
        let result = quick(3).run("rename", || {
            calls.set(calls.get() + 1);
            if calls.get() < 3 {
                Err(io::Error::new(io::ErrorKind::Interrupted, "busy"))
            } else {
                Ok(7)
            }
        });
        assert_eq!(result.unwrap(), 7);
        assert_eq!(calls.get(), 3);
    }

    #[test]
    fn exhaustion_reports_attempt_count() {
        let calls = Cell::new(0);
        let result: CoreResult<()> = quick(2).run("rename", || {
            calls.set(calls.get() + 1);
            Err(io::Error::new(io::ErrorKind::TimedOut, "busy"))
        });
        match result {
            Err(CoreError::RetryExhausted { attempts, .. }) => assert_eq!(attempts, 2),
            other => panic!("unexpected result: {:?}", other),
        }
        assert_eq!(calls.get(), 2);
    }

    #[test]
    fn permanent_error_is_not_retried() {
        let calls = Cell::new(0);
        let result: CoreResult<()> = quick(5).run("open", || {
            calls.set(calls.get() + 1);
            Err(io::Error::new(io::ErrorKind::PermissionDenied, "nope"))
        });
        assert!(matches!(result, Err(CoreError::Io(_))));
        assert_eq!(calls.get(), 1);
    }

    #[test]
    fn fixed_backoff() {
        let policy = RetryPolicy {
            max_attempts: 3,
            backoff_ms: 250,
        };
        assert_eq!(policy.delay_for_attempt(1), Duration::from_millis(250));
        assert_eq!(policy.delay_for_attempt(2), Duration::from_millis(250));
    }
}
