//! Run-level orchestration over many bags.
//!
//! Bags are the unit of parallelism and of failure: each bag is validated
//! (and optionally repaired) on its own worker, and anything that goes wrong
//! inside one bag becomes a finding on that bag's report. Only a missing
//! target or a bad configuration fails the run itself.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use log::{info, warn};
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

use crate::bag::Bag;
use crate::checksum::worker_pool;
use crate::config::CoreConfig;
use crate::discovery::find_bags;
use crate::error::{CoreError, CoreResult};
use crate::metadata::MediaInspector;
use crate::repair::{IntegrityRepairer, RepairResult, RepairState};
use crate::validation::{BagValidator, Finding, FindingKind, PendingReport, ValidationReport};

/// Shared flag that stops a run before its next bag starts.
///
/// Cloning yields a handle to the same flag. A bag already in progress
/// finishes its validation, and a repair that has started always commits or
/// rolls back; a repair not yet started when the flag is set is not started.
#[derive(Debug, Clone, Default)]
pub struct CancellationToken {
    cancelled: Arc<AtomicBool>,
}

impl CancellationToken {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// What a run does besides validating.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RunOptions {
    /// Repair bags whose payload no longer matches their manifest, then
    /// validate them again.
    pub repair: bool,
}

/// Result for one bag.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BagOutcome {
    pub path: PathBuf,
    /// Final report (the post-repair report when a repair ran).
    pub report: ValidationReport,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub repair: Option<RepairResult>,
}

/// Everything a run produced.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RunSummary {
    pub bags: Vec<BagOutcome>,
    /// Bags not started because the run was cancelled.
    pub skipped: Vec<PathBuf>,
}

impl RunSummary {
    pub fn all_passed(&self) -> bool {
        self.bags.iter().all(|b| b.report.passed())
    }

    pub fn passed_count(&self) -> usize {
        self.bags.iter().filter(|b| b.report.passed()).count()
    }

    pub fn failed_count(&self) -> usize {
        self.bags.len() - self.passed_count()
    }

    pub fn was_cancelled(&self) -> bool {
        !self.skipped.is_empty()
    }

    pub fn reports(&self) -> impl Iterator<Item = &ValidationReport> {
        self.bags.iter().map(|b| &b.report)
    }
}

/// Validates every bag under `target`.
///
/// # Errors
///
/// `Err` only for run-level problems: invalid configuration, a missing
/// target, or a target that is a regular file.
pub fn run(
    target: &Path,
    config: &CoreConfig,
    options: RunOptions,
    inspector: Option<&dyn MediaInspector>,
    token: &CancellationToken,
) -> CoreResult<RunSummary> {
    config.validate()?;
    let bags = find_bags(target, config)?;
    info!(
        "Found {} bag(s) under {} ({} bag worker(s), {} hash worker(s))",
        bags.len(),
        target.display(),
        config.bag_workers,
        config.hash_workers
    );

    let hash_pool = worker_pool(config.hash_workers)?;
    let validator = BagValidator::with_pool(config, inspector, Arc::clone(&hash_pool))?;
    let repairer = IntegrityRepairer::with_pool(config, hash_pool);

    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(config.bag_workers)
        .build()
        .map_err(|e| CoreError::OperationFailed(format!("bag pool: {e}")))?;

    let results: Vec<Result<BagOutcome, PathBuf>> = pool.install(|| {
        bags.par_iter()
            .map(|path| {
                if token.is_cancelled() {
                    return Err(path.clone());
                }
                Ok(process_bag(path, config, options, &validator, &repairer, token))
            })
            .collect()
    });

    let mut summary = RunSummary::default();
    for result in results {
        match result {
            Ok(outcome) => summary.bags.push(outcome),
            Err(path) => summary.skipped.push(path),
        }
    }
    if summary.was_cancelled() {
        warn!("Run cancelled; {} bag(s) not started", summary.skipped.len());
    }
    info!(
        "Run complete: {} passed, {} failed, {} skipped",
        summary.passed_count(),
        summary.failed_count(),
        summary.skipped.len()
    );
    Ok(summary)
}

fn process_bag(
    path: &Path,
    config: &CoreConfig,
    options: RunOptions,
    validator: &BagValidator<'_>,
    repairer: &IntegrityRepairer<'_>,
    token: &CancellationToken,
) -> BagOutcome {
    let bag = match Bag::open(path, config) {
        Ok(bag) => bag,
        Err(err) => return failed_outcome(path, FindingKind::IoError, err),
    };

    let report = validator.validate(&bag);
    let changed = report.changed_paths();
    if !options.repair || changed.is_empty() {
        return BagOutcome {
            path: path.to_path_buf(),
            report,
            repair: None,
        };
    }

    let repaired = if token.is_cancelled() {
        Err(CoreError::Cancelled)
    } else {
        info!("{}: repairing {} changed path(s)", bag.id(), changed.len());
        repairer.repair(&bag, &changed)
    };
    match repaired {
        Ok(result) => {
            let report = if result.state == RepairState::Unmodified {
                report
            } else {
                validator.validate(&bag)
            };
            BagOutcome {
                path: path.to_path_buf(),
                report,
                repair: Some(result),
            }
        }
        Err(err) => {
            let mut pending = PendingReport::new(bag.id());
            pending.add_all(report.findings().iter().cloned());
            pending.add(Finding::new(
                FindingKind::RepairFailed,
                bag.id(),
                format!("repair failed, bag left unchanged: {err}"),
            ));
            BagOutcome {
                path: path.to_path_buf(),
                report: pending.finish(),
                repair: None,
            }
        }
    }
}

fn failed_outcome(path: &Path, kind: FindingKind, err: CoreError) -> BagOutcome {
    let id = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| path.display().to_string());
    let mut pending = PendingReport::new(id.as_str());
    pending.add(Finding::new(kind, id.as_str(), err.to_string()));
    BagOutcome {
        path: path.to_path_buf(),
        report: pending.finish(),
        repair: None,
    }
}
