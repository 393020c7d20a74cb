// ============================================================================
// bagcheck-core/src/repair.rs
// ============================================================================
//
// INTEGRITY REPAIR: Bringing Control Files Back in Line with the Payload
//
// A repair takes the paths a validation marked as changed and:
//
// 1. Re-hashes the changed files that still exist, drops manifest entries
//    for files that are gone, and adds entries for new files
// 2. Recomputes Payload-Oxum from a full walk of the payload tree
// 3. Recomputes the tag-manifest entries for the rewritten manifest and
//    bag-info from their new contents
// 4. Stages all three control files and commits them in one transaction
// 5. Re-verifies the bag's integrity
//
// Nothing is written until every new checksum is known. A failure before or
// during the commit leaves the control files as they were.
//
// State progression: UNMODIFIED -> DIRTY -> REPAIRED -> VERIFIED

use std::fmt::{self, Display};
use std::path::Component;
use std::path::Path;
use std::sync::Arc;

use log::{debug, info, warn};
use rayon::ThreadPool;
use serde::{Deserialize, Serialize};

use crate::atomic::ControlFileTransaction;
use crate::bag::{Bag, compute_oxum};
use crate::checksum::{ChecksumEngine, worker_pool};
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};
use crate::logging;
use crate::manifest::{self, PayloadOxum};
use crate::validation::{BagValidator, Finding};

/// Where a bag stands in the repair cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RepairState {
    /// Nothing to repair; no file was written.
    Unmodified,
    /// Payload changed since packaging; control files not yet rewritten.
    Dirty,
    /// Control files rewritten but the bag did not verify.
    Repaired,
    /// Control files rewritten and integrity verified.
    Verified,
}

impl Display for RepairState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RepairState::Unmodified => write!(f, "UNMODIFIED"),
            RepairState::Dirty => write!(f, "DIRTY"),
            RepairState::Repaired => write!(f, "REPAIRED"),
            RepairState::Verified => write!(f, "VERIFIED"),
        }
    }
}

/// Outcome of one repair.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RepairResult {
    pub bag_id: String,
    pub state: RepairState,
    /// Paths whose manifest checksum was replaced.
    pub updated: Vec<String>,
    /// Paths added to the manifest.
    pub added: Vec<String>,
    /// Paths removed from the manifest.
    pub removed: Vec<String>,
    /// Payload-Oxum written to bag-info.
    pub oxum: Option<PayloadOxum>,
    /// Integrity findings left after the repair; empty once VERIFIED.
    pub residual: Vec<Finding>,
}

impl RepairResult {
    fn unmodified(bag_id: &str) -> Self {
        Self {
            bag_id: bag_id.to_string(),
            state: RepairState::Unmodified,
            updated: Vec::new(),
            added: Vec::new(),
            removed: Vec::new(),
            oxum: None,
            residual: Vec::new(),
        }
    }
}

/// Rewrites a bag's control files after payload changes.
pub struct IntegrityRepairer<'a> {
    config: &'a CoreConfig,
    engine: ChecksumEngine,
    pool: Arc<ThreadPool>,
}

impl<'a> IntegrityRepairer<'a> {
    pub fn new(config: &'a CoreConfig) -> CoreResult<Self> {
        Ok(Self::with_pool(config, worker_pool(config.hash_workers)?))
    }

    /// A repairer hashing on an existing pool.
    pub fn with_pool(config: &'a CoreConfig, pool: Arc<ThreadPool>) -> Self {
        Self {
            config,
            engine: ChecksumEngine::new(config.chunk_size),
            pool,
        }
    }

    /// Repairs `bag` for the given bag-relative payload paths.
    ///
    /// # Errors
    ///
    /// Fails without writing anything when the control files cannot be
    /// loaded, a changed path lies outside the payload, a file cannot be
    /// hashed, or the commit fails (in which case it is rolled back).
    pub fn repair(&self, bag: &Bag, changed_paths: &[String]) -> CoreResult<RepairResult> {
        logging::log_section(&format!("REPAIRING {}", bag.id()));
        if changed_paths.is_empty() {
            info!("{}: nothing to repair", bag.id());
            return Ok(RepairResult::unmodified(bag.id()));
        }

        let mut control = manifest::load(bag.root(), self.config)?;
        let mut result = RepairResult {
            state: RepairState::Dirty,
            ..RepairResult::unmodified(bag.id())
        };

        logging::log_subsection("RE-HASH CHANGED PAYLOAD");
        let mut existing = Vec::new();
        for path in changed_paths {
            self.check_payload_path(path)?;
            if bag.resolve(path).is_file() {
                existing.push(path.clone());
            } else if control.manifest.remove(path).is_some() {
                debug!("{}: dropping manifest entry for vanished {}", bag.id(), path);
                result.removed.push(path.clone());
            }
        }
        for (path, checksum) in self.engine.hash_all(bag.root(), &existing, &self.pool) {
            let checksum = checksum?;
            let known = control.manifest.contains(&path);
            if control.manifest.set(&path, &checksum) {
                if known {
                    result.updated.push(path);
                } else {
                    result.added.push(path);
                }
            }
        }

        logging::log_subsection("RECOMPUTE PAYLOAD-OXUM");
        let oxum = compute_oxum(&bag.payload_files()?);
        control.bag_info.set_payload_oxum(oxum);
        result.oxum = Some(oxum);
        debug!("{}: Payload-Oxum {}", bag.id(), oxum);

        logging::log_subsection("TAG MANIFEST CASCADE");
        let manifest_digest = self.engine.hash_bytes(control.manifest.to_text().as_bytes());
        control
            .tag_manifest
            .set(&self.config.manifest_name, &manifest_digest);
        let bag_info_digest = self.engine.hash_bytes(control.bag_info.to_text().as_bytes());
        control
            .tag_manifest
            .set(&self.config.bag_info_name, &bag_info_digest);

        let mut tx = ControlFileTransaction::new(&self.config.retry);
        control.stage(bag.root(), self.config, &mut tx)?;
        tx.commit()?;
        result.state = RepairState::Repaired;
        info!(
            "{}: rewrote control files ({} updated, {} added, {} removed)",
            bag.id(),
            result.updated.len(),
            result.added.len(),
            result.removed.len()
        );

        logging::log_subsection("VERIFY");
        let report = BagValidator::with_pool(self.config, None, Arc::clone(&self.pool))?
            .verify_integrity(bag);
        if report.passed() {
            result.state = RepairState::Verified;
            logging::log_status("VERIFIED", bag.id());
        } else {
            warn!(
                "{}: repaired bag still has {} integrity error(s)",
                bag.id(),
                report.errors().len()
            );
            result.residual = report.findings().to_vec();
        }
        Ok(result)
    }

    /// Rejects paths that do not name a file under the payload directory.
    fn check_payload_path(&self, path: &str) -> CoreResult<()> {
        let prefix = format!("{}/", self.config.payload_dir);
        let inside = path.starts_with(&prefix)
            && Path::new(path)
                .components()
                .all(|c| matches!(c, Component::Normal(_)));
        if inside {
            Ok(())
        } else {
            Err(CoreError::OperationFailed(format!(
                "{path} is not a payload path"
            )))
        }
    }
}
