//! Bag validation
//!
//! Responsibilities:
//! - Load the control files and check the manifest/payload bijection
//! - Verify payload checksums on a bounded worker pool
//! - Check Payload-Oxum and the tag manifest
//! - Cross-reference role derivatives and sidecar metadata
//! - Collect every finding into one `ValidationReport` per bag
//!
//! Validation never mutates a bag. Errors that stop one phase become
//! findings on the report; only a broken configuration is returned as `Err`.

pub mod finding;
pub mod report;

use std::collections::BTreeSet;
use std::sync::Arc;

use log::{debug, info};
use rayon::ThreadPool;
use rayon::prelude::*;

use crate::bag::{Bag, PayloadFile, compute_oxum};
use crate::checksum::{ChecksumEngine, worker_pool};
use crate::config::CoreConfig;
use crate::derivatives::DerivativeSetResolver;
use crate::error::{CoreError, CoreResult};
use crate::logging;
use crate::manifest::{self, ControlFiles};
use crate::metadata::{MediaInspector, MetadataConsistencyChecker, SidecarRecord, sidecar_path_for};

pub use finding::{FieldMismatch, Finding, FindingKind, Severity};
pub use report::{PendingReport, ValidationReport, Verdict};

/// Which phases a validation runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValidationScope {
    /// Integrity, derivatives and metadata.
    Full,
    /// Control files, bijection, checksums, Oxum and tag manifest only.
    IntegrityOnly,
}

/// Validates bags against one configuration.
///
/// Hashing and metadata inspection share one pool of `hash_workers`
/// threads, however many bags are validated concurrently.
pub struct BagValidator<'a> {
    config: &'a CoreConfig,
    engine: ChecksumEngine,
    pool: Arc<ThreadPool>,
    resolver: DerivativeSetResolver,
    checker: MetadataConsistencyChecker,
    inspector: Option<&'a dyn MediaInspector>,
}

impl<'a> BagValidator<'a> {
    /// A validator without metadata cross-checks unless `inspector` is given.
    pub fn new(config: &'a CoreConfig, inspector: Option<&'a dyn MediaInspector>) -> CoreResult<Self> {
        Self::with_pool(config, inspector, worker_pool(config.hash_workers)?)
    }

    /// A validator running its per-file work on an existing pool.
    pub fn with_pool(
        config: &'a CoreConfig,
        inspector: Option<&'a dyn MediaInspector>,
        pool: Arc<ThreadPool>,
    ) -> CoreResult<Self> {
        Ok(Self {
            config,
            engine: ChecksumEngine::new(config.chunk_size),
            pool,
            resolver: DerivativeSetResolver::new(config)?,
            checker: MetadataConsistencyChecker::new(config),
            inspector,
        })
    }

    /// Runs every phase and returns the bag's report.
    pub fn validate(&self, bag: &Bag) -> ValidationReport {
        self.run(bag, ValidationScope::Full)
    }

    /// Runs only the integrity phases.
    pub fn verify_integrity(&self, bag: &Bag) -> ValidationReport {
        self.run(bag, ValidationScope::IntegrityOnly)
    }

    pub fn run(&self, bag: &Bag, scope: ValidationScope) -> ValidationReport {
        logging::log_section(&format!("VALIDATING {}", bag.id()));
        let mut report = PendingReport::new(bag.id());

        logging::log_subsection("CONTROL FILES");
        let control = match manifest::load(bag.root(), self.config) {
            Ok(control) => control,
            Err(err) => {
                report.add(load_failure(err));
                return conclude(report);
            }
        };

        let payload = match bag.payload_files() {
            Ok(files) => files,
            Err(err) => {
                report.add(Finding::new(
                    FindingKind::IoError,
                    self.config.payload_dir.as_str(),
                    format!("could not list payload: {err}"),
                ));
                return conclude(report);
            }
        };

        logging::log_subsection("MANIFEST / PAYLOAD BIJECTION");
        let verifiable = check_bijection(&control, &payload, &mut report);

        logging::log_subsection("PAYLOAD CHECKSUMS");
        self.check_payload_checksums(bag, &control, &verifiable, &mut report);

        logging::log_subsection("PAYLOAD-OXUM");
        check_oxum(&control, &payload, self.config, &mut report);

        logging::log_subsection("TAG MANIFEST");
        self.check_tag_manifest(bag, &control, &mut report);

        if scope == ValidationScope::Full {
            let paths: Vec<&str> = payload.iter().map(|f| f.path.as_str()).collect();

            logging::log_subsection("DERIVATIVES");
            let (_, findings) = self.resolver.resolve(&paths);
            report.add_all(findings);

            if let Some(inspector) = self.inspector {
                logging::log_subsection("SIDECAR METADATA");
                self.check_metadata(bag, &paths, inspector, &mut report);
            } else {
                debug!("{}: no media inspector, skipping metadata checks", bag.id());
            }
        }

        conclude(report)
    }

    fn check_payload_checksums(
        &self,
        bag: &Bag,
        control: &ControlFiles,
        paths: &[String],
        report: &mut PendingReport,
    ) {
        let results = self.engine.hash_all(bag.root(), paths, &self.pool);

        for (path, result) in results {
            let Some(expected) = control.manifest.get(&path) else {
                continue;
            };
            match result {
                Ok(actual) if actual.eq_ignore_ascii_case(expected) => {}
                Ok(actual) => {
                    report.add(Finding::new(
                        FindingKind::ChecksumMismatch,
                        path.as_str(),
                        format!("manifest has {expected}, file hashes to {actual}"),
                    ));
                    report.mark_changed(path);
                }
                Err(err) => report.add(Finding::new(
                    FindingKind::IoError,
                    path.as_str(),
                    format!("could not hash: {err}"),
                )),
            }
        }
    }

    fn check_tag_manifest(&self, bag: &Bag, control: &ControlFiles, report: &mut PendingReport) {
        for entry in control.tag_manifest.entries() {
            let full = bag.resolve(&entry.path);
            if !full.is_file() {
                report.add(Finding::new(
                    FindingKind::CorruptBag,
                    entry.path.as_str(),
                    "listed in tag manifest but missing",
                ));
                continue;
            }
            match self.engine.hash(&full) {
                Ok(actual) if actual.eq_ignore_ascii_case(&entry.checksum) => {}
                Ok(actual) => report.add(Finding::new(
                    FindingKind::TagChecksumMismatch,
                    entry.path.as_str(),
                    format!("tag manifest has {}, file hashes to {actual}", entry.checksum),
                )),
                Err(err) => report.add(Finding::new(
                    FindingKind::IoError,
                    entry.path.as_str(),
                    format!("could not hash: {err}"),
                )),
            }
        }
    }

    /// Checks every payload file that has a sidecar next to it.
    fn check_metadata(
        &self,
        bag: &Bag,
        paths: &[&str],
        inspector: &dyn MediaInspector,
        report: &mut PendingReport,
    ) {
        let present: BTreeSet<&str> = paths.iter().copied().collect();
        let pairs: Vec<(&str, String)> = paths
            .iter()
            .filter(|path| self.is_media_candidate(path))
            .filter_map(|path| {
                let sidecar = sidecar_path_for(path, &self.config.sidecar_extension);
                present.contains(sidecar.as_str()).then_some((*path, sidecar))
            })
            .collect();
        debug!("{}: {} media file(s) with sidecars", bag.id(), pairs.len());

        let check_one = |(media, sidecar): &(&str, String)| -> Vec<Finding> {
            let record = match SidecarRecord::load(&bag.resolve(sidecar)) {
                Ok(record) => record,
                Err(err) => {
                    return vec![Finding::new(
                        FindingKind::SidecarUnreadable,
                        sidecar.as_str(),
                        format!("could not read sidecar: {err}"),
                    )];
                }
            };
            match inspector.inspect(&bag.resolve(media)) {
                Ok(facts) => self.checker.check(media, &record, &facts),
                Err(err) => vec![Finding::new(
                    FindingKind::InspectionFailed,
                    *media,
                    err.to_string(),
                )],
            }
        };

        let findings: Vec<Vec<Finding>> =
            self.pool.install(|| pairs.par_iter().map(check_one).collect());
        report.add_all(findings.into_iter().flatten());
    }

    /// Sidecars and auxiliary files (framemd5, cue, xml, ...) share their
    /// master's stem but are never inspected against its sidecar.
    fn is_media_candidate(&self, path: &str) -> bool {
        let file_name = path.rsplit('/').next().unwrap_or(path);
        match file_name.rsplit_once('.') {
            Some((_, ext)) => {
                !self.config.is_sidecar_extension(ext) && !self.config.is_auxiliary_extension(ext)
            }
            None => true,
        }
    }
}

/// Validates one bag with a fresh validator.
pub fn validate_bag(
    bag: &Bag,
    config: &CoreConfig,
    inspector: Option<&dyn MediaInspector>,
) -> CoreResult<ValidationReport> {
    Ok(BagValidator::new(config, inspector)?.validate(bag))
}

fn load_failure(err: CoreError) -> Finding {
    match err {
        CoreError::Parse { file, line, text } => Finding::new(
            FindingKind::ParseError,
            file,
            format!("line {line}: malformed line {text:?}"),
        ),
        CoreError::MissingControlFile(path) => Finding::new(
            FindingKind::CorruptBag,
            path.file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| path.display().to_string()),
            "control file missing",
        ),
        other => Finding::new(
            FindingKind::IoError,
            "control files",
            format!("could not load control files: {other}"),
        ),
    }
}

/// Reports paths on only one side of the manifest/payload bijection and
/// returns the paths on both sides, in payload order.
fn check_bijection(
    control: &ControlFiles,
    payload: &[PayloadFile],
    report: &mut PendingReport,
) -> Vec<String> {
    let on_disk: BTreeSet<&str> = payload.iter().map(|f| f.path.as_str()).collect();
    let listed: BTreeSet<&str> = control.manifest.paths().collect();

    for path in listed.difference(&on_disk) {
        report.add(Finding::new(
            FindingKind::CorruptBag,
            *path,
            "listed in manifest but missing from payload",
        ));
        report.mark_changed(*path);
    }
    for path in on_disk.difference(&listed) {
        report.add(Finding::new(
            FindingKind::CorruptBag,
            *path,
            "present in payload but not listed in manifest",
        ));
        report.mark_changed(*path);
    }

    payload
        .iter()
        .filter(|f| listed.contains(f.path.as_str()))
        .map(|f| f.path.clone())
        .collect()
}

fn check_oxum(
    control: &ControlFiles,
    payload: &[PayloadFile],
    config: &CoreConfig,
    report: &mut PendingReport,
) {
    let actual = compute_oxum(payload);
    match control.bag_info.payload_oxum() {
        None => report.add(Finding::new(
            FindingKind::OxumMissing,
            config.bag_info_name.as_str(),
            format!("no Payload-Oxum; payload is {actual}"),
        )),
        Some(Err(reason)) => report.add(Finding::new(
            FindingKind::OxumMalformed,
            config.bag_info_name.as_str(),
            format!("malformed Payload-Oxum: {reason}"),
        )),
        Some(Ok(declared)) if declared != actual => report.add(Finding::new(
            FindingKind::OxumMismatch,
            config.bag_info_name.as_str(),
            format!("Payload-Oxum is {declared}, payload is {actual}"),
        )),
        Some(Ok(_)) => {}
    }
}

fn conclude(report: PendingReport) -> ValidationReport {
    let report = report.finish();
    let status = if report.passed() { "PASSED" } else { "FAILED" };
    logging::log_status(
        status,
        &format!(
            "{}: {} error(s), {} warning(s)",
            report.bag_id(),
            report.errors().len(),
            report.warnings().len()
        ),
    );
    info!("{}", report.format());
    report
}
