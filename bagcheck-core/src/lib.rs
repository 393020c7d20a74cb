//! Core library for validating and repairing BagIt preservation packages.
//!
//! This crate verifies checksum manifests, Payload-Oxum and tag manifests,
//! cross-references role derivatives (preservation master, edit master,
//! mezzanine, service copy) of each asset, compares sidecar metadata against
//! inspected media facts, and repairs control files atomically after payload
//! changes.
//!
//! ## Usage Example
//!
//! ```rust,no_run
//! use bagcheck_core::config::CoreConfigBuilder;
//! use bagcheck_core::{CancellationToken, RunOptions, run};
//! use std::path::Path;
//!
//! let config = CoreConfigBuilder::new().bag_workers(2).build();
//! config.validate().unwrap();
//!
//! let summary = run(
//!     Path::new("/mnt/ingest/bags"),
//!     &config,
//!     RunOptions { repair: true },
//!     None,
//!     &CancellationToken::new(),
//! )
//! .unwrap();
//!
//! for report in summary.reports() {
//!     println!("{}: {}", report.bag_id(), report.verdict());
//! }
//! ```

pub mod atomic;
pub mod bag;
pub mod checksum;
pub mod config;
pub mod derivatives;
pub mod discovery;
pub mod error;
pub mod export;
pub mod external;
pub mod logging;
pub mod manifest;
pub mod metadata;
pub mod repair;
pub mod retry;
pub mod runner;
pub mod validation;

// Re-exports for public API
pub use bag::{Bag, PayloadFile, compute_oxum};
pub use checksum::ChecksumEngine;
pub use config::{CoreConfig, CoreConfigBuilder};
pub use derivatives::{DerivativeSetResolver, FilenameGrammar, Role, SourceCategory};
pub use discovery::find_bags;
pub use error::{CoreError, CoreResult};
pub use export::{ReportFormat, write_report};
pub use manifest::{BagInfo, ControlFiles, Manifest, PayloadOxum};
pub use metadata::{
    FfprobeInspector, MediaFacts, MediaInspector, MetadataConsistencyChecker, SidecarRecord,
};
pub use repair::{IntegrityRepairer, RepairResult, RepairState};
pub use retry::RetryPolicy;
pub use runner::{BagOutcome, CancellationToken, RunOptions, RunSummary, run};
pub use validation::{
    BagValidator, Finding, FindingKind, Severity, ValidationReport, Verdict, validate_bag,
};
