use std::collections::{BTreeMap, BTreeSet};
use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

use super::finding::{Finding, FindingKind, Severity};

/// Terminal outcome of validating one bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Verdict {
    Passed,
    Failed,
}

impl Display for Verdict {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Verdict::Passed => write!(f, "PASSED"),
            Verdict::Failed => write!(f, "FAILED"),
        }
    }
}

/// A report still collecting findings.
///
/// Findings are logged as they arrive. `finish` computes the verdict and
/// yields the immutable `ValidationReport`.
#[derive(Debug, Clone)]
pub struct PendingReport {
    bag_id: String,
    findings: Vec<Finding>,
    changed_paths: BTreeSet<String>,
}

impl PendingReport {
    pub fn new<S: Into<String>>(bag_id: S) -> Self {
        Self {
            bag_id: bag_id.into(),
            findings: Vec::new(),
            changed_paths: BTreeSet::new(),
        }
    }

    pub fn bag_id(&self) -> &str {
        &self.bag_id
    }

    /// Records a finding with immediate logging.
    pub fn add(&mut self, finding: Finding) {
        match finding.severity {
            Severity::Error => log::error!("{}: {}", self.bag_id, finding),
            Severity::Warning => log::warn!("{}: {}", self.bag_id, finding),
        }
        self.findings.push(finding);
    }

    pub fn add_all<I: IntoIterator<Item = Finding>>(&mut self, findings: I) {
        for finding in findings {
            self.add(finding);
        }
    }

    /// Marks a payload path whose manifest entry no longer describes it.
    pub fn mark_changed<S: Into<String>>(&mut self, path: S) {
        self.changed_paths.insert(path.into());
    }

    pub fn error_count(&self) -> usize {
        self.findings.iter().filter(|f| f.is_error()).count()
    }

    /// Computes the verdict: FAILED iff at least one ERROR finding exists.
    pub fn finish(self) -> ValidationReport {
        let verdict = if self.findings.iter().any(Finding::is_error) {
            Verdict::Failed
        } else {
            Verdict::Passed
        };
        ValidationReport {
            bag_id: self.bag_id,
            verdict,
            findings: self.findings,
            changed_paths: self.changed_paths,
        }
    }
}

/// Findings for one bag plus its verdict. Immutable once built.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ValidationReport {
    bag_id: String,
    verdict: Verdict,
    findings: Vec<Finding>,
    changed_paths: BTreeSet<String>,
}

impl ValidationReport {
    pub fn bag_id(&self) -> &str {
        &self.bag_id
    }

    pub fn verdict(&self) -> Verdict {
        self.verdict
    }

    pub fn passed(&self) -> bool {
        self.verdict == Verdict::Passed
    }

    pub fn findings(&self) -> &[Finding] {
        &self.findings
    }

    pub fn errors(&self) -> Vec<&Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Error).collect()
    }

    pub fn warnings(&self) -> Vec<&Finding> {
        self.findings.iter().filter(|f| f.severity == Severity::Warning).collect()
    }

    pub fn of_kind(&self, kind: FindingKind) -> Vec<&Finding> {
        self.findings.iter().filter(|f| f.kind == kind).collect()
    }

    /// Payload paths whose bytes, presence or absence no longer match the
    /// manifest: the input `repair` needs to bring the bag back in line.
    pub fn changed_paths(&self) -> Vec<String> {
        self.changed_paths.iter().cloned().collect()
    }

    /// Formatted multi-line summary for terminals and log files.
    pub fn format(&self) -> String {
        let mut lines = Vec::new();
        lines.push("=".repeat(80));
        lines.push(format!(
            "BAG {} - {}",
            self.bag_id,
            match self.verdict {
                Verdict::Passed => "✅ PASSED",
                Verdict::Failed => "❌ FAILED",
            }
        ));
        lines.push("=".repeat(80));

        let mut by_kind: BTreeMap<FindingKind, Vec<&Finding>> = BTreeMap::new();
        for finding in &self.findings {
            by_kind.entry(finding.kind).or_default().push(finding);
        }
        for (kind, findings) in by_kind {
            lines.push(format!("{} ({}):", kind, findings.len()));
            for finding in findings {
                let prefix = match finding.severity {
                    Severity::Error => "❌",
                    Severity::Warning => "⚠️",
                };
                lines.push(format!("  {} {}: {}", prefix, finding.subject, finding.message));
            }
        }

        lines.push("-".repeat(80));
        lines.push(format!(
            "{} error(s), {} warning(s)",
            self.errors().len(),
            self.warnings().len()
        ));
        lines.join("\n")
    }
}

impl Display for ValidationReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.format())
    }
}
