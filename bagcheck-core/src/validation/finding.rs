use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

/// Finding severity. Only `Error` fails a bag.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum Severity {
    Error,
    Warning,
}

impl Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Severity::Error => write!(f, "ERROR"),
            Severity::Warning => write!(f, "WARNING"),
        }
    }
}

/// What kind of inconsistency a finding reports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FindingKind {
    /// A control file could not be parsed or read.
    ParseError,
    /// Manifest and payload disagree on which files exist.
    CorruptBag,
    ChecksumMismatch,
    TagChecksumMismatch,
    OxumMissing,
    OxumMalformed,
    OxumMismatch,
    DerivativeMissing,
    OrphanDerivative,
    /// A role copy stored under another role's directory.
    MisplacedDerivative,
    NonConformingFilename,
    MetadataInconsistency,
    SidecarUnreadable,
    InspectionFailed,
    IoError,
    RepairFailed,
}

impl FindingKind {
    /// Severity every finding of this kind carries.
    pub fn severity(self) -> Severity {
        match self {
            FindingKind::ParseError
            | FindingKind::CorruptBag
            | FindingKind::ChecksumMismatch
            | FindingKind::TagChecksumMismatch
            | FindingKind::OxumMissing
            | FindingKind::OxumMalformed
            | FindingKind::OxumMismatch
            | FindingKind::IoError
            | FindingKind::RepairFailed => Severity::Error,
            FindingKind::DerivativeMissing
            | FindingKind::OrphanDerivative
            | FindingKind::MisplacedDerivative
            | FindingKind::NonConformingFilename
            | FindingKind::MetadataInconsistency
            | FindingKind::SidecarUnreadable
            | FindingKind::InspectionFailed => Severity::Warning,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            FindingKind::ParseError => "parse_error",
            FindingKind::CorruptBag => "corrupt_bag",
            FindingKind::ChecksumMismatch => "checksum_mismatch",
            FindingKind::TagChecksumMismatch => "tag_checksum_mismatch",
            FindingKind::OxumMissing => "oxum_missing",
            FindingKind::OxumMalformed => "oxum_malformed",
            FindingKind::OxumMismatch => "oxum_mismatch",
            FindingKind::DerivativeMissing => "derivative_missing",
            FindingKind::OrphanDerivative => "orphan_derivative",
            FindingKind::MisplacedDerivative => "misplaced_derivative",
            FindingKind::NonConformingFilename => "non_conforming_filename",
            FindingKind::MetadataInconsistency => "metadata_inconsistency",
            FindingKind::SidecarUnreadable => "sidecar_unreadable",
            FindingKind::InspectionFailed => "inspection_failed",
            FindingKind::IoError => "io_error",
            FindingKind::RepairFailed => "repair_failed",
        }
    }
}

impl Display for FindingKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Expected (sidecar) versus actual (inspected) value of one metadata field.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct FieldMismatch {
    pub field: String,
    pub expected: String,
    pub actual: String,
}

/// One reported inconsistency.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Finding {
    pub kind: FindingKind,
    pub severity: Severity,
    /// Bag-relative payload path, control file name, or core asset id.
    pub subject: String,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub field: Option<FieldMismatch>,
}

impl Finding {
    /// A finding with the severity its kind implies.
    pub fn new<S: Into<String>, M: Into<String>>(kind: FindingKind, subject: S, message: M) -> Self {
        Self {
            kind,
            severity: kind.severity(),
            subject: subject.into(),
            message: message.into(),
            field: None,
        }
    }

    /// A metadata mismatch on one field.
    pub fn field_mismatch<S: Into<String>>(
        subject: S,
        field: &str,
        expected: &str,
        actual: &str,
    ) -> Self {
        let mut finding = Finding::new(
            FindingKind::MetadataInconsistency,
            subject,
            format!("{field}: sidecar says {expected:?}, file has {actual:?}"),
        );
        finding.field = Some(FieldMismatch {
            field: field.to_string(),
            expected: expected.to_string(),
            actual: actual.to_string(),
        });
        finding
    }

    pub fn is_error(&self) -> bool {
        self.severity == Severity::Error
    }
}

impl Display for Finding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}] {} {}: {}", self.severity, self.kind, self.subject, self.message)
    }
}
