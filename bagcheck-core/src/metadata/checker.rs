//! Cross-checks sidecar records against inspected media facts.

use std::collections::HashMap;

use chrono::NaiveDate;

use super::facts::MediaFacts;
use super::sidecar::SidecarRecord;
use crate::config::CoreConfig;
use crate::validation::finding::Finding;

const ABSENT: &str = "<absent>";

/// Compares every known sidecar field against the inspected facts.
///
/// All fields are always compared; each mismatch becomes one
/// `MetadataInconsistency` finding carrying field, expected and actual value.
#[derive(Debug, Clone)]
pub struct MetadataConsistencyChecker {
    aliases: HashMap<String, String>,
    duration_tolerance_ms: u64,
}

impl MetadataConsistencyChecker {
    pub fn new(config: &CoreConfig) -> Self {
        let aliases = config
            .format_aliases
            .iter()
            .map(|(label, canonical)| (label.to_ascii_lowercase(), canonical.to_ascii_lowercase()))
            .collect();
        Self {
            aliases,
            duration_tolerance_ms: config.duration_tolerance_ms,
        }
    }

    /// Canonical form of a format label; unknown labels compare as themselves.
    pub fn normalize_format(&self, label: &str) -> String {
        let label = label.trim().to_ascii_lowercase();
        self.aliases.get(&label).cloned().unwrap_or(label)
    }

    /// Whether an inspected format matches the sidecar's.
    ///
    /// Inspectors may report a comma-joined list (`mov,mp4,m4a,...`); the
    /// whole label is tried first, then each member.
    fn formats_match(&self, expected: &str, actual: &str) -> bool {
        let expected = self.normalize_format(expected);
        self.normalize_format(actual) == expected
            || actual
                .split(',')
                .any(|member| self.normalize_format(member) == expected)
    }

    pub fn check(&self, subject: &str, sidecar: &SidecarRecord, facts: &MediaFacts) -> Vec<Finding> {
        let mut findings = Vec::new();
        let technical = &sidecar.technical;
        let mut mismatch = |field: &str, expected: &str, actual: &str| {
            findings.push(Finding::field_mismatch(subject, field, expected, actual));
        };

        if let Some(expected) = &sidecar.asset.reference_filename {
            if expected != &facts.file_name {
                mismatch("asset.referenceFilename", expected, &facts.file_name);
            }
        }

        match &technical.filename {
            Some(expected) if expected == facts.stem() || expected == &facts.file_name => {}
            Some(expected) => mismatch("technical.filename", expected, facts.stem()),
            None => mismatch("technical.filename", ABSENT, facts.stem()),
        }

        match &technical.extension {
            Some(expected)
                if expected
                    .trim_start_matches('.')
                    .eq_ignore_ascii_case(facts.extension()) => {}
            Some(expected) => mismatch("technical.extension", expected, facts.extension()),
            None => mismatch("technical.extension", ABSENT, facts.extension()),
        }

        match (&technical.file_format, &facts.format) {
            (Some(expected), Some(actual)) if self.formats_match(expected, actual) => {}
            (None, None) => {}
            (expected, actual) => mismatch(
                "technical.fileFormat",
                expected.as_deref().unwrap_or(ABSENT),
                actual.as_deref().unwrap_or(ABSENT),
            ),
        }

        for (field, expected, actual) in [
            ("technical.audioCodec", &technical.audio_codec, &facts.audio_codec),
            ("technical.videoCodec", &technical.video_codec, &facts.video_codec),
        ] {
            match (expected, actual) {
                (Some(e), Some(a)) if e.trim().eq_ignore_ascii_case(a.trim()) => {}
                (None, None) => {}
                (e, a) => mismatch(
                    field,
                    e.as_deref().unwrap_or(ABSENT),
                    a.as_deref().unwrap_or(ABSENT),
                ),
            }
        }

        match &technical.file_size {
            Some(expected) if expected.measure == facts.size => {}
            Some(expected) => mismatch(
                "technical.fileSize.measure",
                &expected.measure.to_string(),
                &facts.size.to_string(),
            ),
            None => mismatch("technical.fileSize.measure", ABSENT, &facts.size.to_string()),
        }

        match (&technical.duration_milli, facts.duration_ms) {
            (Some(expected), Some(actual))
                if expected.measure.abs_diff(actual) <= self.duration_tolerance_ms => {}
            (None, None) => {}
            (expected, actual) => mismatch(
                "technical.durationMilli.measure",
                &expected.as_ref().map_or(ABSENT.to_string(), |m| m.measure.to_string()),
                &actual.map_or(ABSENT.to_string(), |a| a.to_string()),
            ),
        }

        match (&technical.date_created, facts.date_created) {
            (Some(expected), Some(actual)) if parse_date(expected) == Some(actual) => {}
            (None, None) => {}
            (expected, actual) => mismatch(
                "technical.dateCreated",
                expected.as_deref().unwrap_or(ABSENT),
                &actual.map_or(ABSENT.to_string(), |d| d.format("%Y-%m-%d").to_string()),
            ),
        }

        findings
    }
}

/// Date part of an ISO date or date-time string.
fn parse_date(text: &str) -> Option<NaiveDate> {
    let date = text.trim().get(..10)?;
    NaiveDate::parse_from_str(date, "%Y-%m-%d").ok()
}
