// bagcheck-core/tests/validation_tests.rs

mod common;

use std::collections::BTreeSet;

use bagcheck_core::{Bag, CoreConfig, FindingKind, Severity, Verdict, validate_bag};
use common::{BagFixture, PM_PATH, SC_PATH};

fn validate(root: &std::path::Path) -> bagcheck_core::ValidationReport {
    let config = CoreConfig::default();
    let bag = Bag::open(root, &config).unwrap();
    validate_bag(&bag, &config, None).unwrap()
}

fn complete_bag() -> common::BuiltBag {
    BagFixture::new("bag_complete")
        .file(PM_PATH, b"preservation master bytes")
        .file(SC_PATH, b"service copy")
        .build()
}

#[test]
fn consistent_bag_passes_with_no_findings() {
    let bag = complete_bag();
    let report = validate(&bag.root);
    assert_eq!(report.verdict(), Verdict::Passed);
    assert!(report.findings().is_empty(), "{:?}", report.findings());
    assert_eq!(report.bag_id(), "bag_complete");
}

#[test]
fn flipped_byte_is_one_checksum_mismatch_on_that_path() {
    let bag = complete_bag();
    bag.flip_byte(PM_PATH);

    let report = validate(&bag.root);
    assert_eq!(report.verdict(), Verdict::Failed);
    let errors = report.errors();
    assert_eq!(errors.len(), 1, "{errors:?}");
    assert_eq!(errors[0].kind, FindingKind::ChecksumMismatch);
    assert_eq!(errors[0].subject, PM_PATH);
    assert_eq!(report.changed_paths(), vec![PM_PATH.to_string()]);
}

#[test]
fn missing_service_copy_is_one_warning() {
    let bag = BagFixture::new("bag_pm_only")
        .file(PM_PATH, b"preservation master bytes")
        .build();

    let report = validate(&bag.root);
    assert_eq!(report.verdict(), Verdict::Passed);
    assert_eq!(report.findings().len(), 1);
    let warning = &report.findings()[0];
    assert_eq!(warning.severity, Severity::Warning);
    assert_eq!(warning.message, "missing sc for abc_123456_v01");
}

#[test]
fn subvariant_service_copies_are_not_conflicts() {
    let bag = BagFixture::new("bag_siblings")
        .file(PM_PATH, b"pm")
        .file("data/ServiceCopies/abc_123456_v01_talk_sc.mp4", b"talk")
        .file("data/ServiceCopies/abc_123456_v01_wide_sc.mp4", b"wide")
        .build();

    let report = validate(&bag.root);
    assert!(report.passed());
    assert!(report.findings().is_empty(), "{:?}", report.findings());
}

#[test]
fn readme_in_payload_is_a_warning() {
    let bag = BagFixture::new("bag_readme")
        .file(PM_PATH, b"pm")
        .file(SC_PATH, b"sc")
        .file("data/readme.txt", b"notes")
        .build();

    let report = validate(&bag.root);
    assert!(report.passed());
    let warnings = report.of_kind(FindingKind::NonConformingFilename);
    assert_eq!(warnings.len(), 1);
    assert_eq!(warnings[0].subject, "data/readme.txt");
}

#[test]
fn validation_is_idempotent() {
    let bag = BagFixture::new("bag_idem")
        .file(PM_PATH, b"pm")
        .file("data/readme.txt", b"notes")
        .build();
    bag.flip_byte(PM_PATH);
    bag.write("data/ServiceCopies/extra_file.mp4", b"unlisted");

    let first = validate(&bag.root);
    let second = validate(&bag.root);
    assert_eq!(first.findings(), second.findings());
    assert_eq!(first, second);
}

#[test]
fn unlisted_and_vanished_files_break_the_bijection() {
    let bag = complete_bag();
    std::fs::remove_file(bag.path(SC_PATH)).unwrap();
    bag.write("data/ServiceCopies/abc_123456_v01_wide_sc.mp4", b"new");

    let report = validate(&bag.root);
    assert!(!report.passed());
    let corrupt: BTreeSet<_> = report
        .of_kind(FindingKind::CorruptBag)
        .iter()
        .map(|f| f.subject.clone())
        .collect();
    assert_eq!(
        corrupt,
        BTreeSet::from([
            SC_PATH.to_string(),
            "data/ServiceCopies/abc_123456_v01_wide_sc.mp4".to_string()
        ])
    );
    assert_eq!(report.changed_paths().len(), 2);
    assert_eq!(report.of_kind(FindingKind::OxumMismatch).len(), 1);
}

#[test]
fn malformed_oxum_is_an_error_not_a_crash() {
    let bag = complete_bag();
    let info = bag.read_text("bag-info.txt").replace("Payload-Oxum: ", "Payload-Oxum: x");
    bag.write("bag-info.txt", info.as_bytes());

    let report = validate(&bag.root);
    assert_eq!(report.of_kind(FindingKind::OxumMalformed).len(), 1);
    // bag-info no longer matches its tag-manifest entry either.
    assert_eq!(report.of_kind(FindingKind::TagChecksumMismatch).len(), 1);
}

#[test]
fn missing_oxum_is_an_error() {
    let bag = complete_bag();
    let info: String = bag
        .read_text("bag-info.txt")
        .lines()
        .filter(|l| !l.starts_with("Payload-Oxum"))
        .map(|l| format!("{l}\n"))
        .collect();
    bag.write("bag-info.txt", info.as_bytes());

    let report = validate(&bag.root);
    assert_eq!(report.of_kind(FindingKind::OxumMissing).len(), 1);
}

#[test]
fn malformed_manifest_line_is_parse_error() {
    let bag = complete_bag();
    let mut manifest = bag.read_text("manifest-md5.txt");
    manifest.push_str("this line has no checksum\n");
    bag.write("manifest-md5.txt", manifest.as_bytes());

    let report = validate(&bag.root);
    assert!(!report.passed());
    let parse = report.of_kind(FindingKind::ParseError);
    assert_eq!(parse.len(), 1);
    assert_eq!(parse[0].subject, "manifest-md5.txt");
    assert!(parse[0].message.contains("line 3"));
}

#[test]
fn edited_declaration_fails_tag_manifest_check() {
    let bag = complete_bag();
    bag.write("bagit.txt", b"BagIt-Version: 1.0\nTag-File-Character-Encoding: UTF-8\n");

    let report = validate(&bag.root);
    let tag = report.of_kind(FindingKind::TagChecksumMismatch);
    assert_eq!(tag.len(), 1);
    assert_eq!(tag[0].subject, "bagit.txt");
}

#[test]
fn oxum_matches_payload_for_valid_bags() {
    let bag = complete_bag();
    let config = CoreConfig::default();
    let opened = Bag::open(&bag.root, &config).unwrap();
    let files = opened.payload_files().unwrap();
    let oxum = bagcheck_core::compute_oxum(&files);
    assert_eq!(oxum.count, 2);
    assert_eq!(oxum.bytes, files.iter().map(|f| f.size).sum::<u64>());
    assert!(bag.read_text("bag-info.txt").contains(&format!("Payload-Oxum: {oxum}")));
}
