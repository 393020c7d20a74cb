// bagcheck-core/tests/metadata_tests.rs

mod common;

use bagcheck_core::{Bag, CoreConfig, FindingKind, validate_bag};
use common::{
    BagFixture, FakeInspector, PM_PATH, PM_SIDECAR_PATH, SC_PATH, matching_facts, sidecar_json,
};

const PM_BYTES: &[u8] = b"preservation master bytes";
const PM_NAME: &str = "abc_123456_v01_pm.mkv";

fn bag_with_sidecar(sidecar: &str) -> common::BuiltBag {
    BagFixture::new("bag_meta")
        .file(PM_PATH, PM_BYTES)
        .file(PM_SIDECAR_PATH, sidecar.as_bytes())
        .file(SC_PATH, b"sc")
        .build()
}

#[test]
fn matching_sidecar_passes_with_no_findings() -> Result<(), Box<dyn std::error::Error>> {
    let bag = bag_with_sidecar(&sidecar_json(PM_NAME, PM_BYTES.len() as u64));
    let inspector = FakeInspector::default().with(matching_facts(PM_NAME, PM_BYTES.len() as u64));
    let config = CoreConfig::default();

    let report = validate_bag(&Bag::open(&bag.root, &config)?, &config, Some(&inspector))?;
    assert!(report.passed());
    assert!(report.findings().is_empty(), "{:?}", report.findings());
    Ok(())
}

#[test]
fn aux_files_next_to_master_are_not_inspected() -> Result<(), Box<dyn std::error::Error>> {
    let bag = BagFixture::new("bag_aux")
        .file(PM_PATH, PM_BYTES)
        .file(
            PM_SIDECAR_PATH,
            sidecar_json(PM_NAME, PM_BYTES.len() as u64).as_bytes(),
        )
        .file(
            "data/PreservationMasters/abc_123456_v01_pm.framemd5",
            b"#format: frame checksums",
        )
        .file("data/PreservationMasters/abc_123456_v01_pm.cue", b"FILE x")
        .file(SC_PATH, b"sc")
        .build();
    let inspector = FakeInspector::default().with(matching_facts(PM_NAME, PM_BYTES.len() as u64));
    let config = CoreConfig::default();

    let report = validate_bag(&Bag::open(&bag.root, &config)?, &config, Some(&inspector))?;
    assert!(report.findings().is_empty(), "{:?}", report.findings());
    Ok(())
}

#[test]
fn size_mismatch_reports_field_values() -> Result<(), Box<dyn std::error::Error>> {
    let bag = bag_with_sidecar(&sidecar_json(PM_NAME, 999));
    let inspector = FakeInspector::default().with(matching_facts(PM_NAME, PM_BYTES.len() as u64));
    let config = CoreConfig::default();

    let report = validate_bag(&Bag::open(&bag.root, &config)?, &config, Some(&inspector))?;
    assert!(report.passed(), "metadata findings are warnings");
    let findings = report.of_kind(FindingKind::MetadataInconsistency);
    assert_eq!(findings.len(), 1);
    assert_eq!(findings[0].subject, PM_PATH);
    let field = findings[0].field.as_ref().unwrap();
    assert_eq!(field.field, "technical.fileSize.measure");
    assert_eq!(field.expected, "999");
    assert_eq!(field.actual, PM_BYTES.len().to_string());
    Ok(())
}

#[test]
fn several_mismatches_all_reported() -> Result<(), Box<dyn std::error::Error>> {
    let bag = bag_with_sidecar(&sidecar_json(PM_NAME, PM_BYTES.len() as u64));
    let mut facts = matching_facts(PM_NAME, PM_BYTES.len() as u64);
    facts.audio_codec = Some("pcm_s24le".to_string());
    facts.duration_ms = Some(1);
    let inspector = FakeInspector::default().with(facts);
    let config = CoreConfig::default();

    let report = validate_bag(&Bag::open(&bag.root, &config)?, &config, Some(&inspector))?;
    assert_eq!(report.of_kind(FindingKind::MetadataInconsistency).len(), 2);
    Ok(())
}

#[test]
fn unreadable_sidecar_is_a_warning() -> Result<(), Box<dyn std::error::Error>> {
    let bag = bag_with_sidecar("{ not json");
    let inspector = FakeInspector::default().with(matching_facts(PM_NAME, PM_BYTES.len() as u64));
    let config = CoreConfig::default();

    let report = validate_bag(&Bag::open(&bag.root, &config)?, &config, Some(&inspector))?;
    assert!(report.passed());
    let unreadable = report.of_kind(FindingKind::SidecarUnreadable);
    assert_eq!(unreadable.len(), 1);
    assert_eq!(unreadable[0].subject, PM_SIDECAR_PATH);
    Ok(())
}

#[test]
fn inspection_failure_is_a_warning() -> Result<(), Box<dyn std::error::Error>> {
    let bag = bag_with_sidecar(&sidecar_json(PM_NAME, PM_BYTES.len() as u64));
    let config = CoreConfig::default();

    let report = validate_bag(
        &Bag::open(&bag.root, &config)?,
        &config,
        Some(&FakeInspector::default()),
    )?;
    assert!(report.passed());
    assert_eq!(report.of_kind(FindingKind::InspectionFailed).len(), 1);
    Ok(())
}

#[test]
fn no_inspector_skips_metadata() -> Result<(), Box<dyn std::error::Error>> {
    let bag = bag_with_sidecar(&sidecar_json(PM_NAME, 1));
    let config = CoreConfig::default();

    let report = validate_bag(&Bag::open(&bag.root, &config)?, &config, None)?;
    assert!(report.findings().is_empty(), "{:?}", report.findings());
    Ok(())
}
