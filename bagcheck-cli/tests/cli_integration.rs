use assert_cmd::Command;
use bagcheck_core::ChecksumEngine;
use predicates::str::contains;
use std::error::Error;
use std::fs;
use std::path::{Path, PathBuf};
use tempfile::tempdir;

const PM_PATH: &str = "data/PreservationMasters/abc_123456_v01_pm.mkv";
const SC_PATH: &str = "data/ServiceCopies/abc_123456_v01_sc.mp4";

// Helper function to get the path to the compiled binary
fn bagcheck_cmd() -> Command {
    Command::cargo_bin("bagcheck").expect("Failed to find bagcheck binary")
}

/// Writes a consistent two-file bag at `<parent>/<name>`.
fn make_bag(parent: &Path, name: &str) -> Result<PathBuf, Box<dyn Error>> {
    let root = parent.join(name);
    let engine = ChecksumEngine::default();
    let mut manifest = String::new();
    let mut bytes = 0;
    for (path, content) in [(PM_PATH, &b"pm bytes"[..]), (SC_PATH, &b"sc bytes"[..])] {
        let full = root.join(path);
        fs::create_dir_all(full.parent().unwrap())?;
        fs::write(&full, content)?;
        manifest.push_str(&format!("{}  {}\n", engine.hash_bytes(content), path));
        bytes += content.len();
    }
    let info = format!("Payload-Oxum: {bytes}.2\n");
    fs::write(root.join("bagit.txt"), "BagIt-Version: 0.97\n")?;
    fs::write(root.join("manifest-md5.txt"), &manifest)?;
    fs::write(root.join("bag-info.txt"), &info)?;
    fs::write(
        root.join("tagmanifest-md5.txt"),
        format!(
            "{}  manifest-md5.txt\n{}  bag-info.txt\n",
            engine.hash_bytes(manifest.as_bytes()),
            engine.hash_bytes(info.as_bytes())
        ),
    )?;
    Ok(root)
}

#[test]
fn test_validate_consistent_bag_exits_zero() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let bag = make_bag(dir.path(), "bag_ok")?;

    bagcheck_cmd()
        .args(["validate", "--no-metadata"])
        .arg(&bag)
        .assert()
        .code(0)
        .stdout(contains("PASSED"))
        .stdout(contains("bag_ok"));
    Ok(())
}

#[test]
fn test_validate_corrupted_bag_exits_one() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let bag = make_bag(dir.path(), "bag_bad")?;
    fs::write(bag.join(PM_PATH), b"PM BYTES")?;

    bagcheck_cmd()
        .args(["validate", "--no-metadata"])
        .arg(&bag)
        .assert()
        .code(1)
        .stdout(contains("FAILED"));
    Ok(())
}

#[test]
fn test_validate_non_existent_target_exits_two() -> Result<(), Box<dyn Error>> {
    bagcheck_cmd()
        .args(["validate", "--no-metadata", "surely/this/does/not/exist"])
        .assert()
        .code(2)
        .stderr(contains("Bag not found"));
    Ok(())
}

#[test]
fn test_validate_directory_of_bags() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    make_bag(dir.path(), "bag_a")?;
    let bad = make_bag(dir.path(), "bag_b")?;
    fs::remove_file(bad.join(SC_PATH))?;

    bagcheck_cmd()
        .args(["validate", "--no-metadata", "--jobs", "2"])
        .arg(dir.path())
        .assert()
        .code(1)
        .stdout(contains("2 bag(s): 1 passed, 1 failed"));
    Ok(())
}

#[test]
fn test_csv_report_export() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let bag = make_bag(dir.path(), "bag_csv")?;
    fs::write(bag.join(PM_PATH), b"PM BYTES")?;
    let report = dir.path().join("findings.csv");

    bagcheck_cmd()
        .args(["validate", "--no-metadata", "--report"])
        .arg(&report)
        .arg(&bag)
        .assert()
        .code(1);

    let csv = fs::read_to_string(&report)?;
    let mut lines = csv.lines();
    assert_eq!(lines.next(), Some("bag_id,path_or_asset_id,kind,severity,message"));
    let row = lines.next().unwrap();
    assert!(row.starts_with(&format!("bag_csv,{PM_PATH},checksum_mismatch,ERROR,")));
    Ok(())
}

#[test]
fn test_json_report_export() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let bag = make_bag(dir.path(), "bag_json")?;
    let report = dir.path().join("summary.json");

    bagcheck_cmd()
        .args(["validate", "--no-metadata", "--report"])
        .arg(&report)
        .arg(&bag)
        .assert()
        .code(0);

    let text = fs::read_to_string(&report)?;
    assert!(text.contains("\"bag_id\": \"bag_json\""));
    assert!(text.contains("\"verdict\": \"PASSED\""));
    Ok(())
}

#[test]
fn test_repair_then_revalidate() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let bag = make_bag(dir.path(), "bag_repair")?;
    fs::write(bag.join(SC_PATH), b"regenerated service copy")?;

    bagcheck_cmd()
        .args(["validate", "--no-metadata", "--repair"])
        .arg(&bag)
        .assert()
        .code(0)
        .stdout(contains("repair: VERIFIED"));

    bagcheck_cmd()
        .args(["validate", "--no-metadata"])
        .arg(&bag)
        .assert()
        .code(0);
    Ok(())
}

#[test]
fn test_log_dir_writes_timestamped_log() -> Result<(), Box<dyn Error>> {
    let dir = tempdir()?;
    let bag = make_bag(dir.path(), "bag_log")?;
    let logs = dir.path().join("logs");

    bagcheck_cmd()
        .args(["validate", "--no-metadata", "--log-dir"])
        .arg(&logs)
        .arg(&bag)
        .assert()
        .code(0);

    let names: Vec<String> = fs::read_dir(&logs)?
        .filter_map(Result::ok)
        .map(|e| e.file_name().to_string_lossy().into_owned())
        .collect();
    assert_eq!(names.len(), 1);
    assert!(names[0].starts_with("bagcheck_validate_run_"));
    assert!(names[0].ends_with(".log"));
    Ok(())
}

#[test]
fn test_invalid_arguments() -> Result<(), Box<dyn Error>> {
    bagcheck_cmd()
        .args(["validate", "--jobs", "0", "somewhere"])
        .assert()
        .failure()
        .stderr(contains("--jobs"));
    bagcheck_cmd().arg("validate").assert().failure();
    Ok(())
}
