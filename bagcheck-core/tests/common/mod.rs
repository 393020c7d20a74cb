// bagcheck-core/tests/common/mod.rs
//
// Shared fixtures: throw-away bags with consistent control files and a fake
// media inspector.

#![allow(dead_code)]

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};

use bagcheck_core::{ChecksumEngine, CoreError, CoreResult, MediaFacts, MediaInspector};
use tempfile::TempDir;

pub const PM_PATH: &str = "data/PreservationMasters/abc_123456_v01_pm.mkv";
pub const PM_SIDECAR_PATH: &str = "data/PreservationMasters/abc_123456_v01_pm.json";
pub const SC_PATH: &str = "data/ServiceCopies/abc_123456_v01_sc.mp4";

/// Builds a bag whose manifest, bag-info and tag manifest all agree with
/// the payload.
#[derive(Default)]
pub struct BagFixture {
    name: String,
    files: Vec<(String, Vec<u8>)>,
}

impl BagFixture {
    pub fn new(name: &str) -> Self {
        Self {
            name: name.to_string(),
            files: Vec::new(),
        }
    }

    pub fn file(mut self, path: &str, bytes: &[u8]) -> Self {
        self.files.push((path.to_string(), bytes.to_vec()));
        self
    }

    /// Creates the bag in a fresh temp directory.
    pub fn build(self) -> BuiltBag {
        let dir = tempfile::tempdir().unwrap();
        let root = self.build_in(dir.path());
        BuiltBag { _dir: Some(dir), root }
    }

    /// Creates the bag as `<parent>/<name>` and returns its root.
    pub fn build_in(self, parent: &Path) -> PathBuf {
        let root = parent.join(&self.name);
        fs::create_dir_all(root.join("data")).unwrap();
        let engine = ChecksumEngine::default();

        let mut manifest = String::new();
        let mut bytes = 0u64;
        for (path, content) in &self.files {
            let full = root.join(path);
            fs::create_dir_all(full.parent().unwrap()).unwrap();
            fs::write(&full, content).unwrap();
            manifest.push_str(&format!("{}  {}\n", engine.hash_bytes(content), path));
            bytes += content.len() as u64;
        }
        let declaration = "BagIt-Version: 0.97\nTag-File-Character-Encoding: UTF-8\n";
        let info = format!(
            "Source-Organization: Test Archive\nBagging-Date: 2024-01-15\nPayload-Oxum: {}.{}\n",
            bytes,
            self.files.len()
        );
        let tag_manifest = format!(
            "{}  bagit.txt\n{}  manifest-md5.txt\n{}  bag-info.txt\n",
            engine.hash_bytes(declaration.as_bytes()),
            engine.hash_bytes(manifest.as_bytes()),
            engine.hash_bytes(info.as_bytes())
        );

        fs::write(root.join("bagit.txt"), declaration).unwrap();
        fs::write(root.join("manifest-md5.txt"), manifest).unwrap();
        fs::write(root.join("bag-info.txt"), info).unwrap();
        fs::write(root.join("tagmanifest-md5.txt"), tag_manifest).unwrap();
        root
    }
}

pub struct BuiltBag {
    _dir: Option<TempDir>,
    pub root: PathBuf,
}

impl BuiltBag {
    pub fn path(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    pub fn read_text(&self, relative: &str) -> String {
        fs::read_to_string(self.path(relative)).unwrap()
    }

    pub fn write(&self, relative: &str, bytes: &[u8]) {
        let full = self.path(relative);
        fs::create_dir_all(full.parent().unwrap()).unwrap();
        fs::write(full, bytes).unwrap();
    }

    /// Flips the first byte of a payload file, keeping its size.
    pub fn flip_byte(&self, relative: &str) {
        let full = self.path(relative);
        let mut bytes = fs::read(&full).unwrap();
        bytes[0] ^= 0xff;
        fs::write(full, bytes).unwrap();
    }
}

/// Sidecar JSON describing a file with the given size.
pub fn sidecar_json(file_name: &str, size: u64) -> String {
    let (stem, ext) = file_name.split_once('.').unwrap();
    format!(
        r#"{{
  "asset": {{"referenceFilename": "{file_name}"}},
  "technical": {{
    "filename": "{stem}",
    "extension": "{ext}",
    "fileFormat": "Matroska",
    "audioCodec": "FLAC",
    "videoCodec": "FFV1",
    "fileSize": {{"measure": {size}, "unit": "B"}},
    "durationMilli": {{"measure": 120000, "unit": "ms"}},
    "dateCreated": "2024-01-15"
  }}
}}"#
    )
}

/// Facts matching `sidecar_json(file_name, size)`.
pub fn matching_facts(file_name: &str, size: u64) -> MediaFacts {
    MediaFacts {
        file_name: file_name.to_string(),
        format: Some("matroska,webm".to_string()),
        audio_codec: Some("flac".to_string()),
        video_codec: Some("ffv1".to_string()),
        size,
        duration_ms: Some(120_000),
        date_created: chrono::NaiveDate::from_ymd_opt(2024, 1, 15),
    }
}

/// Inspector answering from a fixed table keyed by file name.
#[derive(Default)]
pub struct FakeInspector {
    facts: HashMap<String, MediaFacts>,
}

impl FakeInspector {
    pub fn with(mut self, facts: MediaFacts) -> Self {
        self.facts.insert(facts.file_name.clone(), facts);
        self
    }
}

impl MediaInspector for FakeInspector {
    fn inspect(&self, path: &Path) -> CoreResult<MediaFacts> {
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        self.facts.get(&name).cloned().ok_or_else(|| CoreError::Inspection {
            path: path.to_path_buf(),
            message: "no facts recorded".to_string(),
        })
    }
}
