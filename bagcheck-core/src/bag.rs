//! A bag on disk: its root, its payload subtree, and the payload listing.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use walkdir::WalkDir;

use crate::config::{BAGIT_DECLARATION_NAME, CoreConfig};
use crate::error::{CoreError, CoreResult};
use crate::manifest::PayloadOxum;

/// One regular file under the payload root.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PayloadFile {
    /// Bag-relative path with `/` separators, e.g. `data/ServiceCopies/x_sc.mp4`.
    pub path: String,
    pub size: u64,
}

impl PayloadFile {
    /// Final path component.
    pub fn file_name(&self) -> &str {
        self.path.rsplit('/').next().unwrap_or(&self.path)
    }
}

/// A bag directory.
#[derive(Debug, Clone)]
pub struct Bag {
    root: PathBuf,
    payload_root: PathBuf,
    payload_dir: String,
    id: String,
}

impl Bag {
    /// Whether `path` looks like a bag root: a directory holding the
    /// manifest, bag-info or a `bagit.txt` declaration.
    pub fn is_bag(path: &Path, config: &CoreConfig) -> bool {
        path.is_dir()
            && [
                config.manifest_name.as_str(),
                config.bag_info_name.as_str(),
                BAGIT_DECLARATION_NAME,
            ]
            .iter()
            .any(|name| path.join(name).is_file())
    }

    /// Opens the bag rooted at `root`.
    pub fn open(root: &Path, config: &CoreConfig) -> CoreResult<Self> {
        if !root.exists() {
            return Err(CoreError::BagNotFound(root.to_path_buf()));
        }
        if !Self::is_bag(root, config) {
            return Err(CoreError::NotABag(root.to_path_buf()));
        }
        let id = root
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| root.display().to_string());
        Ok(Self {
            root: root.to_path_buf(),
            payload_root: root.join(&config.payload_dir),
            payload_dir: config.payload_dir.clone(),
            id,
        })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn payload_root(&self) -> &Path {
        &self.payload_root
    }

    /// Bag identifier used in reports (the bag directory name).
    pub fn id(&self) -> &str {
        &self.id
    }

    /// Absolute path of a bag-relative path.
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.root.join(relative)
    }

    /// Every regular file under the payload root, sorted by path.
    ///
    /// A missing payload directory is an empty payload.
    pub fn payload_files(&self) -> CoreResult<Vec<PayloadFile>> {
        if !self.payload_root.exists() {
            return Ok(Vec::new());
        }
        let mut files = Vec::new();
        for entry in WalkDir::new(&self.payload_root).follow_links(false) {
            let entry = entry?;
            if !entry.file_type().is_file() {
                continue;
            }
            let relative = entry
                .path()
                .strip_prefix(&self.payload_root)
                .map_err(|e| CoreError::OperationFailed(e.to_string()))?;
            let mut path = self.payload_dir.clone();
            for component in relative.components() {
                path.push('/');
                path.push_str(&component.as_os_str().to_string_lossy());
            }
            files.push(PayloadFile {
                path,
                size: entry.metadata()?.len(),
            });
        }
        files.sort_by(|a, b| a.path.cmp(&b.path));
        Ok(files)
    }
}

/// Payload-Oxum of a full payload listing.
pub fn compute_oxum(files: &[PayloadFile]) -> PayloadOxum {
    PayloadOxum::new(
        files.iter().map(|f| f.size).sum(),
        files.len() as u64,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    #[test]
    fn payload_listing_is_relative_and_sorted() {
        let dir = tempdir().unwrap();
        let root = dir.path();
        fs::write(root.join("bag-info.txt"), "Payload-Oxum: 0.0\n").unwrap();
        fs::create_dir_all(root.join("data/ServiceCopies")).unwrap();
        fs::create_dir_all(root.join("data/PreservationMasters")).unwrap();
        fs::write(root.join("data/ServiceCopies/b_sc.mp4"), b"12345").unwrap();
        fs::write(root.join("data/PreservationMasters/a_pm.mkv"), b"123").unwrap();
        fs::write(root.join("data/.bagcheck-notes.txt"), b"kept").unwrap();

        let bag = Bag::open(root, &CoreConfig::default()).unwrap();
        let files = bag.payload_files().unwrap();
        let paths: Vec<_> = files.iter().map(|f| f.path.as_str()).collect();
        assert_eq!(
            paths,
            vec![
                "data/.bagcheck-notes.txt",
                "data/PreservationMasters/a_pm.mkv",
                "data/ServiceCopies/b_sc.mp4"
            ]
        );
        assert_eq!(files[1].file_name(), "a_pm.mkv");
        assert_eq!(compute_oxum(&files), PayloadOxum::new(12, 3));
    }

    #[test]
    fn open_rejects_plain_directory() {
        let dir = tempdir().unwrap();
        assert!(matches!(
            Bag::open(dir.path(), &CoreConfig::default()),
            Err(CoreError::NotABag(_))
        ));
        assert!(matches!(
            Bag::open(&dir.path().join("missing"), &CoreConfig::default()),
            Err(CoreError::BagNotFound(_))
        ));
    }

    #[test]
    fn missing_payload_dir_is_empty() {
        let dir = tempdir().unwrap();
        fs::write(dir.path().join("manifest-md5.txt"), "").unwrap();
        let bag = Bag::open(dir.path(), &CoreConfig::default()).unwrap();
        assert!(bag.payload_files().unwrap().is_empty());
    }
}
