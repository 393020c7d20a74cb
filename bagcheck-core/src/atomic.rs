//! Write-to-temp-then-rename for control files.
//!
//! A `ControlFileTransaction` stages every new control file as a temp file in
//! the bag root before touching any target. Commit renames them in order; if a
//! rename fails partway, the files already replaced are restored from the
//! bytes captured at staging time, so the bag ends either fully updated or
//! exactly as it was.

use std::fs;
use std::io::{self, Write};
use std::path::{Path, PathBuf};

use log::{debug, error, warn};
use tempfile::{Builder as TempFileBuilder, NamedTempFile};

use crate::error::{CoreError, CoreResult};
use crate::retry::RetryPolicy;

/// Prefix of staged temp files. They are created next to their target and
/// removed on drop when a transaction is abandoned.
pub const TEMP_PREFIX: &str = ".bagcheck-";

/// Creates a temp file next to `target` and fills it with `fill`. Each
/// attempt starts from a fresh temp file; a failed one is removed on drop.
fn stage_with<F>(target: &Path, retry: &RetryPolicy, mut fill: F) -> CoreResult<NamedTempFile>
where
    F: FnMut(&mut NamedTempFile) -> io::Result<()>,
{
    let dir = target
        .parent()
        .ok_or_else(|| CoreError::OperationFailed(format!("{} has no parent", target.display())))?;
    retry.run(&format!("stage {}", target.display()), || {
        let mut temp = TempFileBuilder::new()
            .prefix(TEMP_PREFIX)
            .suffix(".tmp")
            .tempfile_in(dir)?;
        fill(&mut temp)?;
        Ok(temp)
    })
}

/// Writes `bytes` to a temp file next to `target` and syncs it to disk.
fn stage_bytes(target: &Path, bytes: &[u8], retry: &RetryPolicy) -> CoreResult<NamedTempFile> {
    stage_with(target, retry, |temp| {
        temp.write_all(bytes)?;
        temp.as_file().sync_all()
    })
}

/// Current content of `target`, or `None` if it does not exist.
fn read_original(target: &Path, retry: &RetryPolicy) -> CoreResult<Option<Vec<u8>>> {
    retry.run(&format!("read {}", target.display()), || match fs::read(target) {
        Ok(data) => Ok(Some(data)),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(None),
        Err(e) => Err(e),
    })
}

/// Renames a staged temp file over `target`, retrying transient failures.
fn persist(temp: NamedTempFile, target: &Path, retry: &RetryPolicy) -> CoreResult<()> {
    let mut pending = Some(temp);
    retry.run(&format!("replace {}", target.display()), || {
        let file = pending
            .take()
            .ok_or_else(|| io::Error::other("staged file already consumed"))?;
        match file.persist(target) {
            Ok(_) => Ok(()),
            Err(e) => {
                pending = Some(e.file);
                Err(e.error)
            }
        }
    })
}

/// Atomically replaces one file.
pub fn write_atomic(target: &Path, bytes: &[u8], retry: &RetryPolicy) -> CoreResult<()> {
    let temp = stage_bytes(target, bytes, retry)?;
    persist(temp, target, retry)
}

struct StagedFile {
    target: PathBuf,
    temp: NamedTempFile,
    /// Content of the target before this transaction; `None` if it did not exist.
    original: Option<Vec<u8>>,
}

/// A set of control-file replacements applied all-or-nothing.
pub struct ControlFileTransaction<'a> {
    retry: &'a RetryPolicy,
    staged: Vec<StagedFile>,
}

impl<'a> ControlFileTransaction<'a> {
    pub fn new(retry: &'a RetryPolicy) -> Self {
        Self {
            retry,
            staged: Vec::new(),
        }
    }

    /// Stages new content for `target`. Nothing visible changes until `commit`.
    pub fn stage(&mut self, target: &Path, bytes: &[u8]) -> CoreResult<()> {
        let original = read_original(target, self.retry)?;
        let temp = stage_bytes(target, bytes, self.retry)?;
        debug!(
            "Staged {} ({} bytes) at {}",
            target.display(),
            bytes.len(),
            temp.path().display()
        );
        self.staged.push(StagedFile {
            target: target.to_path_buf(),
            temp,
            original,
        });
        Ok(())
    }

    pub fn len(&self) -> usize {
        self.staged.len()
    }

    pub fn is_empty(&self) -> bool {
        self.staged.is_empty()
    }

    /// Renames every staged file into place, in staging order.
    ///
    /// On failure, targets already replaced are restored and the original
    /// error is returned. Unused temp files are removed when dropped.
    pub fn commit(self) -> CoreResult<()> {
        let retry = self.retry;
        let mut committed: Vec<(PathBuf, Option<Vec<u8>>)> = Vec::new();
        let mut staged = self.staged.into_iter();

        while let Some(file) = staged.next() {
            let target = file.target.clone();
            match persist(file.temp, &target, retry) {
                Ok(()) => committed.push((target, file.original)),
                Err(err) => {
                    error!(
                        "Failed to replace {}: {}; restoring {} file(s)",
                        target.display(),
                        err,
                        committed.len()
                    );
                    drop(staged);
                    rollback(committed, retry);
                    return Err(err);
                }
            }
        }
        Ok(())
    }
}

fn rollback(committed: Vec<(PathBuf, Option<Vec<u8>>)>, retry: &RetryPolicy) {
    for (target, original) in committed.into_iter().rev() {
        let restored = match original {
            Some(bytes) => write_atomic(&target, &bytes, retry),
            None => retry.run(&format!("remove {}", target.display()), || {
                match fs::remove_file(&target) {
                    Err(e) if e.kind() != io::ErrorKind::NotFound => Err(e),
                    _ => Ok(()),
                }
            }),
        };
        if let Err(e) = restored {
            warn!("Could not restore {}: {}", target.display(), e);
        }
    }
}
