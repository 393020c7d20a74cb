//! Streaming content hashing for payload and tag files.
//!
//! Files are read in fixed-size chunks so memory use does not depend on file
//! size. A digest is only returned when every byte that was present when the
//! read started has been consumed; a file that vanishes or changes length
//! underneath the reader is an IO error, never a partial digest.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use log::{debug, trace};
use md5::{Digest, Md5};
use rayon::ThreadPool;
use rayon::prelude::*;

use crate::error::{CoreError, CoreResult};

/// Hashes files with MD5, the algorithm named by `manifest-md5.txt`.
///
/// The engine holds no state beyond its buffer size, so one instance can be
/// shared freely across threads.
#[derive(Debug, Clone, Copy)]
pub struct ChecksumEngine {
    chunk_size: usize,
}

impl ChecksumEngine {
    pub fn new(chunk_size: usize) -> Self {
        Self {
            chunk_size: chunk_size.max(1),
        }
    }

    /// Computes the lowercase hex MD5 digest of the file at `path`.
    pub fn hash(&self, path: &Path) -> CoreResult<String> {
        let mut file = File::open(path)?;
        let expected_len = file.metadata()?.len();

        let mut hasher = Md5::new();
        let mut buffer = vec![0u8; self.chunk_size];
        let mut consumed: u64 = 0;
        loop {
            let read = match file.read(&mut buffer) {
                Ok(0) => break,
                Ok(n) => n,
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            };
            hasher.update(&buffer[..read]);
            consumed += read as u64;
        }

        // The open handle keeps an unlinked file readable on unix, so check
        // that the path still names a file of the size we consumed.
        let current_len = std::fs::metadata(path)?.len();
        if consumed != expected_len || current_len != consumed {
            return Err(CoreError::Io(io::Error::other(format!(
                "{} changed while hashing ({} bytes read, {} expected, {} now on disk)",
                path.display(),
                consumed,
                expected_len,
                current_len
            ))));
        }

        let digest = hex::encode(hasher.finalize());
        trace!("md5 {} {}", digest, path.display());
        Ok(digest)
    }

    /// Digest of an in-memory buffer, used for control files that are about to
    /// be written.
    pub fn hash_bytes(&self, bytes: &[u8]) -> String {
        hex::encode(Md5::digest(bytes))
    }

    /// Hashes `relative_paths` (relative to `root`) on `pool` and returns the
    /// results in input order.
    ///
    /// Per-file failures are returned in place; they do not stop the other
    /// files from being hashed.
    pub fn hash_all(
        &self,
        root: &Path,
        relative_paths: &[String],
        pool: &ThreadPool,
    ) -> Vec<(String, CoreResult<String>)> {
        debug!(
            "Hashing {} file(s) under {} with {} worker(s)",
            relative_paths.len(),
            root.display(),
            pool.current_num_threads()
        );

        pool.install(|| {
            relative_paths
                .par_iter()
                .map(|rel| {
                    let full: PathBuf = root.join(rel);
                    (rel.clone(), self.hash(&full))
                })
                .collect()
        })
    }
}

/// Builds the pool that per-file hashing and inspection run on.
///
/// One pool is shared by every bag of a run, so the number of hashing threads
/// stays at `workers` however many bags are in flight.
pub fn worker_pool(workers: usize) -> CoreResult<Arc<ThreadPool>> {
    rayon::ThreadPoolBuilder::new()
        .num_threads(workers.max(1))
        .thread_name(|i| format!("bagcheck-hash-{i}"))
        .build()
        .map(Arc::new)
        .map_err(|e| CoreError::OperationFailed(format!("checksum pool: {e}")))
}

impl Default for ChecksumEngine {
    fn default() -> Self {
        Self::new(crate::config::DEFAULT_CHUNK_SIZE)
    }
}
