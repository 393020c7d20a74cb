//! Bag discovery.
//!
//! The command-line target is either a bag root or a directory whose
//! immediate children are bags. Only the top level of such a directory is
//! searched; nested bags are not looked for.

use std::collections::BTreeSet;
use std::path::{Path, PathBuf};

use log::debug;

use crate::bag::Bag;
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};

/// Finds the bags named by `target`.
///
/// # Returns
///
/// * `Ok(vec![target])` - if `target` is itself a bag
/// * `Ok(bags)` - the bag children of `target`, sorted and de-duplicated by
///   canonical path (possibly empty)
/// * `Err(CoreError::BagNotFound)` - if `target` does not exist
/// * `Err(CoreError::NotABag)` - if `target` is a regular file
///
/// # Examples
///
/// ```rust,no_run
/// use bagcheck_core::{CoreConfig, find_bags};
/// use std::path::Path;
///
/// let bags = find_bags(Path::new("/mnt/ingest/bags"), &CoreConfig::default()).unwrap();
/// println!("Found {} bag(s)", bags.len());
/// ```
pub fn find_bags(target: &Path, config: &CoreConfig) -> CoreResult<Vec<PathBuf>> {
    if !target.exists() {
        return Err(CoreError::BagNotFound(target.to_path_buf()));
    }
    if !target.is_dir() {
        return Err(CoreError::NotABag(target.to_path_buf()));
    }
    if Bag::is_bag(target, config) {
        return Ok(vec![target.to_path_buf()]);
    }

    // Canonical paths shard work: a bag reachable through two names is still
    // handed to exactly one worker.
    let mut bags = BTreeSet::new();
    for entry in std::fs::read_dir(target)? {
        let path = entry?.path();
        if Bag::is_bag(&path, config) {
            bags.insert(path.canonicalize()?);
        } else {
            debug!("Skipping non-bag entry {}", path.display());
        }
    }
    Ok(bags.into_iter().collect())
}
