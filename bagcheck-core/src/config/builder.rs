// ============================================================================
// bagcheck-core/src/config/builder.rs
// ============================================================================
//
// CONFIGURATION BUILDER: Builder Pattern for CoreConfig
//
// Provides a fluent API for creating CoreConfig instances. Every field starts
// from the defaults in `config/mod.rs`; callers override only what they need
// and call `build()` once.

use super::{
    CoreConfig, DEFAULT_AUXILIARY_EXTENSIONS, DEFAULT_BAG_INFO_NAME, DEFAULT_CHUNK_SIZE,
    DEFAULT_FILM_EXTENSIONS, DEFAULT_FORMAT_ALIASES, DEFAULT_MANIFEST_NAME, DEFAULT_PAYLOAD_DIR,
    DEFAULT_SIDECAR_EXTENSION, DEFAULT_SUBVARIANTS, DEFAULT_TAG_MANIFEST_NAME,
};
use crate::retry::RetryPolicy;

/// Builder for creating CoreConfig instances.
///
/// # Examples
///
/// ```rust
/// use bagcheck_core::config::CoreConfigBuilder;
/// use bagcheck_core::retry::RetryPolicy;
///
/// let config = CoreConfigBuilder::new()
///     .hash_workers(8)
///     .retry(RetryPolicy { max_attempts: 6, backoff_ms: 50 })
///     .duration_tolerance_ms(40)
///     .build();
/// assert_eq!(config.hash_workers, 8);
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfigBuilder {
    config: CoreConfig,
}

impl Default for CoreConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CoreConfigBuilder {
    /// Creates a new CoreConfigBuilder with default values.
    pub fn new() -> Self {
        let cpus = num_cpus::get().max(1);
        Self {
            config: CoreConfig {
                payload_dir: DEFAULT_PAYLOAD_DIR.to_string(),
                manifest_name: DEFAULT_MANIFEST_NAME.to_string(),
                tag_manifest_name: DEFAULT_TAG_MANIFEST_NAME.to_string(),
                bag_info_name: DEFAULT_BAG_INFO_NAME.to_string(),
                hash_workers: cpus,
                bag_workers: cpus,
                chunk_size: DEFAULT_CHUNK_SIZE,
                retry: RetryPolicy::default(),
                subvariants: DEFAULT_SUBVARIANTS.iter().map(|s| s.to_string()).collect(),
                sidecar_extension: DEFAULT_SIDECAR_EXTENSION.to_string(),
                auxiliary_extensions: DEFAULT_AUXILIARY_EXTENSIONS
                    .iter()
                    .map(|s| s.to_string())
                    .collect(),
                film_extensions: DEFAULT_FILM_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
                fold_version_into_core_id: false,
                format_aliases: DEFAULT_FORMAT_ALIASES
                    .iter()
                    .map(|(label, canonical)| (label.to_string(), canonical.to_string()))
                    .collect(),
                duration_tolerance_ms: 0,
            },
        }
    }

    /// Sets the payload directory name (default `data`).
    pub fn payload_dir<S: Into<String>>(mut self, dir: S) -> Self {
        self.config.payload_dir = dir.into();
        self
    }

    pub fn manifest_name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.manifest_name = name.into();
        self
    }

    pub fn tag_manifest_name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.tag_manifest_name = name.into();
        self
    }

    pub fn bag_info_name<S: Into<String>>(mut self, name: S) -> Self {
        self.config.bag_info_name = name.into();
        self
    }

    /// Sets the number of checksum workers used inside one bag.
    pub fn hash_workers(mut self, workers: usize) -> Self {
        self.config.hash_workers = workers;
        self
    }

    /// Sets the number of bags processed concurrently.
    pub fn bag_workers(mut self, workers: usize) -> Self {
        self.config.bag_workers = workers;
        self
    }

    pub fn chunk_size(mut self, bytes: usize) -> Self {
        self.config.chunk_size = bytes;
        self
    }

    /// Sets the retry policy used for control-file writes.
    pub fn retry(mut self, policy: RetryPolicy) -> Self {
        self.config.retry = policy;
        self
    }

    /// Replaces the sub-variant vocabulary.
    pub fn subvariants(mut self, subvariants: Vec<String>) -> Self {
        self.config.subvariants = subvariants;
        self
    }

    pub fn sidecar_extension<S: Into<String>>(mut self, ext: S) -> Self {
        self.config.sidecar_extension = ext.into();
        self
    }

    pub fn auxiliary_extensions(mut self, extensions: Vec<String>) -> Self {
        self.config.auxiliary_extensions = extensions;
        self
    }

    pub fn film_extensions(mut self, extensions: Vec<String>) -> Self {
        self.config.film_extensions = extensions;
        self
    }

    /// Treat every version of an object as one asset group.
    pub fn fold_version_into_core_id(mut self, fold: bool) -> Self {
        self.config.fold_version_into_core_id = fold;
        self
    }

    /// Adds (or overrides) one format alias.
    pub fn format_alias<L: Into<String>, C: Into<String>>(mut self, label: L, canonical: C) -> Self {
        let label = label.into().to_ascii_lowercase();
        let canonical = canonical.into().to_ascii_lowercase();
        self.config.format_aliases.retain(|(l, _)| *l != label);
        self.config.format_aliases.push((label, canonical));
        self
    }

    pub fn duration_tolerance_ms(mut self, tolerance: u64) -> Self {
        self.config.duration_tolerance_ms = tolerance;
        self
    }

    /// Builds the configuration. Call `CoreConfig::validate` before use.
    pub fn build(self) -> CoreConfig {
        self.config
    }
}
