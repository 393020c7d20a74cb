//! Configuration structures and constants for the bagcheck-core library.
//!
//! A `CoreConfig` is built once (usually by the CLI through
//! `CoreConfigBuilder`) and passed by reference to every component. Nothing in
//! the core reads environment variables or keeps process-wide state.

mod builder;

use crate::error::{CoreError, CoreResult};
use crate::retry::RetryPolicy;

pub use builder::CoreConfigBuilder;

/// Default payload directory inside a bag.
pub const DEFAULT_PAYLOAD_DIR: &str = "data";

/// Default payload manifest file name.
pub const DEFAULT_MANIFEST_NAME: &str = "manifest-md5.txt";

/// Default tag-manifest file name.
pub const DEFAULT_TAG_MANIFEST_NAME: &str = "tagmanifest-md5.txt";

/// Default bag-info file name.
pub const DEFAULT_BAG_INFO_NAME: &str = "bag-info.txt";

/// BagIt declaration file. Checked through the tag manifest, never rewritten.
pub const BAGIT_DECLARATION_NAME: &str = "bagit.txt";

/// Streaming read buffer for checksum computation.
pub const DEFAULT_CHUNK_SIZE: usize = 64 * 1024;

/// Sub-variant tags that may sit between the core id and the role code.
pub const DEFAULT_SUBVARIANTS: &[&str] =
    &["talk", "wide", "close", "stage", "audience", "left", "right"];

/// Sidecar metadata extension.
pub const DEFAULT_SIDECAR_EXTENSION: &str = "json";

/// Files that must follow the naming grammar but never count as a role copy.
pub const DEFAULT_AUXILIARY_EXTENSIONS: &[&str] =
    &["json", "xml", "framemd5", "cue", "scc", "srt", "vtt", "gz"];

/// Extensions of scanned film masters. An asset with one of these is Film
/// whether or not its mezzanine exists.
pub const DEFAULT_FILM_EXTENSIONS: &[&str] = &["dpx", "cin", "exr", "tif", "tiff"];

/// Format labels and the canonical name each one compares as.
pub const DEFAULT_FORMAT_ALIASES: &[(&str, &str)] = &[
    ("matroska", "matroska"),
    ("mkv", "matroska"),
    ("matroska,webm", "matroska"),
    ("mpeg-4", "mpeg-4"),
    ("mp4", "mpeg-4"),
    ("mov,mp4,m4a,3gp,3g2,mj2", "mpeg-4"),
    ("quicktime", "mpeg-4"),
    ("wave", "wave"),
    ("wav", "wave"),
    ("bwf", "wave"),
    ("flac", "flac"),
    ("aiff", "aiff"),
    ("aif", "aiff"),
];

/// Main configuration structure for the bagcheck-core library.
///
/// All fields have working defaults; see `CoreConfigBuilder` for the fluent
/// way to override them.
///
/// # Examples
///
/// ```rust
/// use bagcheck_core::config::CoreConfigBuilder;
///
/// let config = CoreConfigBuilder::new()
///     .hash_workers(4)
///     .bag_workers(2)
///     .build();
/// assert!(config.validate().is_ok());
/// ```
#[derive(Debug, Clone)]
pub struct CoreConfig {
    // ---- Bag Layout ----
    /// Payload root, relative to the bag root
    pub payload_dir: String,

    /// Payload manifest file name
    pub manifest_name: String,

    /// Tag-manifest file name
    pub tag_manifest_name: String,

    /// Key/value record file name
    pub bag_info_name: String,

    // ---- Concurrency ----
    /// Checksum workers within one bag
    pub hash_workers: usize,

    /// Bags processed concurrently
    pub bag_workers: usize,

    /// Streaming read buffer size in bytes
    pub chunk_size: usize,

    /// Retry policy for control-file writes and renames
    pub retry: RetryPolicy,

    // ---- Filename Grammar ----
    pub subvariants: Vec<String>,
    pub sidecar_extension: String,
    pub auxiliary_extensions: Vec<String>,

    /// Media extensions that mark an asset as Film
    pub film_extensions: Vec<String>,

    /// When true, the `v01` version token is dropped from the core id along
    /// with face/region/stream part tokens.
    pub fold_version_into_core_id: bool,

    // ---- Metadata Cross-checks ----
    pub format_aliases: Vec<(String, String)>,

    /// Allowed difference between sidecar and inspected durations
    pub duration_tolerance_ms: u64,
}

impl Default for CoreConfig {
    fn default() -> Self {
        CoreConfigBuilder::new().build()
    }
}

impl CoreConfig {
    /// Checks the configuration for values no component can work with.
    pub fn validate(&self) -> CoreResult<()> {
        if self.hash_workers == 0 {
            return Err(CoreError::Config("hash_workers must be at least 1".to_string()));
        }
        if self.bag_workers == 0 {
            return Err(CoreError::Config("bag_workers must be at least 1".to_string()));
        }
        if self.chunk_size == 0 {
            return Err(CoreError::Config("chunk_size must be at least 1".to_string()));
        }
        if self.retry.max_attempts == 0 {
            return Err(CoreError::Config(
                "retry.max_attempts must be at least 1".to_string(),
            ));
        }
        for (label, name) in [
            ("payload_dir", &self.payload_dir),
            ("manifest_name", &self.manifest_name),
            ("tag_manifest_name", &self.tag_manifest_name),
            ("bag_info_name", &self.bag_info_name),
        ] {
            if name.trim().is_empty() {
                return Err(CoreError::Config(format!("{label} must not be empty")));
            }
        }
        for sub in &self.subvariants {
            if crate::derivatives::Role::from_code(sub).is_some() {
                return Err(CoreError::Config(format!(
                    "sub-variant '{sub}' collides with a role code"
                )));
            }
            if sub.is_empty() || !sub.chars().all(|c| c.is_ascii_alphanumeric()) {
                return Err(CoreError::Config(format!(
                    "sub-variant '{sub}' must be non-empty and alphanumeric"
                )));
            }
        }
        Ok(())
    }

    /// Whether `ext` (without the dot, any case) is a sidecar extension.
    pub fn is_sidecar_extension(&self, ext: &str) -> bool {
        ext.eq_ignore_ascii_case(&self.sidecar_extension)
    }

    /// Whether `ext` names a scanned-film master format.
    pub fn is_film_extension(&self, ext: &str) -> bool {
        self.film_extensions.iter().any(|f| f.eq_ignore_ascii_case(ext))
    }

    /// Whether `ext` names an auxiliary (non-role) file.
    pub fn is_auxiliary_extension(&self, ext: &str) -> bool {
        self.auxiliary_extensions
            .iter()
            .any(|a| a.eq_ignore_ascii_case(ext))
    }

    /// Control files every bag must carry, in the order they are committed
    /// during a repair.
    pub fn control_file_names(&self) -> [&str; 3] {
        [
            self.manifest_name.as_str(),
            self.bag_info_name.as_str(),
            self.tag_manifest_name.as_str(),
        ]
    }
}
