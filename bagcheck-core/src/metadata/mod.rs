//! Sidecar metadata cross-checks.
//!
//! A sidecar is the `<stem>.<sidecar_extension>` file next to a media file.
//! Its typed `SidecarRecord` is compared against `MediaFacts` that a
//! `MediaInspector` extracts from the media file itself.

pub mod checker;
pub mod facts;
pub mod ffprobe_inspector;
pub mod sidecar;
pub mod tree;

pub use checker::MetadataConsistencyChecker;
pub use facts::{MediaFacts, MediaInspector};
pub use ffprobe_inspector::FfprobeInspector;
pub use sidecar::{AssetSection, Measure, SidecarRecord, TechnicalSection};

/// Bag-relative path of the sidecar for `media_path`.
pub fn sidecar_path_for(media_path: &str, sidecar_extension: &str) -> String {
    let (dir, file_name) = match media_path.rsplit_once('/') {
        Some((dir, name)) => (Some(dir), name),
        None => (None, media_path),
    };
    let stem = file_name.split_once('.').map_or(file_name, |(stem, _)| stem);
    match dir {
        Some(dir) => format!("{dir}/{stem}.{sidecar_extension}"),
        None => format!("{stem}.{sidecar_extension}"),
    }
}
