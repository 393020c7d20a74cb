//! Facts about a media file, as reported by an inspection collaborator.

use std::path::Path;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::error::CoreResult;

/// Technical facts extracted from a media file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaFacts {
    /// Full file name, e.g. `abc_123456_v01_pm.mkv`.
    pub file_name: String,
    /// Container format label as the inspector names it.
    pub format: Option<String>,
    pub audio_codec: Option<String>,
    pub video_codec: Option<String>,
    pub size: u64,
    pub duration_ms: Option<u64>,
    pub date_created: Option<NaiveDate>,
}

impl MediaFacts {
    /// File name up to the first `.`.
    pub fn stem(&self) -> &str {
        self.file_name
            .split_once('.')
            .map_or(self.file_name.as_str(), |(stem, _)| stem)
    }

    /// Everything after the first `.`, empty if there is none.
    pub fn extension(&self) -> &str {
        self.file_name.split_once('.').map_or("", |(_, ext)| ext)
    }
}

/// Extracts `MediaFacts` from a file.
///
/// Implementations must be shareable across the worker pool. Tests provide
/// fakes; `FfprobeInspector` is the default.
pub trait MediaInspector: Send + Sync {
    fn inspect(&self, path: &Path) -> CoreResult<MediaFacts>;
}
