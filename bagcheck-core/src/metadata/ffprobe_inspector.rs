//! Default `MediaInspector` backed by the `ffprobe` crate.

use std::path::Path;

use chrono::{DateTime, Local};
use ffprobe::{FfProbeError, ffprobe};

use super::facts::{MediaFacts, MediaInspector};
use crate::error::{CoreError, CoreResult};
use crate::external::check_dependency;

/// Inspects media files by running `ffprobe`.
///
/// Size and modification date come from the filesystem; format, codecs and
/// duration from ffprobe's JSON output.
#[derive(Debug, Clone, Default)]
pub struct FfprobeInspector;

impl FfprobeInspector {
    /// Creates the inspector after confirming `ffprobe` can be run.
    pub fn detect() -> CoreResult<Self> {
        check_dependency("ffprobe")?;
        Ok(Self)
    }
}

impl MediaInspector for FfprobeInspector {
    fn inspect(&self, path: &Path) -> CoreResult<MediaFacts> {
        log::debug!("Running ffprobe (via crate) on: {}", path.display());
        let metadata = std::fs::metadata(path)?;
        let probed = ffprobe(path).map_err(|e| map_ffprobe_error(e, path))?;

        let codec_of = |kind: &str| {
            probed
                .streams
                .iter()
                .find(|s| s.codec_type.as_deref() == Some(kind))
                .and_then(|s| s.codec_name.clone())
        };
        let duration_ms = probed
            .format
            .duration
            .as_deref()
            .and_then(|d| d.parse::<f64>().ok())
            .filter(|d| d.is_finite() && *d >= 0.0)
            .map(|d| (d * 1000.0).round() as u64);
        let date_created = metadata
            .modified()
            .ok()
            .map(|t| DateTime::<Local>::from(t).date_naive());

        Ok(MediaFacts {
            file_name: path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default(),
            format: Some(probed.format.format_name.clone()),
            audio_codec: codec_of("audio"),
            video_codec: codec_of("video"),
            size: metadata.len(),
            duration_ms,
            date_created,
        })
    }
}

fn map_ffprobe_error(err: FfProbeError, path: &Path) -> CoreError {
    let message = match err {
        FfProbeError::Io(io_err) => format!("could not start ffprobe: {io_err}"),
        FfProbeError::Status(output) => format!(
            "ffprobe exited with {}: {}",
            output.status,
            String::from_utf8_lossy(&output.stderr).trim()
        ),
        FfProbeError::Deserialize(err) => format!("unreadable ffprobe output: {err}"),
        other => format!("unknown ffprobe error: {other:?}"),
    };
    CoreError::Inspection {
        path: path.to_path_buf(),
        message,
    }
}
