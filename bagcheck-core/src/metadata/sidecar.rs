//! Typed sidecar metadata records.
//!
//! Only the fields the consistency check reads are typed. Anything else in
//! the document is carried through `extra` maps so a regenerated record keeps
//! it.

use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use super::facts::MediaFacts;
use crate::error::CoreResult;

/// A numeric measure with its unit, e.g. `{"measure": 1024, "unit": "B"}`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Measure {
    pub measure: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
}

impl Measure {
    fn with_unit(measure: u64, unit: &str) -> Self {
        Self {
            measure,
            unit: Some(unit.to_string()),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssetSection {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reference_filename: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TechnicalSection {
    /// File name without extension.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub extension: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_format: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub audio_codec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub video_codec: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub file_size: Option<Measure>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub duration_milli: Option<Measure>,
    /// ISO date, optionally followed by a time part.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_created: Option<String>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// One sidecar document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SidecarRecord {
    #[serde(default)]
    pub asset: AssetSection,
    #[serde(default)]
    pub technical: TechnicalSection,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl SidecarRecord {
    pub fn from_json(text: &str) -> CoreResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    pub fn load(path: &Path) -> CoreResult<Self> {
        let text = std::fs::read_to_string(path)?;
        Self::from_json(&text)
    }

    pub fn to_json(&self) -> CoreResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// A new record whose technical fields carry the inspected values.
    ///
    /// Fields the inspector could not determine keep their current value.
    pub fn with_inspected_facts(&self, facts: &MediaFacts) -> Self {
        let mut record = self.clone();
        let technical = &mut record.technical;

        record.asset.reference_filename = Some(facts.file_name.clone());
        technical.filename = Some(facts.stem().to_string());
        technical.extension = Some(facts.extension().to_string());
        if let Some(format) = &facts.format {
            technical.file_format = Some(format.clone());
        }
        if facts.audio_codec.is_some() {
            technical.audio_codec = facts.audio_codec.clone();
        }
        if facts.video_codec.is_some() {
            technical.video_codec = facts.video_codec.clone();
        }
        technical.file_size = Some(Measure::with_unit(facts.size, "B"));
        if let Some(duration) = facts.duration_ms {
            technical.duration_milli = Some(Measure::with_unit(duration, "ms"));
        }
        if let Some(date) = facts.date_created {
            technical.date_created = Some(date.format("%Y-%m-%d").to_string());
        }
        record
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;

    const SAMPLE: &str = r#"{
        "asset": {"referenceFilename": "abc_123456_v01_pm.mkv", "schemaVersion": "2"},
        "technical": {
            "filename": "abc_123456_v01_pm",
            "extension": "mkv",
            "fileFormat": "Matroska",
            "audioCodec": "FLAC",
            "videoCodec": "FFV1",
            "fileSize": {"measure": 2048, "unit": "B"},
            "durationMilli": {"measure": 61000, "unit": "ms"},
            "dateCreated": "2023-04-05",
            "scanType": "interlaced"
        },
        "source": {"object": {"type": "video cassette"}}
    }"#;

    #[test]
    fn parses_known_fields_and_keeps_others() {
        let record = SidecarRecord::from_json(SAMPLE).unwrap();
        assert_eq!(
            record.asset.reference_filename.as_deref(),
            Some("abc_123456_v01_pm.mkv")
        );
        assert_eq!(record.technical.file_size.as_ref().unwrap().measure, 2048);
        assert_eq!(record.technical.duration_milli.as_ref().unwrap().measure, 61000);
        assert!(record.technical.extra.contains_key("scanType"));
        assert!(record.extra.contains_key("source"));

        let again = SidecarRecord::from_json(&record.to_json().unwrap()).unwrap();
        assert_eq!(again, record);
    }

    #[test]
    fn regeneration_returns_new_record() {
        let record = SidecarRecord::from_json(SAMPLE).unwrap();
        let facts = MediaFacts {
            file_name: "abc_123456_v01_pm.mkv".to_string(),
            format: Some("matroska,webm".to_string()),
            audio_codec: Some("flac".to_string()),
            video_codec: Some("ffv1".to_string()),
            size: 4096,
            duration_ms: Some(62000),
            date_created: NaiveDate::from_ymd_opt(2024, 1, 2),
        };
        let updated = record.with_inspected_facts(&facts);
        assert_eq!(record.technical.file_size.as_ref().unwrap().measure, 2048);
        assert_eq!(updated.technical.file_size.as_ref().unwrap().measure, 4096);
        assert_eq!(updated.technical.date_created.as_deref(), Some("2024-01-02"));
        assert_eq!(updated.technical.extra, record.technical.extra);
    }

    #[test]
    fn malformed_json_is_error() {
        assert!(SidecarRecord::from_json("{not json").is_err());
    }
}
