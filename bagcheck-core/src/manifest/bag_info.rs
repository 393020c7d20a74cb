//! `bag-info.txt` key/value records and the Payload-Oxum value.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use super::{LineEnding, push_raw_line, split_lines};
use crate::error::{CoreError, CoreResult};

/// Label of the payload size/count summary in bag-info.
pub const PAYLOAD_OXUM_KEY: &str = "Payload-Oxum";

/// `<total-bytes>.<file-count>` summary of the payload tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PayloadOxum {
    pub bytes: u64,
    pub count: u64,
}

impl PayloadOxum {
    pub fn new(bytes: u64, count: u64) -> Self {
        Self { bytes, count }
    }
}

impl fmt::Display for PayloadOxum {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}", self.bytes, self.count)
    }
}

impl FromStr for PayloadOxum {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let (bytes, count) = s
            .split_once('.')
            .ok_or_else(|| format!("expected <bytes>.<count>, got {s:?}"))?;
        let digits = |part: &str| !part.is_empty() && part.chars().all(|c| c.is_ascii_digit());
        if !digits(bytes) || !digits(count) {
            return Err(format!("expected <bytes>.<count>, got {s:?}"));
        }
        let bytes = bytes.parse::<u64>().map_err(|e| format!("{s:?}: {e}"))?;
        let count = count.parse::<u64>().map_err(|e| format!("{s:?}: {e}"))?;
        Ok(Self { bytes, count })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct InfoEntry {
    key: String,
    value: String,
    /// Original lines with their terminators (first line plus any
    /// continuation lines). Cleared when the value is replaced.
    raw: Option<Vec<String>>,
}

/// Order-preserving `Key: value` record.
///
/// Unknown keys are carried through untouched, and so is their formatting.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BagInfo {
    entries: Vec<InfoEntry>,
    line_ending: LineEnding,
}

impl BagInfo {
    /// Parses bag-info text.
    ///
    /// Lines starting with whitespace continue the previous value. Any other
    /// non-blank line without a `:` is a `CoreError::Parse`.
    pub fn parse(file_name: &str, text: &str) -> CoreResult<Self> {
        let mut info = BagInfo {
            entries: Vec::new(),
            line_ending: LineEnding::detect(text),
        };
        for (line_no, line, raw) in split_lines(text) {
            if line.trim().is_empty() {
                continue;
            }
            let parse_error = || CoreError::Parse {
                file: file_name.to_string(),
                line: line_no,
                text: line.to_string(),
            };

            if line.starts_with([' ', '\t']) {
                let last = info.entries.last_mut().ok_or_else(parse_error)?;
                last.value.push(' ');
                last.value.push_str(line.trim());
                if let Some(lines) = last.raw.as_mut() {
                    lines.push(raw.to_string());
                }
                continue;
            }

            let (key, value) = line.split_once(':').ok_or_else(parse_error)?;
            let key = key.trim();
            if key.is_empty() {
                return Err(parse_error());
            }
            info.entries.push(InfoEntry {
                key: key.to_string(),
                value: value.trim().to_string(),
                raw: Some(vec![raw.to_string()]),
            });
        }
        Ok(info)
    }

    /// First value recorded for `key` (label match ignores ASCII case).
    pub fn get(&self, key: &str) -> Option<&str> {
        self.entries
            .iter()
            .find(|e| e.key.eq_ignore_ascii_case(key))
            .map(|e| e.value.as_str())
    }

    /// Replaces the first value for `key`, or appends a new entry.
    pub fn set(&mut self, key: &str, value: &str) {
        match self
            .entries
            .iter_mut()
            .find(|e| e.key.eq_ignore_ascii_case(key))
        {
            Some(entry) => {
                if entry.value != value {
                    entry.value = value.to_string();
                    entry.raw = None;
                }
            }
            None => self.entries.push(InfoEntry {
                key: key.to_string(),
                value: value.to_string(),
                raw: None,
            }),
        }
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.key.as_str())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Parsed Payload-Oxum. `None` when absent; `Some(Err)` when malformed.
    pub fn payload_oxum(&self) -> Option<Result<PayloadOxum, String>> {
        self.get(PAYLOAD_OXUM_KEY).map(str::parse)
    }

    pub fn set_payload_oxum(&mut self, oxum: PayloadOxum) {
        self.set(PAYLOAD_OXUM_KEY, &oxum.to_string());
    }

    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            match &entry.raw {
                Some(lines) => {
                    for line in lines {
                        push_raw_line(&mut out, line, self.line_ending);
                    }
                }
                None => {
                    out.push_str(&format!("{}: {}", entry.key, entry.value));
                    out.push_str(self.line_ending.as_str());
                }
            }
        }
        out
    }
}
