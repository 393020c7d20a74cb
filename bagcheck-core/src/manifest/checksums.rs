//! Checksum manifests (`manifest-md5.txt`, `tagmanifest-md5.txt`).
//!
//! A manifest is an ordered mapping from bag-relative path to checksum. Every
//! parsed line keeps its original text; serialization reuses that text for
//! entries whose checksum has not changed, so a rewrite only touches the lines
//! that actually moved.

use std::collections::HashMap;

use super::{LineEnding, push_raw_line, split_lines};
use crate::error::{CoreError, CoreResult};

/// One manifest entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ManifestEntry {
    pub checksum: String,
    pub path: String,
    /// The line exactly as read, terminator included. `None` once the
    /// entry has been modified or for entries added in memory.
    raw: Option<String>,
}

impl ManifestEntry {
    fn render(&self, ending: LineEnding, out: &mut String) {
        match &self.raw {
            Some(raw) => push_raw_line(out, raw, ending),
            None => {
                out.push_str(&format!("{}  {}", self.checksum, encode_path(&self.path)));
                out.push_str(ending.as_str());
            }
        }
    }
}

/// Ordered path → checksum listing with unique paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Manifest {
    file_name: String,
    entries: Vec<ManifestEntry>,
    index: HashMap<String, usize>,
    /// Terminator for rewritten lines, taken from the parsed text.
    line_ending: LineEnding,
}

impl Manifest {
    /// An empty manifest that will be written as `file_name`.
    pub fn new<S: Into<String>>(file_name: S) -> Self {
        Self {
            file_name: file_name.into(),
            entries: Vec::new(),
            index: HashMap::new(),
            line_ending: LineEnding::Lf,
        }
    }

    /// Parses manifest text. `file_name` is only used in error messages and
    /// when saving.
    ///
    /// Blank lines are ignored. A line without a checksum/path separator, a
    /// checksum that is not hexadecimal, or a path listed twice is a
    /// `CoreError::Parse` naming the 1-based line number.
    pub fn parse(file_name: &str, text: &str) -> CoreResult<Self> {
        let mut manifest = Manifest::new(file_name);
        manifest.line_ending = LineEnding::detect(text);
        for (line_no, line, raw) in split_lines(text) {
            if line.trim().is_empty() {
                continue;
            }
            let parse_error = || CoreError::Parse {
                file: file_name.to_string(),
                line: line_no,
                text: line.to_string(),
            };

            let (checksum, rest) = line
                .split_once(|c: char| c == ' ' || c == '\t')
                .ok_or_else(parse_error)?;
            let path = rest.trim_start_matches([' ', '\t']);
            if checksum.is_empty()
                || path.is_empty()
                || !checksum.chars().all(|c| c.is_ascii_hexdigit())
            {
                return Err(parse_error());
            }

            let path = decode_path(path);
            if manifest.index.contains_key(&path) {
                return Err(parse_error());
            }
            manifest.index.insert(path.clone(), manifest.entries.len());
            manifest.entries.push(ManifestEntry {
                checksum: checksum.to_ascii_lowercase(),
                path,
                raw: Some(raw.to_string()),
            });
        }
        Ok(manifest)
    }

    pub fn file_name(&self) -> &str {
        &self.file_name
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get(&self, path: &str) -> Option<&str> {
        self.index
            .get(path)
            .map(|&i| self.entries[i].checksum.as_str())
    }

    pub fn contains(&self, path: &str) -> bool {
        self.index.contains_key(path)
    }

    pub fn entries(&self) -> impl Iterator<Item = &ManifestEntry> {
        self.entries.iter()
    }

    pub fn paths(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.path.as_str())
    }

    /// Sets the checksum for `path`, appending a new entry if needed.
    ///
    /// Returns true when the manifest changed. Setting an identical checksum
    /// leaves the original line untouched.
    pub fn set(&mut self, path: &str, checksum: &str) -> bool {
        let checksum = checksum.to_ascii_lowercase();
        match self.index.get(path) {
            Some(&i) => {
                let entry = &mut self.entries[i];
                if entry.checksum == checksum {
                    return false;
                }
                entry.checksum = checksum;
                entry.raw = None;
                true
            }
            None => {
                self.index.insert(path.to_string(), self.entries.len());
                self.entries.push(ManifestEntry {
                    checksum,
                    path: path.to_string(),
                    raw: None,
                });
                true
            }
        }
    }

    /// Removes `path`. Returns the checksum it had, if any.
    pub fn remove(&mut self, path: &str) -> Option<String> {
        let i = self.index.remove(path)?;
        let entry = self.entries.remove(i);
        for idx in self.index.values_mut() {
            if *idx > i {
                *idx -= 1;
            }
        }
        Some(entry.checksum)
    }

    /// Serializes the manifest, one line per entry. Untouched lines keep
    /// their own terminator; rewritten ones use the file's.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        for entry in &self.entries {
            entry.render(self.line_ending, &mut out);
        }
        out
    }
}

/// Percent-encodes the characters BagIt reserves in manifest paths.
pub fn encode_path(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    for c in path.chars() {
        match c {
            '%' => out.push_str("%25"),
            '\r' => out.push_str("%0D"),
            '\n' => out.push_str("%0A"),
            _ => out.push(c),
        }
    }
    out
}

/// Reverses `encode_path`. Unknown escapes are left as written.
pub fn decode_path(path: &str) -> String {
    if !path.contains('%') {
        return path.to_string();
    }
    let mut out = String::with_capacity(path.len());
    let mut rest = path;
    while let Some(pos) = rest.find('%') {
        out.push_str(&rest[..pos]);
        let escape = rest.get(pos..pos + 3).unwrap_or("");
        match escape.to_ascii_uppercase().as_str() {
            "%25" => out.push('%'),
            "%0D" => out.push('\r'),
            "%0A" => out.push('\n'),
            _ => {
                out.push('%');
                rest = &rest[pos + 1..];
                continue;
            }
        }
        rest = &rest[pos + 3..];
    }
    out.push_str(rest);
    out
}
