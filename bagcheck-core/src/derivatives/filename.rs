// ============================================================================
// bagcheck-core/src/derivatives/filename.rs
// ============================================================================
//
// FILENAME GRAMMAR: The Single Parser for Payload Filenames
//
// Every payload filename is read through `FilenameGrammar::parse`:
//
//   <division>_<object>_<version>[<part>...][_<subvariant>]_<role>.<ext>
//
//   division    2-5 lowercase letters            abc
//   object      6 digits                         123456
//   version     v + 2-3 digits                   v01
//   part        f|p|r|s + 2-3 digits, repeatable f01r02
//   subvariant  one of the configured vocabulary talk, wide, ...
//   role        pm | em | mz | sc
//
// The core asset id is `<division>_<object>_<version>`. Part tokens (face,
// part, region, stream) are never part of it, so every part of one object
// lands in the same asset group. With `fold_version_into_core_id` the version
// is dropped as well.

use regex::Regex;

use super::Role;
use crate::config::CoreConfig;
use crate::error::{CoreError, CoreResult};

/// A filename that follows the grammar.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedName {
    /// Core asset id used for grouping.
    pub core_id: String,
    /// `<division>_<object>`, without version or parts.
    pub object_id: String,
    /// Version token, e.g. `v01`.
    pub version: String,
    /// Part tokens in filename order, e.g. `["f01", "r02"]`.
    pub parts: Vec<String>,
    pub subvariant: Option<String>,
    pub role: Role,
    /// Everything after the first `.`, e.g. `mkv` or `mkv.gz`.
    pub extension: String,
}

impl ParsedName {
    /// Last extension component, lowercased (`gz` for `mkv.gz`).
    pub fn final_extension(&self) -> String {
        self.extension
            .rsplit('.')
            .next()
            .unwrap_or(&self.extension)
            .to_ascii_lowercase()
    }
}

/// The compiled payload filename grammar.
#[derive(Debug, Clone)]
pub struct FilenameGrammar {
    pattern: Regex,
    fold_version: bool,
}

impl FilenameGrammar {
    /// Compiles the grammar with the sub-variant vocabulary from `config`.
    pub fn new(config: &CoreConfig) -> CoreResult<Self> {
        let subvariants = if config.subvariants.is_empty() {
            // Matches nothing, keeping the group syntax valid.
            "[^\\s\\S]".to_string()
        } else {
            config
                .subvariants
                .iter()
                .map(|s| regex::escape(s))
                .collect::<Vec<_>>()
                .join("|")
        };
        let pattern = format!(
            r"^(?P<object>[a-z]{{2,5}}_\d{{6}})_(?P<version>v\d{{2,3}})(?P<parts>(?:[fprs]\d{{2,3}})*)(?:_(?P<sub>{subvariants}))?_(?P<role>pm|em|mz|sc)$"
        );
        let pattern = Regex::new(&pattern)
            .map_err(|e| CoreError::Config(format!("filename grammar: {e}")))?;
        Ok(Self {
            pattern,
            fold_version: config.fold_version_into_core_id,
        })
    }

    /// Parses a bare filename (no directories). Returns `None` when the name
    /// does not follow the grammar.
    pub fn parse(&self, file_name: &str) -> Option<ParsedName> {
        let (stem, extension) = file_name.split_once('.')?;
        if extension.is_empty() || extension.ends_with('.') {
            return None;
        }
        let caps = self.pattern.captures(stem)?;

        let object_id = caps.name("object")?.as_str().to_string();
        let version = caps.name("version")?.as_str().to_string();
        let parts = split_parts(caps.name("parts").map_or("", |m| m.as_str()));
        let subvariant = caps.name("sub").map(|m| m.as_str().to_string());
        let role = Role::from_code(caps.name("role")?.as_str())?;

        let core_id = if self.fold_version {
            object_id.clone()
        } else {
            format!("{object_id}_{version}")
        };

        Some(ParsedName {
            core_id,
            object_id,
            version,
            parts,
            subvariant,
            role,
            extension: extension.to_string(),
        })
    }
}

/// Splits `f01r02s03` into `["f01", "r02", "s03"]`.
fn split_parts(parts: &str) -> Vec<String> {
    let mut out: Vec<String> = Vec::new();
    for c in parts.chars() {
        if c.is_ascii_alphabetic() {
            out.push(c.to_string());
        } else if let Some(last) = out.last_mut() {
            last.push(c);
        }
    }
    out
}
