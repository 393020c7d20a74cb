//! BagIt control files: payload manifest, tag manifest and bag-info.
//!
//! `load` reads all three from a bag root; `ControlFiles::stage` queues them
//! for an atomic replacement through `atomic::ControlFileTransaction`.

pub mod bag_info;
pub mod checksums;

use std::fs;
use std::io;
use std::path::Path;

use log::debug;

use crate::atomic::ControlFileTransaction;
use crate::config::{BAGIT_DECLARATION_NAME, CoreConfig};
use crate::error::{CoreError, CoreResult};

pub use bag_info::{BagInfo, PAYLOAD_OXUM_KEY, PayloadOxum};
pub use checksums::{Manifest, ManifestEntry};

/// Line terminator used when a control file line has to be written fresh.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LineEnding {
    #[default]
    Lf,
    CrLf,
}

impl LineEnding {
    /// The terminator of the first terminated line in `text`.
    pub fn detect(text: &str) -> Self {
        match text.find('\n') {
            Some(pos) if text[..pos].ends_with('\r') => LineEnding::CrLf,
            _ => LineEnding::Lf,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LineEnding::Lf => "\n",
            LineEnding::CrLf => "\r\n",
        }
    }
}

/// Splits control file text into `(line_no, content, raw)`, where `raw` is
/// the line with its own terminator and `content` is the line without it.
pub(crate) fn split_lines(text: &str) -> impl Iterator<Item = (usize, &str, &str)> {
    text.split_inclusive('\n').enumerate().map(|(idx, raw)| {
        let content = raw
            .strip_suffix('\n')
            .map(|l| l.strip_suffix('\r').unwrap_or(l))
            .unwrap_or(raw);
        (idx + 1, content, raw)
    })
}

/// Appends a preserved line, terminating it with `ending` if the source
/// line had no terminator of its own.
pub(crate) fn push_raw_line(out: &mut String, raw: &str, ending: LineEnding) {
    out.push_str(raw);
    if !raw.ends_with('\n') {
        out.push_str(ending.as_str());
    }
}

/// The three control files of a bag, loaded together and saved together.
#[derive(Debug, Clone)]
pub struct ControlFiles {
    pub manifest: Manifest,
    pub tag_manifest: Manifest,
    pub bag_info: BagInfo,
    /// `bagit.txt`, when the bag carries one.
    pub declaration: Option<BagInfo>,
}

fn read_control(bag_root: &Path, name: &str) -> CoreResult<String> {
    let path = bag_root.join(name);
    match fs::read_to_string(&path) {
        Ok(text) => Ok(text),
        Err(e) if e.kind() == io::ErrorKind::NotFound => Err(CoreError::MissingControlFile(path)),
        Err(e) => Err(e.into()),
    }
}

/// Loads the manifest, tag manifest and bag-info of the bag at `bag_root`.
///
/// A missing control file or a malformed line in any of them fails the whole
/// load; no partially trusted state is returned.
pub fn load(bag_root: &Path, config: &CoreConfig) -> CoreResult<ControlFiles> {
    let manifest = Manifest::parse(
        &config.manifest_name,
        &read_control(bag_root, &config.manifest_name)?,
    )?;
    let tag_manifest = Manifest::parse(
        &config.tag_manifest_name,
        &read_control(bag_root, &config.tag_manifest_name)?,
    )?;
    let bag_info = BagInfo::parse(
        &config.bag_info_name,
        &read_control(bag_root, &config.bag_info_name)?,
    )?;

    let declaration = match read_control(bag_root, BAGIT_DECLARATION_NAME) {
        Ok(text) => Some(BagInfo::parse(BAGIT_DECLARATION_NAME, &text)?),
        Err(CoreError::MissingControlFile(_)) => None,
        Err(e) => return Err(e),
    };
    if let Some(decl) = &declaration {
        debug!(
            "{}: BagIt-Version {}, encoding {}",
            bag_root.display(),
            decl.get("BagIt-Version").unwrap_or("unknown"),
            decl.get("Tag-File-Character-Encoding").unwrap_or("unknown")
        );
    }

    debug!(
        "Loaded {} manifest entries and {} tag entries from {}",
        manifest.len(),
        tag_manifest.len(),
        bag_root.display()
    );

    Ok(ControlFiles {
        manifest,
        tag_manifest,
        bag_info,
        declaration,
    })
}

impl ControlFiles {
    /// Queues the manifest, bag-info and tag manifest in the order
    /// `CoreConfig::control_file_names` gives, so the tag manifest (which
    /// describes the other two) is committed last.
    pub fn stage(
        &self,
        bag_root: &Path,
        config: &CoreConfig,
        tx: &mut ControlFileTransaction<'_>,
    ) -> CoreResult<()> {
        let texts = [
            self.manifest.to_text(),
            self.bag_info.to_text(),
            self.tag_manifest.to_text(),
        ];
        for (name, text) in config.control_file_names().into_iter().zip(texts) {
            tx.stage(&bag_root.join(name), text.as_bytes())?;
        }
        Ok(())
    }

    /// Writes all control files atomically.
    pub fn save(&self, bag_root: &Path, config: &CoreConfig) -> CoreResult<()> {
        let mut tx = ControlFileTransaction::new(&config.retry);
        self.stage(bag_root, config, &mut tx)?;
        tx.commit()
    }
}
