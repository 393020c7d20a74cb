//! Role-variant cross-referencing for payload files.
//!
//! Responsibilities:
//! - Parse payload filenames with one explicit grammar (`filename`)
//! - Group files into asset groups by core asset id (`resolver`)
//! - Apply per-category completeness rules and report missing or orphaned
//!   derivatives

pub mod filename;
pub mod resolver;

use std::fmt::{self, Display};

use serde::{Deserialize, Serialize};

pub use filename::{FilenameGrammar, ParsedName};
pub use resolver::{AssetGroup, Classification, DerivativeSetResolver, RoleMember};

/// Derivative tier of a file.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Role {
    PreservationMaster,
    EditMaster,
    Mezzanine,
    ServiceCopy,
}

impl Role {
    pub const ALL: [Role; 4] = [
        Role::PreservationMaster,
        Role::EditMaster,
        Role::Mezzanine,
        Role::ServiceCopy,
    ];

    /// The filename suffix code for this role.
    pub fn code(self) -> &'static str {
        match self {
            Role::PreservationMaster => "pm",
            Role::EditMaster => "em",
            Role::Mezzanine => "mz",
            Role::ServiceCopy => "sc",
        }
    }

    pub fn from_code(code: &str) -> Option<Self> {
        Role::ALL.into_iter().find(|r| r.code() == code)
    }

    /// Payload subdirectory that conventionally holds this role.
    pub fn directory_name(self) -> &'static str {
        match self {
            Role::PreservationMaster => "PreservationMasters",
            Role::EditMaster => "EditMasters",
            Role::Mezzanine => "Mezzanines",
            Role::ServiceCopy => "ServiceCopies",
        }
    }

    pub fn from_directory_name(name: &str) -> Option<Self> {
        Role::ALL.into_iter().find(|r| r.directory_name() == name)
    }
}

impl Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.code())
    }
}

/// Source-object category, which decides the completeness rules.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SourceCategory {
    Video,
    Audio,
    Film,
}

impl Display for SourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SourceCategory::Video => write!(f, "video"),
            SourceCategory::Audio => write!(f, "audio"),
            SourceCategory::Film => write!(f, "film"),
        }
    }
}

/// Roles that must accompany a preservation master, per category.
pub const COMPLETENESS_RULES: &[(SourceCategory, &[Role])] = &[
    (SourceCategory::Video, &[Role::ServiceCopy]),
    (SourceCategory::Audio, &[Role::EditMaster]),
    (SourceCategory::Film, &[Role::Mezzanine, Role::ServiceCopy]),
];

/// Extensions of audio-only media, used to infer the Audio category.
pub const AUDIO_EXTENSIONS: &[&str] = &["wav", "flac", "aif", "aiff", "mp3", "m4a"];

impl SourceCategory {
    /// Roles required alongside a preservation master.
    pub fn required_roles(self) -> &'static [Role] {
        COMPLETENESS_RULES
            .iter()
            .find(|(category, _)| *category == self)
            .map(|(_, roles)| *roles)
            .unwrap_or(&[])
    }
}
