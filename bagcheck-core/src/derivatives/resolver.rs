//! Groups payload files by core asset id and checks each group against the
//! completeness rules of its source category.

use std::collections::BTreeMap;

use log::{debug, trace};
use serde::Serialize;

use super::filename::{FilenameGrammar, ParsedName};
use super::{AUDIO_EXTENSIONS, Role, SourceCategory};
use crate::config::CoreConfig;
use crate::error::CoreResult;
use crate::validation::finding::{Finding, FindingKind};

/// One role file inside an asset group.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RoleMember {
    /// Bag-relative path.
    pub path: String,
    pub subvariant: Option<String>,
    pub parts: Vec<String>,
    pub extension: String,
}

/// All role files sharing one core asset id.
///
/// A role that appears more than once (sub-variants, multi-part objects)
/// keeps every file as a sibling under the same role.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct AssetGroup {
    pub core_id: String,
    pub members: BTreeMap<Role, Vec<RoleMember>>,
}

impl AssetGroup {
    pub fn has_role(&self, role: Role) -> bool {
        self.members.get(&role).is_some_and(|m| !m.is_empty())
    }

    /// Files recorded under `role`, empty if none.
    pub fn siblings(&self, role: Role) -> &[RoleMember] {
        self.members.get(&role).map_or(&[], Vec::as_slice)
    }

    /// Film if a mezzanine exists or any file has one of `film_extensions`,
    /// Audio if every media file has an audio extension, otherwise Video.
    pub fn category<S: AsRef<str>>(&self, film_extensions: &[S]) -> SourceCategory {
        let final_ext = |m: &RoleMember| -> String {
            m.extension
                .rsplit('.')
                .next()
                .unwrap_or(&m.extension)
                .to_ascii_lowercase()
        };
        let members = || self.members.values().flatten();

        let film = members().any(|m| {
            let ext = final_ext(m);
            film_extensions
                .iter()
                .any(|f| f.as_ref().eq_ignore_ascii_case(&ext))
        });
        if film || self.has_role(Role::Mezzanine) {
            return SourceCategory::Film;
        }
        let all_audio = members().all(|m| AUDIO_EXTENSIONS.contains(&final_ext(m).as_str()));
        if all_audio && !self.members.is_empty() {
            SourceCategory::Audio
        } else {
            SourceCategory::Video
        }
    }
}

/// Result of classifying a payload listing.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Classification {
    pub groups: BTreeMap<String, AssetGroup>,
    /// Paths whose filename does not follow the grammar.
    pub non_conforming: Vec<String>,
    /// Role files stored under another role's directory, with that role.
    pub misplaced: Vec<(String, Role, Role)>,
}

/// Cross-references role variants of every asset in a bag.
#[derive(Debug, Clone)]
pub struct DerivativeSetResolver {
    grammar: FilenameGrammar,
    config: CoreConfig,
}

impl DerivativeSetResolver {
    pub fn new(config: &CoreConfig) -> CoreResult<Self> {
        Ok(Self {
            grammar: FilenameGrammar::new(config)?,
            config: config.clone(),
        })
    }

    pub fn grammar(&self) -> &FilenameGrammar {
        &self.grammar
    }

    /// Source category of `group` under the configured film extensions.
    pub fn category_of(&self, group: &AssetGroup) -> SourceCategory {
        group.category(&self.config.film_extensions)
    }

    /// Parses every path and groups role files by core asset id.
    ///
    /// Auxiliary files (sidecars, framemd5, captions, ...) must follow the
    /// grammar but do not contribute a role.
    pub fn classify<S: AsRef<str>>(&self, paths: &[S]) -> Classification {
        let mut classification = Classification::default();

        for path in paths {
            let path = path.as_ref();
            let file_name = path.rsplit('/').next().unwrap_or(path);
            let Some(parsed) = self.grammar.parse(file_name) else {
                trace!("Non-conforming filename: {path}");
                classification.non_conforming.push(path.to_string());
                continue;
            };
            if self.config.is_auxiliary_extension(&parsed.final_extension()) {
                continue;
            }

            if let Some(dir_role) = parent_role_directory(path) {
                if dir_role != parsed.role {
                    classification
                        .misplaced
                        .push((path.to_string(), parsed.role, dir_role));
                }
            }

            let ParsedName {
                core_id,
                parts,
                subvariant,
                role,
                extension,
                ..
            } = parsed;
            let group = classification
                .groups
                .entry(core_id.clone())
                .or_insert_with(|| AssetGroup {
                    core_id,
                    members: BTreeMap::new(),
                });
            group.members.entry(role).or_default().push(RoleMember {
                path: path.to_string(),
                subvariant,
                parts,
                extension,
            });
        }

        debug!(
            "Classified {} path(s) into {} asset group(s), {} non-conforming",
            paths.len(),
            classification.groups.len(),
            classification.non_conforming.len()
        );
        classification
    }

    /// Applies the completeness rules and reports every gap.
    pub fn check(&self, classification: &Classification) -> Vec<Finding> {
        let mut findings = Vec::new();

        for (core_id, group) in &classification.groups {
            if !group.has_role(Role::PreservationMaster) {
                findings.push(Finding::new(
                    FindingKind::OrphanDerivative,
                    core_id.as_str(),
                    format!("missing {} for {core_id}", Role::PreservationMaster),
                ));
                continue;
            }
            let category = self.category_of(group);
            for role in category.required_roles() {
                if !group.has_role(*role) {
                    findings.push(Finding::new(
                        FindingKind::DerivativeMissing,
                        core_id.as_str(),
                        format!("missing {role} for {core_id}"),
                    ));
                }
            }
        }

        for path in &classification.non_conforming {
            findings.push(Finding::new(
                FindingKind::NonConformingFilename,
                path.as_str(),
                "non-conforming filename",
            ));
        }

        for (path, role, dir_role) in &classification.misplaced {
            findings.push(Finding::new(
                FindingKind::MisplacedDerivative,
                path.as_str(),
                format!("{role} file stored under {}", dir_role.directory_name()),
            ));
        }

        findings
    }

    /// Classifies then checks.
    pub fn resolve<S: AsRef<str>>(&self, paths: &[S]) -> (Classification, Vec<Finding>) {
        let classification = self.classify(paths);
        let findings = self.check(&classification);
        (classification, findings)
    }
}

fn parent_role_directory(path: &str) -> Option<Role> {
    let mut components = path.rsplit('/');
    components.next()?;
    Role::from_directory_name(components.next()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::CoreConfigBuilder;

    fn resolver() -> DerivativeSetResolver {
        DerivativeSetResolver::new(&CoreConfig::default()).unwrap()
    }

    #[test]
    fn pm_without_sc_is_one_warning() {
        let (_, findings) = resolver().resolve(&["data/PreservationMasters/abc_123456_v01_pm.mkv"]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::DerivativeMissing);
        assert_eq!(findings[0].message, "missing sc for abc_123456_v01");
        assert!(!findings[0].is_error());
    }

    #[test]
    fn adding_sc_clears_the_warning() {
        let (_, findings) = resolver().resolve(&[
            "data/PreservationMasters/abc_123456_v01_pm.mkv",
            "data/ServiceCopies/abc_123456_v01_sc.mp4",
        ]);
        assert!(findings.is_empty(), "{findings:?}");
    }

    #[test]
    fn sc_without_pm_is_orphan() {
        let (_, findings) = resolver().resolve(&["data/ServiceCopies/abc_123456_v01_sc.mp4"]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::OrphanDerivative);
        assert_eq!(findings[0].message, "missing pm for abc_123456_v01");
    }

    #[test]
    fn subvariants_are_siblings() {
        let (classification, findings) = resolver().resolve(&[
            "data/PreservationMasters/abc_123456_v01_pm.mkv",
            "data/ServiceCopies/abc_123456_v01_talk_sc.mp4",
            "data/ServiceCopies/abc_123456_v01_wide_sc.mp4",
        ]);
        assert!(findings.is_empty(), "{findings:?}");
        assert_eq!(classification.groups.len(), 1);
        let group = &classification.groups["abc_123456_v01"];
        let subs: Vec<_> = group
            .siblings(Role::ServiceCopy)
            .iter()
            .map(|m| m.subvariant.as_deref().unwrap())
            .collect();
        assert_eq!(subs, vec!["talk", "wide"]);
    }

    #[test]
    fn audio_requires_edit_master() {
        let (classification, findings) = resolver().resolve(&[
            "data/PreservationMasters/abc_123456_v01_pm.flac",
            "data/ServiceCopies/abc_123456_v01_sc.mp3",
        ]);
        assert_eq!(
            resolver().category_of(&classification.groups["abc_123456_v01"]),
            SourceCategory::Audio
        );
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "missing em for abc_123456_v01");
    }

    #[test]
    fn film_requires_mezzanine_and_service_copy() {
        let (classification, findings) = resolver().resolve(&[
            "data/PreservationMasters/abc_123456_v01f01_pm.dpx",
            "data/Mezzanines/abc_123456_v01f01_mz.mov",
        ]);
        assert_eq!(
            resolver().category_of(&classification.groups["abc_123456_v01"]),
            SourceCategory::Film
        );
        let messages: Vec<_> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(messages, vec!["missing sc for abc_123456_v01"]);
    }

    #[test]
    fn film_scan_without_mezzanine_is_reported() {
        let (classification, findings) = resolver().resolve(&[
            "data/PreservationMasters/abc_123456_v01f01_pm.dpx",
            "data/ServiceCopies/abc_123456_v01f01_sc.mp4",
        ]);
        assert_eq!(
            resolver().category_of(&classification.groups["abc_123456_v01"]),
            SourceCategory::Film
        );
        let messages: Vec<_> = findings.iter().map(|f| f.message.as_str()).collect();
        assert_eq!(messages, vec!["missing mz for abc_123456_v01"]);
    }

    #[test]
    fn film_extensions_are_configurable() {
        let config = CoreConfigBuilder::new().film_extensions(Vec::new()).build();
        let resolver = DerivativeSetResolver::new(&config).unwrap();
        let (classification, findings) = resolver.resolve(&[
            "data/PreservationMasters/abc_123456_v01_pm.dpx",
            "data/ServiceCopies/abc_123456_v01_sc.mp4",
        ]);
        assert_eq!(
            resolver.category_of(&classification.groups["abc_123456_v01"]),
            SourceCategory::Video
        );
        assert!(findings.is_empty(), "{findings:?}");
    }

    #[test]
    fn readme_is_non_conforming_warning() {
        let (_, findings) = resolver().resolve(&[
            "data/readme.txt",
            "data/PreservationMasters/abc_123456_v01_pm.mkv",
            "data/ServiceCopies/abc_123456_v01_sc.mp4",
        ]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::NonConformingFilename);
        assert_eq!(findings[0].subject, "data/readme.txt");
        assert!(!findings[0].is_error());
    }

    #[test]
    fn sidecars_contribute_no_role() {
        let (classification, findings) = resolver().resolve(&[
            "data/PreservationMasters/abc_123456_v01_pm.mkv",
            "data/PreservationMasters/abc_123456_v01_pm.json",
            "data/ServiceCopies/abc_123456_v01_sc.mp4",
            "data/ServiceCopies/abc_123456_v01_sc.json",
        ]);
        assert!(findings.is_empty(), "{findings:?}");
        assert_eq!(
            classification.groups["abc_123456_v01"].siblings(Role::PreservationMaster).len(),
            1
        );
    }

    #[test]
    fn misplaced_role_file_is_flagged() {
        let (_, findings) = resolver().resolve(&[
            "data/PreservationMasters/abc_123456_v01_pm.mkv",
            "data/PreservationMasters/abc_123456_v01_sc.mp4",
        ]);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].kind, FindingKind::MisplacedDerivative);
        assert_eq!(findings[0].subject, "data/PreservationMasters/abc_123456_v01_sc.mp4");
    }

    #[test]
    fn versions_form_separate_groups() {
        let (classification, findings) = resolver().resolve(&[
            "data/PreservationMasters/abc_123456_v01_pm.mkv",
            "data/ServiceCopies/abc_123456_v01_sc.mp4",
            "data/PreservationMasters/abc_123456_v02_pm.mkv",
        ]);
        assert_eq!(classification.groups.len(), 2);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].message, "missing sc for abc_123456_v02");
    }
}
