use crate::config::{default_title, CommitPattern};
use crate::domain::{ClassifiedCommit, Commit, Version, VersionBump};
use crate::error::{ReleaseError, Result};
use regex::Regex;

/// A commit pattern with its regex compiled once
#[derive(Debug, Clone)]
struct CompiledPattern {
    matcher: Regex,
    upgrade: VersionBump,
    title: String,
}

/// Outcome of resolving a batch of commits
#[derive(Debug, Clone, PartialEq)]
pub enum Resolution {
    /// At least one commit contributes a bump
    Release {
        version: Version,
        bump: VersionBump,
        classified: Vec<ClassifiedCommit>,
    },
    /// Nothing warrants a release, even if some commits were classified
    NoOp { classified: Vec<ClassifiedCommit> },
}

impl Resolution {
    pub fn classified(&self) -> &[ClassifiedCommit] {
        match self {
            Resolution::Release { classified, .. } | Resolution::NoOp { classified } => classified,
        }
    }
}

/// Classifies commits against ordered patterns and computes the next version
pub struct VersionResolver {
    patterns: Vec<CompiledPattern>,
}

impl VersionResolver {
    /// Compile the configured patterns, in declaration order
    pub fn new(patterns: &[CommitPattern]) -> Result<Self> {
        let patterns = patterns
            .iter()
            .map(|p| {
                let matcher = Regex::new(&p.pattern).map_err(|e| {
                    ReleaseError::config(format!("Invalid commit pattern '{}': {}", p.pattern, e))
                })?;
                Ok(CompiledPattern {
                    matcher,
                    upgrade: p.upgrade,
                    title: p.title.clone(),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(VersionResolver { patterns })
    }

    /// Whether any pattern matches the message
    pub fn matches_any(&self, message: &str) -> bool {
        self.patterns.iter().any(|p| p.matcher.is_match(message))
    }

    /// Classify one message.
    ///
    /// The title comes from the last matching pattern while the weight is the maximum
    /// over all matches, so the two may come from different patterns. `None` means no
    /// pattern matched.
    pub fn classify(&self, message: &str) -> Option<(String, VersionBump)> {
        let mut result: Option<(String, VersionBump)> = None;

        for pattern in self.patterns.iter().filter(|p| p.matcher.is_match(message)) {
            let weight = match &result {
                Some((_, seen)) => (*seen).max(pattern.upgrade),
                None => pattern.upgrade,
            };
            result = Some((pattern.title.clone(), weight));
        }

        result
    }

    /// Resolve the next version from the commits since `previous`
    ///
    /// # Errors
    /// [ReleaseError::Version] when the bump overflows a version component
    pub fn resolve(&self, previous: Version, commits: Vec<Commit>) -> Result<Resolution> {
        let mut dominant: Option<VersionBump> = None;
        let mut classified = Vec::with_capacity(commits.len());

        for commit in commits {
            let title = match self.classify(&commit.message) {
                Some((title, weight)) => {
                    if weight.contributes() {
                        dominant = dominant.max(Some(weight));
                    }
                    title
                }
                None => default_title(),
            };
            classified.push(ClassifiedCommit { commit, title });
        }

        Ok(match dominant {
            Some(bump) => Resolution::Release {
                version: previous.bump(bump)?,
                bump,
                classified,
            },
            None => Resolution::NoOp { classified },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn pattern(pattern: &str, upgrade: VersionBump, title: &str) -> CommitPattern {
        CommitPattern {
            pattern: pattern.to_string(),
            upgrade,
            title: title.to_string(),
        }
    }

    fn resolver() -> VersionResolver {
        VersionResolver::new(&[
            pattern(r"^chore\(\):", VersionBump::Build, "Chores"),
            pattern(r"^feat\(\):", VersionBump::Minor, "Features"),
            pattern(r"^breaking\(\):", VersionBump::Major, "Breaking"),
            pattern(r"^docs\(\):", VersionBump::Ignore, "Docs"),
        ])
        .unwrap()
    }

    fn commits(messages: &[&str]) -> Vec<Commit> {
        messages
            .iter()
            .enumerate()
            .map(|(i, m)| Commit {
                sha: format!("sha{}", i),
                timestamp: Utc.with_ymd_and_hms(2024, 7, 2, 10, i as u32, 0).unwrap(),
                message: m.to_string(),
                files: vec![],
                parents: vec![],
            })
            .collect()
    }

    #[test]
    fn test_max_weight_wins() {
        let resolution = resolver()
            .resolve(
                Version::new(1, 2, 3),
                commits(&["chore(): a", "feat(): b"]),
            )
            .unwrap();
        match resolution {
            Resolution::Release { version, bump, .. } => {
                assert_eq!(version, Version::new(1, 3, 0));
                assert_eq!(bump, VersionBump::Minor);
            }
            other => panic!("expected release, got {:?}", other),
        }
    }

    #[test]
    fn test_major_dominates_many_lower_bumps() {
        let resolution = resolver()
            .resolve(
                Version::new(2, 5, 9),
                commits(&["chore(): a", "feat(): b", "breaking(): c", "chore(): d", "feat(): e"]),
            )
            .unwrap();
        assert!(matches!(
            resolution,
            Resolution::Release { version, .. } if version == Version::new(3, 0, 0)
        ));
    }

    #[test]
    fn test_first_release_from_initial_version() {
        let resolution = resolver()
            .resolve(Version::initial(), commits(&["feat(): x"]))
            .unwrap();
        assert!(matches!(
            resolution,
            Resolution::Release { version, .. } if version == Version::new(0, 1, 0)
        ));
    }

    #[test]
    fn test_ignore_only_is_noop_with_titles() {
        let resolution = resolver()
            .resolve(
                Version::new(1, 0, 0),
                commits(&["docs(): readme", "docs(): typo"]),
            )
            .unwrap();
        match resolution {
            Resolution::NoOp { classified } => {
                assert_eq!(classified.len(), 2);
                assert!(classified.iter().all(|c| c.title == "Docs"));
            }
            other => panic!("expected no-op, got {:?}", other),
        }
    }

    #[test]
    fn test_unmatched_commits_get_default_title() {
        let resolution = resolver()
            .resolve(
                Version::new(1, 0, 0),
                commits(&["random message", "feat(): real"]),
            )
            .unwrap();
        let titles: Vec<&str> = resolution.classified().iter().map(|c| c.title.as_str()).collect();
        assert_eq!(titles, vec!["Default", "Features"]);
    }

    #[test]
    fn test_non_matching_batch_is_noop() {
        let resolution = resolver()
            .resolve(Version::new(1, 0, 0), commits(&["wip", "more wip"]))
            .unwrap();
        assert!(matches!(resolution, Resolution::NoOp { .. }));
    }

    #[test]
    fn test_overflowing_bump_is_an_error() {
        let previous = Version::new(u64::MAX, 0, 0);
        let err = resolver()
            .resolve(previous, commits(&["breaking(): again"]))
            .unwrap_err();
        assert!(matches!(err, ReleaseError::Version(_)));

        let resolution = resolver()
            .resolve(previous, commits(&["docs(): only docs"]))
            .unwrap();
        assert!(matches!(resolution, Resolution::NoOp { .. }));
    }

    #[test]
    fn test_empty_batch_is_noop() {
        let resolution = resolver()
            .resolve(Version::new(1, 0, 0), vec![])
            .unwrap();
        assert!(matches!(resolution, Resolution::NoOp { classified } if classified.is_empty()));
    }

    #[test]
    fn test_title_last_match_weight_max_match() {
        let resolver = VersionResolver::new(&[
            pattern(r"^feat", VersionBump::Major, "Breaking features"),
            pattern(r"\(ui\)", VersionBump::Build, "UI"),
        ])
        .unwrap();

        let (title, weight) = resolver.classify("feat(ui): new button").unwrap();
        assert_eq!(title, "UI");
        assert_eq!(weight, VersionBump::Major);
    }

    #[test]
    fn test_ignore_match_does_not_lower_weight() {
        let resolver = VersionResolver::new(&[
            pattern(r"^feat", VersionBump::Minor, "Features"),
            pattern(r"skip", VersionBump::Ignore, "Skipped"),
        ])
        .unwrap();

        let (title, weight) = resolver.classify("feat: skip ci").unwrap();
        assert_eq!(title, "Skipped");
        assert_eq!(weight, VersionBump::Minor);
    }

    #[test]
    fn test_invalid_pattern_is_config_error() {
        let err = VersionResolver::new(&[pattern("(unclosed", VersionBump::Build, "x")])
            .err()
            .unwrap();
        assert!(matches!(err, ReleaseError::Config(_)));
    }

    #[test]
    fn test_matches_any() {
        assert!(resolver().matches_any("feat(): add login"));
        assert!(!resolver().matches_any("added login"));
    }
}
