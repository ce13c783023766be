use crate::error::{ReleaseError, Result};
use serde::{Deserialize, Serialize};
use std::fmt;

/// Semantic version representation (major.minor.build)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct Version {
    pub major: u64,
    pub minor: u64,
    pub build: u64,
}

impl Version {
    /// Create a new version
    pub fn new(major: u64, minor: u64, build: u64) -> Self {
        Version {
            major,
            minor,
            build,
        }
    }

    /// Version assumed for a workspace that has never been released
    pub fn initial() -> Self {
        Version::new(0, 0, 0)
    }

    /// Parse version from a string (e.g., "v1.2.3" -> Version(1,2,3))
    ///
    /// Pre-release and build-metadata suffixes are rejected: release tags produced by
    /// this tool only ever carry the three numeric components.
    pub fn parse(input: &str) -> Result<Self> {
        let clean = input.trim().trim_start_matches('v').trim_start_matches('V');

        let parsed = semver::Version::parse(clean).map_err(|e| {
            ReleaseError::version(format!("Invalid version '{}': {}", input, e))
        })?;

        if !parsed.pre.is_empty() || !parsed.build.is_empty() {
            return Err(ReleaseError::version(format!(
                "Invalid version '{}': expected X.Y.Z without suffixes",
                input
            )));
        }

        Ok(Version::new(parsed.major, parsed.minor, parsed.patch))
    }

    /// Bump version according to bump type.
    ///
    /// `Ignore` leaves the version untouched. Fails when the bumped component would
    /// overflow.
    pub fn bump(&self, bump: VersionBump) -> Result<Self> {
        let next = |component: u64| {
            component.checked_add(1).ok_or_else(|| {
                ReleaseError::version(format!(
                    "Cannot apply a {} bump to {}: overflow",
                    bump, self
                ))
            })
        };

        Ok(match bump {
            VersionBump::Major => Version::new(next(self.major)?, 0, 0),
            VersionBump::Minor => Version::new(self.major, next(self.minor)?, 0),
            VersionBump::Build => Version::new(self.major, self.minor, next(self.build)?),
            VersionBump::Ignore => *self,
        })
    }
}

impl fmt::Display for Version {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}.{}.{}", self.major, self.minor, self.build)
    }
}

/// Bump weight attached to a commit pattern.
///
/// Ordered by severity so the dominant bump of a batch is simply the maximum.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VersionBump {
    Ignore,
    Build,
    Minor,
    Major,
}

impl VersionBump {
    /// Whether this weight can produce a release on its own
    pub fn contributes(&self) -> bool {
        !matches!(self, VersionBump::Ignore)
    }
}

impl fmt::Display for VersionBump {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            VersionBump::Ignore => "ignore",
            VersionBump::Build => "build",
            VersionBump::Minor => "minor",
            VersionBump::Major => "major",
        };
        f.write_str(name)
    }
}
