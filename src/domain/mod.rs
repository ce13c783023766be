//! Domain logic - pure release rules independent of the remote API

pub mod commit;
pub mod metadata;
pub mod tag;
pub mod version;
pub mod workspace;

pub use commit::{ClassifiedCommit, Commit, CommitParent};
pub use metadata::ReleaseMetadata;
pub use tag::TagPattern;
pub use version::{Version, VersionBump};
pub use workspace::Workspace;
