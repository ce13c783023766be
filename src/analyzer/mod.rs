//! Classification of commits and resolution of the next version

pub mod version_resolver;

pub use version_resolver::{Resolution, VersionResolver};
