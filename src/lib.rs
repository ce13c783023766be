pub mod analyzer;
pub mod boundary;
pub mod cli;
pub mod config;
pub mod domain;
pub mod error;
pub mod github;
pub mod lint;
pub mod locator;
pub mod pipeline;
pub mod plugins;
pub mod publisher;
pub mod ui;
pub mod walker;

pub use error::{ReleaseError, Result};
