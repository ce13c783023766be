pub mod orchestration;

pub use orchestration::{run_commit_lint, run_release, ReleaseArgs};
