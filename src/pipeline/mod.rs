//! Workspace Pipeline Runner
//!
//! Each workspace run gets a fresh [RunContext] and [RunLog]. The source-control plugin
//! writes the context, later plugins read it. A failing plugin is logged and the run
//! moves on, so no error crosses a plugin or workspace boundary.

pub mod context;
pub mod log;
pub mod runner;

pub use context::{RunContext, SourceControlStatus};
pub use log::{LogEntry, Outcome, RunLog};
pub use runner::{PipelineRunner, RunOptions, WorkspaceReport, WorkspaceState};
