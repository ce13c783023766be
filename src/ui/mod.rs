//! Terminal output: status lines and workspace summaries
//!
//! Styling goes through `console`, so colors are dropped automatically when the
//! output is not a terminal.

pub mod formatter;

use console::style;

use crate::pipeline::RunLog;

/// Print an error message in red to stderr.
pub fn display_error(message: &str) {
    eprintln!("{} {}", style("ERROR:").red().bold(), message);
}

/// Print a status message with a yellow arrow.
pub fn display_status(message: &str) {
    println!("{} {}", style("→").yellow(), message);
}

/// Print a non-fatal warning to stderr.
pub fn display_warning(message: &str) {
    eprintln!("{} {}", style("⚠ WARNING:").yellow(), message);
}

/// Print the summary table of one workspace run, followed by its verdict.
pub fn display_summary(log: &RunLog) {
    println!("\n{}", formatter::render_summary_table(log));
    println!("{}", formatter::format_outcome_line(log));
}

/// Print the report of a rejected commit message.
pub fn display_lint_rejection(report: &str) {
    eprintln!("{}", style(report).red());
}
