//! Pure formatting functions for UI output.
//!
//! Everything here returns strings; printing happens in the parent module.

use console::{measure_text_width, style};

use crate::pipeline::{LogEntry, Outcome, RunLog};

const HEADERS: [&str; 3] = ["Plugin Name", "Description", "Comments"];

/// Render the summary table of a workspace run.
///
/// Long comments (such as command output) are reduced to their first line.
///
/// # Arguments
/// * `log` - The run log of one workspace
pub fn render_summary_table(log: &RunLog) -> String {
    let rows: Vec<[String; 3]> = log.entries().iter().map(row).collect();

    let mut widths = HEADERS.map(measure_text_width);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row.iter()) {
            *width = (*width).max(measure_text_width(cell));
        }
    }

    let separator = format!(
        "+{}+",
        widths
            .iter()
            .map(|w| "-".repeat(w + 2))
            .collect::<Vec<_>>()
            .join("+")
    );

    let mut out = Vec::with_capacity(rows.len() + 5);
    out.push(format!("Workspace: {}", log.workspace_id()));
    out.push(separator.clone());
    out.push(line(&HEADERS.map(String::from), &widths));
    out.push(separator.clone());
    for row in &rows {
        out.push(line(row, &widths));
    }
    out.push(separator);
    out.join("\n")
}

fn row(entry: &LogEntry) -> [String; 3] {
    let comment = entry
        .comment
        .as_deref()
        .and_then(|c| c.lines().next())
        .unwrap_or("")
        .to_string();
    [entry.plugin.clone(), entry.description.clone(), comment]
}

fn line(cells: &[String; 3], widths: &[usize; 3]) -> String {
    let padded: Vec<String> = cells
        .iter()
        .zip(widths.iter())
        .map(|(cell, width)| {
            let pad = width - measure_text_width(cell);
            format!(" {}{} ", cell, " ".repeat(pad))
        })
        .collect();
    format!("|{}|", padded.join("|"))
}

/// One-line verdict for a workspace run, styled by its worst outcome
pub fn format_outcome_line(log: &RunLog) -> String {
    let released = log.entries().iter().any(|e| e.outcome == Outcome::Success);

    if log.has_failures() {
        format!("{} {}", style("✗").red(), log.workspace_id())
    } else if released {
        format!("{} {}", style("✓").green(), log.workspace_id())
    } else {
        format!("{} {}", style("→").yellow(), log.workspace_id())
    }
}
