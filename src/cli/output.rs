//! CLI output formatting

use crate::model::{JobEdge, Pipeline};
use crate::validate::{ValidationIssue, ValidationReport};
use console::Emoji;

// Re-export style
pub use console::style;

// Emojis for output
pub static CHECK: Emoji<'_, '_> = Emoji("✅ ", "✓ ");
pub static CROSS: Emoji<'_, '_> = Emoji("❌ ", "✗ ");
pub static INFO: Emoji<'_, '_> = Emoji("ℹ️  ", "i ");
pub static WARN: Emoji<'_, '_> = Emoji("⚠️  ", "! ");
pub static ROCKET: Emoji<'_, '_> = Emoji("🚀 ", "> ");

/// One-line count of what a pipeline contains
pub fn format_pipeline_summary(pipeline: &Pipeline) -> String {
    format!(
        "{} resource types, {} resources, {} jobs, {} groups",
        style(pipeline.resource_types.len()).cyan(),
        style(pipeline.resources.len()).cyan(),
        style(pipeline.jobs.len()).cyan(),
        style(pipeline.groups.len()).cyan()
    )
}

/// Format a single integrity issue
pub fn format_issue(issue: &ValidationIssue) -> String {
    format!("{} {}", CROSS, style(issue).red())
}

/// Format every issue of a report, one per line
pub fn format_report(report: &ValidationReport) -> String {
    report
        .issues
        .iter()
        .map(|issue| format!("  {}", format_issue(issue)))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a dependency edge between two jobs
pub fn format_edge(edge: &JobEdge) -> String {
    format!(
        "{} → {} {}",
        style(&edge.upstream).cyan(),
        style(&edge.downstream).green(),
        style(format!("({})", edge.resource)).dim()
    )
}

/// Format the jobs that nothing gates on, i.e. the roots of the graph
pub fn format_roots(pipeline: &Pipeline, edges: &[JobEdge]) -> Vec<String> {
    pipeline
        .jobs
        .iter()
        .filter(|job| !edges.iter().any(|edge| edge.downstream == job.name))
        .map(|job| format!("{} {}", ROCKET, style(&job.name).bold()))
        .collect()
}
