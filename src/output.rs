//! CLI output formatting for pipeline runs.
//!
//! # Output Format
//!
//! Output follows the run: a header naming the command and output root,
//! one line per written item in traversal order, then the finalize passes
//! and, for `publish`, the new `current` target.
//!
//! ```text
//! ==> generate → /site/work-in-progress
//!     dir   blog
//!     page  blog/first-post.html
//!     asset css/site.css
//!     page  index.html
//! home-page-links: linked 2 posts from 1 home pages
//! Finalized home-page-links
//! Generated 4 pages, 3 assets, 3 directories (2 templates)
//! ```
//!
//! Paths are shown relative to the output root, with forward slashes on
//! every platform.
//!
//! # Architecture
//!
//! Each kind of output has a `format_*` function (returns `Vec<String>`)
//! for testability and a `print_*` wrapper that writes to stdout or stderr.
//! Format functions are pure: no I/O, no side effects.

use crate::classify::ItemKind;
use crate::context::{Command, PipelineEvent};
use crate::pipeline::{ErrorKind, PipelineError, RunSummary};
use std::path::Path;

// ============================================================================
// Shared helpers
// ============================================================================

/// Return indentation string: 4 spaces per depth level.
fn indent(depth: usize) -> String {
    "    ".repeat(depth)
}

/// Display a relative path with forward slashes.
fn slash_path(path: &Path) -> String {
    path.to_string_lossy().replace('\\', "/")
}

/// `1 page`, `2 pages`.
fn count(n: usize, singular: &str, plural: &str) -> String {
    if n == 1 {
        format!("{n} {singular}")
    } else {
        format!("{n} {plural}")
    }
}

/// Item kind padded to a fixed column.
fn kind_column(kind: ItemKind) -> String {
    format!("{:<5}", kind.label())
}

// ============================================================================
// Progress events
// ============================================================================

/// Format a single progress event as display lines.
pub fn format_event(event: &PipelineEvent) -> Vec<String> {
    match event {
        PipelineEvent::RunStarted {
            command,
            output_root,
            ..
        } => vec![format!("==> {} \u{2192} {}", command, output_root.display())],
        PipelineEvent::Cleaned { removed } => {
            vec![format!("Cleaned {}", count(*removed, "entry", "entries"))]
        }
        PipelineEvent::ItemWritten { kind, relative } => vec![format!(
            "{}{} {}",
            indent(1),
            kind_column(*kind),
            slash_path(relative)
        )],
        PipelineEvent::Finalized { plugin } => vec![format!("Finalized {plugin}")],
        PipelineEvent::Note { plugin, message } => vec![format!("{plugin}: {message}")],
        PipelineEvent::Published { version, link } => {
            let name = version
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_else(|| version.display().to_string());
            vec![
                format!("Published {name}"),
                format!("{}{} \u{2192} {}", indent(1), link.display(), name),
            ]
        }
    }
}

// ============================================================================
// Run summary
// ============================================================================

/// Format the closing summary of a successful run.
pub fn format_summary(summary: &RunSummary) -> Vec<String> {
    let verb = match summary.command {
        Command::Publish => "Published",
        Command::Generate | Command::CleanAndGenerate => "Generated",
    };
    vec![format!(
        "{} {}, {}, {} ({})",
        verb,
        count(summary.pages, "page", "pages"),
        count(summary.assets, "asset", "assets"),
        count(summary.directories, "directory", "directories"),
        count(summary.templates, "template", "templates"),
    )]
}

pub fn print_summary(summary: &RunSummary) {
    for line in format_summary(summary) {
        println!("{}", line);
    }
}

// ============================================================================
// Errors
// ============================================================================

/// Format a fatal run error.
///
/// The first line names the failure category; the error's own message
/// already carries the path or plugin involved.
pub fn format_error(err: &PipelineError) -> Vec<String> {
    let label = match err.kind() {
        ErrorKind::Config => "Configuration error",
        ErrorKind::Parse => "Page source error",
        ErrorKind::Io => "File system error",
        ErrorKind::Plugin => "Plugin error",
    };
    vec![format!("Fatal error ({label}):"), format!("{}{err}", indent(1))]
}

pub fn print_error(err: &PipelineError) {
    for line in format_error(err) {
        eprintln!("{}", line);
    }
}
