//! Human-readable run summaries.

use crate::pipeline::{PipelineReport, RunStatus};
use std::fmt::Write;

/// Render a report for terminal output.
///
/// Branches only on the status and whatever payloads are present, so
/// it works for any report shape the orchestrator can produce.
pub fn summarize(report: &PipelineReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "Topic: {}", report.topic);

    match report.status {
        RunStatus::Completed => {
            let _ = writeln!(out, "Status: completed");
        }
        RunStatus::Failed => {
            let _ = writeln!(out, "Status: failed");
            if let Some(error) = &report.error {
                let _ = writeln!(out, "Error: {error}");
            }
        }
    }

    if let Some(research) = &report.research {
        let _ = writeln!(out, "Research: {} sources gathered", research.sources_count);
    }
    if let Some(article) = &report.article {
        let _ = writeln!(out, "Article: \"{}\" ({} words)", article.title, article.word_count);
        if !article.tags.is_empty() {
            let _ = writeln!(out, "Tags: {}", article.tags.join(", "));
        }
    }
    if let Some(images) = &report.images {
        let _ = writeln!(out, "Images: {} curated", images.images.len());
    }
    if let Some(publication) = &report.publication {
        let _ = writeln!(out, "Publishing:");
        for result in publication.iter() {
            if result.success {
                let mut line = format!("  {} -> ok", result.platform);
                if let Some(path) = result.detail("markdown_file").and_then(|v| v.as_str()) {
                    let _ = write!(line, " ({path})");
                } else if let Some(url) = result.detail("url").and_then(|v| v.as_str()) {
                    let _ = write!(line, " ({url})");
                }
                let _ = writeln!(out, "{line}");
            } else {
                let _ = writeln!(
                    out,
                    "  {} -> failed: {}",
                    result.platform,
                    result.error.as_deref().unwrap_or("unknown error")
                );
            }
        }
    }

    out
}
