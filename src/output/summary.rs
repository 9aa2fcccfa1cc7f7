//! Human-readable crawl summaries
//!
//! Used by the CLI to report the outcome of a run and, with `--status`,
//! the stored checkpoint of a target.

use crate::crawler::CrawlReport;
use crate::storage::Checkpoint;
use std::fmt::Write;

/// Formats the outcome of a run
pub fn format_report(report: &CrawlReport) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "=== Crawl Report ===\n");
    let _ = writeln!(out, "  Phase: {}", report.phase);
    let _ = writeln!(out, "  Pages fetched: {}", report.pages_fetched);
    let _ = writeln!(out, "  Records written: {}", report.records_written);

    if let Some(reason) = &report.failure {
        let _ = writeln!(out, "  Failure: {}", reason);
    }
    if let Some(url) = &report.failed_url {
        let _ = writeln!(out, "  Failed at: {}", url);
    }
    if !report.is_success() {
        if let Some(url) = &report.pending_url {
            let _ = writeln!(out, "  Resume from: {}", url);
        }
    }

    out
}

/// Prints the outcome of a run to stdout
pub fn print_report(report: &CrawlReport) {
    print!("{}", format_report(report));
}

/// Formats a stored checkpoint
pub fn format_checkpoint(key: &str, checkpoint: &Checkpoint) -> String {
    let state = &checkpoint.state;
    let mut out = String::new();
    let _ = writeln!(out, "=== Checkpoint {} ===\n", key);
    let _ = writeln!(out, "  Status: {}", checkpoint.status.to_db_string());
    let _ = writeln!(out, "  Updated: {}", checkpoint.updated_at.to_rfc3339());
    let _ = writeln!(out, "  Seeds:");
    for seed in &checkpoint.seeds {
        let _ = writeln!(out, "    {}", seed);
    }
    let _ = writeln!(out, "  Pages fetched: {}", state.pages_fetched);
    let _ = writeln!(out, "  Pages visited: {}", state.visited.len());
    let _ = writeln!(out, "  Records written: {}", state.records_written);

    if let Some(url) = &state.pending_url {
        let _ = writeln!(out, "  Pending: {}", url);
    }
    if let Some(url) = &checkpoint.failed_url {
        let _ = writeln!(out, "  Failed at: {}", url);
    }

    out
}

/// Prints a stored checkpoint to stdout
pub fn print_checkpoint(key: &str, checkpoint: &Checkpoint) {
    print!("{}", format_checkpoint(key, checkpoint));
}
