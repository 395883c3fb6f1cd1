//! Terminal output for progress and run summaries.

use crate::pipeline::OutcomeTally;
use crate::progress::{Progress, ProgressCallback};
use crate::table::TableSummary;

/// Prints progress to stderr, or nothing when disabled.
pub fn reporter(enabled: bool) -> Option<ProgressCallback> {
    if !enabled {
        return None;
    }

    Some(Box::new(|event| match event {
        Progress::RegistryPage {
            page,
            count,
            total_so_far,
        } => {
            eprintln!(
                "  registry page {}: {} servers ({} so far)",
                page, count, total_so_far
            );
        }
        Progress::RegistryComplete { total } => eprintln!("✓ Found {} servers", total),
        Progress::FetchingStats { total, concurrency } => {
            eprintln!(
                "Fetching GitHub stats for {} repositories ({} at a time)...",
                total, concurrency
            );
        }
        Progress::StatsFetched { completed, total } => {
            eprint!("\r  {}/{}", completed, total);
            if completed == total {
                eprintln!();
            }
        }
        Progress::StatsComplete { resolved, total } => {
            eprintln!("✓ Resolved stats for {}/{} repositories", resolved, total);
        }
    }))
}

/// Partial coverage is expected; it is reported, not failed on.
pub fn warn_if_partial(summary: &TableSummary, tally: Option<&OutcomeTally>) {
    if !summary.is_partial() {
        return;
    }

    let missing = summary.with_reference - summary.with_stats;
    eprintln!(
        "⚠ Stats missing for {} of {} repositories.",
        missing, summary.with_reference
    );
    if let Some(tally) = tally {
        eprintln!(
            "  not found: {}, forbidden: {}, empty: {}, transient errors: {}",
            tally.not_found, tally.forbidden, tally.empty, tally.transient
        );
    }
    eprintln!("  Run `mcp-activity refetch <csv>` to retry the missing rows.");
}
