use std::path::PathBuf;

use anyhow::Result;
use chrono::Utc;

use crate::config::Config;
use crate::pipeline::Collector;
use crate::table::{load, save};

use super::console;
use super::services::Services;

#[derive(Debug, Clone)]
pub struct RefetchOptions {
    pub input_csv: PathBuf,
    /// Defaults to overwriting the input.
    pub output_csv: Option<PathBuf>,
    pub force: bool,
    pub show_progress: bool,
}

/// Fills in missing stats of an existing table.
#[tracing::instrument(skip(config, options))]
pub async fn refetch(config: &Config, options: &RefetchOptions) -> Result<()> {
    let table = load(&options.input_csv)?;
    let output = options
        .output_csv
        .clone()
        .unwrap_or_else(|| options.input_csv.clone());

    println!(
        "Loaded {} rows from {}",
        table.len(),
        options.input_csv.display()
    );

    let candidates = table.refetch_candidates(options.force).len();
    if candidates == 0 {
        println!("All rows with a GitHub repository already have stats. Nothing to refetch.");
        return Ok(());
    }
    if options.force {
        println!("Force mode: refetching all {} rows with a GitHub repository", candidates);
    } else {
        println!("Rows to refetch: {}", candidates);
    }

    let services = Services::from_config(config)?;
    let progress = console::reporter(options.show_progress);

    let result = Collector::new(&services.stats, config.max_concurrent)
        .with_progress(progress.as_ref())
        .refetch(&table, options.force, Utc::now())
        .await;
    result.tally.warn_if_throttled();

    save(&result.table, &output)?;

    let summary = result.table.summary();
    println!("\nRefetch complete.");
    println!("  Attempted:            {}", result.attempted);
    println!("  Successfully updated: {}", result.updated);
    println!("  Still missing:        {}", result.attempted - result.updated);
    println!(
        "  Total with stats now: {}/{}",
        summary.with_stats, summary.total
    );
    println!("  Updated table saved to: {}", output.display());

    console::warn_if_partial(&summary, Some(&result.tally));
    Ok(())
}
