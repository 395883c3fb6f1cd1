use std::path::PathBuf;

use anyhow::{Result, bail};
use chrono::Utc;
use log::info;

use crate::config::Config;
use crate::pipeline::{Collector, OutcomeTally};
use crate::plot::{render_enhanced, render_scatter};
use crate::table::{build_table, save};

use super::console;
use super::services::Services;

#[derive(Debug, Clone)]
pub struct AnalyzeOptions {
    pub output_csv: PathBuf,
    pub output_plot: PathBuf,
    /// `None` skips the 2x2 overview.
    pub enhanced_plot: Option<PathBuf>,
    pub log_scale: bool,
    pub skip_plot: bool,
    pub show_progress: bool,
}

/// Full run: registry, stats, table, plot.
#[tracing::instrument(skip(config, options))]
pub async fn analyze(config: &Config, options: &AnalyzeOptions) -> Result<()> {
    let services = Services::from_config(config)?;
    let progress = console::reporter(options.show_progress);

    if options.show_progress {
        println!("MCP Server Activity vs Popularity Analysis\n");
    }

    let entries = services
        .registry
        .fetch_all_entries(progress.as_ref())
        .await?;

    let records = Collector::new(&services.stats, config.max_concurrent)
        .with_progress(progress.as_ref())
        .collect(entries)
        .await;

    let tally = OutcomeTally::from_records(&records);
    tally.warn_if_throttled();

    let table = build_table(&records, Utc::now());
    save(&table, &options.output_csv)?;
    info!("Saved {} rows to {}", table.len(), options.output_csv.display());

    let summary = table.summary();
    println!("\nSummary:\n{}", summary);
    println!("  Data saved to: {}", options.output_csv.display());

    if !options.skip_plot {
        let valid = table.filter_valid();
        if valid.plottable().next().is_none() {
            console::warn_if_partial(&summary, Some(&tally));
            bail!("No valid data collected for plotting");
        }
        let drawn = render_scatter(&valid, &options.output_plot, options.log_scale)?;
        println!(
            "  Plot saved to: {} ({} points)",
            options.output_plot.display(),
            drawn
        );
        if let Some(enhanced) = &options.enhanced_plot {
            render_enhanced(&valid, enhanced)?;
            println!("  Enhanced plot saved to: {}", enhanced.display());
        }
    }

    console::warn_if_partial(&summary, Some(&tally));
    Ok(())
}
