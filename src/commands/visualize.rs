use std::path::PathBuf;

use anyhow::Result;

use crate::plot::{render_enhanced, render_scatter};
use crate::table::load;

#[derive(Debug, Clone)]
pub struct VisualizeOptions {
    pub input_csv: PathBuf,
    pub output_plot: PathBuf,
    /// `None` skips the 2x2 overview.
    pub enhanced_plot: Option<PathBuf>,
    pub log_scale: bool,
}

/// Plots an existing table without fetching anything.
#[tracing::instrument(skip(options))]
pub fn visualize(options: &VisualizeOptions) -> Result<()> {
    let table = load(&options.input_csv)?;
    let valid = table.filter_valid();

    let drawn = render_scatter(&valid, &options.output_plot, options.log_scale)?;

    println!(
        "Loaded {} rows, plotted {} data points.",
        table.len(),
        drawn
    );
    println!("  Plot saved to: {}", options.output_plot.display());

    if let Some(enhanced) = &options.enhanced_plot {
        render_enhanced(&valid, enhanced)?;
        println!("  Enhanced plot saved to: {}", enhanced.display());
    }
    Ok(())
}
