//! Plots of activity (days since last commit) against popularity (stars).

use std::path::Path;

use anyhow::{Result, bail};
use log::debug;
use plotters::coord::Shift;
use plotters::prelude::*;

use crate::table::ResultTable;

const SIZE: (u32, u32) = (1200, 800);
const ENHANCED_SIZE: (u32, u32) = (1400, 1000);
const TITLE: &str = "MCP Server Activity vs Popularity";
const DAYS_DESC: &str = "Days since most recent commit";
const BINS: u32 = 50;

const SKY_BLUE: RGBColor = RGBColor(135, 206, 235);
const CORAL: RGBColor = RGBColor(255, 127, 80);

type Area<'a> = DrawingArea<SVGBackend<'a>, Shift>;

/// Renders every row that has stats as an SVG scatter plot.
/// Returns the number of points drawn.
pub fn render_scatter(table: &ResultTable, path: &Path, log_scale: bool) -> Result<usize> {
    let points: Vec<(f64, f64)> = table
        .plottable()
        .map(|(days, stars)| (days, scale_stars(stars, log_scale)))
        .collect();

    if points.is_empty() {
        bail!("No valid data points to plot");
    }

    let summary = table.summary();

    let root = SVGBackend::new(path, SIZE).into_drawing_area();
    root.fill(&WHITE)?;

    draw_scatter(&root, TITLE, 28, stars_desc(log_scale), &points, 4, BLUE)?;

    let annotation = [
        format!("n = {}", points.len()),
        format!("Mean stars: {:.0}", summary.mean_stars.unwrap_or_default()),
        format!("Median stars: {:.0}", summary.median_stars.unwrap_or_default()),
        format!(
            "Mean days since commit: {:.1}",
            summary.mean_days_since_commit.unwrap_or_default()
        ),
    ];
    let (width, height) = SIZE;
    for (i, line) in annotation.iter().enumerate() {
        let y = height as i32 - 150 + 20 * i as i32;
        root.draw(&Text::new(
            line.clone(),
            (width as i32 - 280, y),
            ("sans-serif", 16).into_font(),
        ))?;
    }

    root.present()?;
    debug!("Plotted {} points to {}", points.len(), path.display());
    Ok(points.len())
}

/// Renders a 2x2 overview: linear and log scatter on top, the star and
/// activity distributions below. Returns the number of rows plotted.
pub fn render_enhanced(table: &ResultTable, path: &Path) -> Result<usize> {
    let rows: Vec<(f64, u64)> = table.plottable().collect();
    if rows.is_empty() {
        bail!("No valid data points to plot");
    }

    let linear: Vec<(f64, f64)> = rows
        .iter()
        .map(|&(days, stars)| (days, scale_stars(stars, false)))
        .collect();
    let log: Vec<(f64, f64)> = rows
        .iter()
        .map(|&(days, stars)| (days, scale_stars(stars, true)))
        .collect();
    let stars: Vec<f64> = rows.iter().map(|&(_, stars)| stars as f64).collect();
    let days: Vec<f64> = rows.iter().map(|&(days, _)| days).collect();

    let root = SVGBackend::new(path, ENHANCED_SIZE).into_drawing_area();
    root.fill(&WHITE)?;
    let body = root.titled(TITLE, ("sans-serif", 30).into_font())?;
    let panels = body.split_evenly((2, 2));
    let [linear_area, log_area, stars_area, days_area] = panels.as_slice() else {
        bail!("Expected 4 plot panels, got {}", panels.len());
    };

    draw_scatter(linear_area, "Linear Scale", 20, stars_desc(false), &linear, 3, BLUE)?;
    draw_scatter(log_area, "Log Scale", 20, stars_desc(true), &log, 3, MAGENTA)?;
    draw_histogram(stars_area, "Star Distribution", "GitHub stars", &stars, SKY_BLUE)?;
    draw_histogram(days_area, "Activity Distribution", DAYS_DESC, &days, CORAL)?;

    root.present()?;
    debug!("Plotted {} rows to {}", rows.len(), path.display());
    Ok(rows.len())
}

fn stars_desc(log_scale: bool) -> &'static str {
    if log_scale {
        "GitHub stars (log10 of stars + 1)"
    } else {
        "GitHub stars"
    }
}

fn draw_scatter(
    area: &Area<'_>,
    caption: &str,
    caption_size: u32,
    y_desc: &str,
    points: &[(f64, f64)],
    radius: u32,
    color: RGBColor,
) -> Result<()> {
    let x_max = upper_bound(points.iter().map(|p| p.0));
    let y_max = upper_bound(points.iter().map(|p| p.1));

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", caption_size).into_font())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d(0f64..x_max, 0f64..y_max)?;

    chart
        .configure_mesh()
        .x_desc(DAYS_DESC)
        .y_desc(y_desc)
        .draw()?;

    chart.draw_series(
        points
            .iter()
            .map(|&(x, y)| Circle::new((x, y), radius, color.mix(0.5).filled())),
    )?;
    Ok(())
}

fn draw_histogram(
    area: &Area<'_>,
    caption: &str,
    x_desc: &str,
    values: &[f64],
    color: RGBColor,
) -> Result<()> {
    let bins = Bins::of(values);
    let y_max = bins.counts.iter().copied().max().unwrap_or(0) + 1;

    let mut chart = ChartBuilder::on(area)
        .caption(caption, ("sans-serif", 20).into_font())
        .margin(20)
        .x_label_area_size(50)
        .y_label_area_size(70)
        .build_cartesian_2d((0u32..BINS).into_segmented(), 0u32..y_max)?;

    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_desc(x_desc)
        .y_desc("Count")
        .x_label_formatter(&|v: &SegmentValue<u32>| match v {
            SegmentValue::Exact(i) | SegmentValue::CenterOf(i) => {
                format!("{:.0}", bins.lower_edge(*i))
            }
            SegmentValue::Last => String::new(),
        })
        .draw()?;

    chart.draw_series(
        Histogram::vertical(&chart)
            .style(color.mix(0.8).filled())
            .margin(1)
            .data(
                bins.counts
                    .iter()
                    .enumerate()
                    .map(|(i, &count)| (i as u32, count)),
            ),
    )?;
    Ok(())
}

/// Equal-width bins over the observed range of a non-empty sample.
#[derive(Debug, PartialEq)]
struct Bins {
    low: f64,
    width: f64,
    counts: Vec<u32>,
}

impl Bins {
    fn of(values: &[f64]) -> Self {
        let low = values.iter().copied().fold(f64::INFINITY, f64::min);
        let high = values.iter().copied().fold(f64::NEG_INFINITY, f64::max);
        let width = if high > low {
            (high - low) / BINS as f64
        } else {
            1.0
        };

        let mut counts = vec![0u32; BINS as usize];
        for value in values {
            let index = (((value - low) / width) as usize).min(BINS as usize - 1);
            counts[index] += 1;
        }
        Self { low, width, counts }
    }

    fn lower_edge(&self, index: u32) -> f64 {
        self.low + index as f64 * self.width
    }
}

fn scale_stars(stars: u64, log_scale: bool) -> f64 {
    if log_scale {
        (stars as f64 + 1.0).log10()
    } else {
        stars as f64
    }
}

/// Axis end with a little headroom; never a zero-width range.
fn upper_bound(values: impl Iterator<Item = f64>) -> f64 {
    let max = values.fold(0.0, f64::max);
    if max <= 0.0 { 1.0 } else { max * 1.05 }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::TableRow;
    use tempfile::tempdir;

    fn row(name: &str, stars: Option<u64>, days: Option<f64>) -> TableRow {
        TableRow {
            server_name: name.into(),
            server_version: "1".into(),
            github_url: Some(format!("https://github.com/acme/{}", name)),
            stars,
            days_since_commit: days,
            last_commit_date: None,
        }
    }

    #[test]
    fn test_render_scatter_writes_svg() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plot.svg");
        let table = ResultTable::from_rows(vec![
            row("a", Some(100), Some(10.0)),
            row("b", Some(0), Some(400.0)),
            row("c", None, None),
        ]);

        let drawn = render_scatter(&table, &path, false).unwrap();

        assert_eq!(drawn, 2);
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("<circle"));
    }

    #[test]
    fn test_render_scatter_log_scale() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("plot-log.svg");
        let table = ResultTable::from_rows(vec![row("a", Some(9999), Some(1.0))]);

        assert_eq!(render_scatter(&table, &path, true).unwrap(), 1);
    }

    #[test]
    fn test_render_scatter_without_points_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nothing.svg");
        let table = ResultTable::from_rows(vec![row("a", None, None)]);

        assert!(render_scatter(&table, &path, false).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_scale_and_bounds() {
        assert_eq!(scale_stars(9, true), 1.0);
        assert_eq!(scale_stars(9, false), 9.0);
        assert_eq!(upper_bound([0.0, 0.0].into_iter()), 1.0);
        assert!((upper_bound([10.0, 2.0].into_iter()) - 10.5).abs() < 1e-9);
    }

    #[test]
    fn test_render_enhanced_writes_four_panels() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("enhanced.svg");
        let table = ResultTable::from_rows(vec![
            row("a", Some(100), Some(10.0)),
            row("b", Some(0), Some(400.0)),
            row("c", Some(2500), Some(3.5)),
            row("d", None, None),
        ]);

        let drawn = render_enhanced(&table, &path).unwrap();

        assert_eq!(drawn, 3);
        let svg = std::fs::read_to_string(&path).unwrap();
        assert!(svg.contains("<svg"));
        assert!(svg.contains("Linear Scale"));
        assert!(svg.contains("Log Scale"));
        assert!(svg.contains("Star Distribution"));
        assert!(svg.contains("Activity Distribution"));
        // Two scatter panels, one circle per row in each.
        assert_eq!(svg.matches("<circle").count(), 6);
    }

    #[test]
    fn test_render_enhanced_without_points_fails() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("nothing.svg");
        let table = ResultTable::from_rows(vec![row("a", None, None)]);

        assert!(render_enhanced(&table, &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_bins_cover_the_whole_range() {
        let bins = Bins::of(&[0.0, 50.0, 100.0]);
        assert_eq!(bins.counts.len(), BINS as usize);
        assert_eq!(bins.counts[0], 1);
        assert_eq!(bins.counts[25], 1);
        assert_eq!(bins.counts[BINS as usize - 1], 1);
        assert_eq!(bins.counts.iter().sum::<u32>(), 3);
        assert_eq!(bins.lower_edge(25), 50.0);
    }

    #[test]
    fn test_bins_of_a_single_value() {
        let bins = Bins::of(&[7.0, 7.0]);
        assert_eq!(bins.counts[0], 2);
        assert_eq!(bins.width, 1.0);
    }
}
