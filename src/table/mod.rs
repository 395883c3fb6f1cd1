//! The tabular dataset: one row per registry entry.

mod store;

use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::github::{RepoReference, RepoStats, resolve_reference};
use crate::pipeline::CollectedRecord;

pub use store::{COLUMNS, load, save};

/// One persisted row. Empty stats cells mean "not known", never zero.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TableRow {
    pub server_name: String,
    pub server_version: String,
    pub github_url: Option<String>,
    pub stars: Option<u64>,
    pub days_since_commit: Option<f64>,
    pub last_commit_date: Option<DateTime<Utc>>,
}

impl TableRow {
    pub fn from_record(record: &CollectedRecord, now: DateTime<Utc>) -> Self {
        let entry = record.entry();
        let mut row = Self {
            server_name: entry.name().to_string(),
            server_version: entry.version().to_string(),
            github_url: record
                .reference()
                .and(entry.repository_url())
                .map(str::to_string),
            stars: None,
            days_since_commit: None,
            last_commit_date: None,
        };
        row.set_stats(record.stats(), now);
        row
    }

    /// The repository this row points at, if its link resolves.
    pub fn reference(&self) -> Option<RepoReference> {
        self.github_url.as_deref().and_then(resolve_reference)
    }

    pub fn has_stats(&self) -> bool {
        self.stars.is_some() && self.days_since_commit.is_some()
    }

    /// Replaces all three stats cells at once so they never disagree.
    pub(crate) fn set_stats(&mut self, stats: Option<&RepoStats>, now: DateTime<Utc>) {
        self.stars = stats.map(|s| s.stars);
        self.days_since_commit = stats.map(|s| s.days_since_commit(now));
        self.last_commit_date = stats.map(|s| s.last_commit);
    }
}

/// Ordered rows of a run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResultTable {
    rows: Vec<TableRow>,
}

/// Builds the table for a collection run, preserving pipeline order.
pub fn build_table(records: &[CollectedRecord], now: DateTime<Utc>) -> ResultTable {
    ResultTable::from_rows(
        records
            .iter()
            .map(|r| TableRow::from_record(r, now))
            .collect(),
    )
}

impl ResultTable {
    pub fn from_rows(rows: Vec<TableRow>) -> Self {
        Self { rows }
    }

    pub fn rows(&self) -> &[TableRow] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Drops rows without a repository. Rows with a repository but no stats stay.
    pub fn filter_valid(&self) -> ResultTable {
        ResultTable::from_rows(
            self.rows
                .iter()
                .filter(|r| r.github_url.as_deref().is_some_and(|u| !u.is_empty()))
                .cloned()
                .collect(),
        )
    }

    /// Rows to look up again, with their position in the table.
    pub fn refetch_candidates(&self, force: bool) -> Vec<(usize, RepoReference)> {
        self.rows
            .iter()
            .enumerate()
            .filter(|(_, row)| force || !row.has_stats())
            .filter_map(|(index, row)| row.reference().map(|r| (index, r)))
            .collect()
    }

    /// `(days_since_commit, stars)` for every row with stats.
    pub fn plottable(&self) -> impl Iterator<Item = (f64, u64)> + '_ {
        self.rows
            .iter()
            .filter_map(|r| Some((r.days_since_commit?, r.stars?)))
    }

    pub fn summary(&self) -> TableSummary {
        let mut stars: Vec<u64> = self.plottable().map(|(_, s)| s).collect();
        let days: Vec<f64> = self.plottable().map(|(d, _)| d).collect();
        stars.sort_unstable();

        TableSummary {
            total: self.rows.len(),
            with_reference: self.rows.iter().filter(|r| r.github_url.is_some()).count(),
            with_stats: stars.len(),
            mean_stars: mean(stars.iter().map(|&s| s as f64)),
            median_stars: median(&stars),
            mean_days_since_commit: mean(days.iter().copied()),
        }
    }
}

/// Read-only statistics over a table.
#[derive(Debug, Clone, PartialEq)]
pub struct TableSummary {
    pub total: usize,
    pub with_reference: usize,
    pub with_stats: usize,
    pub mean_stars: Option<f64>,
    pub median_stars: Option<f64>,
    pub mean_days_since_commit: Option<f64>,
}

impl TableSummary {
    /// Some rows with a repository ended up without stats.
    pub fn is_partial(&self) -> bool {
        self.with_stats < self.with_reference
    }
}

impl fmt::Display for TableSummary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "  Total servers:            {}", self.total)?;
        writeln!(f, "  With a GitHub repository: {}", self.with_reference)?;
        write!(
            f,
            "  With GitHub stats:        {}/{} resolved",
            self.with_stats, self.with_reference
        )?;
        if let (Some(mean), Some(median), Some(days)) = (
            self.mean_stars,
            self.median_stars,
            self.mean_days_since_commit,
        ) {
            write!(
                f,
                "\n  Mean stars: {:.0}, median stars: {:.0}, mean days since commit: {:.1}",
                mean, median, days
            )?;
        }
        Ok(())
    }
}

fn mean(values: impl Iterator<Item = f64>) -> Option<f64> {
    let (sum, count) = values.fold((0.0, 0usize), |(sum, count), v| (sum + v, count + 1));
    (count > 0).then(|| sum / count as f64)
}

fn median(sorted: &[u64]) -> Option<f64> {
    let n = sorted.len();
    match n {
        0 => None,
        _ if n % 2 == 1 => Some(sorted[n / 2] as f64),
        _ => Some((sorted[n / 2 - 1] as f64 + sorted[n / 2] as f64) / 2.0),
    }
}
