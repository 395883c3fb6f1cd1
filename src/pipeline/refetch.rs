//! Incremental refetch over a previously collected table.

use chrono::{DateTime, Utc};
use log::info;

use crate::github::{RepoReference, StatsSource};
use crate::table::ResultTable;

use super::{Collector, OutcomeTally};

/// A refetched table plus what happened to get there.
#[derive(Debug, Clone, PartialEq)]
pub struct Refetched {
    pub table: ResultTable,
    /// Rows that were looked up again.
    pub attempted: usize,
    /// Looked-up rows that now carry stats.
    pub updated: usize,
    pub tally: OutcomeTally,
}

impl<S: StatsSource + ?Sized> Collector<'_, S> {
    /// Looks up stats again for the rows that lack them (or for every row
    /// with a repository when `force` is set).
    ///
    /// Candidate rows take on the new outcome, including a failed one; all
    /// other rows are copied unchanged. Against an unchanged stats source a
    /// second run yields the same table as the first.
    #[tracing::instrument(skip(self, table, now), fields(rows = table.len()))]
    pub async fn refetch(&self, table: &ResultTable, force: bool, now: DateTime<Utc>) -> Refetched {
        let candidates = table.refetch_candidates(force);
        info!(
            "Refetching {} of {} rows (force: {})",
            candidates.len(),
            table.len(),
            force
        );

        let jobs: Vec<RepoReference> = candidates.iter().map(|(_, r)| r.clone()).collect();
        let outcomes = self.fetch_bounded(&jobs).await;
        let tally = OutcomeTally::from_outcomes(&outcomes);

        let mut rows = table.rows().to_vec();
        for ((index, _), outcome) in candidates.iter().zip(&outcomes) {
            rows[*index].set_stats(outcome.stats(), now);
        }

        Refetched {
            table: ResultTable::from_rows(rows),
            attempted: candidates.len(),
            updated: tally.found,
            tally,
        }
    }
}
