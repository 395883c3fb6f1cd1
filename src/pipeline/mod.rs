//! Collection pipeline: joins registry entries with repository stats.
//!
//! Stats lookups run on the calling task, multiplexed through a
//! [`FuturesUnordered`], and each lookup holds a semaphore permit for exactly
//! as long as its request is outstanding. Results are written back into the
//! slot of the entry that asked for them, so output order is input order no
//! matter which request finishes first.

mod refetch;

use std::num::NonZeroUsize;

use futures_util::stream::{FuturesUnordered, StreamExt};
use log::{info, warn};
use tokio::sync::Semaphore;

use crate::github::{RepoReference, RepoStats, StatsOutcome, StatsSource, resolve_reference};
use crate::progress::{Progress, ProgressCallback, emit};
use crate::registry::RegistryEntry;

pub use refetch::Refetched;

/// One registry entry joined with whatever was learned about its repository.
///
/// A record without a reference never carries an outcome.
#[derive(Debug, Clone, PartialEq)]
pub struct CollectedRecord {
    entry: RegistryEntry,
    reference: Option<RepoReference>,
    outcome: Option<StatsOutcome>,
}

impl CollectedRecord {
    /// An entry with no usable repository link. Nothing was fetched.
    pub fn unresolved(entry: RegistryEntry) -> Self {
        Self {
            entry,
            reference: None,
            outcome: None,
        }
    }

    /// An entry whose repository was looked up.
    pub fn fetched(entry: RegistryEntry, reference: RepoReference, outcome: StatsOutcome) -> Self {
        Self {
            entry,
            reference: Some(reference),
            outcome: Some(outcome),
        }
    }

    pub fn entry(&self) -> &RegistryEntry {
        &self.entry
    }

    pub fn reference(&self) -> Option<&RepoReference> {
        self.reference.as_ref()
    }

    pub fn outcome(&self) -> Option<&StatsOutcome> {
        self.outcome.as_ref()
    }

    pub fn stats(&self) -> Option<&RepoStats> {
        self.outcome.as_ref().and_then(StatsOutcome::stats)
    }
}

/// How the lookups of a run turned out.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct OutcomeTally {
    pub found: usize,
    pub not_found: usize,
    pub forbidden: usize,
    pub empty: usize,
    pub transient: usize,
}

impl OutcomeTally {
    pub fn from_outcomes<'a>(outcomes: impl IntoIterator<Item = &'a StatsOutcome>) -> Self {
        let mut tally = Self::default();
        for outcome in outcomes {
            tally.record(outcome);
        }
        tally
    }

    pub fn from_records(records: &[CollectedRecord]) -> Self {
        Self::from_outcomes(records.iter().filter_map(CollectedRecord::outcome))
    }

    fn record(&mut self, outcome: &StatsOutcome) {
        match outcome {
            StatsOutcome::Found(_) => self.found += 1,
            StatsOutcome::NotFound => self.not_found += 1,
            StatsOutcome::Forbidden => self.forbidden += 1,
            StatsOutcome::Empty => self.empty += 1,
            StatsOutcome::TransientError(_) => self.transient += 1,
        }
    }

    pub fn attempted(&self) -> usize {
        self.found + self.not_found + self.forbidden + self.empty + self.transient
    }

    /// Logs the advisory for rate limiting. The pipeline never throttles itself.
    pub fn warn_if_throttled(&self) {
        if self.forbidden > 0 {
            warn!(
                "{} of {} repository lookups were forbidden (likely rate limited); \
                 supply a GitHub token or lower --max-concurrent, then run refetch",
                self.forbidden,
                self.attempted()
            );
        }
    }
}

/// Fans stats lookups out over a [`StatsSource`] with at most
/// `max_concurrent` requests in flight.
pub struct Collector<'a, S: StatsSource + ?Sized> {
    source: &'a S,
    max_concurrent: NonZeroUsize,
    on_progress: Option<&'a ProgressCallback>,
}

impl<'a, S: StatsSource + ?Sized> Collector<'a, S> {
    pub fn new(source: &'a S, max_concurrent: NonZeroUsize) -> Self {
        Self {
            source,
            max_concurrent,
            on_progress: None,
        }
    }

    pub fn with_progress(mut self, on_progress: Option<&'a ProgressCallback>) -> Self {
        self.on_progress = on_progress;
        self
    }

    /// Joins every entry with its repository stats, in input order.
    ///
    /// Entries without a GitHub link are passed through without touching the
    /// network. Failed lookups become records without stats.
    #[tracing::instrument(skip(self, entries), fields(entries = entries.len()))]
    pub async fn collect(&self, entries: Vec<RegistryEntry>) -> Vec<CollectedRecord> {
        let references: Vec<Option<RepoReference>> = entries
            .iter()
            .map(|e| e.repository_url().and_then(resolve_reference))
            .collect();

        let jobs: Vec<RepoReference> = references.iter().flatten().cloned().collect();
        info!(
            "{} of {} entries link to a GitHub repository",
            jobs.len(),
            entries.len()
        );

        let mut outcomes = self.fetch_bounded(&jobs).await.into_iter();

        entries
            .into_iter()
            .zip(references)
            .map(|(entry, reference)| match reference {
                None => CollectedRecord::unresolved(entry),
                Some(reference) => {
                    let outcome = outcomes.next().unwrap_or_else(|| {
                        StatsOutcome::TransientError("lookup result missing".to_string())
                    });
                    CollectedRecord::fetched(entry, reference, outcome)
                }
            })
            .collect()
    }

    /// Looks up every reference and returns the outcomes positionally.
    pub(crate) async fn fetch_bounded(&self, jobs: &[RepoReference]) -> Vec<StatsOutcome> {
        let total = jobs.len();
        if total == 0 {
            return Vec::new();
        }

        let concurrency = self.max_concurrent.get();
        emit(
            self.on_progress,
            Progress::FetchingStats { total, concurrency },
        );

        let semaphore = Semaphore::new(concurrency);
        let source = self.source;

        let mut pending: FuturesUnordered<_> = jobs
            .iter()
            .enumerate()
            .map(|(index, reference)| {
                let semaphore = &semaphore;
                async move {
                    let outcome = match semaphore.acquire().await {
                        Ok(permit) => {
                            let outcome = source.fetch_stats(reference).await;
                            drop(permit);
                            outcome
                        }
                        Err(_) => {
                            StatsOutcome::TransientError("Semaphore closed unexpectedly".to_string())
                        }
                    };
                    (index, outcome)
                }
            })
            .collect();

        let mut slots: Vec<Option<StatsOutcome>> = (0..total).map(|_| None).collect();
        let mut completed = 0;
        let mut resolved = 0;

        while let Some((index, outcome)) = pending.next().await {
            completed += 1;
            if outcome.is_found() {
                resolved += 1;
            }
            slots[index] = Some(outcome);
            emit(
                self.on_progress,
                Progress::StatsFetched { completed, total },
            );
        }

        emit(
            self.on_progress,
            Progress::StatsComplete { resolved, total },
        );
        info!("Resolved stats for {}/{} repositories", resolved, total);

        slots
            .into_iter()
            .map(|slot| {
                slot.unwrap_or_else(|| {
                    StatsOutcome::TransientError("lookup did not complete".to_string())
                })
            })
            .collect()
    }
}
