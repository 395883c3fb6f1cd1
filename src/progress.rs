//! Progress events emitted while collecting.
//!
//! Reporting is a side channel: nothing in the data path depends on whether a
//! callback is installed.

/// Progress events emitted during registry ingestion and stats collection.
#[derive(Debug, Clone, PartialEq, Eq)]
#[non_exhaustive]
pub enum Progress {
    /// Fetched one page of the registry.
    RegistryPage {
        /// Page number (1-indexed).
        page: usize,
        /// Entries on this page.
        count: usize,
        /// Running total of entries fetched so far.
        total_so_far: usize,
    },

    /// The registry has no further pages.
    RegistryComplete { total: usize },

    /// Starting stats fetches for the entries that have a repository.
    FetchingStats { total: usize, concurrency: usize },

    /// One stats fetch finished, regardless of its outcome.
    StatsFetched { completed: usize, total: usize },

    /// All stats fetches finished.
    StatsComplete { resolved: usize, total: usize },
}

/// Callback type for progress reporting.
pub type ProgressCallback = Box<dyn Fn(Progress) + Send + Sync>;

/// Emit a progress event if a callback is provided.
pub fn emit(on_progress: Option<&ProgressCallback>, event: Progress) {
    if let Some(cb) = on_progress {
        cb(event);
    }
}
