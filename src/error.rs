//! Failures that abort a whole run.
//!
//! Per-repository problems never show up here: they are folded into
//! [`crate::github::StatsOutcome`] and end up as empty table cells.

use std::fmt;
use std::path::PathBuf;

#[derive(Debug)]
pub enum PipelineError {
    /// The registry could not be reached or answered with a failure status.
    RegistryUnavailable { page: usize, reason: String },
    /// A registry page did not have the expected shape.
    Schema { page: usize, reason: String },
    /// A setting was rejected before any work started.
    InvalidConfig(String),
    /// A persisted table could not be read or did not have the expected columns.
    TableRead { path: PathBuf, reason: String },
    /// A table could not be written.
    TableWrite { path: PathBuf, reason: String },
}

impl fmt::Display for PipelineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PipelineError::RegistryUnavailable { page, reason } => {
                write!(f, "Registry unavailable (page {}): {}", page, reason)
            }
            PipelineError::Schema { page, reason } => {
                write!(f, "Unexpected registry response (page {}): {}", page, reason)
            }
            PipelineError::InvalidConfig(msg) => write!(f, "Invalid configuration: {}", msg),
            PipelineError::TableRead { path, reason } => {
                write!(f, "Cannot read table {}: {}", path.display(), reason)
            }
            PipelineError::TableWrite { path, reason } => {
                write!(f, "Cannot write table {}: {}", path.display(), reason)
            }
        }
    }
}

impl std::error::Error for PipelineError {}
