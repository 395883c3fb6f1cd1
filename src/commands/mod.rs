//! Command implementations behind the CLI.

mod analyze;
mod console;
mod refetch;
mod services;
mod visualize;

pub use analyze::{AnalyzeOptions, analyze};
pub use refetch::{RefetchOptions, refetch};
pub use services::Services;
pub use visualize::{VisualizeOptions, visualize};
