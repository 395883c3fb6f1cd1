//! CSV persistence of a [`ResultTable`].

use std::path::Path;

use log::debug;

use crate::error::PipelineError;

use super::{ResultTable, TableRow};

/// Column order of the persisted table.
pub const COLUMNS: [&str; 6] = [
    "server_name",
    "server_version",
    "github_url",
    "stars",
    "days_since_commit",
    "last_commit_date",
];

/// Writes the table with a header row, even when it has no rows.
pub fn save(table: &ResultTable, path: &Path) -> Result<(), PipelineError> {
    let write_error = |reason: String| PipelineError::TableWrite {
        path: path.to_path_buf(),
        reason,
    };

    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_path(path)
        .map_err(|e| write_error(e.to_string()))?;

    writer
        .write_record(COLUMNS)
        .map_err(|e| write_error(e.to_string()))?;
    for row in table.rows() {
        writer
            .serialize(row)
            .map_err(|e| write_error(format!("row '{}': {}", row.server_name, e)))?;
    }
    writer.flush().map_err(|e| write_error(e.to_string()))?;

    debug!("Wrote {} rows to {}", table.len(), path.display());
    Ok(())
}

/// Reads a table written by [`save`]. The header must match [`COLUMNS`] exactly.
pub fn load(path: &Path) -> Result<ResultTable, PipelineError> {
    let read_error = |reason: String| PipelineError::TableRead {
        path: path.to_path_buf(),
        reason,
    };

    let mut reader = csv::Reader::from_path(path).map_err(|e| read_error(e.to_string()))?;

    let headers = reader
        .headers()
        .map_err(|e| read_error(e.to_string()))?
        .clone();
    let found: Vec<&str> = headers.iter().collect();
    if found != COLUMNS {
        return Err(read_error(format!(
            "expected columns {} but found {}",
            COLUMNS.join(","),
            found.join(",")
        )));
    }

    let mut rows = Vec::new();
    for (index, record) in reader.deserialize::<TableRow>().enumerate() {
        // Header is line 1.
        let row = record.map_err(|e| read_error(format!("line {}: {}", index + 2, e)))?;
        rows.push(row);
    }

    debug!("Loaded {} rows from {}", rows.len(), path.display());
    Ok(ResultTable::from_rows(rows))
}
