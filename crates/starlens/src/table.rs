//! CSV persistence of repository records.
//!
//! The file is the only contract between the collector and the analyzer.

use std::fs::{self, File};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use csv::{ReaderBuilder, WriterBuilder};
use thiserror::Error;

use crate::record::RepositoryRecord;

/// Column order of the persisted table.
pub const HEADER: [&str; 10] = [
    "name",
    "owner",
    "stars",
    "createdAt",
    "updatedAt",
    "primaryLanguage",
    "pullRequests",
    "releases",
    "issues",
    "closedIssues",
];

/// Errors reading or writing the table.
#[derive(Debug, Error)]
pub enum TableError {
    #[error("{}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),
}

impl TableError {
    fn io(path: &Path, source: io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Write the whole table to `path`.
///
/// Rows go to a temporary file next to `path` which then replaces it, so a
/// reader never sees a half-written table.
pub fn write_records(path: &Path, records: &[RepositoryRecord]) -> Result<(), TableError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| TableError::io(parent, e))?;
    }

    let tmp = temp_path(path);
    let result = write_file(&tmp, records).and_then(|()| {
        fs::rename(&tmp, path).map_err(|e| TableError::io(path, e))
    });

    match result {
        Ok(()) => {
            tracing::debug!(path = %path.display(), rows = records.len(), "Wrote table");
            Ok(())
        }
        Err(e) => {
            let _ = fs::remove_file(&tmp);
            Err(e)
        }
    }
}

fn write_file(tmp: &Path, records: &[RepositoryRecord]) -> Result<(), TableError> {
    let file = File::create(tmp).map_err(|e| TableError::io(tmp, e))?;
    let file = write_to(file, records)?;
    file.sync_all().map_err(|e| TableError::io(tmp, e))
}

/// Serialize `records` (header first) into `writer` and hand it back.
pub fn write_to<W: Write>(writer: W, records: &[RepositoryRecord]) -> Result<W, TableError> {
    // The header is written by hand so an empty table still has one.
    let mut csv = WriterBuilder::new().has_headers(false).from_writer(writer);
    csv.write_record(HEADER)?;
    for record in records {
        csv.serialize(record)?;
    }
    csv.into_inner()
        .map_err(|e| TableError::Csv(csv::Error::from(e.into_error())))
}

/// Read the whole table from `path`.
pub fn read_records(path: &Path) -> Result<Vec<RepositoryRecord>, TableError> {
    let file = File::open(path).map_err(|e| TableError::io(path, e))?;
    let records = read_from(file)?;
    tracing::debug!(path = %path.display(), rows = records.len(), "Read table");
    Ok(records)
}

/// Deserialize every row of `reader`. Columns are matched by header name.
pub fn read_from<R: Read>(reader: R) -> Result<Vec<RepositoryRecord>, TableError> {
    let mut csv = ReaderBuilder::new().has_headers(true).from_reader(reader);
    csv.deserialize()
        .map(|row| row.map_err(TableError::from))
        .collect()
}

fn temp_path(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "table.csv".to_string());
    path.with_file_name(format!(".{name}.tmp"))
}
