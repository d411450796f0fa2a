//! CSV sink for the normalized record table.
//!
//! The table is written to a temporary sibling of the target and renamed into
//! place, so a failed run never leaves a truncated file at `path`.

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info, instrument};

use crate::normalize::Record;

/// Column header, in output order.
pub const CSV_HEADER: [&str; 9] = [
    "PMID",
    "Title",
    "Abstract",
    "Authors",
    "Affiliation",
    "Year",
    "Keywords",
    "Journal",
    "DOI",
];

/// Errors produced while writing the output table.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Filesystem error creating, writing, or renaming the file.
    #[error("I/O error writing {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// CSV encoding error.
    #[error("CSV error writing {}: {source}", path.display())]
    Csv {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },
}

impl OutputError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    fn csv(path: &Path, source: csv::Error) -> Self {
        Self::Csv {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Writes `records` as CSV to `path`, header first, one row per record.
///
/// Parent directories are created as needed; an existing file is replaced.
///
/// # Errors
///
/// Returns [`OutputError`] if the directory, temporary file, or final rename
/// fails, or if a row cannot be encoded.
#[instrument(skip(path, records), fields(path = %path.display(), records = records.len()))]
pub fn write_csv(path: &Path, records: &[Record]) -> Result<(), OutputError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).map_err(|e| OutputError::io(parent, e))?;
    }

    let temp_path = temp_sibling(path);
    if let Err(err) = write_rows(&temp_path, records) {
        // Best-effort cleanup of the partial file.
        let _ = fs::remove_file(&temp_path);
        return Err(err);
    }
    debug!(temp = %temp_path.display(), "table written, moving into place");

    if let Err(err) = fs::rename(&temp_path, path) {
        let _ = fs::remove_file(&temp_path);
        return Err(OutputError::io(path, err));
    }
    info!("output table saved");
    Ok(())
}

fn write_rows(temp_path: &Path, records: &[Record]) -> Result<(), OutputError> {
    let file = fs::File::create(temp_path).map_err(|e| OutputError::io(temp_path, e))?;
    let mut writer = csv::WriterBuilder::new()
        .has_headers(false)
        .from_writer(BufWriter::new(file));

    writer
        .write_record(CSV_HEADER)
        .map_err(|e| OutputError::csv(temp_path, e))?;
    for record in records {
        writer
            .serialize(record.to_row())
            .map_err(|e| OutputError::csv(temp_path, e))?;
    }
    writer.flush().map_err(|e| OutputError::io(temp_path, e))
}

/// `dir/name.csv` → `dir/.name.csv.tmp`
fn temp_sibling(path: &Path) -> PathBuf {
    let name = path
        .file_name()
        .map_or_else(|| "output".into(), |n| n.to_string_lossy().into_owned());
    path.with_file_name(format!(".{name}.tmp"))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn sample() -> Record {
        Record {
            pmid: "31415926".into(),
            title: "Commas, \"quotes\" and\nnewlines".into(),
            abstract_text: "Background. Methods.".into(),
            authors: vec!["Jane Doe".into(), "John Roe".into()],
            affiliations: vec!["Dept A".into(), "Dept B".into()],
            year: "2021".into(),
            keywords: vec!["asthma".into()],
            journal: "Journal of Examples".into(),
            doi: "10.1/x".into(),
        }
    }

    fn read_back(path: &Path) -> (Vec<String>, Vec<Vec<String>>) {
        let mut reader = csv::Reader::from_path(path).unwrap();
        let header = reader.headers().unwrap().iter().map(str::to_string).collect();
        let rows = reader
            .records()
            .map(|r| r.unwrap().iter().map(str::to_string).collect())
            .collect();
        (header, rows)
    }

    #[test]
    fn test_write_csv_header_and_joined_row() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.csv");

        write_csv(&path, &[sample()]).unwrap();

        let (header, rows) = read_back(&path);
        assert_eq!(header, CSV_HEADER);
        assert_eq!(rows.len(), 1);
        assert_eq!(
            rows[0],
            vec![
                "31415926",
                "Commas, \"quotes\" and\nnewlines",
                "Background. Methods.",
                "Jane Doe, John Roe",
                "Dept A; Dept B",
                "2021",
                "asthma",
                "Journal of Examples",
                "10.1/x",
            ]
        );
    }

    #[test]
    fn test_write_csv_empty_table_has_header_only() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.csv");

        write_csv(&path, &[]).unwrap();

        let content = fs::read_to_string(&path).unwrap();
        assert_eq!(
            content,
            "PMID,Title,Abstract,Authors,Affiliation,Year,Keywords,Journal,DOI\n"
        );
    }

    #[test]
    fn test_write_csv_creates_parent_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("upload_data").join("nested").join("output.csv");

        write_csv(&path, &[Record::default()]).unwrap();

        let (_, rows) = read_back(&path);
        assert_eq!(rows, vec![vec![String::new(); 9]]);
    }

    #[test]
    fn test_write_csv_replaces_existing_file_and_leaves_no_temp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("output.csv");
        fs::write(&path, "stale").unwrap();

        write_csv(&path, &[sample()]).unwrap();

        let (_, rows) = read_back(&path);
        assert_eq!(rows.len(), 1);
        let leftovers: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(leftovers, vec![std::ffi::OsString::from("output.csv")]);
    }

    #[test]
    fn test_write_csv_parent_is_a_file_is_io_error() {
        let dir = TempDir::new().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "not a directory").unwrap();
        let path = blocker.join("output.csv");

        let err = write_csv(&path, &[]).unwrap_err();

        assert!(matches!(err, OutputError::Io { .. }));
        assert!(err.to_string().contains("blocker"));
    }

    #[test]
    fn test_temp_sibling_is_hidden_in_same_directory() {
        assert_eq!(
            temp_sibling(Path::new("upload_data/output.csv")),
            PathBuf::from("upload_data/.output.csv.tmp")
        );
    }
}
