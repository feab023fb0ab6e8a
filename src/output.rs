//! Output files.
//!
//! Per-line JSON files double as resume markers: a file that exists and
//! decodes to a JSON array means the line is done.

use crate::error::Result;
use crate::record::WorkRecord;
use serde::Serialize;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};

/// `<dir>/<line>.json`
pub fn line_output_path(output_dir: &Path, line_number: usize) -> PathBuf {
    output_dir.join(format!("{}.json", line_number))
}

/// Number of records in an existing output file.
///
/// Returns `None` when the file is missing, unreadable, or does not decode to
/// a JSON array; such a line should be processed (again).
pub fn existing_record_count(path: &Path) -> Option<usize> {
    if !path.exists() {
        return None;
    }

    let content = match fs::read_to_string(path) {
        Ok(content) => content,
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Failed to read existing output");
            return None;
        }
    };

    match serde_json::from_str::<serde_json::Value>(&content) {
        Ok(serde_json::Value::Array(items)) => Some(items.len()),
        Ok(_) => {
            warn!(path = %path.display(), "Existing output is not an array, reprocessing");
            None
        }
        Err(e) => {
            warn!(path = %path.display(), error = %e, "Existing output corrupted, reprocessing");
            None
        }
    }
}

/// Write `value` as pretty JSON, replacing the file atomically.
///
/// The data goes to `<path>.tmp` first and is renamed into place, so readers
/// never observe a half-written file. Missing parent directories are created.
pub fn write_json_atomic<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<()> {
    let content = serde_json::to_string_pretty(value)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, content)?;
    fs::rename(&tmp, path)?;
    Ok(())
}

/// Save work records as a pretty-printed JSON array.
pub fn save_json(path: &Path, records: &[WorkRecord]) -> Result<()> {
    write_json_atomic(path, records)?;
    info!(path = %path.display(), count = records.len(), "Saved JSON");
    Ok(())
}

/// Save work records as CSV with a header row.
///
/// Nothing is written for an empty slice.
pub fn save_csv(path: &Path, records: &[WorkRecord]) -> Result<()> {
    if records.is_empty() {
        debug!(path = %path.display(), "No records, skipping CSV");
        return Ok(());
    }

    let mut wtr = csv::WriterBuilder::new()
        .has_headers(true)
        .from_path(path)?;

    for record in records {
        wtr.serialize(record)?;
    }

    wtr.flush()?;
    info!(path = %path.display(), count = records.len(), "Saved CSV");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::WORK_COLUMNS;
    use std::io::Write;
    use tempfile::tempdir;

    fn record(title: &str) -> WorkRecord {
        WorkRecord {
            title: title.to_string(),
            authors: "Ada Lovelace; Charles Babbage".to_string(),
            publication_year: 1843,
            ..Default::default()
        }
    }

    #[test]
    fn test_line_output_path() {
        assert_eq!(
            line_output_path(Path::new("out"), 7),
            PathBuf::from("out").join("7.json")
        );
    }

    #[test]
    fn test_existing_count_missing_file() {
        let dir = tempdir().unwrap();
        assert_eq!(existing_record_count(&dir.path().join("1.json")), None);
    }

    #[test]
    fn test_save_then_count() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("3.json");
        save_json(&path, &[record("a"), record("b")])?;
        assert_eq!(existing_record_count(&path), Some(2));
        assert!(!dir.path().join("3.json.tmp").exists());
        Ok(())
    }

    #[test]
    fn test_save_creates_missing_directories() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("output").join("nested").join("2.json");
        save_json(&path, &[record("a")])?;
        assert_eq!(existing_record_count(&path), Some(1));
        Ok(())
    }

    #[test]
    fn test_empty_array_is_valid() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("1.json");
        save_json(&path, &[])?;
        assert_eq!(existing_record_count(&path), Some(0));
        Ok(())
    }

    #[test]
    fn test_corrupted_or_non_array_is_invalid() -> Result<()> {
        let dir = tempdir()?;

        let truncated = dir.path().join("1.json");
        let mut f = fs::File::create(&truncated)?;
        f.write_all(b"[{\"title\": \"cut off")?;
        assert_eq!(existing_record_count(&truncated), None);

        let object = dir.path().join("2.json");
        fs::write(&object, "{\"title\": \"x\"}")?;
        assert_eq!(existing_record_count(&object), None);
        Ok(())
    }

    #[test]
    fn test_json_preserves_non_ascii() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("1.json");
        save_json(&path, &[record("Zürich – 東京")])?;
        let content = fs::read_to_string(&path)?;
        assert!(content.contains("Zürich – 東京"));
        assert!(content.contains("\n  "));
        Ok(())
    }

    #[test]
    fn test_csv_header_and_rows() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("works.csv");
        save_csv(&path, &[record("a"), record("b")])?;

        let mut rdr = csv::Reader::from_path(&path)?;
        let headers: Vec<String> = rdr.headers()?.iter().map(str::to_string).collect();
        assert_eq!(headers, WORK_COLUMNS);
        assert_eq!(rdr.records().count(), 2);
        Ok(())
    }

    #[test]
    fn test_csv_skips_empty() -> Result<()> {
        let dir = tempdir()?;
        let path = dir.path().join("works.csv");
        save_csv(&path, &[])?;
        assert!(!path.exists());
        Ok(())
    }
}
