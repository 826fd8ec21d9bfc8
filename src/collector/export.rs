//! Replay of previously exported records.
//!
//! An export directory may hold, per record kind, a single `<kind>.json`
//! array and/or a `<kind>/` directory of per-item JSON files as written by
//! the per-item exporters. Both are read; array entries come first, then
//! per-item files in path order.

use super::normalize::normalize;
use crate::error::{CollectorError, CollectorResult};
use crate::models::{Record, RecordKind};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};
use walkdir::WalkDir;

/// Reader over one export directory.
#[derive(Debug, Clone)]
pub struct ExportReader {
    root: PathBuf,
}

impl ExportReader {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Read and normalize every exported record of `kind`.
    pub fn read(&self, kind: RecordKind) -> CollectorResult<Vec<Record>> {
        if !self.root.is_dir() {
            return Err(CollectorError::MissingExport(self.root.clone()));
        }

        let mut raw = Vec::new();

        let array_path = self.root.join(format!("{}.json", kind.export_stem()));
        if array_path.is_file() {
            match read_json(&array_path)? {
                Value::Array(items) => raw.extend(items),
                single => raw.push(single),
            }
        }

        let item_dir = self.root.join(kind.export_stem());
        if item_dir.is_dir() {
            for path in item_files(&item_dir)? {
                raw.push(read_json(&path)?);
            }
        }

        let mut records = Vec::with_capacity(raw.len());
        let mut skipped = 0usize;
        for value in &raw {
            match normalize(kind, value) {
                Ok(record) => records.push(record),
                Err(e) => {
                    skipped += 1;
                    debug!("Skipping {} entry: {}", kind, e);
                }
            }
        }
        if skipped > 0 {
            warn!(
                "Skipped {} malformed {} entries in {}",
                skipped,
                kind,
                self.root.display()
            );
        }

        debug!("Read {} {} from {}", records.len(), kind, self.root.display());
        Ok(records)
    }
}

/// Per-item JSON files under `dir`, sorted by path.
fn item_files(dir: &Path) -> CollectorResult<Vec<PathBuf>> {
    let mut files = Vec::new();
    for entry in WalkDir::new(dir).follow_links(false) {
        let entry = entry?;
        let path = entry.path();
        let hidden = entry.file_name().to_string_lossy().starts_with('.');
        if entry.file_type().is_file()
            && !hidden
            && path.extension().and_then(|e| e.to_str()) == Some("json")
        {
            files.push(path.to_path_buf());
        }
    }
    files.sort();
    Ok(files)
}

fn read_json(path: &Path) -> CollectorResult<Value> {
    let content = fs::read_to_string(path).map_err(|source| CollectorError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    serde_json::from_str(&content).map_err(|source| CollectorError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &Path, rel: &str, content: &str) {
        let path = dir.join(rel);
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).unwrap();
        }
        fs::write(path, content).unwrap();
    }

    #[test]
    fn test_reads_array_and_item_files() {
        let temp = TempDir::new().unwrap();
        write(
            temp.path(),
            "issues.json",
            r#"[{"number": 1, "created_at": "2024-03-01T00:00:00Z"},
                {"number": 2}]"#,
        );
        write(
            temp.path(),
            "issues/0003.json",
            r#"{"number": 3, "created_at": "2024-03-02T00:00:00Z", "state": "closed"}"#,
        );
        write(temp.path(), "issues/.hidden.json", "not json");
        write(temp.path(), "issues/notes.txt", "ignored");

        let reader = ExportReader::new(temp.path().to_path_buf());
        let records = reader.read(RecordKind::Issues).unwrap();

        // Entry without created_at is skipped
        assert_eq!(records.len(), 2);
        match &records[1] {
            Record::Issue(issue) => assert_eq!(issue.number, 3),
            other => panic!("unexpected record {:?}", other),
        }
    }

    #[test]
    fn test_missing_kind_is_empty() {
        let temp = TempDir::new().unwrap();
        let reader = ExportReader::new(temp.path().to_path_buf());
        assert!(reader.read(RecordKind::Releases).unwrap().is_empty());
    }

    #[test]
    fn test_missing_directory_is_error() {
        let reader = ExportReader::new(PathBuf::from("/definitely/not/here"));
        assert!(matches!(
            reader.read(RecordKind::Commits),
            Err(CollectorError::MissingExport(_))
        ));
    }

    #[test]
    fn test_unparseable_file_is_error() {
        let temp = TempDir::new().unwrap();
        write(temp.path(), "commits.json", "{ not json");
        let reader = ExportReader::new(temp.path().to_path_buf());
        assert!(matches!(
            reader.read(RecordKind::Commits),
            Err(CollectorError::Parse { .. })
        ));
    }
}
