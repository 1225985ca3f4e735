//! Format extractors and the directory ingestion sweep.
//!
//! Each extractor turns one source file into zero or more [`Document`]s with
//! provenance metadata. Failures are contained per file: the sweep logs the
//! error and the file contributes nothing, without aborting its siblings.

pub mod csv;
pub mod pdf;
pub mod ppt;
pub mod pptx;
pub mod text;

use std::ffi::OsStr;
use std::path::{Path, PathBuf};
use std::time::Duration;

use tracing::{error, info};

use crate::models::{Document, IndexingConfig};

/// Extensions recognized by the sweep, in processing order.
///
/// Matching is case-sensitive: `report.CSV` is not picked up.
const SUPPORTED_EXTENSIONS: [&str; 5] = ["pdf", "txt", "csv", "pptx", "ppt"];

/// Load all extractable documents from a directory.
///
/// Scans the top level of `dir` for supported file types and runs the
/// matching extractor per file. A missing directory or a failing file is
/// logged and contributes zero documents; this function never fails.
pub async fn load_documents(dir: &Path, config: &IndexingConfig) -> Vec<Document> {
    if !dir.is_dir() {
        error!(path = %dir.display(), "directory not found");
        return Vec::new();
    }

    let conversion_timeout = Duration::from_secs(config.conversion_timeout_secs);
    let mut documents = Vec::new();

    for ext in SUPPORTED_EXTENSIONS {
        for path in files_with_extension(dir, ext) {
            let result = match ext {
                "pdf" => pdf::extract_pdf(&path).await,
                "txt" => text::extract_text(&path, config.max_file_size),
                "csv" => csv::extract_csv(&path),
                "pptx" => pptx::extract_pptx(&path),
                "ppt" => ppt::extract_ppt(&path, conversion_timeout).await,
                _ => unreachable!("unsupported extension: {ext}"),
            };

            match result {
                Ok(docs) => documents.extend(docs),
                Err(e) => {
                    error!(path = %path.display(), error = %e, "skipping file");
                }
            }
        }
    }

    info!(count = documents.len(), dir = %dir.display(), "loaded documents");
    documents
}

/// Collect top-level files with the given extension, sorted by name so the
/// sweep order is deterministic.
fn files_with_extension(dir: &Path, ext: &str) -> Vec<PathBuf> {
    let entries = match std::fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(e) => {
            error!(path = %dir.display(), error = %e, "failed to read directory");
            return Vec::new();
        }
    };

    let mut files: Vec<PathBuf> = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.is_file() && path.extension() == Some(OsStr::new(ext)))
        .collect();

    files.sort();
    files
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[tokio::test]
    async fn test_missing_directory_yields_nothing() {
        let config = IndexingConfig::default();
        let docs = load_documents(Path::new("/nonexistent/docqa-test"), &config).await;
        assert!(docs.is_empty());
    }

    #[tokio::test]
    async fn test_extension_matching_is_case_sensitive() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("upper.TXT"), "ignored").unwrap();
        fs::write(dir.path().join("lower.txt"), "picked up").unwrap();

        let config = IndexingConfig::default();
        let docs = load_documents(dir.path(), &config).await;
        assert_eq!(docs.len(), 1);
        assert!(docs[0].source_path.ends_with("lower.txt"));
    }

    #[tokio::test]
    async fn test_corrupt_file_does_not_abort_siblings() {
        let dir = tempfile::tempdir().unwrap();
        // Invalid UTF-8 makes the CSV reader fail for this file only.
        fs::write(dir.path().join("broken.csv"), [0xff, 0xfe, 0x00, 0xff]).unwrap();
        fs::write(dir.path().join("notes.txt"), "still indexed").unwrap();

        let config = IndexingConfig::default();
        let docs = load_documents(dir.path(), &config).await;
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "still indexed");
    }

    #[test]
    fn test_files_sorted_within_extension() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(dir.path().join("b.txt"), "b").unwrap();
        fs::write(dir.path().join("a.txt"), "a").unwrap();

        let files = files_with_extension(dir.path(), "txt");
        assert_eq!(files.len(), 2);
        assert!(files[0].ends_with("a.txt"));
        assert!(files[1].ends_with("b.txt"));
    }
}
