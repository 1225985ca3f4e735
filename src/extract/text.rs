//! Plain-text file extractor.

use std::path::Path;

use crate::error::ExtractionError;
use crate::models::Document;
use crate::utils::read_file_content;

/// Extract one document holding the full file content.
///
/// Files with only whitespace yield zero documents.
pub fn extract_text(path: &Path, max_size: u64) -> Result<Vec<Document>, ExtractionError> {
    let content = read_file_content(path, max_size)?;

    if content.trim().is_empty() {
        return Ok(Vec::new());
    }

    Ok(vec![Document::new(content, path.to_string_lossy())])
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;

    #[test]
    fn test_whole_file_becomes_one_document() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("notes.txt");
        fs::write(&path, "line one\nline two\n").unwrap();

        let docs = extract_text(&path, 1024).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].content, "line one\nline two\n");
        assert_eq!(docs[0].slide_number, None);
    }

    #[test]
    fn test_whitespace_only_file_skipped() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("blank.txt");
        fs::write(&path, "  \n\t \n").unwrap();

        let docs = extract_text(&path, 1024).unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_oversized_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("big.txt");
        fs::write(&path, "0123456789").unwrap();

        assert!(extract_text(&path, 4).is_err());
    }
}
