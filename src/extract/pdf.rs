//! PDF file extractor.

use std::path::Path;

use crate::error::ExtractionError;
use crate::models::Document;

/// Extract one document per page.
///
/// Text extraction is CPU-bound, so it runs on the blocking pool. Blank
/// pages produce empty documents which the chunker later drops.
pub async fn extract_pdf(path: &Path) -> Result<Vec<Document>, ExtractionError> {
    let source = path.to_string_lossy().to_string();
    let path_buf = path.to_path_buf();

    let pages = tokio::task::spawn_blocking(move || {
        pdf_extract::extract_text_by_pages(&path_buf).map_err(|e| ExtractionError::Pdf(e.to_string()))
    })
    .await
    .map_err(|e| ExtractionError::TaskJoin(e.to_string()))??;

    Ok(pages
        .into_iter()
        .map(|page| Document::new(page, source.clone()))
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_file_is_an_error() {
        let result = extract_pdf(Path::new("/nonexistent/missing.pdf")).await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_garbage_bytes_are_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("fake.pdf");
        std::fs::write(&path, b"not a pdf at all").unwrap();

        let result = extract_pdf(&path).await;
        assert!(result.is_err());
    }
}
