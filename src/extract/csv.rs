//! Tabular (CSV) file extractor.

use std::path::Path;

use crate::error::ExtractionError;
use crate::models::Document;

/// Extract one document per data row.
///
/// The header row is consumed once and not repeated per row; each row is
/// serialized as its column values joined by single spaces. Rows that
/// serialize to whitespace are skipped.
pub fn extract_csv(path: &Path) -> Result<Vec<Document>, ExtractionError> {
    let mut reader = ::csv::ReaderBuilder::new()
        .flexible(true)
        .from_path(path)?;

    let source = path.to_string_lossy().to_string();
    let mut documents = Vec::new();

    for record in reader.records() {
        let record = record?;
        let content = record
            .iter()
            .map(str::trim)
            .filter(|field| !field.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        if !content.is_empty() {
            documents.push(Document::new(content, source.clone()));
        }
    }

    Ok(documents)
}
