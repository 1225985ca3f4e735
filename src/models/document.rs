use serde::{Deserialize, Serialize};

use crate::utils::calculate_checksum;

/// A normalized text unit extracted from one source file, or from one
/// slide/row/page within it. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    pub content: String,
    pub source_path: String,
    /// 1-based slide number, only for slide-deck-derived documents.
    pub slide_number: Option<u32>,
}

impl Document {
    pub fn new(content: impl Into<String>, source_path: impl Into<String>) -> Self {
        Self {
            content: content.into(),
            source_path: source_path.into(),
            slide_number: None,
        }
    }

    pub fn slide(
        content: impl Into<String>,
        source_path: impl Into<String>,
        slide_number: u32,
    ) -> Self {
        Self {
            content: content.into(),
            source_path: source_path.into(),
            slide_number: Some(slide_number),
        }
    }

    /// Stable identifier for this document, derived from provenance and content.
    pub fn checksum(&self) -> String {
        let input = format!(
            "{}:{}:{}",
            self.source_path,
            self.slide_number.unwrap_or(0),
            self.content
        );
        calculate_checksum(&input)
    }
}

/// A bounded-size slice of a [`Document`], carrying the parent's provenance
/// metadata unchanged. Never mutated after creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentChunk {
    pub id: String,
    pub content: String,
    pub chunk_index: u32,
    pub source_path: String,
    pub slide_number: Option<u32>,
    pub created_at: String,
}

impl DocumentChunk {
    /// Deterministic chunk id: uuid v5 over the parent checksum and chunk index.
    pub fn generate_id(document_checksum: &str, chunk_index: u32) -> String {
        use uuid::Uuid;
        let name = format!("{}:{}", document_checksum, chunk_index);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
    }

    pub fn from_document(document: &Document, content: String, chunk_index: u32) -> Self {
        let id = Self::generate_id(&document.checksum(), chunk_index);
        Self {
            id,
            content,
            chunk_index,
            source_path: document.source_path.clone(),
            slide_number: document.slide_number,
            created_at: chrono::Utc::now().to_rfc3339(),
        }
    }
}
