//! Text chunking with overlap for embedding.

use crate::models::{Document, DocumentChunk, IndexingConfig};

/// Splits documents into overlapping chunks of roughly `chunk_size`
/// characters. Chunk boundaries prefer natural break points and every
/// character of the source document lands in at least one chunk.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Target chunk size in characters
    chunk_size: usize,
    /// Overlap size in characters
    overlap: usize,
}

impl TextChunker {
    /// Create a new text chunker with the given configuration.
    pub fn new(config: &IndexingConfig) -> Self {
        Self {
            chunk_size: config.chunk_size as usize,
            overlap: config.chunk_overlap as usize,
        }
    }

    /// Create a chunker with default settings.
    pub fn with_defaults() -> Self {
        Self::new(&IndexingConfig::default())
    }

    /// Chunk every document, numbering chunks per document.
    pub fn chunk_all(&self, documents: &[Document]) -> Vec<DocumentChunk> {
        documents.iter().flat_map(|doc| self.chunk(doc)).collect()
    }

    /// Chunk a document into overlapping segments.
    ///
    /// Each chunk inherits the document's source path and slide number.
    pub fn chunk(&self, document: &Document) -> Vec<DocumentChunk> {
        let content = &document.content;

        if content.trim().is_empty() {
            return Vec::new();
        }

        if content.chars().count() <= self.chunk_size {
            return vec![DocumentChunk::from_document(document, content.clone(), 0)];
        }

        self.split_with_overlap(content)
            .into_iter()
            .filter(|chunk| !chunk.trim().is_empty())
            .enumerate()
            .map(|(idx, chunk)| DocumentChunk::from_document(document, chunk, idx as u32))
            .collect()
    }

    /// Split content into overlapping pieces.
    ///
    /// The next piece starts `overlap` characters before the previous
    /// piece ended, so shortening a piece at a break point never skips
    /// content.
    fn split_with_overlap(&self, content: &str) -> Vec<String> {
        let chars: Vec<char> = content.chars().collect();
        let total = chars.len();
        let mut chunks = Vec::new();
        let mut start = 0;

        while start < total {
            let end = (start + self.chunk_size).min(total);
            let adjusted_end = self.find_break_point(&chars, end, total);

            chunks.push(chars[start..adjusted_end].iter().collect());

            if adjusted_end >= total {
                break;
            }

            let next = adjusted_end.saturating_sub(self.overlap);
            // Ensure forward progress even when overlap swallows the chunk.
            start = if next > start { next } else { adjusted_end };
        }

        chunks
    }

    /// Find a natural break point near the target end position.
    fn find_break_point(&self, chars: &[char], target_end: usize, total: usize) -> usize {
        if target_end >= total {
            return total;
        }

        // Look for a natural break point within the last 20% of the chunk
        let search_start = target_end.saturating_sub(self.chunk_size / 5);
        let search_range = &chars[search_start..target_end];

        // Priority: double newline > single newline > period+space > space
        let mut best_break = None;
        let mut last_newline = None;
        let mut last_sentence = None;
        let mut last_space = None;

        for (i, c) in search_range.iter().enumerate() {
            let pos = search_start + i;
            match c {
                '\n' => {
                    if i > 0 && search_range.get(i.saturating_sub(1)) == Some(&'\n') {
                        best_break = Some(pos + 1);
                    }
                    last_newline = Some(pos + 1);
                }
                '.' | '!' | '?' => {
                    if search_range.get(i + 1).is_some_and(|c| c.is_whitespace()) {
                        last_sentence = Some(pos + 1);
                    }
                }
                ' ' | '\t' => {
                    last_space = Some(pos + 1);
                }
                _ => {}
            }
        }

        best_break
            .or(last_newline)
            .or(last_sentence)
            .or(last_space)
            .unwrap_or(target_end)
    }
}
