//! Persisted brute-force vector index.
//!
//! The index lives next to the documents it covers, in a `faiss_index/`
//! directory holding two JSON files: `index.json` with the embedding
//! dimension and vectors, and `docstore.json` with the chunk texts and
//! provenance. Loading a persisted index never re-embeds anything.

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::IndexError;
use crate::extract::load_documents;
use crate::models::{Config, DocumentChunk};
use crate::services::chunker::TextChunker;
use crate::services::provider::EmbeddingProvider;

/// Directory created under the document directory.
pub const INDEX_DIR_NAME: &str = "faiss_index";

const VECTORS_FILE: &str = "index.json";
const DOCSTORE_FILE: &str = "docstore.json";

/// On-disk form of the vectors file.
#[derive(Debug, Serialize, Deserialize)]
struct VectorsFile {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
}

/// A retrieved chunk with its similarity score.
#[derive(Debug, Clone)]
pub struct ScoredChunk {
    pub chunk: DocumentChunk,
    pub score: f32,
}

/// In-memory vector index over document chunks.
#[derive(Debug)]
pub struct VectorIndex {
    dimension: usize,
    vectors: Vec<Vec<f32>>,
    chunks: Vec<DocumentChunk>,
}

impl VectorIndex {
    /// Path of the index directory for a document directory.
    pub fn index_path(dir: &Path) -> PathBuf {
        dir.join(INDEX_DIR_NAME)
    }

    /// Whether a complete persisted index exists for `dir`.
    pub fn exists(dir: &Path) -> bool {
        let index_dir = Self::index_path(dir);
        index_dir.join(VECTORS_FILE).is_file() && index_dir.join(DOCSTORE_FILE).is_file()
    }

    /// Embed all chunks and build a fresh index.
    pub async fn build(
        chunks: Vec<DocumentChunk>,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Self, IndexError> {
        if chunks.is_empty() {
            return Err(IndexError::NoDocuments);
        }

        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = embedder.embed_batch(&texts).await?;

        let dimension = vectors.first().map(Vec::len).unwrap_or(0);
        if dimension == 0 || vectors.iter().any(|v| v.len() != dimension) {
            return Err(IndexError::Corrupt(
                "inconsistent embedding dimension".to_string(),
            ));
        }

        info!(chunks = chunks.len(), dimension, "built vector index");
        Ok(Self {
            dimension,
            vectors,
            chunks,
        })
    }

    /// Persist the index under `dir`.
    pub fn save(&self, dir: &Path) -> Result<(), IndexError> {
        let index_dir = Self::index_path(dir);
        std::fs::create_dir_all(&index_dir)?;

        let vectors = VectorsFile {
            dimension: self.dimension,
            vectors: self.vectors.clone(),
        };
        std::fs::write(
            index_dir.join(VECTORS_FILE),
            serde_json::to_string(&vectors)?,
        )?;
        std::fs::write(
            index_dir.join(DOCSTORE_FILE),
            serde_json::to_string(&self.chunks)?,
        )?;

        debug!(path = %index_dir.display(), "saved vector index");
        Ok(())
    }

    /// Load a persisted index from `dir`.
    pub fn load(dir: &Path) -> Result<Self, IndexError> {
        let index_dir = Self::index_path(dir);

        let vectors: VectorsFile =
            serde_json::from_str(&std::fs::read_to_string(index_dir.join(VECTORS_FILE))?)?;
        let chunks: Vec<DocumentChunk> =
            serde_json::from_str(&std::fs::read_to_string(index_dir.join(DOCSTORE_FILE))?)?;

        if vectors.vectors.len() != chunks.len() {
            return Err(IndexError::Corrupt(format!(
                "{} vectors but {} chunks",
                vectors.vectors.len(),
                chunks.len()
            )));
        }
        if vectors.vectors.iter().any(|v| v.len() != vectors.dimension) {
            return Err(IndexError::Corrupt(
                "vector dimension mismatch".to_string(),
            ));
        }

        debug!(chunks = chunks.len(), "loaded vector index");
        Ok(Self {
            dimension: vectors.dimension,
            vectors: vectors.vectors,
            chunks,
        })
    }

    /// Load the index for `dir` if a valid one is persisted there.
    ///
    /// A missing or corrupt index is logged and reported as absent; callers
    /// decide whether to rebuild.
    pub fn open(dir: &Path) -> Option<Self> {
        if !Self::exists(dir) {
            return None;
        }
        match Self::load(dir) {
            Ok(index) => Some(index),
            Err(e) => {
                warn!(path = %Self::index_path(dir).display(), error = %e, "failed to load index");
                None
            }
        }
    }

    /// Load the persisted index for `dir`, or extract, chunk, embed, and
    /// persist a fresh one.
    pub async fn build_or_load(
        dir: &Path,
        config: &Config,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Self, IndexError> {
        if let Some(index) = Self::open(dir) {
            return Ok(index);
        }

        let documents = load_documents(dir, &config.indexing).await;
        let chunks = TextChunker::new(&config.indexing).chunk_all(&documents);
        let index = Self::build(chunks, embedder).await?;
        index.save(dir)?;
        Ok(index)
    }

    /// Retrieve the `k` chunks most similar to the query.
    pub async fn search(
        &self,
        query: &str,
        k: usize,
        embedder: &dyn EmbeddingProvider,
    ) -> Result<Vec<ScoredChunk>, IndexError> {
        let query_vector = embedder.embed(query).await?;
        if query_vector.len() != self.dimension {
            return Err(IndexError::Corrupt(format!(
                "query embedding dimension {} does not match index dimension {}",
                query_vector.len(),
                self.dimension
            )));
        }

        let mut scored: Vec<ScoredChunk> = self
            .vectors
            .iter()
            .zip(&self.chunks)
            .map(|(vector, chunk)| ScoredChunk {
                chunk: chunk.clone(),
                score: cosine_similarity(&query_vector, vector),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
        });
        scored.truncate(k);
        Ok(scored)
    }

    /// All indexed chunks, in insertion order.
    pub fn records(&self) -> &[DocumentChunk] {
        &self.chunks
    }

    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    pub fn dimension(&self) -> usize {
        self.dimension
    }
}

/// Cosine similarity between two vectors; zero when either has zero norm.
fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();

    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::EmbeddingError;
    use crate::models::Document;
    use async_trait::async_trait;
    use std::sync::atomic::{AtomicU32, Ordering};

    /// Deterministic embedder counting letter frequencies; tracks call count
    /// so tests can assert nothing is re-embedded.
    struct StubEmbedder {
        calls: AtomicU32,
    }

    impl StubEmbedder {
        fn new() -> Self {
            Self {
                calls: AtomicU32::new(0),
            }
        }

        fn calls(&self) -> u32 {
            self.calls.load(Ordering::SeqCst)
        }
    }

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let count = |c: char| text.chars().filter(|&x| x == c).count() as f32;
            Ok(vec![count('a'), count('b'), count('c')])
        }
    }

    fn chunk(content: &str) -> DocumentChunk {
        let doc = Document::new(content, "/test.txt");
        DocumentChunk::from_document(&doc, content.to_string(), 0)
    }

    #[tokio::test]
    async fn test_empty_build_is_rejected() {
        let embedder = StubEmbedder::new();
        let result = VectorIndex::build(Vec::new(), &embedder).await;
        assert!(matches!(result, Err(IndexError::NoDocuments)));
    }

    #[tokio::test]
    async fn test_search_ranks_most_similar_first() {
        let embedder = StubEmbedder::new();
        let chunks = vec![chunk("aaaa"), chunk("bbbb"), chunk("cccc")];
        let index = VectorIndex::build(chunks, &embedder).await.unwrap();

        let results = index.search("bb", 2, &embedder).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].chunk.content, "bbbb");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_search_rejects_mismatched_query_dimension() {
        struct WideEmbedder;

        #[async_trait]
        impl EmbeddingProvider for WideEmbedder {
            async fn embed(&self, _text: &str) -> Result<Vec<f32>, EmbeddingError> {
                Ok(vec![1.0; 5])
            }
        }

        let embedder = StubEmbedder::new();
        let index = VectorIndex::build(vec![chunk("aaaa"), chunk("bbbb")], &embedder)
            .await
            .unwrap();

        let result = index.search("bb", 1, &WideEmbedder).await;
        assert!(matches!(result, Err(IndexError::Corrupt(_))));
    }

    #[tokio::test]
    async fn test_save_and_load_round_trip_without_reembedding() {
        let dir = tempfile::tempdir().unwrap();
        let embedder = StubEmbedder::new();

        let chunks = vec![chunk("aaaa"), chunk("abab")];
        let index = VectorIndex::build(chunks, &embedder).await.unwrap();
        index.save(dir.path()).unwrap();
        let embed_calls_after_build = embedder.calls();

        assert!(VectorIndex::exists(dir.path()));
        let loaded = VectorIndex::load(dir.path()).unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded.dimension(), 3);
        assert_eq!(loaded.records()[1].content, "abab");

        // Loading and one query must cost exactly one embedding call.
        loaded.search("aa", 1, &embedder).await.unwrap();
        assert_eq!(embedder.calls(), embed_calls_after_build + 1);
    }

    #[tokio::test]
    async fn test_build_or_load_prefers_persisted_index() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("notes.txt"), "alpha beta").unwrap();
        let config = Config::default();
        let embedder = StubEmbedder::new();

        let first = VectorIndex::build_or_load(dir.path(), &config, &embedder)
            .await
            .unwrap();
        assert_eq!(first.len(), 1);
        let calls_after_build = embedder.calls();
        assert!(calls_after_build > 0);

        // Second call loads from disk and must not embed anything.
        let second = VectorIndex::build_or_load(dir.path(), &config, &embedder)
            .await
            .unwrap();
        assert_eq!(second.len(), first.len());
        assert_eq!(embedder.calls(), calls_after_build);
    }

    #[tokio::test]
    async fn test_corrupt_index_reported_absent() {
        let dir = tempfile::tempdir().unwrap();
        let index_dir = VectorIndex::index_path(dir.path());
        std::fs::create_dir_all(&index_dir).unwrap();
        std::fs::write(index_dir.join(VECTORS_FILE), "not json").unwrap();
        std::fs::write(index_dir.join(DOCSTORE_FILE), "[]").unwrap();

        assert!(VectorIndex::exists(dir.path()));
        assert!(VectorIndex::load(dir.path()).is_err());
        assert!(VectorIndex::open(dir.path()).is_none());
    }

    #[tokio::test]
    async fn test_missing_docstore_means_absent() {
        let dir = tempfile::tempdir().unwrap();
        let index_dir = VectorIndex::index_path(dir.path());
        std::fs::create_dir_all(&index_dir).unwrap();
        std::fs::write(
            index_dir.join(VECTORS_FILE),
            r#"{"dimension":3,"vectors":[]}"#,
        )
        .unwrap();

        assert!(!VectorIndex::exists(dir.path()));
        assert!(VectorIndex::open(dir.path()).is_none());
    }

    #[test]
    fn test_cosine_similarity_zero_norm() {
        assert_eq!(cosine_similarity(&[0.0, 0.0], &[1.0, 2.0]), 0.0);
        let s = cosine_similarity(&[1.0, 0.0], &[1.0, 0.0]);
        assert!((s - 1.0).abs() < 1e-6);
    }
}
