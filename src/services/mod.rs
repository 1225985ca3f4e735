//! Core services: chunking, providers, the vector index, and question
//! answering.

pub mod chunker;
pub mod index;
pub mod ollama;
pub mod provider;
pub mod qa;

pub use chunker::TextChunker;
pub use index::{INDEX_DIR_NAME, ScoredChunk, VectorIndex};
pub use ollama::OllamaClient;
pub use provider::{EmbeddingProvider, LanguageModel};
pub use qa::{CHUNK_LISTING_ANSWER, FAILURE_ANSWER, RetrievalQa, citation, is_chunk_listing};
