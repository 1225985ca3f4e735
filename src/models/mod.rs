mod answer;
mod config;
mod document;

pub use answer::{Answer, OutputFormat};
pub use config::{
    Config, DEFAULT_EMBEDDING_MODEL, DEFAULT_LLM_MODEL, DEFAULT_OLLAMA_URL, IndexingConfig,
    OllamaConfig, QueryConfig,
};
pub use document::{Document, DocumentChunk};
