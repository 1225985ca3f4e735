//! Provider traits for embeddings and text generation.
//!
//! The index and orchestrator depend on these traits instead of a concrete
//! client, so tests can substitute deterministic in-memory providers.

use async_trait::async_trait;

use crate::error::{EmbeddingError, GenerationError};

/// Turns text into a fixed-dimension vector.
#[async_trait]
pub trait EmbeddingProvider: Send + Sync {
    /// Embed a single text.
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError>;

    /// Embed a batch of texts, preserving order.
    async fn embed_batch(&self, texts: &[String]) -> Result<Vec<Vec<f32>>, EmbeddingError> {
        let mut embeddings = Vec::with_capacity(texts.len());
        for text in texts {
            embeddings.push(self.embed(text).await?);
        }
        Ok(embeddings)
    }
}

/// Produces a completion for a prompt.
#[async_trait]
pub trait LanguageModel: Send + Sync {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError>;
}
