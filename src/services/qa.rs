//! Retrieval question answering over a vector index.

use std::collections::BTreeSet;
use std::io::Write;

use tracing::warn;

use crate::models::{Answer, DocumentChunk};
use crate::services::index::VectorIndex;
use crate::services::provider::{EmbeddingProvider, LanguageModel};

/// Returned whenever retrieval or generation fails; the pipeline never
/// surfaces provider errors to the asker.
pub const FAILURE_ANSWER: &str = "Failed to get response. Please try another question.";

/// Returned for the chunk-listing diagnostic query.
pub const CHUNK_LISTING_ANSWER: &str = "Displayed all chunks in the console.";

const PROMPT_TEMPLATE: &str = "Use the following pieces of context to answer the question at the end. If you don't know the answer, just say that you don't know.\n\n{context}\n\nQuestion: {question}\nHelpful Answer:";

/// The literal query `chunk` (any case) lists the indexed chunks instead
/// of running retrieval.
pub fn is_chunk_listing(query: &str) -> bool {
    query.trim().eq_ignore_ascii_case("chunk")
}

/// Citation string for a chunk: the source path, with the slide number
/// when the chunk came from a slide deck.
pub fn citation(chunk: &DocumentChunk) -> String {
    match chunk.slide_number {
        Some(n) => format!("{} (Slide {})", chunk.source_path, n),
        None => chunk.source_path.clone(),
    }
}

/// Question answering pipeline: retrieve the most relevant chunks, stuff
/// them into a prompt, and cite where the context came from.
pub struct RetrievalQa<'a> {
    index: &'a VectorIndex,
    embedder: &'a dyn EmbeddingProvider,
    llm: &'a dyn LanguageModel,
    top_k: usize,
}

impl<'a> RetrievalQa<'a> {
    pub fn new(
        index: &'a VectorIndex,
        embedder: &'a dyn EmbeddingProvider,
        llm: &'a dyn LanguageModel,
        top_k: usize,
    ) -> Self {
        Self {
            index,
            embedder,
            llm,
            top_k,
        }
    }

    /// Answer a question. Never fails: provider errors are logged and
    /// collapse into [`FAILURE_ANSWER`] with no sources. The chunk-listing
    /// query writes every indexed chunk to `out` and acknowledges.
    pub async fn answer(&self, query: &str, out: &mut (dyn Write + Send)) -> Answer {
        if is_chunk_listing(query) {
            if let Err(e) = self.write_listing(out) {
                warn!(error = %e, "failed to write chunk listing");
                return Answer::bare(FAILURE_ANSWER);
            }
            return Answer::bare(CHUNK_LISTING_ANSWER);
        }

        let retrieved = match self.index.search(query, self.top_k, self.embedder).await {
            Ok(retrieved) => retrieved,
            Err(e) => {
                warn!(error = %e, "retrieval failed");
                return Answer::bare(FAILURE_ANSWER);
            }
        };

        let context = retrieved
            .iter()
            .map(|s| s.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join("\n\n");
        let prompt = PROMPT_TEMPLATE
            .replace("{context}", &context)
            .replace("{question}", query);

        let response = match self.llm.complete(&prompt).await {
            Ok(response) => response,
            Err(e) => {
                warn!(error = %e, "generation failed");
                return Answer::bare(FAILURE_ANSWER);
            }
        };

        let text = response.trim().to_string();
        if text.is_empty() {
            warn!("empty completion");
            return Answer::bare(FAILURE_ANSWER);
        }

        // Deduplicated, sorted citations over the retrieved chunks.
        let sources: BTreeSet<String> = retrieved.iter().map(|s| citation(&s.chunk)).collect();
        Answer::new(text, sources.into_iter().collect())
    }

    fn write_listing(&self, out: &mut (dyn Write + Send)) -> std::io::Result<()> {
        for (i, chunk) in self.index.records().iter().enumerate() {
            writeln!(out, "{}. {} [chunk {}]", i + 1, citation(chunk), chunk.chunk_index)?;
            for line in chunk.content.lines() {
                writeln!(out, "   {line}")?;
            }
            writeln!(out)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::{EmbeddingError, GenerationError};
    use crate::models::Document;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct StubEmbedder;

    #[async_trait]
    impl EmbeddingProvider for StubEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
            let count = |c: char| text.chars().filter(|&x| x == c).count() as f32;
            Ok(vec![count('a'), count('b'), 1.0])
        }
    }

    struct StubLlm {
        reply: Option<String>,
        prompts: Mutex<Vec<String>>,
    }

    impl StubLlm {
        fn answering(reply: &str) -> Self {
            Self {
                reply: Some(reply.to_string()),
                prompts: Mutex::new(Vec::new()),
            }
        }

        fn failing() -> Self {
            Self {
                reply: None,
                prompts: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl LanguageModel for StubLlm {
        async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
            self.prompts.lock().unwrap().push(prompt.to_string());
            match &self.reply {
                Some(reply) => Ok(reply.clone()),
                None => Err(GenerationError::Timeout),
            }
        }
    }

    fn slide_chunk(content: &str, source: &str, slide: u32) -> crate::models::DocumentChunk {
        let doc = Document::slide(content, source, slide);
        crate::models::DocumentChunk::from_document(&doc, content.to_string(), 0)
    }

    fn text_chunk(content: &str, source: &str) -> crate::models::DocumentChunk {
        let doc = Document::new(content, source);
        crate::models::DocumentChunk::from_document(&doc, content.to_string(), 0)
    }

    async fn index_of(chunks: Vec<crate::models::DocumentChunk>) -> VectorIndex {
        VectorIndex::build(chunks, &StubEmbedder).await.unwrap()
    }

    #[test]
    fn test_chunk_listing_detection() {
        assert!(is_chunk_listing("chunk"));
        assert!(is_chunk_listing("  CHUNK "));
        assert!(!is_chunk_listing("chunks"));
        assert!(!is_chunk_listing("what is a chunk?"));
    }

    #[test]
    fn test_citation_formats() {
        let with_slide = slide_chunk("x", "/docs/deck.pptx", 4);
        assert_eq!(citation(&with_slide), "/docs/deck.pptx (Slide 4)");

        let plain = text_chunk("x", "/docs/notes.txt");
        assert_eq!(citation(&plain), "/docs/notes.txt");
    }

    #[tokio::test]
    async fn test_sources_deduplicated_and_sorted() {
        let index = index_of(vec![
            slide_chunk("abab", "/d/deck.pptx", 2),
            slide_chunk("abab", "/d/deck.pptx", 2),
            slide_chunk("aabb", "/d/deck.pptx", 1),
            text_chunk("abba", "/d/notes.txt"),
        ])
        .await;
        let llm = StubLlm::answering("An answer.");
        let qa = RetrievalQa::new(&index, &StubEmbedder, &llm, 5);

        let answer = qa.answer("ab", &mut Vec::<u8>::new()).await;
        assert_eq!(answer.text, "An answer.");
        assert_eq!(
            answer.sources,
            vec![
                "/d/deck.pptx (Slide 1)".to_string(),
                "/d/deck.pptx (Slide 2)".to_string(),
                "/d/notes.txt".to_string(),
            ]
        );
    }

    #[tokio::test]
    async fn test_chunk_query_lists_chunks_without_retrieval() {
        let index = index_of(vec![
            slide_chunk("first slide text", "/d/deck.pptx", 1),
            text_chunk("plain notes", "/d/a.txt"),
        ])
        .await;
        let llm = StubLlm::failing();
        let qa = RetrievalQa::new(&index, &StubEmbedder, &llm, 5);

        let mut out = Vec::new();
        let answer = qa.answer("chunk", &mut out).await;
        assert_eq!(answer.text, CHUNK_LISTING_ANSWER);
        assert!(answer.sources.is_empty());
        assert!(llm.prompts.lock().unwrap().is_empty());

        let listing = String::from_utf8(out).unwrap();
        assert!(listing.contains("1. /d/deck.pptx (Slide 1) [chunk 0]"));
        assert!(listing.contains("first slide text"));
        assert!(listing.contains("2. /d/a.txt [chunk 0]"));
        assert!(listing.contains("plain notes"));
    }

    #[tokio::test]
    async fn test_generation_failure_is_contained() {
        let index = index_of(vec![text_chunk("aaaa", "/d/a.txt")]).await;
        let llm = StubLlm::failing();
        let qa = RetrievalQa::new(&index, &StubEmbedder, &llm, 5);

        let answer = qa.answer("aa", &mut Vec::<u8>::new()).await;
        assert_eq!(answer.text, FAILURE_ANSWER);
        assert!(answer.sources.is_empty());
    }

    #[tokio::test]
    async fn test_prompt_contains_context_and_question() {
        let index = index_of(vec![text_chunk("the sky is blue", "/d/a.txt")]).await;
        let llm = StubLlm::answering("Blue.");
        let qa = RetrievalQa::new(&index, &StubEmbedder, &llm, 5);

        qa.answer("what color is the sky", &mut Vec::<u8>::new()).await;

        let prompts = llm.prompts.lock().unwrap();
        assert_eq!(prompts.len(), 1);
        assert!(prompts[0].contains("the sky is blue"));
        assert!(prompts[0].contains("Question: what color is the sky"));
        assert!(prompts[0].ends_with("Helpful Answer:"));
    }
}
