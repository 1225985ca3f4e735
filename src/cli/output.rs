use std::fmt::Write as FmtWrite;

use crate::models::{Answer, DocumentChunk, OutputFormat};

pub trait Formatter {
    fn format_answer(&self, answer: &Answer) -> String;
    fn format_chunks(&self, chunks: &[DocumentChunk]) -> String;
    fn format_status(&self, status: &StatusInfo) -> String;
    fn format_index_stats(&self, stats: &IndexStats) -> String;
    fn format_message(&self, message: &str) -> String;
    fn format_error(&self, error: &str) -> String;
}

#[derive(Debug, Clone)]
pub struct StatusInfo {
    pub ollama_url: String,
    pub ollama_reachable: bool,
    pub llm_model: String,
    pub embedding_model: String,
    pub models_missing: Vec<String>,
    pub config_path: Option<String>,
}

#[derive(Debug, Clone, Default)]
pub struct IndexStats {
    pub documents: u64,
    pub chunks: u64,
    pub dimension: u64,
    pub duration_ms: u64,
}

pub struct TextFormatter;

impl Formatter for TextFormatter {
    fn format_answer(&self, answer: &Answer) -> String {
        let mut output = String::new();
        writeln!(output, "{}", answer.text).unwrap();
        if !answer.sources.is_empty() {
            writeln!(output, "\nSources:").unwrap();
            for source in &answer.sources {
                writeln!(output, "  - {}", source).unwrap();
            }
        }
        output
    }

    fn format_chunks(&self, chunks: &[DocumentChunk]) -> String {
        if chunks.is_empty() {
            return "No chunks indexed.\n".to_string();
        }

        let mut output = String::new();
        writeln!(output, "Indexed chunks: {}\n", chunks.len()).unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            let slide = chunk
                .slide_number
                .map(|n| format!(" (Slide {})", n))
                .unwrap_or_default();
            writeln!(
                output,
                "{}. {}{} [chunk {}]",
                i + 1,
                chunk.source_path,
                slide,
                chunk.chunk_index
            )
            .unwrap();
            for line in chunk.content.lines() {
                writeln!(output, "   {}", line).unwrap();
            }
            writeln!(output).unwrap();
        }
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "Status").unwrap();
        writeln!(output, "------").unwrap();

        let ollama = if status.ollama_reachable {
            "[CONNECTED]"
        } else {
            "[UNREACHABLE]"
        };
        writeln!(output, "Ollama:        {}", ollama).unwrap();
        writeln!(output, "  URL:         {}", status.ollama_url).unwrap();

        let model_line = |output: &mut String, label: &str, model: &str, missing: &[String]| {
            let mark = if missing.iter().any(|m| m == model) {
                "[MISSING]"
            } else {
                "[OK]"
            };
            writeln!(output, "  {}: {} {}", label, model, mark).unwrap();
        };
        if status.ollama_reachable {
            model_line(&mut output, "LLM      ", &status.llm_model, &status.models_missing);
            model_line(
                &mut output,
                "Embedding",
                &status.embedding_model,
                &status.models_missing,
            );
        }

        if let Some(ref path) = status.config_path {
            writeln!(output, "Config:        {}", path).unwrap();
        }
        output
    }

    fn format_index_stats(&self, stats: &IndexStats) -> String {
        let mut output = String::new();
        writeln!(output, "Indexing Complete").unwrap();
        writeln!(output, "-----------------").unwrap();
        writeln!(output, "Documents: {}", stats.documents).unwrap();
        writeln!(output, "Chunks: {}", stats.chunks).unwrap();
        writeln!(output, "Dimension: {}", stats.dimension).unwrap();
        writeln!(output, "Duration: {}ms", stats.duration_ms).unwrap();
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("{}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("Error: {}\n", error)
    }
}

pub struct JsonFormatter {
    pub pretty: bool,
}

impl JsonFormatter {
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    fn render(&self, json: &serde_json::Value) -> String {
        if self.pretty {
            serde_json::to_string_pretty(json).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
        } else {
            serde_json::to_string(json).unwrap_or_else(|e| format!("{{\"error\": \"{}\"}}", e))
        }
    }
}

impl Formatter for JsonFormatter {
    fn format_answer(&self, answer: &Answer) -> String {
        let json = serde_json::json!({
            "answer": answer.text,
            "sources": answer.sources,
        });
        self.render(&json)
    }

    fn format_chunks(&self, chunks: &[DocumentChunk]) -> String {
        let chunks_array: Vec<serde_json::Value> = chunks
            .iter()
            .map(|c| {
                serde_json::json!({
                    "id": c.id,
                    "source": c.source_path,
                    "slide": c.slide_number,
                    "chunk_index": c.chunk_index,
                    "content": c.content,
                })
            })
            .collect();
        self.render(&serde_json::json!({ "chunks": chunks_array }))
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let json = serde_json::json!({
            "ollama": {
                "url": status.ollama_url,
                "reachable": status.ollama_reachable,
                "llm_model": status.llm_model,
                "embedding_model": status.embedding_model,
                "models_missing": status.models_missing,
            },
            "config_path": status.config_path,
        });
        self.render(&json)
    }

    fn format_index_stats(&self, stats: &IndexStats) -> String {
        let json = serde_json::json!({
            "documents": stats.documents,
            "chunks": stats.chunks,
            "dimension": stats.dimension,
            "duration_ms": stats.duration_ms,
        });
        self.render(&json)
    }

    fn format_message(&self, message: &str) -> String {
        serde_json::json!({"message": message}).to_string()
    }

    fn format_error(&self, error: &str) -> String {
        serde_json::json!({"error": error}).to_string()
    }
}

pub struct MarkdownFormatter;

impl Formatter for MarkdownFormatter {
    fn format_answer(&self, answer: &Answer) -> String {
        let mut output = String::new();
        writeln!(output, "## Answer\n").unwrap();
        writeln!(output, "{}\n", answer.text).unwrap();
        if !answer.sources.is_empty() {
            writeln!(output, "### Sources\n").unwrap();
            for source in &answer.sources {
                writeln!(output, "- `{}`", source).unwrap();
            }
        }
        output
    }

    fn format_chunks(&self, chunks: &[DocumentChunk]) -> String {
        if chunks.is_empty() {
            return "## Chunks\n\n*No chunks indexed.*\n".to_string();
        }

        let mut output = String::new();
        writeln!(output, "## Chunks ({})\n", chunks.len()).unwrap();
        for (i, chunk) in chunks.iter().enumerate() {
            let slide = chunk
                .slide_number
                .map(|n| format!(" (Slide {})", n))
                .unwrap_or_default();
            writeln!(output, "### {}. `{}`{}\n", i + 1, chunk.source_path, slide).unwrap();
            writeln!(output, "```").unwrap();
            writeln!(output, "{}", chunk.content).unwrap();
            writeln!(output, "```\n").unwrap();
        }
        output
    }

    fn format_status(&self, status: &StatusInfo) -> String {
        let mut output = String::new();
        writeln!(output, "## Status\n").unwrap();

        let ollama = if status.ollama_reachable { "✅" } else { "❌" };
        writeln!(output, "### Ollama {}\n", ollama).unwrap();
        writeln!(output, "- **URL:** `{}`", status.ollama_url).unwrap();
        let mark = |model: &str| {
            if status.models_missing.iter().any(|m| m == model) {
                "❌"
            } else {
                "✅"
            }
        };
        writeln!(
            output,
            "- **LLM:** {} {}",
            status.llm_model,
            mark(&status.llm_model)
        )
        .unwrap();
        writeln!(
            output,
            "- **Embedding:** {} {}",
            status.embedding_model,
            mark(&status.embedding_model)
        )
        .unwrap();
        if let Some(ref path) = status.config_path {
            writeln!(output, "- **Config:** `{}`", path).unwrap();
        }
        output
    }

    fn format_index_stats(&self, stats: &IndexStats) -> String {
        let mut output = String::new();
        writeln!(output, "## Indexing Complete\n").unwrap();
        writeln!(output, "| Metric | Value |").unwrap();
        writeln!(output, "|--------|-------|").unwrap();
        writeln!(output, "| Documents | {} |", stats.documents).unwrap();
        writeln!(output, "| Chunks | {} |", stats.chunks).unwrap();
        writeln!(output, "| Dimension | {} |", stats.dimension).unwrap();
        writeln!(output, "| Duration | {}ms |", stats.duration_ms).unwrap();
        output
    }

    fn format_message(&self, message: &str) -> String {
        format!("> {}\n", message)
    }

    fn format_error(&self, error: &str) -> String {
        format!("> ⚠️ **Error:** {}\n", error)
    }
}

pub fn get_formatter(format: OutputFormat) -> Box<dyn Formatter> {
    match format {
        OutputFormat::Text => Box::new(TextFormatter),
        OutputFormat::Json => Box::new(JsonFormatter::new(true)),
        OutputFormat::Markdown => Box::new(MarkdownFormatter),
    }
}
