//! Error types for the document QA CLI.

use thiserror::Error;

use crate::utils::retry::Retryable;

/// Errors raised while extracting documents from a single source file.
///
/// Extraction failures are always contained: the ingestion sweep logs them
/// and moves on to the next file.
#[derive(Debug, Error)]
pub enum ExtractionError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("PDF extraction failed: {0}")]
    Pdf(String),

    #[error("CSV parse error: {0}")]
    Csv(#[from] csv::Error),

    #[error("slide archive error: {0}")]
    SlideArchive(String),

    #[error("slide XML error: {0}")]
    SlideXml(String),

    #[error("conversion error: {0}")]
    Conversion(#[from] ConversionError),

    #[error("extraction task failed: {0}")]
    TaskJoin(String),
}

/// Errors from converting a legacy `.ppt` file to `.pptx`.
#[derive(Debug, Error)]
pub enum ConversionError {
    #[error("failed to run converter: {0}")]
    Io(#[from] std::io::Error),

    #[error("converter exited with {status}: {stderr}")]
    ExitStatus { status: String, stderr: String },

    #[error("converter produced no output file: {0}")]
    MissingOutput(String),

    #[error("conversion timed out")]
    Timeout,
}

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to Ollama: {0}")]
    ConnectionError(String),

    #[error("Ollama server error: {0}")]
    ServerError(String),

    #[error("embedding request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding timeout")]
    Timeout,
}

impl Retryable for EmbeddingError {
    fn is_retryable(&self) -> bool {
        match self {
            // Connection and timeout errors are retryable
            EmbeddingError::ConnectionError(_) | EmbeddingError::Timeout => true,
            // Server errors might be transient (e.g., 503 Service Unavailable)
            EmbeddingError::ServerError(msg) => is_transient_status(msg),
            // Request errors depend on the underlying cause
            EmbeddingError::RequestError(e) => e.is_timeout() || e.is_connect(),
            // Invalid responses are not retryable
            EmbeddingError::InvalidResponse(_) => false,
        }
    }
}

/// Errors related to language model completion.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("failed to connect to Ollama: {0}")]
    ConnectionError(String),

    #[error("Ollama server error: {0}")]
    ServerError(String),

    #[error("generation request failed: {0}")]
    RequestError(#[from] reqwest::Error),

    #[error("invalid generation response: {0}")]
    InvalidResponse(String),

    #[error("generation timeout")]
    Timeout,
}

impl Retryable for GenerationError {
    fn is_retryable(&self) -> bool {
        match self {
            GenerationError::ConnectionError(_) | GenerationError::Timeout => true,
            GenerationError::ServerError(msg) => is_transient_status(msg),
            GenerationError::RequestError(e) => e.is_timeout() || e.is_connect(),
            GenerationError::InvalidResponse(_) => false,
        }
    }
}

fn is_transient_status(msg: &str) -> bool {
    msg.contains("503")
        || msg.contains("502")
        || msg.contains("504")
        || msg.contains("429")
        || msg.to_lowercase().contains("unavailable")
        || msg.to_lowercase().contains("too many requests")
}

/// Errors related to building, persisting, and loading the vector index.
#[derive(Debug, Error)]
pub enum IndexError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("index serialization error: {0}")]
    Serde(#[from] serde_json::Error),

    #[error("corrupt index: {0}")]
    Corrupt(String),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("no documents found")]
    NoDocuments,
}

/// Errors related to configuration and required external services.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("TOML parse error: {0}")]
    TomlParseError(#[from] toml::de::Error),

    #[error("TOML serialize error: {0}")]
    TomlSerializeError(#[from] toml::ser::Error),

    #[error("path error: {0}")]
    PathError(String),

    #[error("required models not installed: {} (install each with: ollama pull <model>)", .0.join(", "))]
    MissingModels(Vec<String>),

    #[error("Ollama unreachable: {0}")]
    OllamaUnreachable(String),
}

/// Application-level errors that wrap domain errors.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("index error: {0}")]
    Index(#[from] IndexError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("{0}")]
    Other(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_embedding_timeout_is_retryable() {
        assert!(EmbeddingError::Timeout.is_retryable());
        assert!(!EmbeddingError::InvalidResponse("bad json".into()).is_retryable());
    }

    #[test]
    fn test_transient_server_errors() {
        assert!(GenerationError::ServerError("status 503: busy".into()).is_retryable());
        assert!(!GenerationError::ServerError("status 400: bad request".into()).is_retryable());
    }
}
