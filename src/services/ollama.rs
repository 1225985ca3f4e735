//! Ollama client for embeddings and completions.

use async_trait::async_trait;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::time::Duration;

use crate::error::{ConfigError, EmbeddingError, GenerationError};
use crate::models::OllamaConfig;
use crate::services::provider::{EmbeddingProvider, LanguageModel};
use crate::utils::{RetryConfig, with_retry};

/// Request body for the /api/embeddings endpoint.
#[derive(Debug, Serialize)]
struct EmbeddingsRequest<'a> {
    model: &'a str,
    prompt: &'a str,
}

/// Response from the /api/embeddings endpoint.
#[derive(Debug, Deserialize)]
struct EmbeddingsResponse {
    embedding: Vec<f32>,
}

/// Request body for the /api/generate endpoint.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    model: &'a str,
    prompt: &'a str,
    stream: bool,
}

/// Response from the /api/generate endpoint.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    response: String,
}

/// Response from the /api/tags endpoint.
#[derive(Debug, Deserialize)]
struct TagsResponse {
    #[serde(default)]
    models: Vec<TagEntry>,
}

#[derive(Debug, Deserialize)]
struct TagEntry {
    name: String,
}

/// Client for a local Ollama server.
#[derive(Debug, Clone)]
pub struct OllamaClient {
    client: Client,
    base_url: String,
    llm_model: String,
    embedding_model: String,
    retry: RetryConfig,
}

impl OllamaClient {
    /// Create a new client with the given configuration.
    pub fn new(config: &OllamaConfig) -> Result<Self, EmbeddingError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| EmbeddingError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url: config.url.trim_end_matches('/').to_string(),
            llm_model: config.llm_model.clone(),
            embedding_model: config.embedding_model.clone(),
            retry: RetryConfig::default(),
        })
    }

    /// Create a client with default configuration.
    pub fn with_defaults() -> Result<Self, EmbeddingError> {
        Self::new(&OllamaConfig::default())
    }

    /// Verify the server is reachable and both required models are installed.
    pub async fn check_models(&self) -> Result<(), ConfigError> {
        let url = format!("{}/api/tags", self.base_url);
        let response = self
            .client
            .get(&url)
            .send()
            .await
            .map_err(|e| ConfigError::OllamaUnreachable(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ConfigError::OllamaUnreachable(format!(
                "status {}",
                response.status()
            )));
        }

        let tags: TagsResponse = response
            .json()
            .await
            .map_err(|e| ConfigError::OllamaUnreachable(e.to_string()))?;
        let installed: Vec<String> = tags.models.into_iter().map(|m| m.name).collect();

        let missing = missing_models(
            &installed,
            &[self.llm_model.as_str(), self.embedding_model.as_str()],
        );
        if !missing.is_empty() {
            return Err(ConfigError::MissingModels(missing));
        }

        Ok(())
    }

    /// Names of the models this client talks to, for status reporting.
    pub fn models(&self) -> (&str, &str) {
        (&self.llm_model, &self.embedding_model)
    }

    /// Get the base URL of the Ollama server.
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    async fn embed_once(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let url = format!("{}/api/embeddings", self.base_url);
        let request = EmbeddingsRequest {
            model: &self.embedding_model,
            prompt: text,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    EmbeddingError::Timeout
                } else {
                    EmbeddingError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(EmbeddingError::ServerError(format!(
                "status {}: {}",
                status, body
            )));
        }

        let parsed: EmbeddingsResponse = response
            .json()
            .await
            .map_err(|e| EmbeddingError::InvalidResponse(e.to_string()))?;

        if parsed.embedding.is_empty() {
            return Err(EmbeddingError::InvalidResponse(
                "empty embedding".to_string(),
            ));
        }

        Ok(parsed.embedding)
    }
}

/// Every required model absent from the installed tags, in required order.
fn missing_models(installed: &[String], required: &[&str]) -> Vec<String> {
    required
        .iter()
        .filter(|name| !model_installed(installed, name))
        .map(|name| name.to_string())
        .collect()
}

/// A model is installed if a tag matches exactly or up to its `:tag` suffix.
fn model_installed(installed: &[String], required: &str) -> bool {
    installed.iter().any(|name| {
        name == required
            || name
                .strip_prefix(required)
                .is_some_and(|rest| rest.starts_with(':'))
    })
}

#[async_trait]
impl EmbeddingProvider for OllamaClient {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        with_retry(&self.retry, || self.embed_once(text))
            .await
            .into_result()
    }
}

#[async_trait]
impl LanguageModel for OllamaClient {
    async fn complete(&self, prompt: &str) -> Result<String, GenerationError> {
        let url = format!("{}/api/generate", self.base_url);
        let request = GenerateRequest {
            model: &self.llm_model,
            prompt,
            stream: false,
        };

        let response = self
            .client
            .post(&url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    GenerationError::Timeout
                } else {
                    GenerationError::RequestError(e)
                }
            })?;

        if !response.status().is_success() {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            return Err(GenerationError::ServerError(format!(
                "status {}: {}",
                status, body
            )));
        }

        let parsed: GenerateResponse = response
            .json()
            .await
            .map_err(|e| GenerationError::InvalidResponse(e.to_string()))?;

        Ok(parsed.response)
    }
}
