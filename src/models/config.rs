use serde::{Deserialize, Serialize};

use super::answer::OutputFormat;

pub const DEFAULT_OLLAMA_URL: &str = "http://localhost:11434";
pub const DEFAULT_LLM_MODEL: &str = "llama3.2-vision";
pub const DEFAULT_EMBEDDING_MODEL: &str = "nomic-embed-text";

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub ollama: OllamaConfig,

    #[serde(default)]
    pub indexing: IndexingConfig,

    #[serde(default)]
    pub query: QueryConfig,
}

impl Config {
    pub fn config_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|p| p.join("docqa").join("config.toml"))
    }

    pub fn load() -> Result<Self, crate::error::ConfigError> {
        if let Some(path) = Self::config_path() {
            return Self::load_from(&path);
        }
        Ok(Self::default())
    }

    pub fn load_from(path: &std::path::Path) -> Result<Self, crate::error::ConfigError> {
        if !path.exists() {
            return Ok(Self::default());
        }
        let content = std::fs::read_to_string(path)?;
        let config: Config = toml::from_str(&content)?;
        Ok(config)
    }

    /// Load the config file, falling back to defaults with a warning when it
    /// is unreadable or malformed. Every command loads config this way.
    pub fn load_or_default() -> Self {
        match Self::load() {
            Ok(config) => config,
            Err(e) => {
                tracing::warn!(error = %e, "ignoring unusable config file, using defaults");
                Self::default()
            }
        }
    }

    pub fn save(&self) -> Result<(), crate::error::ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            crate::error::ConfigError::PathError("could not determine config directory".to_string())
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OllamaConfig {
    #[serde(default = "default_ollama_url")]
    pub url: String,

    #[serde(default = "default_llm_model")]
    pub llm_model: String,

    #[serde(default = "default_embedding_model")]
    pub embedding_model: String,

    #[serde(default = "default_timeout")]
    pub timeout_secs: u64,
}

fn default_ollama_url() -> String {
    DEFAULT_OLLAMA_URL.to_string()
}

fn default_llm_model() -> String {
    DEFAULT_LLM_MODEL.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_timeout() -> u64 {
    120
}

impl Default for OllamaConfig {
    fn default() -> Self {
        Self {
            url: default_ollama_url(),
            llm_model: default_llm_model(),
            embedding_model: default_embedding_model(),
            timeout_secs: default_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexingConfig {
    /// Target chunk size in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: u32,

    /// Overlap between consecutive chunks in characters.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: u32,

    /// Maximum size of a single source file.
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,

    /// Timeout for the legacy slide conversion subprocess.
    #[serde(default = "default_conversion_timeout")]
    pub conversion_timeout_secs: u64,
}

fn default_chunk_size() -> u32 {
    800
}

fn default_chunk_overlap() -> u32 {
    80
}

fn default_max_file_size() -> u64 {
    10 * 1024 * 1024
}

fn default_conversion_timeout() -> u64 {
    60
}

impl Default for IndexingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            max_file_size: default_max_file_size(),
            conversion_timeout_secs: default_conversion_timeout(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueryConfig {
    /// Number of chunks retrieved per question.
    #[serde(default = "default_top_k")]
    pub top_k: u32,

    #[serde(default)]
    pub default_format: OutputFormat,
}

fn default_top_k() -> u32 {
    5
}

impl Default for QueryConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            default_format: OutputFormat::Text,
        }
    }
}
