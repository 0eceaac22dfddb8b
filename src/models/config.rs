use serde::{Deserialize, Serialize};

use super::search::OutputFormat;
use crate::error::ConfigError;

pub const DEFAULT_API_URL: &str = "https://api.openai.com/v1";
pub const DEFAULT_EMBEDDING_MODEL: &str = "text-embedding-3-small";
pub const DEFAULT_EMBEDDING_DIMENSION: u32 = 1536;
pub const DEFAULT_GENERATION_MODEL: &str = "gpt-4o-mini";
pub const DEFAULT_QDRANT_URL: &str = "http://localhost:6334";
pub const DEFAULT_COLLECTION: &str = "doc_qa_collection";
pub const DEFAULT_FALLBACK_ANSWER: &str = "No relevant information was found in the documents.";

/// Environment variables consulted for the backend API key, in order.
pub const API_KEY_ENV_VARS: [&str; 2] = ["DOCQA_API_KEY", "OPENAI_API_KEY"];

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct Config {
    #[serde(default)]
    pub embedding: EmbeddingConfig,

    #[serde(default)]
    pub generation: GenerationConfig,

    #[serde(default)]
    pub vector_store: VectorStoreConfig,

    #[serde(default)]
    pub chunking: ChunkingConfig,

    #[serde(default)]
    pub retrieval: RetrievalConfig,

    #[serde(default)]
    pub retry: RetrySettings,

    #[serde(default)]
    pub server: ServerConfig,

    #[serde(default)]
    pub output: OutputConfig,
}

impl Config {
    pub fn config_path() -> Option<std::path::PathBuf> {
        dirs::config_dir().map(|p| p.join("docqa").join("config.toml"))
    }

    /// Load the config file (or defaults), fill secrets from the environment,
    /// and validate the result.
    pub fn load() -> Result<Self, ConfigError> {
        let mut config = match Self::config_path() {
            Some(path) if path.exists() => Self::from_toml(&std::fs::read_to_string(&path)?)?,
            _ => Self::default(),
        };
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    pub fn from_toml(content: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(content)?)
    }

    pub fn save(&self) -> Result<std::path::PathBuf, ConfigError> {
        let path = Self::config_path().ok_or_else(|| {
            ConfigError::PathError("could not determine config directory".to_string())
        })?;

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = toml::to_string_pretty(self)?;
        std::fs::write(&path, content)?;
        Ok(path)
    }

    /// Fill API keys that the file left unset from the environment.
    pub fn apply_env(&mut self) {
        let env_key = API_KEY_ENV_VARS
            .iter()
            .find_map(|name| std::env::var(name).ok().filter(|v| !v.is_empty()));

        if self.embedding.api_key.is_none() {
            self.embedding.api_key = env_key.clone();
        }
        if self.generation.api_key.is_none() {
            self.generation.api_key = env_key;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        self.chunking.validate()?;

        if self.retrieval.top_k == 0 {
            return Err(invalid("retrieval.top_k must be at least 1"));
        }
        if self.retrieval.fallback_answer.trim().is_empty() {
            return Err(invalid("retrieval.fallback_answer must not be empty"));
        }
        if self.embedding.model.trim().is_empty() {
            return Err(invalid("embedding.model must not be empty"));
        }
        if self.embedding.dimension == 0 {
            return Err(invalid("embedding.dimension must be at least 1"));
        }
        if self.generation.model.trim().is_empty() {
            return Err(invalid("generation.model must not be empty"));
        }
        if !(0.0..=2.0).contains(&self.generation.temperature) {
            return Err(invalid("generation.temperature must be between 0.0 and 2.0"));
        }
        if self.generation.max_tokens == 0 {
            return Err(invalid("generation.max_tokens must be at least 1"));
        }
        if self.vector_store.collection.trim().is_empty() {
            return Err(invalid("vector_store.collection must not be empty"));
        }
        if self.retry.max_attempts == 0 {
            return Err(invalid("retry.max_attempts must be at least 1"));
        }
        Ok(())
    }
}

fn invalid(msg: &str) -> ConfigError {
    ConfigError::Validation(msg.to_string())
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EmbeddingConfig {
    #[serde(default = "default_api_url")]
    pub url: String,

    #[serde(default = "default_embedding_model")]
    pub model: String,

    #[serde(default = "default_dimension")]
    pub dimension: u32,

    #[serde(default = "default_embedding_timeout")]
    pub timeout_secs: u64,

    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

fn default_api_url() -> String {
    DEFAULT_API_URL.to_string()
}

fn default_embedding_model() -> String {
    DEFAULT_EMBEDDING_MODEL.to_string()
}

fn default_dimension() -> u32 {
    DEFAULT_EMBEDDING_DIMENSION
}

fn default_embedding_timeout() -> u64 {
    60
}

impl Default for EmbeddingConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            model: default_embedding_model(),
            dimension: default_dimension(),
            timeout_secs: default_embedding_timeout(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GenerationConfig {
    #[serde(default = "default_api_url")]
    pub url: String,

    #[serde(default = "default_generation_model")]
    pub model: String,

    /// Kept near zero so answers stay faithful to the retrieved context.
    #[serde(default = "default_temperature")]
    pub temperature: f32,

    #[serde(default = "default_max_tokens")]
    pub max_tokens: u32,

    #[serde(default = "default_generation_timeout")]
    pub timeout_secs: u64,

    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

fn default_generation_model() -> String {
    DEFAULT_GENERATION_MODEL.to_string()
}

fn default_temperature() -> f32 {
    0.1
}

fn default_max_tokens() -> u32 {
    1024
}

fn default_generation_timeout() -> u64 {
    120
}

impl Default for GenerationConfig {
    fn default() -> Self {
        Self {
            url: default_api_url(),
            model: default_generation_model(),
            temperature: default_temperature(),
            max_tokens: default_max_tokens(),
            timeout_secs: default_generation_timeout(),
            api_key: None,
        }
    }
}

/// Vector index backend.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VectorDriver {
    #[default]
    Qdrant,
    /// Process-local index; contents are lost on exit.
    Memory,
}

impl std::fmt::Display for VectorDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            VectorDriver::Qdrant => write!(f, "qdrant"),
            VectorDriver::Memory => write!(f, "memory"),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VectorStoreConfig {
    #[serde(default)]
    pub driver: VectorDriver,

    #[serde(default = "default_qdrant_url")]
    pub url: String,

    #[serde(default = "default_collection")]
    pub collection: String,

    #[serde(default = "default_store_timeout")]
    pub timeout_secs: u64,

    #[serde(default, skip_serializing)]
    pub api_key: Option<String>,
}

fn default_qdrant_url() -> String {
    DEFAULT_QDRANT_URL.to_string()
}

fn default_collection() -> String {
    DEFAULT_COLLECTION.to_string()
}

fn default_store_timeout() -> u64 {
    30
}

impl Default for VectorStoreConfig {
    fn default() -> Self {
        Self {
            driver: VectorDriver::default(),
            url: default_qdrant_url(),
            collection: default_collection(),
            timeout_secs: default_store_timeout(),
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChunkingConfig {
    /// Window width in characters.
    #[serde(default = "default_chunk_size")]
    pub chunk_size: usize,

    /// Characters shared by consecutive chunks.
    #[serde(default = "default_chunk_overlap")]
    pub chunk_overlap: usize,

    /// Chunks embedded and stored at the same time during ingestion.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,
}

impl ChunkingConfig {
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.chunk_size == 0 {
            return Err(invalid("chunking.chunk_size must be at least 1"));
        }
        if self.chunk_overlap >= self.chunk_size {
            return Err(ConfigError::Validation(format!(
                "chunking.chunk_overlap ({}) must be smaller than chunking.chunk_size ({})",
                self.chunk_overlap, self.chunk_size
            )));
        }
        if self.concurrency == 0 {
            return Err(invalid("chunking.concurrency must be at least 1"));
        }
        Ok(())
    }
}

fn default_chunk_size() -> usize {
    800
}

fn default_chunk_overlap() -> usize {
    100
}

fn default_concurrency() -> usize {
    4
}

impl Default for ChunkingConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            chunk_overlap: default_chunk_overlap(),
            concurrency: default_concurrency(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrievalConfig {
    #[serde(default = "default_top_k")]
    pub top_k: usize,

    /// Phrase the model must answer with when the context is insufficient.
    #[serde(default = "default_fallback_answer")]
    pub fallback_answer: String,
}

fn default_top_k() -> usize {
    3
}

fn default_fallback_answer() -> String {
    DEFAULT_FALLBACK_ANSWER.to_string()
}

impl Default for RetrievalConfig {
    fn default() -> Self {
        Self {
            top_k: default_top_k(),
            fallback_answer: default_fallback_answer(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RetrySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,

    #[serde(default = "default_initial_delay_ms")]
    pub initial_delay_ms: u64,

    #[serde(default = "default_max_delay_ms")]
    pub max_delay_ms: u64,
}

fn default_max_attempts() -> u32 {
    3
}

fn default_initial_delay_ms() -> u64 {
    200
}

fn default_max_delay_ms() -> u64 {
    5000
}

impl Default for RetrySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_delay_ms: default_initial_delay_ms(),
            max_delay_ms: default_max_delay_ms(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,

    #[serde(default = "default_max_document_bytes")]
    pub max_document_bytes: u64,
}

fn default_bind() -> String {
    "127.0.0.1:8080".to_string()
}

fn default_max_document_bytes() -> u64 {
    10 * 1024 * 1024
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            max_document_bytes: default_max_document_bytes(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct OutputConfig {
    #[serde(default)]
    pub default_format: OutputFormat,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.embedding.url, DEFAULT_API_URL);
        assert_eq!(config.vector_store.url, DEFAULT_QDRANT_URL);
        assert_eq!(config.vector_store.collection, DEFAULT_COLLECTION);
        assert_eq!(config.chunking.chunk_size, 800);
        assert_eq!(config.chunking.chunk_overlap, 100);
        assert_eq!(config.retrieval.top_k, 3);
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_config_path() {
        let path = Config::config_path();
        assert!(path.is_some());
    }

    #[test]
    fn test_partial_toml_uses_defaults() {
        let config = Config::from_toml(
            r#"
            [chunking]
            chunk_size = 400

            [vector_store]
            driver = "memory"
            "#,
        )
        .unwrap();

        assert_eq!(config.chunking.chunk_size, 400);
        assert_eq!(config.chunking.chunk_overlap, 100);
        assert_eq!(config.vector_store.driver, VectorDriver::Memory);
        assert_eq!(config.generation.max_tokens, 1024);
    }

    #[test]
    fn test_overlap_must_be_smaller_than_chunk_size() {
        let mut config = Config::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Validation(_))
        ));
    }

    #[test]
    fn test_zero_chunk_size_rejected() {
        let chunking = ChunkingConfig {
            chunk_size: 0,
            chunk_overlap: 0,
            ..Default::default()
        };
        assert!(chunking.validate().is_err());
    }

    #[test]
    fn test_temperature_range() {
        let mut config = Config::default();
        config.generation.temperature = 3.5;
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_api_key_never_serialized() {
        let mut config = Config::default();
        config.embedding.api_key = Some("sk-secret".to_string());
        config.generation.api_key = Some("sk-secret".to_string());

        let rendered = toml::to_string_pretty(&config).unwrap();
        assert!(!rendered.contains("sk-secret"));
    }
}
