mod config;
mod document;
mod ingest;
mod search;

pub use config::{
    API_KEY_ENV_VARS, ChunkingConfig, Config, DEFAULT_API_URL, DEFAULT_COLLECTION,
    DEFAULT_EMBEDDING_DIMENSION, DEFAULT_EMBEDDING_MODEL, DEFAULT_FALLBACK_ANSWER,
    DEFAULT_GENERATION_MODEL, DEFAULT_QDRANT_URL, EmbeddingConfig, GenerationConfig,
    OutputConfig, RetrievalConfig, RetrySettings, ServerConfig, VectorDriver, VectorStoreConfig,
};
pub use document::{Chunk, Document, IndexEntry};
pub use ingest::{ChunkFailure, FailureStage, IngestReport};
pub use search::{Answer, OutputFormat, RetrievedChunk};
