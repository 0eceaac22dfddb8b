//! Error types for docqa.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::utils::retry::Retryable;

/// Machine-readable error category surfaced to callers of the CLI and HTTP API.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Configuration,
    InvalidRequest,
    Embedding,
    Store,
    Query,
    Generation,
    Timeout,
    Cancelled,
    Internal,
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ErrorKind::Configuration => "configuration",
            ErrorKind::InvalidRequest => "invalid_request",
            ErrorKind::Embedding => "embedding",
            ErrorKind::Store => "store",
            ErrorKind::Query => "query",
            ErrorKind::Generation => "generation",
            ErrorKind::Timeout => "timeout",
            ErrorKind::Cancelled => "cancelled",
            ErrorKind::Internal => "internal",
        };
        f.write_str(name)
    }
}

/// Errors that can be produced by a guarded collaborator call.
///
/// Implemented by every backend error so that [`crate::utils::guard`] can
/// report timeouts and cancellation in the caller's own error type.
pub trait Interrupted {
    fn timed_out(after_secs: u64) -> Self;
    fn cancelled() -> Self;
}

/// Errors related to embedding operations.
#[derive(Debug, Error)]
pub enum EmbeddingError {
    #[error("failed to connect to embedding server: {0}")]
    ConnectionError(String),

    #[error("embedding server error: {0}")]
    ServerError(String),

    #[error("invalid embedding response: {0}")]
    InvalidResponse(String),

    #[error("embedding dimension mismatch: expected {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("embedding timed out after {0}s")]
    Timeout(u64),

    #[error("embedding cancelled")]
    Cancelled,
}

impl Retryable for EmbeddingError {
    fn is_retryable(&self) -> bool {
        match self {
            EmbeddingError::ConnectionError(_) | EmbeddingError::Timeout(_) => true,
            EmbeddingError::ServerError(msg) => is_transient_status(msg),
            EmbeddingError::InvalidResponse(_)
            | EmbeddingError::DimensionMismatch { .. }
            | EmbeddingError::Cancelled => false,
        }
    }
}

impl EmbeddingError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            EmbeddingError::Timeout(_) => ErrorKind::Timeout,
            EmbeddingError::Cancelled => ErrorKind::Cancelled,
            _ => ErrorKind::Embedding,
        }
    }

    /// Message that is safe to show to the requester.
    pub fn user_message(&self) -> String {
        match self {
            EmbeddingError::Timeout(_) => {
                "the embedding service did not respond in time".to_string()
            }
            EmbeddingError::Cancelled => "embedding was cancelled".to_string(),
            EmbeddingError::DimensionMismatch { expected, actual } => {
                format!("the embedding has {actual} dimensions, expected {expected}")
            }
            _ => "the text could not be embedded".to_string(),
        }
    }
}

impl Interrupted for EmbeddingError {
    fn timed_out(after_secs: u64) -> Self {
        EmbeddingError::Timeout(after_secs)
    }

    fn cancelled() -> Self {
        EmbeddingError::Cancelled
    }
}

/// Errors related to vector index operations.
#[derive(Debug, Error)]
pub enum VectorStoreError {
    #[error("failed to connect to vector store: {0}")]
    ConnectionError(String),

    #[error("collection error: {0}")]
    CollectionError(String),

    #[error("upsert error: {0}")]
    UpsertError(String),

    #[error("search error: {0}")]
    SearchError(String),

    #[error("vector dimension mismatch: collection holds {expected}, got {actual}")]
    DimensionMismatch { expected: usize, actual: usize },

    #[error("vector store call timed out after {0}s")]
    Timeout(u64),

    #[error("vector store call cancelled")]
    Cancelled,
}

impl Retryable for VectorStoreError {
    fn is_retryable(&self) -> bool {
        match self {
            VectorStoreError::ConnectionError(_) | VectorStoreError::Timeout(_) => true,
            VectorStoreError::CollectionError(msg)
            | VectorStoreError::UpsertError(msg)
            | VectorStoreError::SearchError(msg) => {
                let msg_lower = msg.to_lowercase();
                msg_lower.contains("timeout")
                    || msg_lower.contains("connection")
                    || msg_lower.contains("unavailable")
                    || msg_lower.contains("too many")
            }
            VectorStoreError::DimensionMismatch { .. } | VectorStoreError::Cancelled => false,
        }
    }
}

impl VectorStoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            VectorStoreError::Timeout(_) => ErrorKind::Timeout,
            VectorStoreError::Cancelled => ErrorKind::Cancelled,
            _ => ErrorKind::Store,
        }
    }

    /// Message that is safe to show to the requester.
    pub fn user_message(&self) -> String {
        match self {
            VectorStoreError::Timeout(_) => "the vector store did not respond in time".to_string(),
            VectorStoreError::Cancelled => "the vector store call was cancelled".to_string(),
            VectorStoreError::DimensionMismatch { expected, actual } => {
                format!("the vector has {actual} dimensions, the index holds {expected}")
            }
            _ => "the vector store rejected the request".to_string(),
        }
    }
}

impl Interrupted for VectorStoreError {
    fn timed_out(after_secs: u64) -> Self {
        VectorStoreError::Timeout(after_secs)
    }

    fn cancelled() -> Self {
        VectorStoreError::Cancelled
    }
}

/// Errors related to answer generation.
#[derive(Debug, Error)]
pub enum GenerationError {
    #[error("failed to connect to generation server: {0}")]
    ConnectionError(String),

    #[error("generation server error: {0}")]
    ServerError(String),

    #[error("invalid generation response: {0}")]
    InvalidResponse(String),

    #[error("generation timed out after {0}s")]
    Timeout(u64),

    #[error("generation cancelled")]
    Cancelled,
}

impl Retryable for GenerationError {
    fn is_retryable(&self) -> bool {
        match self {
            GenerationError::ConnectionError(_) | GenerationError::Timeout(_) => true,
            GenerationError::ServerError(msg) => is_transient_status(msg),
            GenerationError::InvalidResponse(_) | GenerationError::Cancelled => false,
        }
    }
}

impl Interrupted for GenerationError {
    fn timed_out(after_secs: u64) -> Self {
        GenerationError::Timeout(after_secs)
    }

    fn cancelled() -> Self {
        GenerationError::Cancelled
    }
}

fn is_transient_status(msg: &str) -> bool {
    let lower = msg.to_lowercase();
    msg.contains("429")
        || msg.contains("502")
        || msg.contains("503")
        || msg.contains("504")
        || lower.contains("unavailable")
        || lower.contains("too many requests")
}

/// Errors related to configuration.
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

    #[error("validation error: {0}")]
    Validation(String),
}

/// Whole-call ingestion failures.
///
/// Failures of individual chunks are not errors; they are collected in
/// [`crate::models::IngestReport`].
#[derive(Debug, Error)]
pub enum IngestError {
    #[error("failed to read document: {0}")]
    ReadError(String),

    #[error("document is empty")]
    EmptyDocument,

    #[error("document is too large: {size} bytes (limit {limit})")]
    TooLarge { size: u64, limit: u64 },

    #[error("document is not plain text: {0}")]
    NotText(String),

    #[error("vector store setup failed: {0}")]
    Setup(#[from] VectorStoreError),

    #[error("ingestion cancelled")]
    Cancelled,
}

impl IngestError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            IngestError::ReadError(_)
            | IngestError::EmptyDocument
            | IngestError::TooLarge { .. }
            | IngestError::NotText(_) => ErrorKind::InvalidRequest,
            IngestError::Setup(VectorStoreError::Timeout(_)) => ErrorKind::Timeout,
            IngestError::Setup(_) => ErrorKind::Store,
            IngestError::Cancelled => ErrorKind::Cancelled,
        }
    }

    /// Message that is safe to show to the requester.
    pub fn user_message(&self) -> String {
        match self {
            IngestError::ReadError(_) => "the document could not be read".to_string(),
            IngestError::EmptyDocument => "the document is empty".to_string(),
            IngestError::TooLarge { limit, .. } => {
                format!("the document exceeds the {limit} byte limit")
            }
            IngestError::NotText(_) => "only plain text documents are supported".to_string(),
            IngestError::Setup(_) => "the vector store is unavailable".to_string(),
            IngestError::Cancelled => "ingestion was cancelled".to_string(),
        }
    }
}

/// Errors that abort a question.
#[derive(Debug, Error)]
pub enum QueryError {
    #[error("invalid question: {0}")]
    InvalidQuestion(String),

    #[error("question embedding failed: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("retrieval failed: {0}")]
    Retrieval(#[from] VectorStoreError),

    #[error("generation failed: {0}")]
    Generation(#[from] GenerationError),
}

impl QueryError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            QueryError::InvalidQuestion(_) => ErrorKind::InvalidRequest,
            QueryError::Embedding(EmbeddingError::Timeout(_))
            | QueryError::Retrieval(VectorStoreError::Timeout(_))
            | QueryError::Generation(GenerationError::Timeout(_)) => ErrorKind::Timeout,
            QueryError::Embedding(EmbeddingError::Cancelled)
            | QueryError::Retrieval(VectorStoreError::Cancelled)
            | QueryError::Generation(GenerationError::Cancelled) => ErrorKind::Cancelled,
            QueryError::Embedding(_) => ErrorKind::Embedding,
            QueryError::Retrieval(_) => ErrorKind::Query,
            QueryError::Generation(_) => ErrorKind::Generation,
        }
    }

    /// Message that is safe to show to the requester.
    pub fn user_message(&self) -> String {
        match self.kind() {
            ErrorKind::InvalidRequest => match self {
                QueryError::InvalidQuestion(reason) => reason.clone(),
                _ => "invalid question".to_string(),
            },
            ErrorKind::Timeout => "a backend service did not respond in time".to_string(),
            ErrorKind::Cancelled => "the question was cancelled".to_string(),
            ErrorKind::Embedding => "the question could not be embedded".to_string(),
            ErrorKind::Query => "relevant documents could not be retrieved".to_string(),
            _ => "the answer could not be generated".to_string(),
        }
    }
}

/// Top-level error for wiring the application together.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("config error: {0}")]
    Config(#[from] ConfigError),

    #[error("embedding error: {0}")]
    Embedding(#[from] EmbeddingError),

    #[error("vector store error: {0}")]
    VectorStore(#[from] VectorStoreError),

    #[error("generation error: {0}")]
    Generation(#[from] GenerationError),

    #[error("ingest error: {0}")]
    Ingest(#[from] IngestError),

    #[error("query error: {0}")]
    Query(#[from] QueryError),

    #[error("{0}")]
    Other(String),
}

impl AppError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            AppError::Config(_) => ErrorKind::Configuration,
            AppError::Embedding(_) => ErrorKind::Embedding,
            AppError::VectorStore(_) => ErrorKind::Store,
            AppError::Generation(_) => ErrorKind::Generation,
            AppError::Ingest(e) => e.kind(),
            AppError::Query(e) => e.kind(),
            AppError::Other(_) => ErrorKind::Internal,
        }
    }

    /// Message that is safe to show to the requester. Config errors are
    /// local and shown as is.
    pub fn user_message(&self) -> String {
        match self {
            AppError::Config(e) => e.to_string(),
            AppError::Embedding(e) => e.user_message(),
            AppError::VectorStore(e) => e.user_message(),
            AppError::Generation(_) => "the answer could not be generated".to_string(),
            AppError::Ingest(e) => e.user_message(),
            AppError::Query(e) => e.user_message(),
            AppError::Other(msg) => msg.clone(),
        }
    }
}
