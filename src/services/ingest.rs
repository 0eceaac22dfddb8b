//! Document ingestion: chunk, embed, store.

use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};

use chrono::Utc;
use futures::stream::{self, StreamExt};
use tokio_util::sync::CancellationToken;
use tracing::{info, warn};

use super::chunker::TextChunker;
use super::embedding::{Embedder, embed_checked};
use super::vector_store::VectorIndex;
use crate::error::{ConfigError, ErrorKind, IngestError, VectorStoreError};
use crate::models::{
    Chunk, ChunkFailure, Config, Document, FailureStage, IndexEntry, IngestReport,
};
use crate::utils::{CallGuard, RetryConfig, read_text_document, with_retry};

/// Splits documents into chunks and stores one embedded entry per chunk.
///
/// A failing chunk never aborts the document: it is recorded in the
/// returned [`IngestReport`] and the remaining chunks are still processed.
pub struct IngestionPipeline {
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    chunker: TextChunker,
    retry: RetryConfig,
    embed_timeout: Duration,
    store_timeout: Duration,
    concurrency: usize,
}

impl IngestionPipeline {
    pub fn new(
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        chunker: TextChunker,
    ) -> Self {
        Self {
            embedder,
            index,
            chunker,
            retry: RetryConfig::default(),
            embed_timeout: Duration::from_secs(60),
            store_timeout: Duration::from_secs(30),
            concurrency: 4,
        }
    }

    /// Build a pipeline with chunking, retry and timeout settings taken
    /// from `config`.
    pub fn from_config(
        config: &Config,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
    ) -> Result<Self, ConfigError> {
        let chunker = TextChunker::from_config(&config.chunking)?;

        Ok(Self::new(embedder, index, chunker)
            .with_retry(RetryConfig::from_settings(&config.retry))
            .with_timeouts(
                Duration::from_secs(config.embedding.timeout_secs),
                Duration::from_secs(config.vector_store.timeout_secs),
            )
            .with_concurrency(config.chunking.concurrency))
    }

    #[must_use]
    pub fn with_retry(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    #[must_use]
    pub fn with_timeouts(mut self, embed: Duration, store: Duration) -> Self {
        self.embed_timeout = embed;
        self.store_timeout = store;
        self
    }

    #[must_use]
    pub fn with_concurrency(mut self, concurrency: usize) -> Self {
        self.concurrency = concurrency.max(1);
        self
    }

    pub fn chunker(&self) -> &TextChunker {
        &self.chunker
    }

    /// Ingest one document.
    ///
    /// Returns `Err` only when nothing could be attempted (empty document,
    /// collection setup failure) or the run was cancelled. Per-chunk
    /// failures are reported in the `Ok` value.
    pub async fn ingest(
        &self,
        document: &Document,
        cancel: &CancellationToken,
    ) -> Result<IngestReport, IngestError> {
        let start = Instant::now();

        let chunks = self.chunker.chunk(document);
        if chunks.is_empty() {
            return Err(IngestError::EmptyDocument);
        }

        info!(
            source = %document.source,
            document_id = %document.id,
            chunks = chunks.len(),
            "ingesting document"
        );

        let dimension = self.embedder.dimension();
        let setup_guard = CallGuard::new(self.store_timeout, cancel.clone());
        with_retry(&self.retry, cancel, "ensure collection", || {
            setup_guard.run(self.index.ensure_collection(dimension))
        })
        .await
        .map_err(|e| match e {
            VectorStoreError::Cancelled => IngestError::Cancelled,
            other => IngestError::Setup(other),
        })?;

        // Owned chunks keep the stream future `Send` for the HTTP handlers.
        let outcomes: Vec<Result<(), ChunkFailure>> = stream::iter(chunks)
            .map(|chunk| async move {
                self.ingest_chunk(document, &chunk, dimension, cancel).await
            })
            .buffer_unordered(self.concurrency)
            .collect()
            .await;

        let attempted = outcomes.len();
        let mut failures: Vec<ChunkFailure> =
            outcomes.into_iter().filter_map(Result::err).collect();
        failures.sort_by_key(|f| f.index);
        let stored = attempted - failures.len();

        if cancel.is_cancelled() {
            warn!(
                source = %document.source,
                stored,
                attempted,
                "ingestion cancelled"
            );
            return Err(IngestError::Cancelled);
        }

        let report = IngestReport {
            document_id: document.id.clone(),
            source: document.source.clone(),
            checksum: document.checksum.clone(),
            attempted,
            stored,
            failures,
            duration_ms: start.elapsed().as_millis() as u64,
            ingested_at: Utc::now(),
        };

        info!(
            source = %report.source,
            stored = report.stored,
            failed = report.failed(),
            duration_ms = report.duration_ms,
            "ingestion finished"
        );

        Ok(report)
    }

    async fn ingest_chunk(
        &self,
        document: &Document,
        chunk: &Chunk,
        dimension: usize,
        cancel: &CancellationToken,
    ) -> Result<(), ChunkFailure> {
        let embed_guard = CallGuard::new(self.embed_timeout, cancel.clone());
        let vector = embed_checked(
            self.embedder.as_ref(),
            &chunk.text,
            dimension,
            &embed_guard,
            &self.retry,
        )
        .await
        .map_err(|e| {
            chunk_failure(chunk, FailureStage::Embed, e.kind(), e.user_message(), &e)
        })?;

        let entry = IndexEntry::new(chunk, &document.source, vector);
        let store_guard = CallGuard::new(self.store_timeout, cancel.clone());
        with_retry(&self.retry, cancel, "store chunk", || {
            store_guard.run(self.index.add(entry.clone()))
        })
        .await
        .map_err(|e| {
            chunk_failure(chunk, FailureStage::Store, e.kind(), e.user_message(), &e)
        })
    }
}

/// Read a plain-text file into a [`Document`] named by its canonical path,
/// so the same file keeps the same ids however it is referred to.
pub async fn load_document(path: &Path, max_bytes: u64) -> Result<Document, IngestError> {
    let canonical = tokio::fs::canonicalize(path)
        .await
        .map_err(|e| IngestError::ReadError(format!("{}: {}", path.display(), e)))?;
    let content = read_text_document(&canonical, max_bytes).await?;
    Ok(Document::new(canonical.display().to_string(), content))
}

/// The backend error is logged in full; the report only carries its kind
/// and a fixed message, since reports are returned to HTTP callers.
fn chunk_failure(
    chunk: &Chunk,
    stage: FailureStage,
    kind: ErrorKind,
    reason: String,
    error: &dyn std::fmt::Display,
) -> ChunkFailure {
    warn!(index = chunk.index, %stage, %kind, error = %error, "chunk failed");
    ChunkFailure {
        index: chunk.index,
        stage,
        kind,
        reason,
    }
}
