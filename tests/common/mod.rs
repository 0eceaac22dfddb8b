//! In-process collaborators for driving the pipelines without network access.

#![allow(dead_code)]

use std::sync::Arc;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use docqa::error::{EmbeddingError, GenerationError, VectorStoreError};
use docqa::models::{Config, IndexEntry, RetrievedChunk, RetrySettings, VectorDriver};
use docqa::services::{DocQa, Embedder, GenerationParams, Generator, MemoryIndex, VectorIndex};

/// Words the keyword embedder counts; one vector component per word plus a
/// constant component so no vector is all zeros.
pub const VOCABULARY: [&str; 7] = ["cat", "mat", "dog", "sat", "rust", "crab", "part"];

pub const DIMENSION: usize = VOCABULARY.len() + 1;

/// Bag-of-words embedder over [`VOCABULARY`].
#[derive(Default)]
pub struct KeywordEmbedder {
    /// Text containing this marker fails with a permanent error whose
    /// message carries a credential.
    pub fail_on: Option<String>,
    /// Number of leading calls that fail with a transient error.
    pub transient_failures: usize,
    pub calls: AtomicUsize,
}

impl KeywordEmbedder {
    pub fn failing_on(marker: &str) -> Self {
        Self {
            fail_on: Some(marker.to_string()),
            ..Default::default()
        }
    }

    pub fn flaky(transient_failures: usize) -> Self {
        Self {
            transient_failures,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

pub fn keyword_vector(text: &str) -> Vec<f32> {
    let lower = text.to_lowercase();
    let mut vector: Vec<f32> = VOCABULARY
        .iter()
        .map(|word| lower.matches(word).count() as f32)
        .collect();
    vector.push(0.1);
    vector
}

#[async_trait]
impl Embedder for KeywordEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>, EmbeddingError> {
        let call = self.calls.fetch_add(1, Ordering::SeqCst);
        if call < self.transient_failures {
            return Err(EmbeddingError::ServerError(
                "status 503 Service Unavailable: overloaded".to_string(),
            ));
        }
        if let Some(ref marker) = self.fail_on
            && text.contains(marker.as_str())
        {
            return Err(EmbeddingError::ServerError(
                "status 401 Unauthorized: Incorrect API key provided: sk-SECRET123".to_string(),
            ));
        }
        Ok(keyword_vector(text))
    }

    fn dimension(&self) -> usize {
        DIMENSION
    }
}

/// Generator that records every prompt and replies with a fixed answer.
pub struct RecordingGenerator {
    pub reply: String,
    pub prompts: Mutex<Vec<String>>,
    pub params: Mutex<Vec<GenerationParams>>,
}

impl RecordingGenerator {
    pub fn new(reply: &str) -> Self {
        Self {
            reply: reply.to_string(),
            prompts: Mutex::new(Vec::new()),
            params: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl Generator for RecordingGenerator {
    async fn generate(
        &self,
        prompt: &str,
        params: GenerationParams,
    ) -> Result<String, GenerationError> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        self.params.lock().unwrap().push(params);
        Ok(self.reply.clone())
    }
}

/// Generator that always fails with a permanent server error.
#[derive(Default)]
pub struct FailingGenerator {
    pub calls: AtomicUsize,
}

impl FailingGenerator {
    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Generator for FailingGenerator {
    async fn generate(
        &self,
        _prompt: &str,
        _params: GenerationParams,
    ) -> Result<String, GenerationError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(GenerationError::ServerError(
            "status 500 Internal Server Error: model crashed".to_string(),
        ))
    }
}

/// Memory index that rejects writes of entries whose text contains a
/// marker, and optionally fails every query.
pub struct RejectingIndex {
    pub inner: MemoryIndex,
    pub reject_text: Option<String>,
    pub fail_queries: bool,
}

impl RejectingIndex {
    pub fn rejecting(marker: &str) -> Self {
        Self {
            inner: MemoryIndex::new("doc_qa_collection"),
            reject_text: Some(marker.to_string()),
            fail_queries: false,
        }
    }

    pub fn failing_queries() -> Self {
        Self {
            inner: MemoryIndex::new("doc_qa_collection"),
            reject_text: None,
            fail_queries: true,
        }
    }
}

#[async_trait]
impl VectorIndex for RejectingIndex {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.inner.health_check().await
    }

    async fn ensure_collection(&self, dimension: usize) -> Result<(), VectorStoreError> {
        self.inner.ensure_collection(dimension).await
    }

    async fn count(&self) -> Result<Option<u64>, VectorStoreError> {
        self.inner.count().await
    }

    async fn add(&self, entry: IndexEntry) -> Result<(), VectorStoreError> {
        if let Some(ref marker) = self.reject_text
            && entry.text.contains(marker.as_str())
        {
            return Err(VectorStoreError::UpsertError(
                "status 400: payload rejected by shard 10.0.0.5".to_string(),
            ));
        }
        self.inner.add(entry).await
    }

    async fn query(
        &self,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedChunk>, VectorStoreError> {
        if self.fail_queries {
            return Err(VectorStoreError::SearchError(
                "grpc: internal error at 10.0.0.5".to_string(),
            ));
        }
        self.inner.query(vector, k).await
    }

    fn collection(&self) -> &str {
        self.inner.collection()
    }
}

/// Pipelines over arbitrary collaborators.
pub fn docqa_with(
    config: Config,
    embedder: Arc<dyn Embedder>,
    index: Arc<dyn VectorIndex>,
    generator: Arc<dyn Generator>,
) -> DocQa {
    DocQa::with_collaborators(config, embedder, index, generator).expect("valid test config")
}

/// Config tuned for tests: small chunks, the memory driver and fast retries.
pub fn test_config(chunk_size: usize, chunk_overlap: usize) -> Config {
    let mut config = Config::default();
    config.embedding.dimension = DIMENSION as u32;
    config.vector_store.driver = VectorDriver::Memory;
    config.chunking.chunk_size = chunk_size;
    config.chunking.chunk_overlap = chunk_overlap;
    config.chunking.concurrency = 2;
    config.retry = RetrySettings {
        max_attempts: 3,
        initial_delay_ms: 1,
        max_delay_ms: 5,
    };
    config
}

pub struct Harness {
    pub docqa: DocQa,
    pub embedder: Arc<KeywordEmbedder>,
    pub index: Arc<MemoryIndex>,
    pub generator: Arc<RecordingGenerator>,
}

pub fn harness(config: Config, embedder: KeywordEmbedder, reply: &str) -> Harness {
    let embedder = Arc::new(embedder);
    let index = Arc::new(MemoryIndex::new(config.vector_store.collection.clone()));
    let generator = Arc::new(RecordingGenerator::new(reply));

    let docqa = DocQa::with_collaborators(
        config,
        embedder.clone(),
        index.clone(),
        generator.clone(),
    )
    .expect("valid test config");

    Harness {
        docqa,
        embedder,
        index,
        generator,
    }
}
