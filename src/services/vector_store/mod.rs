//! Vector index abstraction layer.
//!
//! The pipelines only need upsert-by-id and nearest-neighbour lookup; this
//! module puts those behind [`VectorIndex`] so Qdrant and the in-process
//! index can be swapped by configuration.

mod memory;
mod qdrant;

pub use memory::MemoryIndex;
pub use qdrant::QdrantIndex;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::VectorStoreError;
use crate::models::{IndexEntry, RetrievedChunk, VectorDriver, VectorStoreConfig};

/// Stores (id, vector, text) entries and answers nearest-neighbour queries.
///
/// Implementations must be safe for concurrent `add` and `query` calls.
#[async_trait]
pub trait VectorIndex: Send + Sync {
    /// Check if the backend is reachable.
    async fn health_check(&self) -> Result<bool, VectorStoreError>;

    /// Create the collection for vectors of `dimension` if it does not exist.
    async fn ensure_collection(&self, dimension: usize) -> Result<(), VectorStoreError>;

    /// Number of stored entries, or `None` if the collection does not exist.
    async fn count(&self) -> Result<Option<u64>, VectorStoreError>;

    /// Insert an entry, replacing any previous entry with the same id.
    async fn add(&self, entry: IndexEntry) -> Result<(), VectorStoreError>;

    /// Up to `k` entries nearest to `vector`, ordered by decreasing score.
    /// Returns fewer than `k` (possibly none) when the index holds fewer.
    async fn query(&self, vector: &[f32], k: usize)
    -> Result<Vec<RetrievedChunk>, VectorStoreError>;

    /// Get the collection name.
    fn collection(&self) -> &str;
}

/// Create the backend selected by `config.driver`.
pub fn create_index(config: &VectorStoreConfig) -> Result<Arc<dyn VectorIndex>, VectorStoreError> {
    match config.driver {
        VectorDriver::Qdrant => Ok(Arc::new(QdrantIndex::new(config)?)),
        VectorDriver::Memory => Ok(Arc::new(MemoryIndex::new(config.collection.clone()))),
    }
}

/// Cosine similarity; 0.0 when either vector has zero magnitude.
pub(crate) fn cosine_similarity(a: &[f32], b: &[f32]) -> f32 {
    let dot: f32 = a.iter().zip(b.iter()).map(|(x, y)| x * y).sum();
    let norm_a: f32 = a.iter().map(|x| x * x).sum::<f32>().sqrt();
    let norm_b: f32 = b.iter().map(|x| x * x).sum::<f32>().sqrt();
    if norm_a == 0.0 || norm_b == 0.0 {
        return 0.0;
    }
    dot / (norm_a * norm_b)
}
