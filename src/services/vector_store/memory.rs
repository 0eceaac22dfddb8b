//! In-process vector index using cosine similarity.

use std::collections::HashMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{VectorIndex, cosine_similarity};
use crate::error::VectorStoreError;
use crate::models::{IndexEntry, RetrievedChunk};

#[derive(Debug, Default)]
struct MemoryCollection {
    dimension: Option<usize>,
    entries: HashMap<String, IndexEntry>,
}

impl MemoryCollection {
    /// Fix the dimension on first use and reject vectors of any other length.
    fn check_dimension(&mut self, actual: usize) -> Result<(), VectorStoreError> {
        match self.dimension {
            Some(expected) if expected != actual => {
                Err(VectorStoreError::DimensionMismatch { expected, actual })
            }
            Some(_) => Ok(()),
            None => {
                self.dimension = Some(actual);
                Ok(())
            }
        }
    }
}

/// Vector index kept in memory; contents do not outlive the process.
#[derive(Debug)]
pub struct MemoryIndex {
    collection: String,
    inner: RwLock<MemoryCollection>,
}

impl MemoryIndex {
    pub fn new(collection: impl Into<String>) -> Self {
        Self {
            collection: collection.into(),
            inner: RwLock::new(MemoryCollection::default()),
        }
    }

    pub async fn len(&self) -> usize {
        self.inner.read().await.entries.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }

    pub async fn get(&self, id: &str) -> Option<IndexEntry> {
        self.inner.read().await.entries.get(id).cloned()
    }
}

#[async_trait]
impl VectorIndex for MemoryIndex {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        Ok(true)
    }

    async fn ensure_collection(&self, dimension: usize) -> Result<(), VectorStoreError> {
        self.inner.write().await.check_dimension(dimension)
    }

    async fn count(&self) -> Result<Option<u64>, VectorStoreError> {
        Ok(Some(self.len().await as u64))
    }

    async fn add(&self, entry: IndexEntry) -> Result<(), VectorStoreError> {
        let mut inner = self.inner.write().await;
        inner.check_dimension(entry.vector.len())?;
        inner.entries.insert(entry.id.clone(), entry);
        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedChunk>, VectorStoreError> {
        let inner = self.inner.read().await;
        if let Some(expected) = inner.dimension
            && expected != vector.len()
        {
            return Err(VectorStoreError::DimensionMismatch {
                expected,
                actual: vector.len(),
            });
        }

        let mut scored: Vec<RetrievedChunk> = inner
            .entries
            .values()
            .map(|entry| RetrievedChunk {
                id: entry.id.clone(),
                text: entry.text.clone(),
                score: cosine_similarity(&entry.vector, vector),
                source: Some(entry.source.clone()),
            })
            .collect();

        scored.sort_by(|a, b| {
            b.score
                .partial_cmp(&a.score)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| a.id.cmp(&b.id))
        });
        scored.truncate(k);
        Ok(scored)
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn entry(id: &str, vector: Vec<f32>, text: &str) -> IndexEntry {
        IndexEntry {
            id: id.to_string(),
            vector,
            text: text.to_string(),
            document_id: "doc".to_string(),
            chunk_index: 0,
            source: "test".to_string(),
        }
    }

    #[tokio::test]
    async fn test_query_empty_index() {
        let index = MemoryIndex::new("test");
        let results = index.query(&[1.0, 0.0], 3).await.unwrap();
        assert!(results.is_empty());
    }

    #[tokio::test]
    async fn test_query_returns_fewer_than_k_in_score_order() {
        let index = MemoryIndex::new("test");
        index.add(entry("a", vec![0.0, 1.0], "far")).await.unwrap();
        index.add(entry("b", vec![1.0, 0.1], "near")).await.unwrap();

        let results = index.query(&[1.0, 0.0], 3).await.unwrap();
        assert_eq!(results.len(), 2);
        assert_eq!(results[0].text, "near");
        assert_eq!(results[1].text, "far");
        assert!(results[0].score > results[1].score);
    }

    #[tokio::test]
    async fn test_add_upserts_by_id() {
        let index = MemoryIndex::new("test");
        index.add(entry("a", vec![1.0, 0.0], "old")).await.unwrap();
        index.add(entry("a", vec![0.0, 1.0], "new")).await.unwrap();

        assert_eq!(index.len().await, 1);
        assert_eq!(index.get("a").await.unwrap().text, "new");
    }

    #[tokio::test]
    async fn test_dimension_is_enforced() {
        let index = MemoryIndex::new("test");
        index.ensure_collection(2).await.unwrap();

        let err = index.add(entry("a", vec![1.0, 0.0, 0.0], "x")).await.unwrap_err();
        assert!(matches!(
            err,
            VectorStoreError::DimensionMismatch {
                expected: 2,
                actual: 3
            }
        ));

        let err = index.query(&[1.0], 1).await.unwrap_err();
        assert!(matches!(err, VectorStoreError::DimensionMismatch { .. }));
    }

    #[tokio::test]
    async fn test_truncates_to_k() {
        let index = MemoryIndex::new("test");
        for i in 0..5 {
            index
                .add(entry(&format!("id{i}"), vec![1.0, i as f32], "t"))
                .await
                .unwrap();
        }
        let results = index.query(&[1.0, 0.0], 3).await.unwrap();
        assert_eq!(results.len(), 3);
        assert_eq!(results[0].id, "id0");
    }
}
