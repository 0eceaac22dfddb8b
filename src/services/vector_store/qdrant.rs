//! Qdrant vector index backend.

use async_trait::async_trait;
use qdrant_client::Qdrant;
use qdrant_client::qdrant::value::Kind;
use qdrant_client::qdrant::{
    CreateCollectionBuilder, Distance, PointStruct, SearchPointsBuilder, UpsertPointsBuilder,
    Value, VectorParamsBuilder,
};
use std::collections::HashMap;
use tracing::{debug, info};

use super::VectorIndex;
use crate::error::VectorStoreError;
use crate::models::{IndexEntry, RetrievedChunk, VectorStoreConfig};

/// Qdrant vector index backend.
pub struct QdrantIndex {
    client: Qdrant,
    collection: String,
}

impl QdrantIndex {
    pub fn new(config: &VectorStoreConfig) -> Result<Self, VectorStoreError> {
        let mut builder = Qdrant::from_url(&config.url);

        if let Some(ref api_key) = config.api_key {
            builder = builder.api_key(api_key.clone());
        }

        let client = builder
            .build()
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            collection: config.collection.clone(),
        })
    }

    fn payload(entry: IndexEntry) -> HashMap<String, Value> {
        let mut payload: HashMap<String, Value> = HashMap::new();
        payload.insert("content".to_string(), entry.text.into());
        payload.insert("document_id".to_string(), entry.document_id.into());
        payload.insert(
            "chunk_index".to_string(),
            i64::from(entry.chunk_index).into(),
        );
        payload.insert("source".to_string(), entry.source.into());
        payload
    }
}

fn payload_str(payload: &HashMap<String, Value>, key: &str) -> Option<String> {
    payload.get(key).and_then(|v| match &v.kind {
        Some(Kind::StringValue(s)) => Some(s.clone()),
        _ => None,
    })
}

fn is_missing_collection(msg: &str) -> bool {
    msg.contains("not found") || msg.contains("doesn't exist")
}

fn is_existing_collection(msg: &str) -> bool {
    msg.contains("already exists")
}

#[async_trait]
impl VectorIndex for QdrantIndex {
    async fn health_check(&self) -> Result<bool, VectorStoreError> {
        self.client
            .health_check()
            .await
            .map(|_| true)
            .map_err(|e| VectorStoreError::ConnectionError(e.to_string()))
    }

    async fn ensure_collection(&self, dimension: usize) -> Result<(), VectorStoreError> {
        if self.count().await?.is_some() {
            return Ok(());
        }

        let create_collection = CreateCollectionBuilder::new(&self.collection).vectors_config(
            VectorParamsBuilder::new(dimension as u64, Distance::Cosine),
        );

        match self.client.create_collection(create_collection).await {
            Ok(_) => {
                info!(collection = %self.collection, dimension, "created collection");
                Ok(())
            }
            // A concurrent ingestion created it between the check and here.
            Err(e) if is_existing_collection(&e.to_string()) => Ok(()),
            Err(e) => Err(VectorStoreError::CollectionError(e.to_string())),
        }
    }

    async fn count(&self) -> Result<Option<u64>, VectorStoreError> {
        match self.client.collection_info(&self.collection).await {
            Ok(info) => Ok(Some(
                info.result.map_or(0, |r| r.points_count.unwrap_or(0)),
            )),
            Err(e) => {
                let msg = e.to_string();
                if is_missing_collection(&msg) {
                    Ok(None)
                } else {
                    Err(VectorStoreError::CollectionError(msg))
                }
            }
        }
    }

    async fn add(&self, mut entry: IndexEntry) -> Result<(), VectorStoreError> {
        let id = entry.id.clone();
        let vector = std::mem::take(&mut entry.vector);
        let point = PointStruct::new(id, vector, Self::payload(entry));

        self.client
            .upsert_points(UpsertPointsBuilder::new(&self.collection, vec![point]).wait(true))
            .await
            .map_err(|e| VectorStoreError::UpsertError(e.to_string()))?;

        Ok(())
    }

    async fn query(
        &self,
        vector: &[f32],
        k: usize,
    ) -> Result<Vec<RetrievedChunk>, VectorStoreError> {
        let search =
            SearchPointsBuilder::new(&self.collection, vector.to_vec(), k as u64).with_payload(true);

        let response = match self.client.search_points(search).await {
            Ok(response) => response,
            Err(e) => {
                let msg = e.to_string();
                // Nothing has been ingested yet.
                if is_missing_collection(&msg) {
                    debug!(collection = %self.collection, "query against missing collection");
                    return Ok(Vec::new());
                }
                return Err(VectorStoreError::SearchError(msg));
            }
        };

        let results = response
            .result
            .into_iter()
            .map(|point| {
                let id = match point.id.and_then(|id| id.point_id_options) {
                    Some(qdrant_client::qdrant::point_id::PointIdOptions::Uuid(uuid)) => uuid,
                    Some(qdrant_client::qdrant::point_id::PointIdOptions::Num(num)) => {
                        num.to_string()
                    }
                    None => String::new(),
                };

                RetrievedChunk {
                    id,
                    text: payload_str(&point.payload, "content").unwrap_or_default(),
                    score: point.score,
                    source: payload_str(&point.payload, "source"),
                }
            })
            .collect();

        Ok(results)
    }

    fn collection(&self) -> &str {
        &self.collection
    }
}
