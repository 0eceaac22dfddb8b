mod chunker;
mod embedding;
mod generation;
mod ingest;
mod prompt;
mod query;
pub mod vector_store;

pub use chunker::{TextChunker, split_text};
pub use embedding::{Embedder, OpenAiEmbedder, embed_checked};
pub use generation::{ChatGenerator, GenerationParams, Generator};
pub use ingest::{IngestionPipeline, load_document};
pub use prompt::{CONTEXT_SEPARATOR, PromptTemplate, build_context};
pub use query::QueryPipeline;
pub use vector_store::{MemoryIndex, QdrantIndex, VectorIndex, create_index};

use std::sync::Arc;

use crate::error::{AppError, ConfigError};
use crate::models::Config;

/// Both pipelines wired to one shared set of collaborators.
///
/// Ingestion and querying share the embedder and the index, so vectors
/// written by one are comparable with those searched by the other.
#[derive(Clone)]
pub struct DocQa {
    config: Arc<Config>,
    index: Arc<dyn VectorIndex>,
    ingestion: Arc<IngestionPipeline>,
    query: Arc<QueryPipeline>,
}

impl DocQa {
    /// Connect the configured HTTP clients and vector backend.
    pub fn from_config(config: Config) -> Result<Self, AppError> {
        let embedder: Arc<dyn Embedder> = Arc::new(OpenAiEmbedder::new(&config.embedding)?);
        let generator: Arc<dyn Generator> = Arc::new(ChatGenerator::new(&config.generation)?);
        let index = create_index(&config.vector_store)?;
        Ok(Self::with_collaborators(config, embedder, index, generator)?)
    }

    /// Wire pipelines around caller-supplied collaborators.
    pub fn with_collaborators(
        config: Config,
        embedder: Arc<dyn Embedder>,
        index: Arc<dyn VectorIndex>,
        generator: Arc<dyn Generator>,
    ) -> Result<Self, ConfigError> {
        let ingestion = IngestionPipeline::from_config(&config, embedder.clone(), index.clone())?;
        let query = QueryPipeline::from_config(&config, embedder, index.clone(), generator);

        Ok(Self {
            config: Arc::new(config),
            index,
            ingestion: Arc::new(ingestion),
            query: Arc::new(query),
        })
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn index(&self) -> &Arc<dyn VectorIndex> {
        &self.index
    }

    pub fn ingestion(&self) -> &IngestionPipeline {
        &self.ingestion
    }

    pub fn query(&self) -> &QueryPipeline {
        &self.query
    }
}
