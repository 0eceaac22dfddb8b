pub mod cli;
pub mod error;
pub mod models;
pub mod server;
pub mod services;
pub mod utils;

pub use cli::{Cli, Commands};
pub use error::{AppError, ErrorKind, IngestError, QueryError};
pub use models::{Answer, Config, Document, IngestReport, OutputFormat, RetrievedChunk};
pub use services::{
    DocQa, Embedder, Generator, IngestionPipeline, MemoryIndex, QueryPipeline, TextChunker,
    VectorIndex,
};
