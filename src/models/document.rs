use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

use crate::utils::calculate_checksum;

/// Raw text read for one ingestion call.
#[derive(Debug, Clone)]
pub struct Document {
    pub id: String,
    /// Where the text came from (a path, or a caller-supplied label).
    pub source: String,
    pub content: String,
    pub checksum: String,
}

impl Document {
    pub fn generate_id(source: &str) -> String {
        let hash = Sha256::digest(source.as_bytes());
        hex::encode(&hash[..16])
    }

    pub fn new(source: impl Into<String>, content: String) -> Self {
        let source = source.into();
        Self {
            id: Self::generate_id(&source),
            checksum: calculate_checksum(&content),
            source,
            content,
        }
    }

    /// A document without a natural source; its content checksum names it.
    pub fn inline(content: String) -> Self {
        let source = format!("inline:{}", &calculate_checksum(&content)[..16]);
        Self::new(source, content)
    }
}

/// A contiguous window of a document's trimmed text.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Chunk {
    pub id: String,
    pub document_id: String,
    pub index: u32,
    pub text: String,
    /// Character offsets into the trimmed document text.
    pub start: usize,
    pub end: usize,
}

impl Chunk {
    /// Stable chunk id: same document and position always map to the same id.
    pub fn generate_id(document_id: &str, index: u32) -> String {
        use uuid::Uuid;
        let name = format!("{}:{}", document_id, index);
        Uuid::new_v5(&Uuid::NAMESPACE_OID, name.as_bytes()).to_string()
    }
}

/// What the vector index stores per chunk.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IndexEntry {
    pub id: String,
    pub vector: Vec<f32>,
    pub text: String,
    pub document_id: String,
    pub chunk_index: u32,
    pub source: String,
}

impl IndexEntry {
    pub fn new(chunk: &Chunk, source: &str, vector: Vec<f32>) -> Self {
        Self {
            id: chunk.id.clone(),
            vector,
            text: chunk.text.clone(),
            document_id: chunk.document_id.clone(),
            chunk_index: chunk.index,
            source: source.to_string(),
        }
    }
}
