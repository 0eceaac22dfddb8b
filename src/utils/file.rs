//! Reading plain-text documents from disk.

use sha2::{Digest, Sha256};
use std::path::Path;

use crate::error::IngestError;

/// Bytes inspected when sniffing for binary content.
const SNIFF_LEN: usize = 8192;

/// Calculate SHA-256 checksum of content.
pub fn calculate_checksum(content: &str) -> String {
    let hash = Sha256::digest(content.as_bytes());
    hex::encode(hash)
}

/// Read a UTF-8 plain-text document no larger than `max_bytes`.
pub async fn read_text_document(path: &Path, max_bytes: u64) -> Result<String, IngestError> {
    let metadata = tokio::fs::metadata(path)
        .await
        .map_err(|e| IngestError::ReadError(format!("{}: {}", path.display(), e)))?;

    if !metadata.is_file() {
        return Err(IngestError::ReadError(format!(
            "{} is not a regular file",
            path.display()
        )));
    }

    if metadata.len() > max_bytes {
        return Err(IngestError::TooLarge {
            size: metadata.len(),
            limit: max_bytes,
        });
    }

    let bytes = tokio::fs::read(path)
        .await
        .map_err(|e| IngestError::ReadError(format!("{}: {}", path.display(), e)))?;

    decode_text(bytes, &path.display().to_string())
}

/// Decode raw bytes as a plain-text document, rejecting binary content.
pub fn decode_text(bytes: Vec<u8>, origin: &str) -> Result<String, IngestError> {
    let head = &bytes[..bytes.len().min(SNIFF_LEN)];
    if head.contains(&0) {
        return Err(IngestError::NotText(format!("{origin} contains binary data")));
    }

    String::from_utf8(bytes)
        .map_err(|_| IngestError::NotText(format!("{origin} is not valid UTF-8")))
}
