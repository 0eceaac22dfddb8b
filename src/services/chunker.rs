//! Fixed-size text chunking with overlap.
//!
//! Windows are measured in characters (Unicode scalar values), never bytes,
//! and may start or end mid-word.

use crate::error::ConfigError;
use crate::models::{Chunk, ChunkingConfig, Document};

/// Splits text into overlapping windows of `chunk_size` characters.
#[derive(Debug, Clone)]
pub struct TextChunker {
    chunk_size: usize,
    overlap: usize,
}

impl TextChunker {
    /// Create a chunker, rejecting parameters that could not advance the window.
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self, ConfigError> {
        ChunkingConfig {
            chunk_size,
            chunk_overlap: overlap,
            ..Default::default()
        }
        .validate()?;

        Ok(Self {
            chunk_size,
            overlap,
        })
    }

    pub fn from_config(config: &ChunkingConfig) -> Result<Self, ConfigError> {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    pub fn chunk_size(&self) -> usize {
        self.chunk_size
    }

    pub fn overlap(&self) -> usize {
        self.overlap
    }

    /// Split text into chunk strings.
    pub fn split(&self, text: &str) -> Vec<String> {
        self.windows(text)
            .into_iter()
            .map(|(text, _, _)| text.to_string())
            .collect()
    }

    /// Chunk a document, assigning stable ids from the document id and position.
    pub fn chunk(&self, document: &Document) -> Vec<Chunk> {
        self.windows(&document.content)
            .into_iter()
            .enumerate()
            .map(|(idx, (text, start, end))| {
                let index = idx as u32;
                Chunk {
                    id: Chunk::generate_id(&document.id, index),
                    document_id: document.id.clone(),
                    index,
                    text: text.to_string(),
                    start,
                    end,
                }
            })
            .collect()
    }

    /// Windows over the trimmed text as (slice, start char, end char).
    fn windows<'a>(&self, text: &'a str) -> Vec<(&'a str, usize, usize)> {
        let text = text.trim();
        if text.is_empty() {
            return Vec::new();
        }

        // Byte offset of every char boundary, including the end of the text.
        let bounds: Vec<usize> = text
            .char_indices()
            .map(|(i, _)| i)
            .chain(std::iter::once(text.len()))
            .collect();
        let total = bounds.len() - 1;

        if total <= self.chunk_size {
            return vec![(text, 0, total)];
        }

        let step = self.chunk_size - self.overlap;
        let mut windows = Vec::with_capacity(total.div_ceil(step));
        let mut start = 0;

        while start < total {
            let end = (start + self.chunk_size).min(total);
            windows.push((&text[bounds[start]..bounds[end]], start, end));

            // The next window would sit entirely inside this one's overlap.
            if end == total {
                break;
            }
            start += step;
        }

        windows
    }
}

/// Split `text` into windows of `chunk_size` characters sharing `overlap`
/// characters with their predecessor.
pub fn split_text(
    text: &str,
    chunk_size: usize,
    overlap: usize,
) -> Result<Vec<String>, ConfigError> {
    Ok(TextChunker::new(chunk_size, overlap)?.split(text))
}
