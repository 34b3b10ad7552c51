//! Fixed-size character chunking with page tracking

use crate::config::ChunkingConfig;
use crate::error::Result;
use crate::types::{Chunk, Page};

/// Text chunker with configurable size and overlap.
///
/// Windows are measured in Unicode scalar values and advance by
/// `chunk_size - overlap`, so consecutive chunks of a page share exactly
/// `overlap` characters. Sentence boundaries are not respected.
#[derive(Debug, Clone)]
pub struct TextChunker {
    /// Maximum chunk size in characters
    chunk_size: usize,
    /// Overlap between consecutive chunks
    overlap: usize,
}

impl TextChunker {
    /// Create a new chunker, rejecting `overlap >= chunk_size`
    pub fn new(chunk_size: usize, overlap: usize) -> Result<Self> {
        Self::from_config(&ChunkingConfig {
            chunk_size,
            chunk_overlap: overlap,
        })
    }

    /// Create from configuration
    pub fn from_config(config: &ChunkingConfig) -> Result<Self> {
        config.validate()?;
        Ok(Self {
            chunk_size: config.chunk_size,
            overlap: config.chunk_overlap,
        })
    }

    /// Chunk every page in order; chunk indices run across the whole document
    pub fn chunk_pages(&self, pages: &[Page]) -> Vec<Chunk> {
        let mut chunks = Vec::new();

        for page in pages.iter().filter(|p| p.has_text()) {
            for (char_start, content) in self.split_text(&page.text) {
                let index = chunks.len() as u32;
                chunks.push(Chunk::new(index, page.number, char_start, content));
            }
        }

        tracing::debug!(
            "Split {} page(s) into {} chunk(s) (size {}, overlap {})",
            pages.len(),
            chunks.len(),
            self.chunk_size,
            self.overlap
        );

        chunks
    }

    /// Split one text into `(char_offset, window)` pairs
    pub fn split_text(&self, text: &str) -> Vec<(usize, String)> {
        if text.trim().is_empty() {
            return Vec::new();
        }

        let chars: Vec<char> = text.chars().collect();
        let step = self.chunk_size - self.overlap;
        let mut windows = Vec::new();
        let mut start = 0usize;

        loop {
            let end = (start + self.chunk_size).min(chars.len());
            windows.push((start, chars[start..end].iter().collect()));

            if end == chars.len() {
                break;
            }
            start += step;
        }

        windows
    }
}
