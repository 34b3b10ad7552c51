//! Document, page and chunk types with page tracking

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Text of a single PDF page
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Page {
    /// Page number (1-indexed)
    pub number: u32,
    /// Extracted text content of the page
    pub text: String,
}

impl Page {
    /// Create a new page
    pub fn new(number: u32, text: impl Into<String>) -> Self {
        Self {
            number,
            text: text.into(),
        }
    }

    /// Whether the page has any extractable text
    pub fn has_text(&self) -> bool {
        !self.text.trim().is_empty()
    }
}

/// An uploaded paper: ordered page texts plus provenance
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Document {
    /// Unique document ID
    pub id: Uuid,
    /// Original filename as uploaded by user
    pub filename: String,
    /// SHA-256 of the raw file bytes
    pub content_hash: String,
    /// File size in bytes
    pub file_size: u64,
    /// Ordered page texts
    pub pages: Vec<Page>,
    /// Ingestion timestamp
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

impl Document {
    /// Create a new document
    pub fn new(filename: impl Into<String>, content_hash: String, file_size: u64, pages: Vec<Page>) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            content_hash,
            file_size,
            pages,
            ingested_at: chrono::Utc::now(),
        }
    }

    /// Number of pages in the PDF
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Whether any page carries extractable text
    pub fn has_text(&self) -> bool {
        self.pages.iter().any(Page::has_text)
    }

    /// Total extracted characters across all pages
    pub fn char_count(&self) -> usize {
        self.pages.iter().map(|p| p.text.chars().count()).sum()
    }
}

/// A bounded window of page text used as the retrieval unit
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chunk {
    /// Position of the chunk within the document (0-indexed)
    pub index: u32,
    /// Page the chunk was cut from (1-indexed)
    pub page_number: u32,
    /// Character offset of the chunk within its page
    pub char_start: usize,
    /// Chunk text
    pub content: String,
}

impl Chunk {
    /// Create a new chunk
    pub fn new(index: u32, page_number: u32, char_start: usize, content: String) -> Self {
        Self {
            index,
            page_number,
            char_start,
            content,
        }
    }

    /// Length in characters
    pub fn char_len(&self) -> usize {
        self.content.chars().count()
    }
}

/// Summary of a processed document returned to clients
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentInfo {
    pub id: Uuid,
    pub filename: String,
    pub content_hash: String,
    pub file_size: u64,
    pub page_count: usize,
    pub chunk_count: usize,
    pub ingested_at: chrono::DateTime<chrono::Utc>,
}

impl DocumentInfo {
    /// Build from a document and its chunk count
    pub fn new(doc: &Document, chunk_count: usize) -> Self {
        Self {
            id: doc.id,
            filename: doc.filename.clone(),
            content_hash: doc.content_hash.clone(),
            file_size: doc.file_size,
            page_count: doc.page_count(),
            chunk_count,
            ingested_at: doc.ingested_at,
        }
    }
}
