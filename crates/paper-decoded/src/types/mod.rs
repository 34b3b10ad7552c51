//! Core types for the summarization pipeline

pub mod document;
pub mod summary;

pub use document::{Chunk, Document, DocumentInfo, Page};
pub use summary::{BlogSummary, SectionKind, SummarySection};
