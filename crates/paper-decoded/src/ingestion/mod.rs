//! PDF ingestion and chunking

mod chunker;
mod parser;

pub use chunker::TextChunker;
pub use parser::{cleanup_pdf_text, hash_bytes, PdfIngestor};
