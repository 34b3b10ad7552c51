//! paper-decoded: turn a research paper PDF into a blog-style summary
//!
//! A PDF is split into overlapping chunks, embedded into an in-memory
//! vector index, and four fixed questions (problem, methodology, key
//! takeaways, conclusion) are answered by an LLM from the retrieved chunks.

pub mod config;
pub mod error;
pub mod generation;
pub mod ingestion;
pub mod pipeline;
pub mod providers;
pub mod retrieval;
pub mod server;
pub mod types;

pub use config::RagConfig;
pub use error::{Error, Result};
pub use pipeline::{ProcessingStep, Session, SessionState};
pub use types::{BlogSummary, Chunk, Document, DocumentInfo, Page, SectionKind, SummarySection};
