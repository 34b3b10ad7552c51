//! Vector index and retrieval

mod index;
mod retriever;

pub use index::{cosine_similarity, DistanceMetric, SearchHit, VectorIndex};
pub use retriever::{Retrieved, Retriever, CONTEXT_SEPARATOR};
