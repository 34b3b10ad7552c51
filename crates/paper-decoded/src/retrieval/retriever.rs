//! Question-to-context retrieval

use std::sync::Arc;

use crate::error::Result;
use crate::providers::EmbeddingProvider;

use super::index::{SearchHit, VectorIndex};

/// Separator placed between retrieved chunk texts
pub const CONTEXT_SEPARATOR: &str = "\n\n";

/// Chunks retrieved for one question
#[derive(Debug, Clone)]
pub struct Retrieved {
    /// Hits, nearest first
    pub hits: Vec<SearchHit>,
    /// Hit texts joined nearest first
    pub context: String,
}

impl Retrieved {
    /// Pages the hits came from, nearest first, without repeats
    pub fn source_pages(&self) -> Vec<u32> {
        let mut pages = Vec::new();
        for hit in &self.hits {
            if !pages.contains(&hit.chunk.page_number) {
                pages.push(hit.chunk.page_number);
            }
        }
        pages
    }
}

/// Embeds questions and looks them up in a document's index
pub struct Retriever {
    embedder: Arc<dyn EmbeddingProvider>,
    index: VectorIndex,
}

impl Retriever {
    pub fn new(embedder: Arc<dyn EmbeddingProvider>, index: VectorIndex) -> Self {
        Self { embedder, index }
    }

    /// The `k` chunks nearest to `question`, plus their concatenated text
    pub async fn retrieve(&self, question: &str, k: usize) -> Result<Retrieved> {
        let query = self.embedder.embed(question).await?;
        let hits = self.index.query(&query, k)?;

        tracing::debug!(
            "Retrieved {} chunk(s) for question ({} chars)",
            hits.len(),
            question.len()
        );

        let context = hits
            .iter()
            .map(|h| h.chunk.content.as_str())
            .collect::<Vec<_>>()
            .join(CONTEXT_SEPARATOR);

        Ok(Retrieved { hits, context })
    }
}
