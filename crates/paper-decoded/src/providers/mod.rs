//! Provider abstractions for embeddings and text generation
//!
//! Trait-based seams that let the session switch between the local ONNX
//! embedder, a hosted LLM, and a local Ollama server.

pub mod embedding;
pub mod groq;
pub mod llm;
pub mod ollama;
pub mod onnx;

use std::sync::Arc;

use crate::config::{EmbeddingBackend, EmbeddingConfig, LlmBackend, LlmConfig};
use crate::error::Result;

pub use embedding::EmbeddingProvider;
pub use groq::GroqClient;
pub use llm::LlmProvider;
pub use ollama::{OllamaEmbedder, OllamaLlm};
pub use onnx::OnnxEmbedder;

/// Build the configured embedding provider
pub fn build_embedder(config: &EmbeddingConfig) -> Result<Arc<dyn EmbeddingProvider>> {
    let embedder: Arc<dyn EmbeddingProvider> = match config.backend {
        EmbeddingBackend::Onnx => Arc::new(OnnxEmbedder::new(config)),
        EmbeddingBackend::Ollama => Arc::new(OllamaEmbedder::new(config)?),
    };
    tracing::info!("Embedding provider: {} ({})", embedder.name(), config.model);
    Ok(embedder)
}

/// Build the configured LLM provider
pub fn build_llm(config: &LlmConfig) -> Result<Arc<dyn LlmProvider>> {
    let llm: Arc<dyn LlmProvider> = match config.backend {
        LlmBackend::Groq => Arc::new(GroqClient::new(config)?),
        LlmBackend::Ollama => Arc::new(OllamaLlm::new(config)?),
    };
    tracing::info!("LLM provider: {} ({})", llm.name(), llm.model());
    Ok(llm)
}
