//! LLM provider trait for text generation

use async_trait::async_trait;
use crate::error::Result;

/// Trait for prompt completion against a language model
///
/// Implementations:
/// - `GroqClient`: hosted Groq chat completions (llama3-70b-8192)
/// - `OllamaLlm`: Local Ollama server
///
/// Failures are reported as `Error::Generation` and never retried here.
#[async_trait]
pub trait LlmProvider: Send + Sync {
    /// Complete a fully built prompt
    async fn complete(&self, prompt: &str) -> Result<String>;

    /// Check if the provider is reachable
    async fn health_check(&self) -> Result<bool>;

    /// Get provider name for logging
    fn name(&self) -> &str;

    /// Get the model being used
    fn model(&self) -> &str;
}
