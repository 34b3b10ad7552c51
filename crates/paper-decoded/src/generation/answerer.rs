//! Context-grounded answers from an LLM provider

use std::sync::Arc;
use std::time::Instant;

use crate::error::{Error, Result};
use crate::providers::LlmProvider;

use super::prompt::PromptBuilder;

/// Sends question + retrieved context to the configured model
#[derive(Clone)]
pub struct Answerer {
    llm: Arc<dyn LlmProvider>,
}

impl Answerer {
    pub fn new(llm: Arc<dyn LlmProvider>) -> Self {
        Self { llm }
    }

    /// Answer `question` from `context`; failures are not retried
    pub async fn answer(&self, question: &str, context: &str) -> Result<String> {
        let prompt = PromptBuilder::build_qa_prompt(question, context);
        let start = Instant::now();

        let answer = self.llm.complete(&prompt).await.map_err(|e| match e {
            Error::Generation(_) => e,
            other => Error::generation(other.to_string()),
        })?;

        tracing::info!(
            "{} ({}) answered in {:?} ({} chars)",
            self.llm.name(),
            self.llm.model(),
            start.elapsed(),
            answer.len()
        );

        Ok(answer.trim().to_string())
    }
}
