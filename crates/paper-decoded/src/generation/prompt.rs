//! Prompt templates for summary generation

/// Prompt builder for retrieval-augmented questions
pub struct PromptBuilder;

impl PromptBuilder {
    /// "Stuff" prompt: all retrieved context followed by the question
    pub fn build_qa_prompt(question: &str, context: &str) -> String {
        format!(
            r#"Use the following pieces of context to answer the question at the end. If you don't know the answer, just say that you don't know, don't try to make up an answer.

{context}

Question: {question}
Helpful Answer:"#,
            context = context.trim(),
            question = question.trim()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_context_precedes_question() {
        let prompt = PromptBuilder::build_qa_prompt(
            "What problem does this paper solve?",
            "This paper proposes X to solve Y.\n\nWe evaluate on Z.",
        );

        let context_at = prompt.find("This paper proposes X").unwrap();
        let question_at = prompt.find("Question: What problem").unwrap();
        assert!(context_at < question_at);
        assert!(prompt.ends_with("Helpful Answer:"));
        assert!(prompt.contains("We evaluate on Z."));
    }
}
