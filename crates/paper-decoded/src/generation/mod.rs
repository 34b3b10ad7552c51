//! Answer generation from retrieved context

mod answerer;
mod prompt;

pub use answerer::Answerer;
pub use prompt::PromptBuilder;
