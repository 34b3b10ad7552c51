//! Session lifecycle states

use serde::{Deserialize, Serialize};
use std::fmt;

/// Where a session is in the upload → index → summarize lifecycle
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SessionState {
    /// No document yet
    #[default]
    Idle,
    /// Extracting, chunking, embedding and indexing an upload
    Ingesting,
    /// Index built, ready to summarize
    Indexed,
    /// Answering the fixed questions
    Summarizing,
    /// All sections answered
    Done,
    /// Ingestion or summarization failed
    Failed,
}

impl SessionState {
    /// Whether moving from `self` to `next` is a legal transition
    pub fn can_transition_to(self, next: SessionState) -> bool {
        use SessionState::*;
        matches!(
            (self, next),
            (Idle | Indexed | Done | Failed, Ingesting)
                | (Ingesting, Indexed | Failed)
                | (Indexed | Done | Failed, Summarizing)
                | (Summarizing, Done | Failed)
        )
    }

    /// Work is in progress
    pub fn is_busy(self) -> bool {
        matches!(self, Self::Ingesting | Self::Summarizing)
    }
}

impl fmt::Display for SessionState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Idle => "idle",
            Self::Ingesting => "ingesting",
            Self::Indexed => "indexed",
            Self::Summarizing => "summarizing",
            Self::Done => "done",
            Self::Failed => "failed",
        };
        f.write_str(name)
    }
}

/// Progress reported while a document is processed
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProcessingStep {
    ExtractingText,
    SplittingText,
    EmbeddingChunks,
    BuildingIndex,
    Ready,
}

impl ProcessingStep {
    /// Status line shown to the user
    pub fn message(&self) -> &'static str {
        match self {
            Self::ExtractingText => "Extracting text from PDF...",
            Self::SplittingText => "Splitting document into chunks...",
            Self::EmbeddingChunks => "Embedding chunks...",
            Self::BuildingIndex => "Creating vector database...",
            Self::Ready => "Processing complete!",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::SessionState::*;
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(Idle.can_transition_to(Ingesting));
        assert!(Ingesting.can_transition_to(Indexed));
        assert!(Indexed.can_transition_to(Summarizing));
        assert!(Summarizing.can_transition_to(Done));
    }

    #[test]
    fn test_failure_and_retry_transitions() {
        assert!(Ingesting.can_transition_to(Failed));
        assert!(Summarizing.can_transition_to(Failed));
        assert!(Failed.can_transition_to(Summarizing));
        assert!(Failed.can_transition_to(Ingesting));
        assert!(Done.can_transition_to(Ingesting));
    }

    #[test]
    fn test_illegal_transitions() {
        assert!(!Idle.can_transition_to(Summarizing));
        assert!(!Idle.can_transition_to(Indexed));
        assert!(!Ingesting.can_transition_to(Summarizing));
        assert!(!Ingesting.can_transition_to(Ingesting));
        assert!(!Summarizing.can_transition_to(Ingesting));
        assert!(!Indexed.can_transition_to(Done));
    }

    #[test]
    fn test_serialized_names() {
        assert_eq!(serde_json::to_string(&Summarizing).unwrap(), "\"summarizing\"");
        assert_eq!(Failed.to_string(), "failed");
        assert!(Ingesting.is_busy());
        assert!(!Done.is_busy());
    }
}
