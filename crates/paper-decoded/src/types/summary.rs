//! Blog summary sections produced by the session

use serde::{Deserialize, Serialize};

/// The four fixed sections of a blog summary, in generation order
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SectionKind {
    ProblemStatement,
    Methodology,
    KeyTakeaways,
    Conclusion,
}

impl SectionKind {
    /// All sections in the order they are generated
    pub const ALL: [SectionKind; 4] = [
        SectionKind::ProblemStatement,
        SectionKind::Methodology,
        SectionKind::KeyTakeaways,
        SectionKind::Conclusion,
    ];

    /// Heading shown to the reader
    pub fn title(&self) -> &'static str {
        match self {
            Self::ProblemStatement => "Problem Statement",
            Self::Methodology => "Methodology",
            Self::KeyTakeaways => "Key Takeaways",
            Self::Conclusion => "Conclusion",
        }
    }

    /// Question sent through retrieval and generation
    pub fn question(&self) -> &'static str {
        match self {
            Self::ProblemStatement => {
                "What problem does this paper solve? Explain simply in 2-3 paragraphs suitable for a blog post."
            }
            Self::Methodology => {
                "Explain the methodology in simple terms suitable for a non-expert audience. Use 3-4 paragraphs with clear explanations."
            }
            Self::KeyTakeaways => {
                "Summarize the results in 5 bullet points with clear explanations for each point. Format as markdown bullets."
            }
            Self::Conclusion => {
                "Summarize the conclusion in a blog-style format with 2-3 paragraphs. Include potential implications and future directions if mentioned in the paper."
            }
        }
    }
}

/// One answered section
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SummarySection {
    pub kind: SectionKind,
    pub title: String,
    pub question: String,
    pub answer: String,
    /// Pages the retrieved context came from, nearest chunk first
    pub source_pages: Vec<u32>,
}

impl SummarySection {
    /// Create a section for `kind` with the generated answer
    pub fn new(kind: SectionKind, answer: String, source_pages: Vec<u32>) -> Self {
        Self {
            kind,
            title: kind.title().to_string(),
            question: kind.question().to_string(),
            answer,
            source_pages,
        }
    }

    /// Render as a markdown block
    pub fn to_markdown(&self) -> String {
        format!("## {}\n\n{}\n", self.title, self.answer.trim())
    }
}

/// Sections answered so far, in generation order
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct BlogSummary {
    pub sections: Vec<SummarySection>,
}

impl BlogSummary {
    /// Empty summary
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a finished section
    pub fn push(&mut self, section: SummarySection) {
        self.sections.push(section);
    }

    /// Look up a section by kind
    pub fn section(&self, kind: SectionKind) -> Option<&SummarySection> {
        self.sections.iter().find(|s| s.kind == kind)
    }

    /// Whether every fixed section has been answered
    pub fn is_complete(&self) -> bool {
        SectionKind::ALL.iter().all(|kind| self.section(*kind).is_some())
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Render all sections as one markdown document
    pub fn to_markdown(&self, title: Option<&str>) -> String {
        let mut out = String::new();
        if let Some(title) = title {
            out.push_str(&format!("# {}\n\n", title));
        }
        let body = self
            .sections
            .iter()
            .map(SummarySection::to_markdown)
            .collect::<Vec<_>>()
            .join("\n");
        out.push_str(&body);
        out
    }
}
