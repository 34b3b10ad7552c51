//! One paper, one index, one summary

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Instant;

use crate::config::RagConfig;
use crate::error::{Error, Result};
use crate::generation::Answerer;
use crate::ingestion::{PdfIngestor, TextChunker};
use crate::providers::{self, EmbeddingProvider, LlmProvider};
use crate::retrieval::{Retriever, VectorIndex};
use crate::types::{BlogSummary, Document, DocumentInfo, SectionKind, SummarySection};

use super::state::{ProcessingStep, SessionState};

enum Source {
    Path(PathBuf),
    Bytes { filename: String, data: Vec<u8> },
}

/// Drives a single paper from upload to blog summary.
///
/// Steps run strictly one after another. A failed ingestion discards the
/// document and its index; a failed summarization keeps the index and the
/// sections finished before the failure.
pub struct Session {
    config: RagConfig,
    ingestor: PdfIngestor,
    chunker: TextChunker,
    embedder: Arc<dyn EmbeddingProvider>,
    answerer: Answerer,
    state: SessionState,
    document: Option<Document>,
    chunk_count: usize,
    retriever: Option<Retriever>,
    summary: BlogSummary,
    last_error: Option<String>,
}

impl Session {
    /// Create a session around explicit providers
    pub fn new(
        config: RagConfig,
        embedder: Arc<dyn EmbeddingProvider>,
        llm: Arc<dyn LlmProvider>,
    ) -> Result<Self> {
        config.validate()?;
        let chunker = TextChunker::from_config(&config.chunking)?;

        Ok(Self {
            ingestor: PdfIngestor::new(&config.ingestion),
            chunker,
            embedder,
            answerer: Answerer::new(llm),
            state: SessionState::Idle,
            document: None,
            chunk_count: 0,
            retriever: None,
            summary: BlogSummary::new(),
            last_error: None,
            config,
        })
    }

    /// Create a session with the providers named in `config`
    pub fn from_config(config: RagConfig) -> Result<Self> {
        let embedder = providers::build_embedder(&config.embeddings)?;
        let llm = providers::build_llm(&config.llm)?;
        Self::new(config, embedder, llm)
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn document(&self) -> Option<&Document> {
        self.document.as_ref()
    }

    pub fn document_info(&self) -> Option<DocumentInfo> {
        self.document
            .as_ref()
            .map(|doc| DocumentInfo::new(doc, self.chunk_count))
    }

    /// Sections produced by the latest summarization, complete or not
    pub fn summary(&self) -> &BlogSummary {
        &self.summary
    }

    /// Message of the failure that moved the session to `Failed`
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// An index exists to summarize from
    pub fn can_summarize(&self) -> bool {
        self.retriever.is_some()
    }

    /// Settle a run whose future was dropped before it finished.
    ///
    /// Every run holds `&mut self`, so a busy state seen here was left by a
    /// cancelled run. An interrupted ingest discards its partial document; an
    /// interrupted summary keeps the index and the sections already written.
    /// Returns whether anything had to be recovered.
    pub fn recover_interrupted(&mut self) -> bool {
        if !self.state.is_busy() {
            return false;
        }
        tracing::warn!("Recovering session left {} by a cancelled run", self.state);
        let error = Error::internal(format!("{} was interrupted before it finished", self.state));
        self.fail(&error);
        true
    }

    /// Process the PDF at `path`
    pub async fn ingest<F>(&mut self, path: &Path, on_step: F) -> Result<DocumentInfo>
    where
        F: FnMut(ProcessingStep),
    {
        self.run_ingest(Source::Path(path.to_path_buf()), on_step).await
    }

    /// Process an uploaded PDF
    pub async fn ingest_bytes<F>(&mut self, filename: &str, data: Vec<u8>, on_step: F) -> Result<DocumentInfo>
    where
        F: FnMut(ProcessingStep),
    {
        let source = Source::Bytes {
            filename: filename.to_string(),
            data,
        };
        self.run_ingest(source, on_step).await
    }

    async fn run_ingest<F>(&mut self, source: Source, mut on_step: F) -> Result<DocumentInfo>
    where
        F: FnMut(ProcessingStep),
    {
        self.recover_interrupted();
        self.transition(SessionState::Ingesting)?;
        self.document = None;
        self.chunk_count = 0;
        self.retriever = None;
        self.summary = BlogSummary::new();
        self.last_error = None;

        let start = Instant::now();
        match self.build_index(source, &mut on_step).await {
            Ok((document, chunk_count, retriever)) => {
                let info = DocumentInfo::new(&document, chunk_count);
                tracing::info!(
                    "Indexed {} ({} pages, {} chunks) in {:?}",
                    document.filename,
                    document.page_count(),
                    chunk_count,
                    start.elapsed()
                );
                self.document = Some(document);
                self.chunk_count = chunk_count;
                self.retriever = Some(retriever);
                self.transition(SessionState::Indexed)?;
                on_step(ProcessingStep::Ready);
                Ok(info)
            }
            Err(e) => {
                tracing::error!("Ingestion failed: {}", e);
                self.fail(&e);
                Err(e)
            }
        }
    }

    async fn build_index<F>(&self, source: Source, on_step: &mut F) -> Result<(Document, usize, Retriever)>
    where
        F: FnMut(ProcessingStep),
    {
        on_step(ProcessingStep::ExtractingText);
        let ingestor = self.ingestor.clone();
        let document = tokio::task::spawn_blocking(move || match source {
            Source::Path(path) => ingestor.ingest_path(&path),
            Source::Bytes { filename, data } => ingestor.ingest_bytes(&filename, &data),
        })
        .await
        .map_err(|e| Error::internal(format!("extraction task failed: {}", e)))??;

        on_step(ProcessingStep::SplittingText);
        let chunks = self.chunker.chunk_pages(&document.pages);
        if chunks.is_empty() {
            return Err(Error::ingest(&document.filename, "Document produced no text chunks"));
        }
        tracing::debug!("Split {} into {} chunks", document.filename, chunks.len());

        on_step(ProcessingStep::EmbeddingChunks);
        let texts: Vec<String> = chunks.iter().map(|c| c.content.clone()).collect();
        let vectors = self.embedder.embed_batch(&texts).await?;
        if vectors.len() != chunks.len() {
            return Err(Error::embedding(format!(
                "{} returned {} embeddings for {} chunks",
                self.embedder.name(),
                vectors.len(),
                chunks.len()
            )));
        }

        on_step(ProcessingStep::BuildingIndex);
        let chunk_count = chunks.len();
        let index = VectorIndex::build(vectors, chunks, self.config.retrieval.metric)?;
        tracing::debug!(
            "Index holds {} vectors of {} dimensions",
            index.len(),
            index.dimensions()
        );
        let retriever = Retriever::new(Arc::clone(&self.embedder), index);

        Ok((document, chunk_count, retriever))
    }

    /// Answer the four section questions in order.
    ///
    /// `on_section` sees each section as soon as it is written. The first
    /// failure stops the run; sections written before it stay in
    /// [`Session::summary`].
    pub async fn summarize<F>(&mut self, mut on_section: F) -> Result<BlogSummary>
    where
        F: FnMut(&SummarySection),
    {
        self.recover_interrupted();
        if self.retriever.is_none() {
            return Err(Error::invalid_state("summary unavailable: no document has been indexed"));
        }
        self.transition(SessionState::Summarizing)?;
        self.summary = BlogSummary::new();
        self.last_error = None;

        let start = Instant::now();
        for kind in SectionKind::ALL {
            match self.write_section(kind).await {
                Ok(section) => {
                    tracing::info!("Wrote section '{}' ({} chars)", section.title, section.answer.len());
                    on_section(&section);
                    self.summary.push(section);
                }
                Err(e) => {
                    tracing::error!("Section '{}' failed: {}", kind.title(), e);
                    self.fail(&e);
                    return Err(e);
                }
            }
        }

        self.transition(SessionState::Done)?;
        tracing::info!("Summary complete in {:?}", start.elapsed());
        Ok(self.summary.clone())
    }

    async fn write_section(&self, kind: SectionKind) -> Result<SummarySection> {
        let retriever = self
            .retriever
            .as_ref()
            .ok_or_else(|| Error::invalid_state("index was discarded"))?;

        let retrieved = retriever
            .retrieve(kind.question(), self.config.retrieval.top_k)
            .await?;
        let answer = self.answerer.answer(kind.question(), &retrieved.context).await?;

        Ok(SummarySection::new(kind, answer, retrieved.source_pages()))
    }

    /// Drop the document and return to `Idle`
    pub fn reset(&mut self) {
        self.state = SessionState::Idle;
        self.document = None;
        self.chunk_count = 0;
        self.retriever = None;
        self.summary = BlogSummary::new();
        self.last_error = None;
    }

    fn transition(&mut self, next: SessionState) -> Result<()> {
        if !self.state.can_transition_to(next) {
            return Err(Error::invalid_state(format!(
                "cannot move from {} to {}",
                self.state, next
            )));
        }
        tracing::debug!("Session {} -> {}", self.state, next);
        self.state = next;
        Ok(())
    }

    fn fail(&mut self, error: &Error) {
        if self.state == SessionState::Ingesting {
            self.document = None;
            self.chunk_count = 0;
            self.retriever = None;
        }
        self.last_error = Some(error.to_string());
        self.state = SessionState::Failed;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;

    struct LengthEmbedder;

    #[async_trait]
    impl EmbeddingProvider for LengthEmbedder {
        async fn embed(&self, text: &str) -> Result<Vec<f32>> {
            Ok(vec![text.len() as f32, 1.0])
        }

        fn dimensions(&self) -> usize {
            2
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "length"
        }
    }

    struct CannedLlm {
        calls: Mutex<usize>,
    }

    #[async_trait]
    impl LlmProvider for CannedLlm {
        async fn complete(&self, _prompt: &str) -> Result<String> {
            let mut calls = self.calls.lock();
            *calls += 1;
            Ok(format!("answer {}", *calls))
        }

        async fn health_check(&self) -> Result<bool> {
            Ok(true)
        }

        fn name(&self) -> &str {
            "canned"
        }

        fn model(&self) -> &str {
            "canned"
        }
    }

    fn session() -> Session {
        Session::new(
            RagConfig::default(),
            Arc::new(LengthEmbedder),
            Arc::new(CannedLlm { calls: Mutex::new(0) }),
        )
        .unwrap()
    }

    #[test]
    fn test_new_session_is_idle() {
        let s = session();
        assert_eq!(s.state(), SessionState::Idle);
        assert!(!s.can_summarize());
        assert!(s.document_info().is_none());
        assert!(s.summary().is_empty());
    }

    #[test]
    fn test_invalid_config_rejected() {
        let mut config = RagConfig::default();
        config.chunking.chunk_overlap = config.chunking.chunk_size;
        let result = Session::new(
            config,
            Arc::new(LengthEmbedder),
            Arc::new(CannedLlm { calls: Mutex::new(0) }),
        );
        assert!(matches!(result, Err(Error::Config(_))));
    }

    #[tokio::test]
    async fn test_summarize_without_index_keeps_state() {
        let mut s = session();
        let err = s.summarize(|_| {}).await.unwrap_err();
        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.last_error().is_none());
    }

    #[tokio::test]
    async fn test_garbage_upload_fails_ingestion() {
        let mut s = session();
        let mut steps = Vec::new();
        let err = s
            .ingest_bytes("notes.pdf", b"plain text, not a pdf".to_vec(), |step| steps.push(step))
            .await
            .unwrap_err();

        assert!(matches!(err, Error::Ingest { .. }));
        assert_eq!(s.state(), SessionState::Failed);
        assert!(!s.can_summarize());
        assert!(s.last_error().is_some());
        assert_eq!(steps, vec![ProcessingStep::ExtractingText]);
    }

    #[tokio::test]
    async fn test_missing_file_fails_ingestion() {
        let mut s = session();
        let result = s.ingest(Path::new("/nonexistent/paper.pdf"), |_| {}).await;
        assert!(matches!(result, Err(Error::Ingest { .. })));
        assert_eq!(s.state(), SessionState::Failed);
    }

    #[tokio::test]
    async fn test_reset_returns_to_idle() {
        let mut s = session();
        let _ = s.ingest_bytes("x.pdf", Vec::new(), |_| {}).await;
        assert_eq!(s.state(), SessionState::Failed);
        s.reset();
        assert_eq!(s.state(), SessionState::Idle);
        assert!(s.last_error().is_none());
    }
}
