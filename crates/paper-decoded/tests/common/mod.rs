//! Shared fixtures: generated PDFs and deterministic providers

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use lopdf::content::{Content, Operation};
use lopdf::{dictionary, Object, Stream};
use parking_lot::Mutex;

use paper_decoded::providers::{EmbeddingProvider, LlmProvider};
use paper_decoded::{Error, RagConfig, Result, Session};

/// Write a PDF with one page per entry of `pages`, each line drawn on its own row
pub fn write_pdf(dir: &Path, name: &str, pages: &[&[&str]]) -> PathBuf {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Courier",
    });
    let resources_id = doc.add_object(dictionary! {
        "Font" => dictionary! { "F1" => font_id },
    });

    let mut kids: Vec<Object> = Vec::new();
    for lines in pages {
        let mut operations = vec![
            Operation::new("BT", vec![]),
            Operation::new("Tf", vec!["F1".into(), 11.into()]),
            Operation::new("Td", vec![72.into(), 760.into()]),
        ];
        for line in lines.iter() {
            operations.push(Operation::new("Tj", vec![Object::string_literal(*line)]));
            operations.push(Operation::new("Td", vec![0.into(), (-16).into()]));
        }
        operations.push(Operation::new("ET", vec![]));

        let content = Content { operations };
        let content_id = doc.add_object(Stream::new(dictionary! {}, content.encode().unwrap()));
        let page_id = doc.add_object(dictionary! {
            "Type" => "Page",
            "Parent" => pages_id,
            "Contents" => content_id,
            "Resources" => resources_id,
        });
        kids.push(page_id.into());
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! {
            "Type" => "Pages",
            "Kids" => kids,
            "Count" => count,
            "Resources" => resources_id,
            "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        }),
    );
    let catalog_id = doc.add_object(dictionary! {
        "Type" => "Catalog",
        "Pages" => pages_id,
    });
    doc.trailer.set("Root", catalog_id);

    let path = dir.join(name);
    doc.save(&path).unwrap();
    path
}

/// A three page paper whose first page states its problem and proposal
pub fn write_paper(dir: &Path) -> PathBuf {
    write_pdf(
        dir,
        "paper.pdf",
        &[
            &[
                "Introduction",
                "This paper proposes GraphFlow to solve congested routing.",
                "Congested routing slows every shared network.",
            ],
            &[
                "Method",
                "GraphFlow learns edge weights from observed traffic.",
                "We train it on three public traces.",
            ],
            &[
                "Results and Conclusion",
                "GraphFlow cuts median latency by forty percent.",
                "Future work will study wireless meshes.",
            ],
        ],
    )
}

/// Hashed bag-of-words embedding: same text, same vector
pub struct HashEmbedder {
    dimensions: usize,
    stall_next: AtomicBool,
}

impl HashEmbedder {
    pub fn new(dimensions: usize) -> Self {
        Self {
            dimensions,
            stall_next: AtomicBool::new(false),
        }
    }

    /// Never return from the next embedding call
    pub fn stall_next(&self) {
        self.stall_next.store(true, Ordering::SeqCst);
    }
}

#[async_trait]
impl EmbeddingProvider for HashEmbedder {
    async fn embed(&self, text: &str) -> Result<Vec<f32>> {
        if self.stall_next.swap(false, Ordering::SeqCst) {
            std::future::pending::<()>().await;
        }
        let mut vector = vec![0.0f32; self.dimensions];
        for word in text.split_whitespace() {
            let word = word.trim_matches(|c: char| !c.is_alphanumeric()).to_lowercase();
            if word.is_empty() {
                continue;
            }
            let bucket = word
                .bytes()
                .fold(7usize, |h, b| h.wrapping_mul(31).wrapping_add(b as usize))
                % self.dimensions;
            vector[bucket] += 1.0;
        }
        Ok(vector)
    }

    fn dimensions(&self) -> usize {
        self.dimensions
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "hash"
    }
}

/// Answers with the context block of the prompt; can be told to fail or hang once
pub struct EchoLlm {
    calls: Mutex<usize>,
    fail_on_call: Mutex<Option<usize>>,
    hang_on_call: Mutex<Option<usize>>,
}

impl EchoLlm {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(0),
            fail_on_call: Mutex::new(None),
            hang_on_call: Mutex::new(None),
        }
    }

    /// Fail the `n`th call (1-based) counted from now
    pub fn fail_on(&self, n: usize) {
        let calls = *self.calls.lock();
        *self.fail_on_call.lock() = Some(calls + n);
    }

    /// Never answer the `n`th call (1-based) counted from now
    pub fn hang_on(&self, n: usize) {
        let calls = *self.calls.lock();
        *self.hang_on_call.lock() = Some(calls + n);
    }

    pub fn calls(&self) -> usize {
        *self.calls.lock()
    }
}

#[async_trait]
impl LlmProvider for EchoLlm {
    async fn complete(&self, prompt: &str) -> Result<String> {
        let call = {
            let mut calls = self.calls.lock();
            *calls += 1;
            *calls
        };

        let hang = {
            let mut hang_on = self.hang_on_call.lock();
            let hang = *hang_on == Some(call);
            if hang {
                *hang_on = None;
            }
            hang
        };
        if hang {
            std::future::pending::<()>().await;
        }

        {
            let mut fail_on = self.fail_on_call.lock();
            if *fail_on == Some(call) {
                *fail_on = None;
                return Err(Error::generation("rate limit exceeded"));
            }
        }

        let context = prompt
            .split_once("\n\n")
            .map(|(_, rest)| rest)
            .and_then(|rest| rest.rsplit_once("\n\nQuestion:"))
            .map(|(context, _)| context)
            .unwrap_or(prompt);
        Ok(context.to_string())
    }

    async fn health_check(&self) -> Result<bool> {
        Ok(true)
    }

    fn name(&self) -> &str {
        "echo"
    }

    fn model(&self) -> &str {
        "echo"
    }
}

pub fn session_with(llm: Arc<EchoLlm>) -> Session {
    session_with_embedder(Arc::new(HashEmbedder::new(64)), llm)
}

pub fn session_with_embedder(embedder: Arc<HashEmbedder>, llm: Arc<EchoLlm>) -> Session {
    Session::new(RagConfig::default(), embedder, llm).unwrap()
}
