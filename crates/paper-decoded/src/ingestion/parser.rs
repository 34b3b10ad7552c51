//! PDF text extraction, page by page

use sha2::{Digest, Sha256};
use std::path::Path;
use std::sync::mpsc;
use std::thread;
use std::time::Duration;

use crate::config::IngestionConfig;
use crate::error::{Error, Result};
use crate::types::{Document, Page};

/// Glyph names some PDF fonts leak into extracted text
const GLYPH_NAMES: &[(&str, char)] = &[
    ("uni2010", '\u{2010}'),
    ("uni2011", '\u{2011}'),
    ("uni2012", '\u{2012}'),
    ("uni2013", '\u{2013}'),
    ("uni2014", '\u{2014}'),
    ("uni2018", '\u{2018}'),
    ("uni2019", '\u{2019}'),
    ("uni201C", '\u{201C}'),
    ("uni201D", '\u{201D}'),
    ("uni2022", '\u{2022}'),
    ("uni2026", '\u{2026}'),
    ("uni00A0", '\u{00A0}'),
    ("uni2009", '\u{2009}'),
    ("uni2212", '\u{2212}'),
    ("uni00D7", '\u{00D7}'),
];

/// ASCII approximation for typographic characters
fn ascii_approximation(c: char) -> Option<&'static str> {
    let replacement = match c {
        '\u{2010}' | '\u{2011}' | '\u{2012}' | '\u{2013}' | '\u{2212}' => "-",
        '\u{2014}' => "--",
        '\u{2018}' | '\u{2019}' => "'",
        '\u{201C}' | '\u{201D}' => "\"",
        '\u{2022}' => "* ",
        '\u{2026}' => "...",
        '\u{00A0}' | '\u{2009}' | '\u{2002}' | '\u{2003}' => " ",
        '\u{FB00}' => "ff",
        '\u{FB01}' => "fi",
        '\u{FB02}' => "fl",
        '\u{FB03}' => "ffi",
        '\u{FB04}' => "ffl",
        '\0' => "",
        _ => return None,
    };
    Some(replacement)
}

/// Normalize extracted page text: glyph names, ligatures, quotes, blank lines
pub fn cleanup_pdf_text(text: &str) -> String {
    let mut result = text.to_string();
    for (glyph_name, value) in GLYPH_NAMES {
        if result.contains(glyph_name) {
            for pattern in [format!("({})", glyph_name), format!("<{}>", glyph_name)] {
                result = result.replace(&pattern, &value.to_string());
            }
            result = result.replace(glyph_name, &value.to_string());
        }
    }

    let mut normalized = String::with_capacity(result.len());
    for c in result.chars() {
        match ascii_approximation(c) {
            Some(replacement) => normalized.push_str(replacement),
            None => normalized.push(c),
        }
    }

    normalized
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Reads PDF files into per-page text
#[derive(Debug, Clone)]
pub struct PdfIngestor {
    extract_timeout: Duration,
}

impl Default for PdfIngestor {
    fn default() -> Self {
        Self::new(&IngestionConfig::default())
    }
}

impl PdfIngestor {
    /// Create a new ingestor
    pub fn new(config: &IngestionConfig) -> Self {
        Self {
            extract_timeout: Duration::from_secs(config.extract_timeout_secs),
        }
    }

    /// Read and parse the PDF at `path`
    pub fn ingest_path(&self, path: &Path) -> Result<Document> {
        let filename = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());

        let data = std::fs::read(path)
            .map_err(|e| Error::ingest(&filename, format!("Failed to read file: {}", e)))?;

        self.ingest_bytes(&filename, &data)
    }

    /// Parse an in-memory PDF
    pub fn ingest_bytes(&self, filename: &str, data: &[u8]) -> Result<Document> {
        if data.is_empty() {
            return Err(Error::ingest(filename, "File is empty"));
        }

        if !has_pdf_header(data) {
            return Err(Error::ingest(filename, "Not a PDF file (missing %PDF- header)"));
        }

        let raw_pages = self.extract_pages(filename, data)?;

        let pages: Vec<Page> = raw_pages
            .iter()
            .enumerate()
            .map(|(i, text)| Page::new(i as u32 + 1, cleanup_pdf_text(text)))
            .collect();

        let document = Document::new(filename, hash_bytes(data), data.len() as u64, pages);

        if !document.has_text() {
            tracing::warn!(
                "{}: {} page(s) but no extractable text, PDF may be image-based",
                filename,
                document.page_count()
            );
            return Err(Error::ingest(
                filename,
                "No text content could be extracted from PDF",
            ));
        }

        tracing::info!(
            "Extracted {} characters from {} page(s) of {}",
            document.char_count(),
            document.page_count(),
            filename
        );

        Ok(document)
    }

    /// Extract raw page texts with pdf-extract, falling back to lopdf
    fn extract_pages(&self, filename: &str, data: &[u8]) -> Result<Vec<String>> {
        let data_vec = data.to_vec();
        let (tx, rx) = mpsc::channel();

        // pdf-extract can hang or panic on unusual fonts, so it runs on its own thread
        let handle = thread::spawn(move || {
            let result = pdf_extract::extract_text_from_mem_by_pages(&data_vec);
            let _ = tx.send(result);
        });

        match rx.recv_timeout(self.extract_timeout) {
            Ok(Ok(pages)) => {
                let _ = handle.join();
                if pages.iter().all(|p| p.trim().is_empty()) {
                    tracing::debug!("pdf-extract found no text in {}, trying lopdf", filename);
                    if let Ok(fallback) = Self::extract_pages_fallback(filename, data) {
                        if fallback.iter().any(|p| !p.trim().is_empty()) {
                            return Ok(fallback);
                        }
                    }
                }
                Ok(pages)
            }
            Ok(Err(e)) => {
                let _ = handle.join();
                tracing::warn!("pdf-extract failed on {}: {}, trying lopdf", filename, e);
                Self::extract_pages_fallback(filename, data)
            }
            Err(mpsc::RecvTimeoutError::Timeout) => {
                tracing::error!(
                    "pdf-extract timed out after {:?} on {}, trying lopdf",
                    self.extract_timeout,
                    filename
                );
                Self::extract_pages_fallback(filename, data)
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                let _ = handle.join();
                tracing::error!("pdf-extract crashed on {}, trying lopdf", filename);
                Self::extract_pages_fallback(filename, data)
            }
        }
    }

    /// Per-page extraction straight from lopdf
    fn extract_pages_fallback(filename: &str, data: &[u8]) -> Result<Vec<String>> {
        let doc = lopdf::Document::load_mem(data)
            .map_err(|e| Error::ingest(filename, format!("Failed to load PDF: {}", e)))?;

        let page_numbers: Vec<u32> = doc.get_pages().keys().copied().collect();
        if page_numbers.is_empty() {
            return Err(Error::ingest(filename, "PDF has no pages"));
        }

        let pages = page_numbers
            .iter()
            .map(|&number| match doc.extract_text(&[number]) {
                Ok(text) => text,
                Err(e) => {
                    tracing::debug!("Could not extract text from page {}: {}", number, e);
                    String::new()
                }
            })
            .collect();

        Ok(pages)
    }
}

/// PDF files may carry junk before the header, but only within the first kilobyte
fn has_pdf_header(data: &[u8]) -> bool {
    let window = &data[..data.len().min(1024)];
    window.windows(5).any(|w| w == b"%PDF-")
}

/// SHA-256 hex digest
pub fn hash_bytes(data: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(data);
    hex::encode(hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cleanup_ligatures_and_quotes() {
        let raw = "  \u{FB01}nal \u{201C}results\u{201D}\u{2014}good  \n\n\0\n e\u{FB03}cient ";
        assert_eq!(cleanup_pdf_text(raw), "final \"results\"--good\nefficient");
    }

    #[test]
    fn test_cleanup_glyph_names() {
        assert_eq!(cleanup_pdf_text("state(uni2013)of(uni2013)the art"), "state-of-the art");
        assert_eq!(cleanup_pdf_text("it<uni2019>s"), "it's");
    }

    #[test]
    fn test_rejects_empty_file() {
        let err = PdfIngestor::default().ingest_bytes("empty.pdf", b"").unwrap_err();
        assert!(matches!(err, Error::Ingest { .. }));
    }

    #[test]
    fn test_rejects_non_pdf() {
        let err = PdfIngestor::default()
            .ingest_bytes("notes.pdf", b"just some plain text, not a pdf")
            .unwrap_err();
        assert!(err.to_string().contains("missing %PDF- header"));
    }

    #[test]
    fn test_rejects_corrupted_pdf() {
        let err = PdfIngestor::default()
            .ingest_bytes("broken.pdf", b"%PDF-1.4\n%garbage without objects or trailer")
            .unwrap_err();
        assert!(matches!(err, Error::Ingest { .. }));
    }

    #[test]
    fn test_missing_file() {
        let err = PdfIngestor::default()
            .ingest_path(Path::new("/nonexistent/paper.pdf"))
            .unwrap_err();
        match err {
            Error::Ingest { filename, message } => {
                assert_eq!(filename, "paper.pdf");
                assert!(message.starts_with("Failed to read file"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_hash_is_stable() {
        assert_eq!(hash_bytes(b"abc"), hash_bytes(b"abc"));
        assert_eq!(hash_bytes(b"abc").len(), 64);
    }
}
