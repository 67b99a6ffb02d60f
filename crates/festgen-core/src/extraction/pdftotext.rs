use crate::error::FestgenError;
use crate::extraction::{PageText, TextExtractionStrategy};
use std::io::Write;
use std::process::Command;

/// PDF extraction backend using pdftotext (from poppler-utils).
///
/// Runs in reading-order mode; pages come back separated by form feeds.
pub struct PdftotextExtractor;

impl PdftotextExtractor {
    pub fn new() -> Self {
        PdftotextExtractor
    }

    /// Check if pdftotext is available on the system.
    pub fn is_available() -> bool {
        Command::new("pdftotext")
            .arg("-v")
            .output()
            .map(|o| o.status.success() || !o.stderr.is_empty())
            .unwrap_or(false)
    }

    /// Extract text page by page, in page order.
    pub fn extract_pages(&self, pdf_bytes: &[u8]) -> Result<Vec<PageText>, FestgenError> {
        // pdftotext only reads from a path
        let mut tmpfile =
            tempfile::NamedTempFile::new().map_err(|e| FestgenError::extraction("pdf", e))?;
        tmpfile
            .write_all(pdf_bytes)
            .map_err(|e| FestgenError::extraction("pdf", e))?;

        let output = Command::new("pdftotext")
            .arg("-enc")
            .arg("UTF-8")
            .arg(tmpfile.path())
            .arg("-") // output to stdout
            .output()
            .map_err(|e| {
                if e.kind() == std::io::ErrorKind::NotFound {
                    FestgenError::PdftotextNotFound
                } else {
                    FestgenError::extraction("pdf", format!("pdftotext failed: {}", e))
                }
            })?;

        if !output.status.success() {
            let code = output.status.code().unwrap_or(-1);
            let stderr = String::from_utf8_lossy(&output.stderr).to_string();
            return Err(FestgenError::PdftotextFailed { code, stderr });
        }

        let text = String::from_utf8_lossy(&output.stdout);
        Ok(split_pages(&text))
    }
}

impl Default for PdftotextExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl TextExtractionStrategy for PdftotextExtractor {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, FestgenError> {
        let pages = self.extract_pages(bytes)?;
        tracing::debug!(pages = pages.len(), "pdftotext finished");
        Ok(join_pages(&pages))
    }

    fn backend_name(&self) -> &str {
        "pdftotext"
    }
}

/// Split pdftotext output on form feeds. The trailing form feed after the
/// last page produces no extra page.
fn split_pages(text: &str) -> Vec<PageText> {
    let mut pages: Vec<PageText> = text
        .split('\x0c')
        .enumerate()
        .map(|(i, page_text)| PageText {
            page_number: i + 1,
            text: page_text.to_string(),
        })
        .collect();

    if pages.len() > 1 && pages.last().is_some_and(|p| p.text.trim().is_empty()) {
        pages.pop();
    }
    pages
}

fn join_pages(pages: &[PageText]) -> String {
    let mut full_text = String::new();
    for page in pages {
        full_text.push_str(&page.text);
    }
    full_text
}
