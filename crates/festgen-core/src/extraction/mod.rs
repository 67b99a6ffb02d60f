pub mod docx;
pub mod hwp;
pub mod pdftotext;
pub mod remote;

use crate::error::FestgenError;
use crate::model::DocumentFormat;

/// Text extracted from a single page of a PDF.
#[derive(Debug, Clone)]
pub struct PageText {
    pub page_number: usize,
    pub text: String,
}

/// One extraction backend per document format. Every backend yields a
/// single buffer with source content in document order.
pub trait TextExtractionStrategy: Send + Sync {
    fn extract_text(&self, bytes: &[u8]) -> Result<String, FestgenError>;

    /// Name of this extraction backend (for diagnostics).
    fn backend_name(&self) -> &str;
}

/// Dispatch table from format tag to strategy.
pub struct ExtractorSet {
    pub pdf: Box<dyn TextExtractionStrategy>,
    pub docx: Box<dyn TextExtractionStrategy>,
    pub hwp: Box<dyn TextExtractionStrategy>,
}

impl ExtractorSet {
    /// Local backends only: pdftotext, the DOCX reader and the offline HWP parser.
    pub fn offline() -> Self {
        ExtractorSet {
            pdf: Box::new(pdftotext::PdftotextExtractor::new()),
            docx: Box::new(docx::DocxExtractor),
            hwp: Box::new(hwp::HwpExtractor),
        }
    }

    /// Replaces the HWP backend, e.g. with a [`remote::RemoteHwpExtractor`].
    pub fn with_hwp(mut self, hwp: Box<dyn TextExtractionStrategy>) -> Self {
        self.hwp = hwp;
        self
    }

    pub fn for_format(
        &self,
        format: &DocumentFormat,
    ) -> Result<&dyn TextExtractionStrategy, FestgenError> {
        match format {
            DocumentFormat::Pdf => Ok(self.pdf.as_ref()),
            DocumentFormat::Docx => Ok(self.docx.as_ref()),
            DocumentFormat::Hwp => Ok(self.hwp.as_ref()),
            DocumentFormat::Unsupported(_) => Err(FestgenError::UnsupportedFormat {
                extension: format.to_string(),
            }),
        }
    }
}

impl Default for ExtractorSet {
    fn default() -> Self {
        Self::offline()
    }
}

/// Keep at most `budget` characters. Never splits a UTF-8 sequence and
/// returns the input untouched when it already fits.
pub fn truncate_chars(text: &str, budget: usize) -> &str {
    match text.char_indices().nth(budget) {
        Some((byte_idx, _)) => &text[..byte_idx],
        None => text,
    }
}
