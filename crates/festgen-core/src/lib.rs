pub mod cardnews;
pub mod config;
pub mod error;
pub mod extraction;
pub mod extractor;
pub mod generation;
pub mod model;
pub mod prompt;
pub mod report;
pub mod schema;

#[cfg(test)]
mod test_support;

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use std::thread;

use config::{Config, ConversionConfig, HwpStrategy, DEFAULT_TEXT_BUDGET};
use error::FestgenError;
use extraction::pdftotext::PdftotextExtractor;
use extraction::remote::{CloudConvertClient, RemoteHwpExtractor};
use extraction::ExtractorSet;
use extractor::SchemaExtractor;
use generation::CompletionService;
use model::{DocumentFormat, SourceDocument};
use schema::{FestivalSummary, SummaryRecord};

/// Per-run knobs for the summarize pipeline.
#[derive(Debug, Clone, Copy)]
pub struct SummarizeOptions {
    /// Characters of document text submitted to the generation service.
    pub text_budget: usize,
}

impl Default for SummarizeOptions {
    fn default() -> Self {
        SummarizeOptions {
            text_budget: DEFAULT_TEXT_BUDGET,
        }
    }
}

impl From<&Config> for SummarizeOptions {
    fn from(config: &Config) -> Self {
        SummarizeOptions {
            text_budget: config.text_budget,
        }
    }
}

/// Build the extractor table for `config`.
pub fn extractors_for(config: &Config) -> Result<ExtractorSet, FestgenError> {
    extractors_with(config.hwp_strategy, config.conversion.as_ref())
}

/// The remote HWP strategy replaces only the HWP slot; PDF and DOCX always
/// run locally.
pub fn extractors_with(
    strategy: HwpStrategy,
    conversion: Option<&ConversionConfig>,
) -> Result<ExtractorSet, FestgenError> {
    let set = ExtractorSet::offline();
    match (strategy, conversion) {
        (HwpStrategy::Offline, _) => Ok(set),
        (HwpStrategy::Remote, Some(conversion)) => {
            let client = CloudConvertClient::new(conversion)?;
            Ok(set.with_hwp(Box::new(RemoteHwpExtractor::new(
                Box::new(client),
                Box::new(PdftotextExtractor::new()),
            ))))
        }
        (HwpStrategy::Remote, None) => Err(FestgenError::Config(
            "remote HWP strategy selected without CloudConvert credentials".into(),
        )),
    }
}

/// Fail fast when `path` needs pdftotext and it is not installed.
///
/// PDFs always go through pdftotext, and so do HWP files under the remote
/// strategy since they come back from conversion as PDF.
pub fn ensure_pdftotext_for(path: &Path, strategy: HwpStrategy) -> Result<(), FestgenError> {
    let needed = match DocumentFormat::from_path(path) {
        DocumentFormat::Pdf => true,
        DocumentFormat::Hwp => strategy == HwpStrategy::Remote,
        _ => false,
    };
    if needed && !PdftotextExtractor::is_available() {
        return Err(FestgenError::PdftotextNotFound);
    }
    Ok(())
}

/// Detect the format of `path` and extract its plain text.
///
/// Missing files and unsupported extensions fail before any bytes are read.
pub fn extract_file_text(path: &Path, extractors: &ExtractorSet) -> Result<String, FestgenError> {
    let document = SourceDocument::new(path);
    document.ensure_readable()?;
    extractors.for_format(&document.format)?;

    let bytes = std::fs::read(&document.path)?;
    tracing::debug!(file = %document.file_name(), bytes = bytes.len(), "document read");
    extract_bytes_text(&bytes, &document.format, extractors)
}

/// Extract plain text from in-memory document bytes of a known format.
pub fn extract_bytes_text(
    bytes: &[u8],
    format: &DocumentFormat,
    extractors: &ExtractorSet,
) -> Result<String, FestgenError> {
    let strategy = extractors.for_format(format)?;
    tracing::debug!(
        format = %format,
        backend = strategy.backend_name(),
        bytes = bytes.len(),
        "extracting text"
    );
    let text = strategy.extract_text(bytes)?;
    tracing::info!(format = %format, chars = text.chars().count(), "text extracted");
    Ok(text)
}

/// Fallible form of [`summarize_file`].
pub fn try_summarize_file(
    path: &Path,
    extractors: &ExtractorSet,
    service: &dyn CompletionService,
    options: &SummarizeOptions,
) -> Result<FestivalSummary, FestgenError> {
    let text = extract_file_text(path, extractors)?;
    summarize_text(&text, service, options)
}

/// Fallible form of [`summarize_bytes`].
pub fn try_summarize_bytes(
    bytes: &[u8],
    format: &DocumentFormat,
    extractors: &ExtractorSet,
    service: &dyn CompletionService,
    options: &SummarizeOptions,
) -> Result<FestivalSummary, FestgenError> {
    let text = extract_bytes_text(bytes, format, extractors)?;
    summarize_text(&text, service, options)
}

fn summarize_text(
    text: &str,
    service: &dyn CompletionService,
    options: &SummarizeOptions,
) -> Result<FestivalSummary, FestgenError> {
    SchemaExtractor::new(service)
        .with_text_budget(options.text_budget)
        .extract(text)
}

/// Main API entry point: summarize one festival planning document.
///
/// Runs detection, extraction and schema extraction in sequence and stops at
/// the first failure. Always returns a record; failures become
/// `{"error": ...}` and the generation service is never called when
/// detection or extraction failed.
pub fn summarize_file(
    path: &Path,
    extractors: &ExtractorSet,
    service: &dyn CompletionService,
    options: &SummarizeOptions,
) -> SummaryRecord {
    let result = try_summarize_file(path, extractors, service, options);
    if let Err(e) = &result {
        tracing::warn!(file = %path.display(), error = %e, "summarize failed");
    }
    SummaryRecord::from(result)
}

/// [`summarize_file`] for documents already in memory, e.g. uploads.
pub fn summarize_bytes(
    bytes: &[u8],
    format: &DocumentFormat,
    extractors: &ExtractorSet,
    service: &dyn CompletionService,
    options: &SummarizeOptions,
) -> SummaryRecord {
    let result = try_summarize_bytes(bytes, format, extractors, service, options);
    if let Err(e) = &result {
        tracing::warn!(format = %format, error = %e, "summarize failed");
    }
    SummaryRecord::from(result)
}

/// One entry of a batch run.
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct BatchEntry {
    pub file: PathBuf,
    pub result: SummaryRecord,
}

/// Summarize several documents on up to `jobs` worker threads.
///
/// Each document gets its own record and a failing document never aborts the
/// rest. Output order matches `paths`.
pub fn summarize_batch(
    paths: &[PathBuf],
    extractors: &ExtractorSet,
    service: &dyn CompletionService,
    options: &SummarizeOptions,
    jobs: usize,
) -> Vec<BatchEntry> {
    let workers = jobs.clamp(1, paths.len().max(1));
    let next = AtomicUsize::new(0);
    let slots: Mutex<Vec<Option<SummaryRecord>>> = Mutex::new(vec![None; paths.len()]);

    tracing::info!(documents = paths.len(), workers, "starting batch");
    thread::scope(|scope| {
        for _ in 0..workers {
            scope.spawn(|| loop {
                let index = next.fetch_add(1, Ordering::Relaxed);
                let Some(path) = paths.get(index) else {
                    break;
                };
                let record = summarize_file(path, extractors, service, options);
                if let Ok(mut slots) = slots.lock() {
                    slots[index] = Some(record);
                }
            });
        }
    });

    let slots = slots.into_inner().unwrap_or_else(|poisoned| poisoned.into_inner());
    let entries: Vec<BatchEntry> = paths
        .iter()
        .zip(slots)
        .map(|(path, slot)| BatchEntry {
            file: path.clone(),
            result: slot.unwrap_or_else(|| SummaryRecord::error("worker did not produce a result")),
        })
        .collect();

    let failed = entries.iter().filter(|e| e.result.is_error()).count();
    tracing::info!(documents = entries.len(), failed, "batch finished");
    entries
}
