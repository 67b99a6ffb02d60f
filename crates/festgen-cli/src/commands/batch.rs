use festgen_core::error::FestgenError;
use festgen_core::generation::openai::OpenAiClient;
use festgen_core::{extractors_for, summarize_batch, SummarizeOptions};
use std::path::PathBuf;

use crate::commands::load_config;
use crate::output;
use crate::Overrides;

pub fn run(
    input_files: Vec<PathBuf>,
    overrides: &Overrides,
    jobs: usize,
    output_file: Option<PathBuf>,
) -> Result<(), FestgenError> {
    let config = load_config(overrides)?;
    let extractors = extractors_for(&config)?;
    let service = OpenAiClient::new(&config.generation)?;

    let entries = summarize_batch(
        &input_files,
        &extractors,
        &service,
        &SummarizeOptions::from(&config),
        jobs,
    );

    let failed = entries.iter().filter(|e| e.result.is_error()).count();
    output::json::emit(&entries, output_file.as_deref())?;
    if failed > 0 {
        eprintln!("{failed} of {} document(s) failed", entries.len());
        for entry in &entries {
            if let Some(error) = entry.result.error_message() {
                eprintln!("  {}: {error}", entry.file.display());
            }
        }
    }
    Ok(())
}
