use festgen_core::cardnews::{CardNewsGenerator, CardNewsRequest};
use festgen_core::config::Config;
use festgen_core::error::FestgenError;
use festgen_core::generation::openai::OpenAiClient;
use festgen_core::report::AnalysisReport;
use festgen_core::schema::SummaryRecord;
use std::path::{Path, PathBuf};

use crate::output;

pub fn run(
    summary_file: PathBuf,
    theme: &str,
    trends: Vec<String>,
    buzzwords: Vec<String>,
    model: Option<String>,
) -> Result<(), FestgenError> {
    let record = load_record(&summary_file)?;
    let summary = match &record {
        SummaryRecord::Summary(summary) => summary,
        SummaryRecord::Error { error } => {
            return Err(FestgenError::InvalidInput(format!(
                "{} holds an error record, not a summary: {error}",
                summary_file.display()
            )))
        }
    };

    let mut config = Config::from_env()?;
    if let Some(model) = model {
        config.generation.model = model;
    }
    let service = OpenAiClient::new(&config.generation)?;

    let pages = CardNewsGenerator::new(&service).generate(&CardNewsRequest {
        theme,
        summary,
        trend_keywords: &trends,
        buzzwords: &buzzwords,
    })?;
    output::json::emit(&pages, None)
}

/// Accepts either a bare summary record or an analysis report.
fn load_record(path: &Path) -> Result<SummaryRecord, FestgenError> {
    let bytes = std::fs::read(path)?;
    if let Ok(report) = serde_json::from_slice::<AnalysisReport>(&bytes) {
        return Ok(report.analysis_summary);
    }
    Ok(serde_json::from_slice(&bytes)?)
}
