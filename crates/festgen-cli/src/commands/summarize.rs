use festgen_core::error::FestgenError;
use festgen_core::generation::openai::OpenAiClient;
use festgen_core::report::{parse_keywords, AnalysisReport, UserInputs};
use festgen_core::{extractors_for, summarize_file, SummarizeOptions};
use std::path::PathBuf;

use crate::commands::load_config;
use crate::output;
use crate::Overrides;

pub struct ReportArgs {
    pub theme: Option<String>,
    pub title: Option<String>,
    pub keywords: Option<String>,
}

/// Returns `Ok(false)` when the record printed is an error record.
pub fn run(
    input_file: PathBuf,
    overrides: &Overrides,
    report: ReportArgs,
    output_format: &str,
    output_file: Option<PathBuf>,
) -> Result<bool, FestgenError> {
    let config = load_config(overrides)?;
    let extractors = extractors_for(&config)?;
    let service = OpenAiClient::new(&config.generation)?;

    let record = summarize_file(
        &input_file,
        &extractors,
        &service,
        &SummarizeOptions::from(&config),
    );
    let succeeded = !record.is_error();

    match report.theme {
        Some(theme) => {
            let inputs = UserInputs {
                title: report.title,
                theme,
                keywords: report.keywords.as_deref().map(parse_keywords).unwrap_or_default(),
            };
            let report = AnalysisReport::new(record, inputs);
            output::json::emit(&report, output_file.as_deref())?;
        }
        None => match (output_format, &output_file) {
            ("table", None) => output::table::print_record(&record),
            _ => output::json::emit(&record, output_file.as_deref())?,
        },
    }

    Ok(succeeded)
}
