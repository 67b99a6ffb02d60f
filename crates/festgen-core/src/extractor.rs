use crate::config::DEFAULT_TEXT_BUDGET;
use crate::error::FestgenError;
use crate::extraction::truncate_chars;
use crate::generation::{CompletionRequest, CompletionService};
use crate::prompt;
use crate::schema::FestivalSummary;

/// LLM-backed structured extraction over the fixed festival schema.
pub struct SchemaExtractor<'a> {
    service: &'a dyn CompletionService,
    text_budget: usize,
}

impl<'a> SchemaExtractor<'a> {
    pub fn new(service: &'a dyn CompletionService) -> Self {
        SchemaExtractor {
            service,
            text_budget: DEFAULT_TEXT_BUDGET,
        }
    }

    pub fn with_text_budget(mut self, text_budget: usize) -> Self {
        self.text_budget = text_budget;
        self
    }

    /// Build the request for `text`, truncated to the budget. Summaries
    /// therefore reflect a prefix of long documents only.
    pub fn build_request(&self, text: &str) -> CompletionRequest {
        let submitted = truncate_chars(text, self.text_budget);
        if submitted.len() < text.len() {
            tracing::info!(
                budget = self.text_budget,
                dropped_bytes = text.len() - submitted.len(),
                "document text truncated"
            );
        }
        CompletionRequest {
            system: prompt::extraction_system_prompt(),
            user: prompt::extraction_user_prompt(submitted),
            json_response: true,
        }
    }

    pub fn extract(&self, text: &str) -> Result<FestivalSummary, FestgenError> {
        let request = self.build_request(text);
        tracing::info!(model = self.service.model_name(), "requesting schema extraction");
        let raw = self.service.complete(&request)?;
        let summary = FestivalSummary::from_generated(&raw)?;
        tracing::info!(title = %summary.title, "schema extraction complete");
        Ok(summary)
    }
}
