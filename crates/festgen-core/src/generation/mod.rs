pub mod openai;

use crate::error::FestgenError;

/// A single system + user exchange with a text-generation service.
#[derive(Debug, Clone)]
pub struct CompletionRequest {
    pub system: String,
    pub user: String,
    /// Ask the service to answer with one JSON object.
    pub json_response: bool,
}

/// Trait for text-generation backends.
pub trait CompletionService: Send + Sync {
    /// Returns the raw text of the first completion choice.
    fn complete(&self, request: &CompletionRequest) -> Result<String, FestgenError>;

    /// Model identifier (for diagnostics).
    fn model_name(&self) -> &str;
}
