use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum FestgenError {
    #[error("file not found: {}", path.display())]
    MissingFile { path: PathBuf },

    #[error("unsupported file format '{extension}'. Supported: pdf, docx, hwp")]
    UnsupportedFormat { extension: String },

    #[error("{format} extraction failed: {reason}")]
    Extraction { format: String, reason: String },

    #[error("pdftotext not found. Install poppler: brew install poppler (macOS) or apt install poppler-utils (Linux)")]
    PdftotextNotFound,

    #[error("pdftotext failed with exit code {code}: {stderr}")]
    PdftotextFailed { code: i32, stderr: String },

    #[error("document conversion failed: {0}")]
    Conversion(String),

    #[error("generation service rejected the credentials: {0}")]
    GenerationAuth(String),

    #[error("generation service rate limit exceeded: {0}")]
    RateLimited(String),

    #[error("generation service returned HTTP {status}: {message}")]
    GenerationApi { status: u16, message: String },

    #[error("generation service unreachable: {0}")]
    GenerationTransport(String),

    #[error("generation service returned malformed content: {0}")]
    MalformedResponse(String),

    #[error("generation output violates the extraction schema: {0}")]
    SchemaViolation(String),

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("configuration error: {0}")]
    Config(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl FestgenError {
    pub(crate) fn extraction(format: &str, reason: impl ToString) -> Self {
        FestgenError::Extraction {
            format: format.to_string(),
            reason: reason.to_string(),
        }
    }
}

/// Human-readable message from an HTTP error body. JSON bodies contribute
/// `error.message`, `error` or `message`; other bodies are used as text.
pub(crate) fn http_error_message(body: &str) -> Option<String> {
    if let Ok(value) = serde_json::from_str::<serde_json::Value>(body) {
        return value["error"]["message"]
            .as_str()
            .or_else(|| value["error"].as_str())
            .or_else(|| value["message"].as_str())
            .map(str::to_string);
    }
    let text = body.trim();
    if text.is_empty() {
        return None;
    }
    Some(text.chars().take(200).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_from_json_or_text() {
        assert_eq!(
            http_error_message(r#"{"error": {"message": "Incorrect API key"}}"#).as_deref(),
            Some("Incorrect API key")
        );
        assert_eq!(http_error_message(r#"{"message": "Unauthenticated."}"#).as_deref(), Some("Unauthenticated."));
        assert_eq!(http_error_message("{}"), None);
        assert_eq!(http_error_message("  Bad Gateway\n").as_deref(), Some("Bad Gateway"));
        assert_eq!(http_error_message(""), None);
    }
}
