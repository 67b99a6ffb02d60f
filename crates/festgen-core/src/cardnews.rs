//! Card-news marketing copy built from a festival summary.

use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::error::FestgenError;
use crate::generation::{CompletionRequest, CompletionService};
use crate::prompt;
use crate::schema::FestivalSummary;

/// Pages in one Instagram card-news set.
pub const DEFAULT_PAGES: usize = 6;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CardPage {
    pub page: u32,
    pub title: String,
    pub body: String,
}

#[derive(Debug, Clone)]
pub struct CardNewsRequest<'a> {
    /// Planning intent, e.g. "2030 연인들을 위한 로맨틱한 크리스마스 축제".
    pub theme: &'a str,
    pub summary: &'a FestivalSummary,
    pub trend_keywords: &'a [String],
    pub buzzwords: &'a [String],
}

pub struct CardNewsGenerator<'a> {
    service: &'a dyn CompletionService,
    pages: usize,
}

impl<'a> CardNewsGenerator<'a> {
    pub fn new(service: &'a dyn CompletionService) -> Self {
        CardNewsGenerator {
            service,
            pages: DEFAULT_PAGES,
        }
    }

    pub fn generate(&self, request: &CardNewsRequest<'_>) -> Result<Vec<CardPage>, FestgenError> {
        if request.theme.trim().is_empty() {
            return Err(FestgenError::InvalidInput("card news needs a theme".into()));
        }
        let summary_json = serde_json::to_string_pretty(request.summary)?;
        let completion = CompletionRequest {
            system: prompt::cardnews_system_prompt(self.pages),
            user: prompt::cardnews_user_prompt(
                request.theme,
                &summary_json,
                request.trend_keywords,
                request.buzzwords,
                self.pages,
            ),
            json_response: true,
        };

        tracing::info!(model = self.service.model_name(), "requesting card news copy");
        let raw = self.service.complete(&completion)?;
        let pages = parse_pages(&raw)?;
        if pages.len() != self.pages {
            tracing::warn!(expected = self.pages, got = pages.len(), "card news page count differs");
        }
        Ok(pages)
    }
}

/// Accepts a bare array or an object wrapping it under `pages` / `cards`
/// (JSON-object mode forbids top-level arrays). Pages come back sorted.
pub fn parse_pages(raw: &str) -> Result<Vec<CardPage>, FestgenError> {
    let value: Value = serde_json::from_str(raw.trim())
        .map_err(|e| FestgenError::MalformedResponse(format!("card news is not JSON: {e}")))?;

    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut object) => ["pages", "cards"]
            .iter()
            .find_map(|key| object.remove(*key))
            .ok_or_else(|| {
                FestgenError::SchemaViolation("card news object has no 'pages' array".into())
            })?,
        _ => {
            return Err(FestgenError::SchemaViolation(
                "card news must be a JSON array or object".into(),
            ))
        }
    };

    let mut pages: Vec<CardPage> = serde_json::from_value(list)
        .map_err(|e| FestgenError::SchemaViolation(format!("invalid card page: {e}")))?;
    if pages.is_empty() {
        return Err(FestgenError::SchemaViolation("card news has no pages".into()));
    }
    pages.sort_by_key(|p| p.page);
    Ok(pages)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_wrapped_pages_in_order() {
        let raw = r#"{"pages": [
            {"page": 2, "title": "메타랜드에서", "body": "12월 24일~25일"},
            {"page": 1, "title": "🎅 산타가 온다", "body": "제7회 담양 산타 축제"}
        ]}"#;
        let pages = parse_pages(raw).unwrap();
        assert_eq!(pages[0].page, 1);
        assert_eq!(pages[1].title, "메타랜드에서");
    }

    #[test]
    fn parses_bare_array() {
        let raw = r#"[{"page": 1, "title": "t", "body": "b"}]"#;
        assert_eq!(parse_pages(raw).unwrap().len(), 1);
    }

    #[test]
    fn rejects_incomplete_pages() {
        assert!(matches!(
            parse_pages(r#"{"pages": [{"page": 1, "title": "t"}]}"#),
            Err(FestgenError::SchemaViolation(_))
        ));
        assert!(matches!(
            parse_pages(r#"{"slides": []}"#),
            Err(FestgenError::SchemaViolation(_))
        ));
        assert!(matches!(parse_pages("카드뉴스"), Err(FestgenError::MalformedResponse(_))));
    }

    struct Canned(&'static str);

    impl CompletionService for Canned {
        fn complete(&self, request: &CompletionRequest) -> Result<String, FestgenError> {
            assert!(request.user.contains("제7회 담양 산타 축제"));
            assert!(request.user.contains("크리스마스 데이트"));
            Ok(self.0.to_string())
        }

        fn model_name(&self) -> &str {
            "canned"
        }
    }

    #[test]
    fn generate_embeds_summary_and_trends() {
        let summary = FestivalSummary {
            title: "제7회 담양 산타 축제".into(),
            ..FestivalSummary::default()
        };
        let trends = vec!["크리스마스 데이트".to_string()];
        let service = Canned(r#"{"cards": [{"page": 1, "title": "t", "body": "b"}]}"#);
        let pages = CardNewsGenerator::new(&service)
            .generate(&CardNewsRequest {
                theme: "로맨틱",
                summary: &summary,
                trend_keywords: &trends,
                buzzwords: &[],
            })
            .unwrap();
        assert_eq!(pages.len(), 1);
    }

    #[test]
    fn blank_theme_is_rejected_before_calling() {
        let summary = FestivalSummary::default();
        let service = Canned("unused");
        let err = CardNewsGenerator::new(&service)
            .generate(&CardNewsRequest {
                theme: "  ",
                summary: &summary,
                trend_keywords: &[],
                buzzwords: &[],
            })
            .unwrap_err();
        assert!(matches!(err, FestgenError::InvalidInput(_)));
    }
}
