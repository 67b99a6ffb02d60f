use serde::{Deserialize, Serialize};

use crate::schema::SummaryRecord;

/// Planning intent supplied alongside the document.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserInputs {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub title: Option<String>,
    pub theme: String,
    pub keywords: Vec<String>,
}

/// Summary record plus the user inputs it was produced for.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnalysisReport {
    pub analysis_summary: SummaryRecord,
    pub user_inputs: UserInputs,
}

impl AnalysisReport {
    pub fn new(analysis_summary: SummaryRecord, user_inputs: UserInputs) -> Self {
        AnalysisReport {
            analysis_summary,
            user_inputs,
        }
    }
}

/// Split a comma-separated keyword field, e.g. `"꽃, 쉼 ,열정"`.
pub fn parse_keywords(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|k| !k.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::FestivalSummary;

    #[test]
    fn keywords_are_trimmed_and_empties_dropped() {
        assert_eq!(parse_keywords("꽃, 쉼 ,열정"), vec!["꽃", "쉼", "열정"]);
        assert_eq!(parse_keywords(" , ,"), Vec::<String>::new());
        assert!(parse_keywords("").is_empty());
    }

    #[test]
    fn report_serializes_both_parts() {
        let report = AnalysisReport::new(
            SummaryRecord::Summary(FestivalSummary::default()),
            UserInputs {
                title: None,
                theme: "로맨틱 크리스마스".into(),
                keywords: parse_keywords("산타, 데이트"),
            },
        );
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["analysis_summary"]["title"], crate::schema::NOT_FOUND);
        assert_eq!(value["user_inputs"]["keywords"][1], "데이트");
        assert!(value["user_inputs"].get("title").is_none());
    }

    #[test]
    fn error_summary_is_carried_through() {
        let report = AnalysisReport::new(SummaryRecord::error("unsupported format: txt"), UserInputs::default());
        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["analysis_summary"]["error"], "unsupported format: txt");
    }
}
