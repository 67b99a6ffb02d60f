use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::error::FestgenError;

/// Placeholder for any field the source text does not mention.
pub const NOT_FOUND: &str = "정보 없음";

/// The closed set of output keys, in prompt order.
pub const SCHEMA_FIELDS: [&str; 12] = [
    "title",
    "date",
    "location",
    "host",
    "organizer",
    "targetAudience",
    "summary",
    "programs",
    "events",
    "visualKeywords",
    "contactInfo",
    "directions",
];

/// Keys whose value is a list of strings.
pub const LIST_FIELDS: [&str; 3] = ["programs", "events", "visualKeywords"];

/// Field descriptions used in the extraction prompt and by `festgen schema`.
pub const FIELD_DESCRIPTIONS: [(&str, &str); 12] = [
    ("title", "축제 공식 제목"),
    ("date", "축제가 열리는 정확한 날짜와 기간"),
    ("location", "축제가 열리는 구체적인 장소"),
    ("host", "주최 기관"),
    ("organizer", "주관 기관"),
    (
        "targetAudience",
        "축제의 주요 대상 고객 (예: '가족 단위 방문객', '2030 연인', '어린이'). '주요 타깃' 또는 '고객층' 같은 단어 근처를 찾아보세요.",
    ),
    ("summary", "축제의 목적과 핵심 내용을 요약"),
    (
        "programs",
        "방문객이 '체험'할 수 있는 주요 프로그램의 '구체적인 내용' (리스트). (주의: '프로그램'이라는 제목의 목차뿐만 아니라, 그 '상세 내용'을 찾아주세요.)",
    ),
    (
        "events",
        "축제 기간 중 열리는 '특별 이벤트'의 '구체적인 내용' (리스트). (예: '개막 퍼포먼스', '산타 이벤트 운영'). (주의: '이벤트'라는 제목의 목차뿐만 아니라, 그 '상세 내용'을 찾아주세요.)",
    ),
    (
        "visualKeywords",
        "카드뉴스 디자인에 참고할 만한 시각적 키워드 (예: \"야간 조명\", \"크리스마스 트리\", \"산타\") (리스트)",
    ),
    (
        "contactInfo",
        "방문객이 문의할 수 있는 전화번호 또는 공식 웹사이트 주소",
    ),
    (
        "directions",
        "방문객이 축제 장소에 '오시는 길' (예: 'xx IC에서 10분', '담양 버스터미널에서 5번 버스', '주차: 메타랜드 주차장 이용'). (주의: '사업 지시'나 '제안서 접수' 내용이 아님. 방문객용 교통/주차 정보가 명확히 없으면 \"정보 없음\"으로 표기)",
    ),
];

/// A list field: either the items found, or the bare sentinel string when
/// nothing was found. Serializes back to exactly what was received.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ListField {
    Items(Vec<String>),
    NotFound(String),
}

impl ListField {
    pub fn items(&self) -> &[String] {
        match self {
            ListField::Items(items) => items,
            ListField::NotFound(_) => &[],
        }
    }
}

impl Default for ListField {
    fn default() -> Self {
        ListField::NotFound(NOT_FOUND.to_string())
    }
}

/// A fully populated extraction result. Every field is always present.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct FestivalSummary {
    pub title: String,
    pub date: String,
    pub location: String,
    pub host: String,
    pub organizer: String,
    pub target_audience: String,
    pub summary: String,
    pub programs: ListField,
    pub events: ListField,
    pub visual_keywords: ListField,
    pub contact_info: String,
    pub directions: String,
}

impl Default for FestivalSummary {
    fn default() -> Self {
        let nf = || NOT_FOUND.to_string();
        FestivalSummary {
            title: nf(),
            date: nf(),
            location: nf(),
            host: nf(),
            organizer: nf(),
            target_audience: nf(),
            summary: nf(),
            programs: ListField::default(),
            events: ListField::default(),
            visual_keywords: ListField::default(),
            contact_info: nf(),
            directions: nf(),
        }
    }
}

impl FestivalSummary {
    /// Parse and validate untrusted generation output.
    ///
    /// The body must be one JSON object with exactly the schema keys; scalar
    /// fields must be strings and list fields arrays of strings (or the
    /// sentinel string). Anything else fails closed.
    pub fn from_generated(raw: &str) -> Result<FestivalSummary, FestgenError> {
        let value: Value = serde_json::from_str(raw.trim()).map_err(|e| {
            FestgenError::MalformedResponse(format!("response is not JSON: {e}"))
        })?;
        let object = value.as_object().ok_or_else(|| {
            FestgenError::SchemaViolation("response is not a JSON object".into())
        })?;
        check_object(object)?;
        serde_json::from_value(value)
            .map_err(|e| FestgenError::SchemaViolation(format!("cannot map fields: {e}")))
    }

    pub fn to_value(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }
}

fn check_object(object: &Map<String, Value>) -> Result<(), FestgenError> {
    let mut unexpected: Vec<&str> = object
        .keys()
        .map(String::as_str)
        .filter(|k| !SCHEMA_FIELDS.contains(k))
        .collect();
    if !unexpected.is_empty() {
        unexpected.sort_unstable();
        return Err(FestgenError::SchemaViolation(format!(
            "unexpected field(s): {}",
            unexpected.join(", ")
        )));
    }

    let missing: Vec<&str> = SCHEMA_FIELDS
        .iter()
        .copied()
        .filter(|k| !object.contains_key(*k))
        .collect();
    if !missing.is_empty() {
        return Err(FestgenError::SchemaViolation(format!(
            "missing field(s): {}",
            missing.join(", ")
        )));
    }

    for (key, value) in object {
        if LIST_FIELDS.contains(&key.as_str()) {
            check_list(key, value)?;
        } else if !value.is_string() {
            return Err(FestgenError::SchemaViolation(format!(
                "field '{key}' must be a string, got {}",
                type_name(value)
            )));
        }
    }
    Ok(())
}

fn check_list(key: &str, value: &Value) -> Result<(), FestgenError> {
    match value {
        Value::Array(items) => match items.iter().find(|v| !v.is_string()) {
            Some(bad) => Err(FestgenError::SchemaViolation(format!(
                "field '{key}' must contain only strings, found {}",
                type_name(bad)
            ))),
            None => Ok(()),
        },
        Value::String(s) if s == NOT_FOUND => Ok(()),
        other => Err(FestgenError::SchemaViolation(format!(
            "field '{key}' must be a list of strings, got {}",
            type_name(other)
        ))),
    }
}

fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "boolean",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// Pipeline output: a summary or an error, never both.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SummaryRecord {
    Error { error: String },
    Summary(FestivalSummary),
}

impl SummaryRecord {
    pub fn error(reason: impl ToString) -> Self {
        SummaryRecord::Error {
            error: reason.to_string(),
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match self {
            SummaryRecord::Error { error } => Some(error),
            SummaryRecord::Summary(_) => None,
        }
    }

    pub fn is_error(&self) -> bool {
        matches!(self, SummaryRecord::Error { .. })
    }

    pub fn summary(&self) -> Option<&FestivalSummary> {
        match self {
            SummaryRecord::Summary(s) => Some(s),
            SummaryRecord::Error { .. } => None,
        }
    }
}

impl From<Result<FestivalSummary, FestgenError>> for SummaryRecord {
    fn from(result: Result<FestivalSummary, FestgenError>) -> Self {
        match result {
            Ok(summary) => SummaryRecord::Summary(summary),
            Err(e) => SummaryRecord::error(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn complete() -> Value {
        json!({
            "title": "제7회 담양 산타 축제",
            "date": "2025.12.24~12.25",
            "location": "메타랜드 일원",
            "host": "담양군",
            "organizer": NOT_FOUND,
            "targetAudience": "가족, 연인",
            "summary": "크리스마스 축제",
            "programs": ["산타축제공연", "야간경관 및 포토존 조성"],
            "events": NOT_FOUND,
            "visualKeywords": ["야간 조명", "산타"],
            "contactInfo": NOT_FOUND,
            "directions": NOT_FOUND
        })
    }

    #[test]
    fn accepts_complete_object_and_round_trips_unchanged() {
        let input = complete();
        let summary = FestivalSummary::from_generated(&input.to_string()).unwrap();
        assert_eq!(summary.events, ListField::NotFound(NOT_FOUND.into()));
        assert_eq!(summary.programs.items().len(), 2);
        assert_eq!(summary.to_value(), input);
    }

    #[test]
    fn rejects_budget_field() {
        let mut input = complete();
        input["budget"] = json!("총 사업비 3억원");
        let err = FestivalSummary::from_generated(&input.to_string()).unwrap_err();
        assert!(matches!(err, FestgenError::SchemaViolation(ref m) if m.contains("budget")));
    }

    #[test]
    fn rejects_missing_field() {
        let mut input = complete();
        input.as_object_mut().unwrap().remove("directions");
        let err = FestivalSummary::from_generated(&input.to_string()).unwrap_err();
        assert!(err.to_string().contains("directions"));
    }

    #[test]
    fn rejects_wrong_types() {
        let mut input = complete();
        input["title"] = Value::Null;
        assert!(FestivalSummary::from_generated(&input.to_string()).is_err());

        let mut input = complete();
        input["programs"] = json!("공연");
        assert!(FestivalSummary::from_generated(&input.to_string()).is_err());

        let mut input = complete();
        input["events"] = json!(["개막", 3]);
        assert!(FestivalSummary::from_generated(&input.to_string()).is_err());
    }

    #[test]
    fn non_json_is_malformed() {
        let err = FestivalSummary::from_generated("Sure! Here is the summary:").unwrap_err();
        assert!(matches!(err, FestgenError::MalformedResponse(_)));
        assert!(matches!(
            FestivalSummary::from_generated("[1, 2]").unwrap_err(),
            FestgenError::SchemaViolation(_)
        ));
    }

    #[test]
    fn default_is_all_sentinels() {
        let value = FestivalSummary::default().to_value();
        let object = value.as_object().unwrap();
        assert_eq!(object.len(), SCHEMA_FIELDS.len());
        assert!(object.values().all(|v| v == NOT_FOUND));
    }

    #[test]
    fn record_shapes_are_exclusive() {
        let err = SummaryRecord::from(Err(FestgenError::SchemaViolation("x".into())));
        let value = serde_json::to_value(&err).unwrap();
        assert_eq!(value.as_object().unwrap().len(), 1);
        assert!(value["error"].as_str().unwrap().contains("x"));

        assert!(err.error_message().is_some_and(|m| m.contains("x")));

        let ok = SummaryRecord::from(Ok(FestivalSummary::default()));
        assert!(serde_json::to_value(&ok).unwrap().get("error").is_none());
        assert_eq!(ok.error_message(), None);
    }

    #[test]
    fn descriptions_cover_every_field() {
        let described: Vec<&str> = FIELD_DESCRIPTIONS.iter().map(|(k, _)| *k).collect();
        assert_eq!(described, SCHEMA_FIELDS);
    }
}
